pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error(transparent)]
	Search(#[from] cover_search::Error),
}
impl From<cover_domain::Error> for Error {
	fn from(err: cover_domain::Error) -> Self {
		match err {
			cover_domain::Error::InvalidCharacteristics { message } =>
				Self::InvalidRequest { message },
		}
	}
}
