pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Search engine is unreachable: {0}")]
	Connectivity(#[source] reqwest::Error),
	#[error("Search engine rejected the request with status {status}: {body}")]
	Query { status: u16, body: String },
	#[error("Search engine returned an unreadable response: {message}")]
	InvalidResponse { message: String },
	#[error("Connection manager is closed.")]
	Closed,
	#[error("{message}")]
	InvalidConfig { message: String },
}
impl Error {
	/// Transport-level failures are the only ones worth a reconnect and retry.
	pub fn is_connectivity(&self) -> bool {
		matches!(self, Self::Connectivity(_))
	}
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		if err.is_decode() {
			return Self::InvalidResponse { message: err.to_string() };
		}
		if err.is_builder() {
			return Self::InvalidConfig { message: err.to_string() };
		}

		Self::Connectivity(err)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::InvalidResponse { message: err.to_string() }
	}
}
