pub mod find_products;
pub mod hydration;
pub mod query;
pub mod ranking;

mod error;

pub use error::{Error, Result};
pub use find_products::{FindProductsRequest, FindProductsResponse};
pub use query::{BoostCondition, HardFilter, QueryPlan, SoftBoost};

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use cover_config::Config;
use cover_domain::ScoringSpec;
use cover_search::ConnectionManager;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The document-search operations the matching pipeline depends on.
pub trait SearchBackend
where
	Self: Send + Sync,
{
	/// Liveness probe that may recreate the underlying session.
	fn ensure_connection(&self) -> BoxFuture<'_, bool>;

	/// Recreates the underlying session after a transport failure.
	fn reconnect(&self) -> BoxFuture<'_, bool>;

	fn search<'a>(
		&'a self,
		index: &'a str,
		body: &'a Value,
	) -> BoxFuture<'a, cover_search::Result<Value>>;

	fn health_check(&self) -> BoxFuture<'_, bool>;

	fn close(&self);
}

/// Which pipeline stage issued a search, for logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Stage {
	Ranking,
	Fallback,
	Hydration,
}
impl Stage {
	pub(crate) fn as_str(self) -> &'static str {
		match self {
			Self::Ranking => "ranking",
			Self::Fallback => "fallback",
			Self::Hydration => "hydration",
		}
	}
}

pub struct MatchingService {
	pub cfg: Config,
	pub spec: ScoringSpec,
	pub backend: Arc<dyn SearchBackend>,
}
impl MatchingService {
	/// Builds the service over a pooled connection to the configured search engine.
	pub fn new(cfg: Config) -> Result<Self> {
		let backend = Arc::new(ConnectionManager::new(&cfg.search)?);

		Ok(Self::with_backend(cfg, backend))
	}

	pub fn with_backend(cfg: Config, backend: Arc<dyn SearchBackend>) -> Self {
		Self { cfg, spec: ScoringSpec::default(), backend }
	}

	/// Cluster health for diagnostics. Never fails.
	pub async fn health_check(&self) -> bool {
		self.backend.health_check().await
	}

	/// Releases pooled connections. Safe to call more than once.
	pub fn close(&self) {
		self.backend.close();
	}

	/// Issues one search for `stage`, retrying once after a reconnect when the failure was a
	/// transport error. Returns `None` when the stage has to give up.
	pub(crate) async fn search_with_retry(
		&self,
		stage: Stage,
		index: &str,
		body: &Value,
	) -> Option<Value> {
		if !self.backend.ensure_connection().await {
			tracing::error!(stage = stage.as_str(), "Search engine is unavailable.");

			return None;
		}

		let err = match self.backend.search(index, body).await {
			Ok(response) => return Some(response),
			Err(err) => err,
		};

		if !err.is_connectivity() {
			tracing::error!(stage = stage.as_str(), index, error = %err, "Search failed.");

			return None;
		}

		tracing::warn!(
			stage = stage.as_str(),
			index,
			error = %err,
			"Search connection failed. Reconnecting and retrying once."
		);

		if !self.backend.reconnect().await {
			tracing::error!(stage = stage.as_str(), "Search engine reconnect failed.");

			return None;
		}

		match self.backend.search(index, body).await {
			Ok(response) => {
				tracing::info!(stage = stage.as_str(), index, "Search retry succeeded.");

				Some(response)
			},
			Err(err) => {
				tracing::error!(stage = stage.as_str(), index, error = %err, "Search retry failed.");

				None
			},
		}
	}
}

impl SearchBackend for ConnectionManager {
	fn ensure_connection(&self) -> BoxFuture<'_, bool> {
		Box::pin(ConnectionManager::ensure_connection(self))
	}

	fn reconnect(&self) -> BoxFuture<'_, bool> {
		Box::pin(ConnectionManager::reconnect(self))
	}

	fn search<'a>(
		&'a self,
		index: &'a str,
		body: &'a Value,
	) -> BoxFuture<'a, cover_search::Result<Value>> {
		Box::pin(ConnectionManager::search(self, index, body))
	}

	fn health_check(&self) -> BoxFuture<'_, bool> {
		Box::pin(ConnectionManager::health_check(self))
	}

	fn close(&self) {
		ConnectionManager::close(self);
	}
}
