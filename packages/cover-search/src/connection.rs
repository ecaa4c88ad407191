use std::{
	sync::{
		Arc, RwLock,
		atomic::{AtomicU64, Ordering},
	},
	time::Duration,
};

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::{ClusterHealth, Error, Result, dns::CachingResolver};

/// Owns the pooled HTTP session to the document-search engine.
///
/// The session is replaced wholesale when it is recreated, never mutated in place: a caller
/// holding the previous session finishes its request on it while new callers pick up the
/// fresh one. Every request holds a permit until its response body has been read, which bounds
/// the number of connections busy at once across all callers sharing the manager.
pub struct ConnectionManager {
	settings: cover_config::Search,
	session: RwLock<Option<Arc<Session>>>,
	generations: AtomicU64,
	permits: Semaphore,
}

struct Session {
	client: Client,
	generation: u64,
}

impl ConnectionManager {
	pub fn new(settings: &cover_config::Search) -> Result<Self> {
		let settings = settings.clone();
		let session = Session::open(&settings, 1)?;
		let permits = Semaphore::new(settings.pool.max_connections as usize);

		Ok(Self {
			settings,
			session: RwLock::new(Some(Arc::new(session))),
			generations: AtomicU64::new(1),
			permits,
		})
	}

	pub fn base_url(&self) -> &str {
		&self.settings.base_url
	}

	/// Number of sessions opened so far, starting at one.
	pub fn generation(&self) -> u64 {
		self.current().map(|session| session.generation).unwrap_or(0)
	}

	pub fn is_closed(&self) -> bool {
		self.session.read().unwrap_or_else(|err| err.into_inner()).is_none()
	}

	/// Cheap liveness probe. On failure the session is recreated and probed once more.
	pub async fn ensure_connection(&self) -> bool {
		let Ok(session) = self.current() else {
			return false;
		};

		match self.probe(&session).await {
			Ok(()) => true,
			Err(err) => {
				tracing::warn!(error = %err, base_url = %self.base_url(), "Search engine probe failed.");

				self.reopen_and_probe(session.generation).await
			},
		}
	}

	/// Recreates the session and probes the new one. Used by callers that just saw a transport
	/// failure on the current session.
	pub async fn reconnect(&self) -> bool {
		let Ok(session) = self.current() else {
			return false;
		};

		self.reopen_and_probe(session.generation).await
	}

	/// Cluster health probe for diagnostics. Never recreates the session.
	pub async fn health_check(&self) -> bool {
		let (response, _permit) = match self.send(Method::GET, "/_cluster/health", None).await {
			Ok(sent) => sent,
			Err(err) => {
				tracing::error!(error = %err, "Search engine health check failed.");

				return false;
			},
		};
		let status = response.status();

		if status != StatusCode::OK {
			tracing::error!(status = status.as_u16(), "Search engine health check failed.");

			return false;
		}

		match response.json::<ClusterHealth>().await {
			Ok(health) => {
				tracing::info!(
					status = %health.status,
					cluster = health.cluster_name.as_deref().unwrap_or("unknown"),
					"Search engine cluster health."
				);
			},
			Err(err) => {
				tracing::warn!(error = %err, "Search engine health body was unreadable.");
			},
		}

		true
	}

	/// `POST /{index}/_search`. Non-2xx statuses become [`Error::Query`].
	pub async fn search(&self, index: &str, body: &Value) -> Result<Value> {
		let path = format!("/{index}/_search");
		let (response, _permit) = self.send(Method::POST, &path, Some(body)).await?;
		let status = response.status();

		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();

			return Err(Error::Query { status: status.as_u16(), body });
		}

		Ok(response.json().await?)
	}

	/// Releases the session. Requests already in flight finish on the session they hold. Safe
	/// to call more than once.
	pub fn close(&self) {
		let previous = self.session.write().unwrap_or_else(|err| err.into_inner()).take();

		if previous.is_some() {
			self.permits.close();

			tracing::info!(base_url = %self.base_url(), "Search engine connection closed.");
		}
	}

	fn current(&self) -> Result<Arc<Session>> {
		self.session.read().unwrap_or_else(|err| err.into_inner()).clone().ok_or(Error::Closed)
	}

	/// Swaps in a new session unless another caller already replaced `observed`.
	fn reopen(&self, observed: u64) -> Result<Arc<Session>> {
		let mut guard = self.session.write().unwrap_or_else(|err| err.into_inner());
		let Some(current) = guard.as_ref() else {
			return Err(Error::Closed);
		};

		if current.generation != observed {
			return Ok(current.clone());
		}

		let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
		let fresh = Arc::new(Session::open(&self.settings, generation)?);

		*guard = Some(fresh.clone());

		Ok(fresh)
	}

	async fn reopen_and_probe(&self, observed: u64) -> bool {
		let session = match self.reopen(observed) {
			Ok(session) => session,
			Err(err) => {
				tracing::error!(error = %err, "Failed to recreate search engine session.");

				return false;
			},
		};

		match self.probe(&session).await {
			Ok(()) => {
				tracing::info!(generation = session.generation, "Search engine reconnected.");

				true
			},
			Err(err) => {
				tracing::error!(error = %err, "Search engine reconnect failed.");

				false
			},
		}
	}

	async fn probe(&self, session: &Session) -> Result<()> {
		let (response, _permit) = self.send_on(session, Method::GET, "/", None).await?;
		let status = response.status();

		if status != StatusCode::OK {
			return Err(Error::Query { status: status.as_u16(), body: String::new() });
		}

		Ok(())
	}

	async fn send(
		&self,
		method: Method,
		path: &str,
		body: Option<&Value>,
	) -> Result<(Response, SemaphorePermit<'_>)> {
		let session = self.current()?;

		self.send_on(&session, method, path, body).await
	}

	async fn send_on(
		&self,
		session: &Session,
		method: Method,
		path: &str,
		body: Option<&Value>,
	) -> Result<(Response, SemaphorePermit<'_>)> {
		let permit = self.permits.acquire().await.map_err(|_| Error::Closed)?;
		let url = format!("{}{}", self.settings.base_url, path);
		let mut request = session.client.request(method, url);

		if let Some(body) = body {
			request = request.json(body);
		}

		let response = self.authorize(request).send().await?;

		Ok((response, permit))
	}

	fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
		match (&self.settings.username, &self.settings.password) {
			(Some(username), password) => request.basic_auth(username, password.as_deref()),
			_ => request,
		}
	}
}

impl Drop for ConnectionManager {
	fn drop(&mut self) {
		self.close();
	}
}

impl Session {
	fn open(settings: &cover_config::Search, generation: u64) -> Result<Self> {
		let pool = &settings.pool;
		let mut builder = Client::builder()
			.connect_timeout(Duration::from_millis(pool.connect_timeout_ms))
			.timeout(Duration::from_millis(pool.request_timeout_ms))
			.pool_max_idle_per_host(pool.max_idle_per_host as usize)
			.pool_idle_timeout(Duration::from_secs(pool.keepalive_secs))
			.tcp_keepalive(Duration::from_secs(pool.keepalive_secs))
			.danger_accept_invalid_certs(settings.accept_invalid_certs);

		if pool.dns_cache_ttl_secs > 0 {
			builder = builder.dns_resolver(Arc::new(CachingResolver::new(Duration::from_secs(
				pool.dns_cache_ttl_secs,
			))));
		}

		let client = builder
			.build()
			.map_err(|err| Error::InvalidConfig { message: err.to_string() })?;

		Ok(Self { client, generation })
	}
}
