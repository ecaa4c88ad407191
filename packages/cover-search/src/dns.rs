use std::{io, net::SocketAddr, sync::Arc, time::Duration};

use moka::future::Cache;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};

/// Resolver that remembers lookups for a fixed time-to-live.
///
/// Each pooled session owns its own resolver, so recreating the session after a failure also
/// drops every cached address.
#[derive(Clone)]
pub struct CachingResolver {
	entries: Cache<String, Arc<Vec<SocketAddr>>>,
}
impl CachingResolver {
	const MAX_HOSTS: u64 = 64;

	pub fn new(ttl: Duration) -> Self {
		Self { entries: Cache::builder().max_capacity(Self::MAX_HOSTS).time_to_live(ttl).build() }
	}

	pub fn is_cached(&self, host: &str) -> bool {
		self.entries.contains_key(host)
	}

	/// Concurrent lookups of the same host share one resolution.
	async fn resolve_host(&self, host: String) -> Result<Arc<Vec<SocketAddr>>, Arc<io::Error>> {
		let lookup = {
			let host = host.clone();

			async move {
				let addrs = tokio::net::lookup_host((host.as_str(), 0)).await?.collect::<Vec<_>>();

				if addrs.is_empty() {
					return Err(io::Error::new(
						io::ErrorKind::NotFound,
						format!("No addresses resolved for {host}."),
					));
				}

				tracing::debug!(%host, count = addrs.len(), "Resolved search engine host.");

				Ok(Arc::new(addrs))
			}
		};

		self.entries.try_get_with(host, lookup).await
	}
}

impl Resolve for CachingResolver {
	fn resolve(&self, name: Name) -> Resolving {
		let resolver = self.clone();
		let host = name.as_str().to_string();

		Box::pin(async move {
			match resolver.resolve_host(host).await {
				Ok(addrs) => Ok(Box::new(addrs.as_ref().clone().into_iter()) as Addrs),
				Err(err) => Err(io::Error::new(err.kind(), err.to_string()).into()),
			}
		})
	}
}
