use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub search: Search,
	#[serde(default)]
	pub matching: Matching,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

/// Where the document-search engine lives and how to talk to it.
#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	pub base_url: String,
	pub username: Option<String>,
	pub password: Option<String>,
	/// Coarse index used for eligibility filtering and scoring. Only product ids are read back.
	pub recommendation_index: String,
	/// Detail index holding the full product records, keyed by the same product id.
	pub catalog_index: String,
	#[serde(default)]
	pub accept_invalid_certs: bool,
	#[serde(default)]
	pub pool: SearchPool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchPool {
	/// Upper bound on requests in flight across every caller sharing one engine.
	pub max_connections: u32,
	pub max_idle_per_host: u32,
	pub keepalive_secs: u64,
	/// Zero disables resolver caching.
	pub dns_cache_ttl_secs: u64,
	pub connect_timeout_ms: u64,
	pub request_timeout_ms: u64,
}
impl Default for SearchPool {
	fn default() -> Self {
		Self {
			max_connections: 10,
			max_idle_per_host: 5,
			keepalive_secs: 30,
			dns_cache_ttl_secs: 300,
			connect_timeout_ms: 10_000,
			request_timeout_ms: 30_000,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Matching {
	pub default_budget: f64,
	pub default_limit: u32,
	pub fallback_size: u32,
}
impl Default for Matching {
	fn default() -> Self {
		Self { default_budget: 5_000.0, default_limit: 10, fallback_size: 3 }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}
