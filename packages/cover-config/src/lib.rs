mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Matching, Search, SearchPool, Service};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	let search = &cfg.search;

	if !(search.base_url.starts_with("http://") || search.base_url.starts_with("https://")) {
		return Err(Error::validation("search.base_url", "must start with http:// or https://"));
	}

	for (key, value) in [
		("search.recommendation_index", &search.recommendation_index),
		("search.catalog_index", &search.catalog_index),
	] {
		if value.trim().is_empty() {
			return Err(Error::validation(key, "must be non-empty"));
		}
	}

	if search.username.is_some() != search.password.is_some() {
		return Err(Error::validation(
			"search.username",
			"and search.password must be set together",
		));
	}

	let pool = &search.pool;

	for (key, value) in [
		("search.pool.max_connections", u64::from(pool.max_connections)),
		("search.pool.max_idle_per_host", u64::from(pool.max_idle_per_host)),
		("search.pool.keepalive_secs", pool.keepalive_secs),
		("search.pool.connect_timeout_ms", pool.connect_timeout_ms),
		("search.pool.request_timeout_ms", pool.request_timeout_ms),
	] {
		if value == 0 {
			return Err(Error::validation(key, "must be greater than zero"));
		}
	}

	if pool.connect_timeout_ms > pool.request_timeout_ms {
		return Err(Error::validation(
			"search.pool.connect_timeout_ms",
			"must not exceed search.pool.request_timeout_ms",
		));
	}
	if !cfg.matching.default_budget.is_finite() {
		return Err(Error::validation("matching.default_budget", "must be a finite number"));
	}
	if cfg.matching.default_budget <= 0.0 {
		return Err(Error::validation("matching.default_budget", "must be greater than zero"));
	}
	if cfg.matching.default_limit == 0 {
		return Err(Error::validation("matching.default_limit", "must be greater than zero"));
	}
	if cfg.matching.fallback_size == 0 {
		return Err(Error::validation("matching.fallback_size", "must be greater than zero"));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.search.username.as_deref().map(|value| value.trim().is_empty()).unwrap_or(false) {
		cfg.search.username = None;
	}
	if cfg.search.password.as_deref().map(|value| value.trim().is_empty()).unwrap_or(false) {
		cfg.search.password = None;
	}

	let trimmed = cfg.search.base_url.trim().trim_end_matches('/').to_string();

	cfg.search.base_url = trimmed;
}
