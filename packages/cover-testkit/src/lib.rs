pub mod dsl;
pub mod fixtures;

mod error;

pub use error::{Error, Result};

use std::{
	future::IntoFuture,
	net::TcpListener as StdTcpListener,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use axum::{
	Json, Router,
	extract::{Path, State},
	http::{HeaderMap, StatusCode, header::AUTHORIZATION},
	response::{IntoResponse, Response},
	routing,
};
use serde_json::Value;
use tokio::{
	net::TcpListener,
	sync::{oneshot, oneshot::Sender},
};

use cover_domain::{RankingCandidate, ScoredResult, ScoringParams, ScoringSpec, product};

pub const RECOMMENDATION_INDEX: &str = "insurance_products";
pub const CATALOG_INDEX: &str = "insurance_total_fields";

/// An in-memory stand-in for the document-search engine, served over real HTTP.
///
/// Recommendation searches are evaluated with [`dsl`] and scored with the domain scoring
/// functions. Catalog lookups return matches in reverse insertion order so callers cannot rely
/// on the engine preserving request order.
pub struct FakeSearchEngine {
	base_url: String,
	state: Arc<EngineState>,
	shutdown: Option<Sender<()>>,
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
	pub method: String,
	pub path: String,
	pub authorization: Option<String>,
	pub body: Option<Value>,
}

#[derive(Default)]
struct EngineState {
	candidates: Mutex<Vec<Value>>,
	catalog: Mutex<Vec<Value>>,
	requests: Mutex<Vec<RecordedRequest>>,
	probe_failures: AtomicUsize,
	search_failures: AtomicUsize,
	health: Mutex<Option<String>>,
}

impl FakeSearchEngine {
	pub async fn start() -> Result<Self> {
		let state = Arc::new(EngineState::default());

		*lock(&state.health) = Some("green".to_string());

		let app = Router::new()
			.route("/", routing::get(probe_handler))
			.route("/_cluster/health", routing::get(health_handler))
			.route("/{index}/_search", routing::post(search_handler))
			.with_state(state.clone());
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let (tx, rx) = oneshot::channel();
		let server = axum::serve(listener, app).with_graceful_shutdown(async move {
			let _ = rx.await;
		});

		tokio::spawn(async move {
			let _ = server.into_future().await;
		});

		Ok(Self { base_url: format!("http://{addr}"), state, shutdown: Some(tx) })
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// Adds a recommendation-index document. It must carry a `product_id`.
	pub fn index_candidate(&self, doc: Value) {
		lock(&self.state.candidates).push(doc);
	}

	/// Adds a catalog-index document. It must carry a `product_id`.
	pub fn index_product(&self, doc: Value) {
		lock(&self.state.catalog).push(doc);
	}

	/// The next `count` liveness probes answer 503.
	pub fn fail_next_probes(&self, count: usize) {
		self.state.probe_failures.store(count, Ordering::SeqCst);
	}

	/// The next `count` searches answer 500.
	pub fn fail_next_searches(&self, count: usize) {
		self.state.search_failures.store(count, Ordering::SeqCst);
	}

	/// `None` makes the health endpoint answer 503.
	pub fn set_health(&self, status: Option<&str>) {
		*lock(&self.state.health) = status.map(str::to_string);
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		lock(&self.state.requests).clone()
	}

	/// Bodies of the searches issued against `index`, oldest first.
	pub fn search_bodies(&self, index: &str) -> Vec<Value> {
		let path = format!("/{index}/_search");

		self.requests()
			.into_iter()
			.filter(|request| request.path == path)
			.filter_map(|request| request.body)
			.collect()
	}

	pub fn count_requests(&self, path: &str) -> usize {
		lock(&self.state.requests).iter().filter(|request| request.path == path).count()
	}

	pub fn shutdown(mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
	}
}

impl Drop for FakeSearchEngine {
	fn drop(&mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
	}
}

/// Search settings pointing at `base_url`, with short timeouts suitable for tests.
pub fn search_settings(base_url: &str) -> cover_config::Search {
	cover_config::Search {
		base_url: base_url.trim_end_matches('/').to_string(),
		username: None,
		password: None,
		recommendation_index: RECOMMENDATION_INDEX.to_string(),
		catalog_index: CATALOG_INDEX.to_string(),
		accept_invalid_certs: false,
		pool: cover_config::SearchPool {
			connect_timeout_ms: 500,
			request_timeout_ms: 2_000,
			..Default::default()
		},
	}
}

/// A full configuration around [`search_settings`] with default matching settings.
pub fn test_config(base_url: &str) -> cover_config::Config {
	cover_config::Config {
		service: cover_config::Service { log_level: "debug".to_string() },
		search: search_settings(base_url),
		matching: cover_config::Matching::default(),
	}
}

/// A URL on which nothing is listening.
pub fn closed_port_url() -> Result<String> {
	let listener = StdTcpListener::bind("127.0.0.1:0")?;
	let addr = listener.local_addr()?;

	drop(listener);

	Ok(format!("http://{addr}"))
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|err| err.into_inner())
}

fn record(state: &EngineState, method: &str, path: String, headers: &HeaderMap, body: Option<Value>) {
	let authorization =
		headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()).map(str::to_string);

	lock(&state.requests).push(RecordedRequest {
		method: method.to_string(),
		path,
		authorization,
		body,
	});
}

fn take_failure(counter: &AtomicUsize) -> bool {
	counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok()
}

async fn probe_handler(State(state): State<Arc<EngineState>>, headers: HeaderMap) -> Response {
	record(&state, "GET", "/".to_string(), &headers, None);

	if take_failure(&state.probe_failures) {
		return StatusCode::SERVICE_UNAVAILABLE.into_response();
	}

	Json(serde_json::json!({ "name": "fake", "version": { "number": "8.13.0" } })).into_response()
}

async fn health_handler(State(state): State<Arc<EngineState>>, headers: HeaderMap) -> Response {
	record(&state, "GET", "/_cluster/health".to_string(), &headers, None);

	match lock(&state.health).clone() {
		Some(status) => {
			Json(serde_json::json!({ "cluster_name": "fake", "status": status })).into_response()
		},
		None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
	}
}

async fn search_handler(
	State(state): State<Arc<EngineState>>,
	Path(index): Path<String>,
	headers: HeaderMap,
	Json(body): Json<Value>,
) -> Response {
	record(&state, "POST", format!("/{index}/_search"), &headers, Some(body.clone()));

	if take_failure(&state.search_failures) {
		return (StatusCode::INTERNAL_SERVER_ERROR, "injected failure").into_response();
	}

	let hits = match index.as_str() {
		RECOMMENDATION_INDEX => rank(&lock(&state.candidates), &body),
		CATALOG_INDEX => lookup(&lock(&state.catalog), &body),
		_ => {
			let error = serde_json::json!({ "error": { "type": "index_not_found_exception" } });

			return (StatusCode::NOT_FOUND, Json(error)).into_response();
		},
	};

	match hits {
		Ok(hits) => Json(serde_json::json!({ "hits": { "hits": hits } })).into_response(),
		Err(message) => (StatusCode::BAD_REQUEST, message).into_response(),
	}
}

fn rank(candidates: &[Value], body: &Value) -> Result<Vec<Value>, String> {
	let size = requested_size(body);
	let script_score = body
		.pointer("/query/script_score")
		.ok_or_else(|| "Expected a script_score query.".to_string())?;
	let inner = script_score.get("query").cloned().unwrap_or_else(|| serde_json::json!({}));
	let params: ScoringParams = script_score
		.pointer("/script/params")
		.cloned()
		.ok_or_else(|| "Missing script params.".to_string())
		.and_then(|params| serde_json::from_value(params).map_err(|err| err.to_string()))?;
	let spec = ScoringSpec::default();
	let mut scored = Vec::new();

	for doc in candidates {
		let Some(base) = dsl::relevance(&inner, doc) else {
			continue;
		};
		let candidate: RankingCandidate =
			serde_json::from_value(doc.clone()).map_err(|err| err.to_string())?;

		scored.push(ScoredResult {
			score: spec.final_score(base, &candidate, &params),
			cost_performance: candidate.cost_performance_score,
			product_id: candidate.product_id,
		});
	}

	product::sort_ranked(&mut scored);

	Ok(scored
		.into_iter()
		.take(size)
		.map(|result| {
			serde_json::json!({
				"_id": result.product_id,
				"_score": null,
				"_source": { "product_id": result.product_id },
				"sort": [result.score, result.cost_performance],
			})
		})
		.collect())
}

fn lookup(catalog: &[Value], body: &Value) -> Result<Vec<Value>, String> {
	let size = requested_size(body);
	let ids = body
		.pointer("/query/terms/product_id")
		.and_then(Value::as_array)
		.ok_or_else(|| "Expected a terms query on product_id.".to_string())?;

	Ok(catalog
		.iter()
		.rev()
		.filter(|doc| doc.get("product_id").map(|id| ids.contains(id)).unwrap_or(false))
		.take(size)
		.map(|doc| serde_json::json!({ "_id": doc["product_id"], "_score": 1.0, "_source": doc }))
		.collect())
}

fn requested_size(body: &Value) -> usize {
	body.get("size").and_then(Value::as_u64).map(|size| size as usize).unwrap_or(10)
}
