use std::{sync::Arc, time::Duration};

use serde_json::{Value, json};

use cover_domain::{BuyerCharacteristics, Gender, UserSegment};
use cover_service::{Error, FindProductsRequest, MatchingService};
use cover_testkit::{
	CATALOG_INDEX, FakeSearchEngine, RECOMMENDATION_INDEX,
	fixtures::{catalog_product, eligible_candidate, with_field},
};

async fn start_engine() -> FakeSearchEngine {
	FakeSearchEngine::start().await.expect("Failed to start fake search engine.")
}

fn service_for(engine: &FakeSearchEngine) -> MatchingService {
	MatchingService::new(cover_testkit::test_config(engine.base_url()))
		.expect("Failed to build matching service.")
}

fn young_tech_buyer() -> FindProductsRequest {
	FindProductsRequest {
		characteristics: BuyerCharacteristics {
			age: Some(27),
			gender: Some(Gender::Female),
			insurance_budget: Some(5_000.0),
			user_segment: UserSegment::TechYoung,
			..Default::default()
		},
		limit: None,
	}
}

fn index_both(engine: &FakeSearchEngine, candidate: Value) {
	let product_id = candidate["product_id"].as_str().unwrap_or_default().to_string();

	engine.index_candidate(candidate);
	engine.index_product(catalog_product(&product_id));
}

/// Five eligible products with clearly separated scores, plus four that fail one hard filter
/// each for a 27-year-old woman.
fn seed_catalog(engine: &FakeSearchEngine) {
	let best = [
		("value_added_services", json!(["在线问诊"])),
		("company", json!("众安保险")),
		("renewal.guaranteed_renewal_years", json!(20)),
		("renewal.renewal_underwriting_required", json!(false)),
		("cost_performance_score", json!(90)),
	]
	.into_iter()
	.fold(eligible_candidate("best"), |doc, (path, value)| with_field(doc, path, value));
	let worst = with_field(
		with_field(eligible_candidate("worst"), "premium.age_25", json!(20_000)),
		"cost_performance_score",
		json!(10),
	);

	index_both(engine, best);
	index_both(engine, eligible_candidate("mid-1"));
	index_both(engine, with_field(eligible_candidate("mid-2"), "overall_rating", json!(80)));
	index_both(engine, with_field(eligible_candidate("mid-3"), "gender_requirement", json!("女")));
	index_both(engine, worst);

	let ineligible = [
		("too-old-limit", "age_range.max_age", json!(25)),
		("men-only", "gender_requirement", json!("男")),
		("regional", "regions", json!(["北京"])),
		("high-risk", "excluded_occupations", json!(["高危职业"])),
	];

	for (product_id, path, value) in ineligible {
		index_both(engine, with_field(eligible_candidate(product_id), path, value));
	}
}

fn ids(products: &[cover_domain::DetailedProduct]) -> Vec<String> {
	products.iter().map(|product| product.product_id.clone()).collect()
}

#[tokio::test]
async fn eligible_products_are_ranked_and_hydrated() {
	let engine = start_engine().await;

	seed_catalog(&engine);

	let service = service_for(&engine);
	let response = service.find_products(young_tech_buyer()).await.expect("find_products failed");
	let returned = ids(&response.products);

	assert_eq!(returned.len(), 5);
	assert_eq!(returned.first().map(String::as_str), Some("best"));
	assert_eq!(returned.last().map(String::as_str), Some("worst"));

	for excluded in ["too-old-limit", "men-only", "regional", "high-risk"] {
		assert!(!returned.iter().any(|id| id == excluded), "{excluded} must be filtered out.");
	}

	let catalog_bodies = engine.search_bodies(CATALOG_INDEX);

	assert_eq!(catalog_bodies[0]["query"]["terms"]["product_id"], json!(returned));
	assert_eq!(response.products[0].field("product_name"), Some(&json!("Product best")));
	assert_eq!(engine.search_bodies(RECOMMENDATION_INDEX).len(), 1);
}

#[tokio::test]
async fn buyer_outside_every_age_range_gets_the_fallback() {
	let engine = start_engine().await;

	seed_catalog(&engine);

	let service = service_for(&engine);
	let mut req = young_tech_buyer();

	req.characteristics.age = Some(95);

	let response = service.find_products(req).await.expect("find_products failed");
	let ranking_bodies = engine.search_bodies(RECOMMENDATION_INDEX);

	assert_eq!(response.products.len(), 3);
	assert_eq!(ranking_bodies.len(), 2);
	assert_eq!(ranking_bodies[1]["query"]["script_score"]["query"], json!({ "match_all": {} }));
	assert_eq!(ranking_bodies[1]["size"], 3);
}

#[tokio::test]
async fn products_missing_from_the_catalog_are_dropped_in_order() {
	let engine = start_engine().await;

	for product_id in ["A", "B", "C"] {
		engine.index_candidate(eligible_candidate(product_id));
	}
	for product_id in ["A", "C"] {
		engine.index_product(catalog_product(product_id));
	}

	let service = service_for(&engine);
	let response = service.find_products(young_tech_buyer()).await.expect("find_products failed");
	let catalog_bodies = engine.search_bodies(CATALOG_INDEX);
	let ranked = catalog_bodies[0]["query"]["terms"]["product_id"]
		.as_array()
		.map(|ids| ids.iter().filter_map(Value::as_str).map(str::to_string).collect::<Vec<_>>())
		.unwrap_or_default();
	let expected = ranked.into_iter().filter(|id| id != "B").collect::<Vec<_>>();

	assert_eq!(ids(&response.products), expected);
	assert_eq!(expected.len(), 2);
}

#[tokio::test]
async fn repeated_requests_return_the_same_list() {
	let engine = start_engine().await;

	seed_catalog(&engine);

	let service = service_for(&engine);
	let first = service.find_products(young_tech_buyer()).await.expect("find_products failed");
	let second = service.find_products(young_tech_buyer()).await.expect("find_products failed");

	assert_eq!(ids(&first.products), ids(&second.products));
	assert_ne!(first.request_id, second.request_id);
}

#[tokio::test]
async fn empty_store_is_not_an_error() {
	let engine = start_engine().await;
	let service = service_for(&engine);
	let response = service.find_products(young_tech_buyer()).await.expect("find_products failed");

	assert!(response.products.is_empty());
	assert_eq!(engine.search_bodies(RECOMMENDATION_INDEX).len(), 2);
	assert!(engine.search_bodies(CATALOG_INDEX).is_empty());
}

#[tokio::test]
async fn unreachable_engine_yields_an_empty_list() {
	let url = cover_testkit::closed_port_url().expect("Failed to reserve a closed port.");
	let service = MatchingService::new(cover_testkit::test_config(&url))
		.expect("Failed to build matching service.");
	let response = service.find_products(young_tech_buyer()).await.expect("find_products failed");

	assert!(response.products.is_empty());
	assert!(!service.health_check().await);
}

#[tokio::test]
async fn negative_budget_is_rejected() {
	let engine = start_engine().await;
	let service = service_for(&engine);
	let mut req = young_tech_buyer();

	req.characteristics.insurance_budget = Some(-100.0);

	let err = service.find_products(req).await.expect_err("Expected InvalidRequest.");

	assert!(matches!(err, Error::InvalidRequest { .. }), "Unexpected error: {err:?}");
	assert!(engine.requests().is_empty());
}

#[tokio::test]
async fn rejected_ranking_query_is_not_retried() {
	let engine = start_engine().await;

	seed_catalog(&engine);
	engine.fail_next_searches(1);

	let service = service_for(&engine);
	let response = service.find_products(young_tech_buyer()).await.expect("find_products failed");

	assert!(response.products.is_empty());
	assert_eq!(engine.search_bodies(RECOMMENDATION_INDEX).len(), 1);
}

#[tokio::test]
async fn failed_probe_reconnects_and_the_request_still_succeeds() {
	let engine = start_engine().await;

	seed_catalog(&engine);
	engine.fail_next_probes(1);

	let service = service_for(&engine);
	let response = service.find_products(young_tech_buyer()).await.expect("find_products failed");

	assert_eq!(response.products.len(), 5);
}

#[tokio::test]
async fn concurrent_requests_share_one_service() {
	let engine = start_engine().await;

	seed_catalog(&engine);

	let service = Arc::new(service_for(&engine));
	let mut tasks = Vec::new();

	for _ in 0..16 {
		let service = service.clone();

		tasks.push(tokio::spawn(async move { service.find_products(young_tech_buyer()).await }));
	}

	let mut lists = Vec::new();

	for task in tasks {
		let response = task.await.expect("Task panicked.").expect("find_products failed");

		lists.push(ids(&response.products));
	}

	assert!(lists.iter().all(|list| list == &lists[0]));
	assert_eq!(lists[0].len(), 5);
}

#[tokio::test]
async fn cancelled_requests_leave_the_service_usable() {
	let engine = start_engine().await;

	seed_catalog(&engine);

	let service = Arc::new(service_for(&engine));
	let mut tasks = Vec::new();

	for _ in 0..20 {
		let service = service.clone();

		tasks.push(tokio::spawn(async move { service.find_products(young_tech_buyer()).await }));
	}

	tokio::time::sleep(Duration::from_micros(200)).await;

	for task in &tasks {
		task.abort();
	}
	for task in tasks {
		let _ = task.await;
	}

	let response = service.find_products(young_tech_buyer()).await.expect("find_products failed");

	assert_eq!(ids(&response.products).len(), 5);
	assert!(service.health_check().await);
}

#[tokio::test]
async fn close_is_idempotent_and_later_requests_degrade_to_empty() {
	let engine = start_engine().await;

	seed_catalog(&engine);

	let service = service_for(&engine);

	service.close();
	service.close();

	let response = service.find_products(young_tech_buyer()).await.expect("find_products failed");

	assert!(response.products.is_empty());
	assert!(engine.requests().is_empty());
}

#[tokio::test]
async fn health_reports_cluster_state() {
	let engine = start_engine().await;
	let service = service_for(&engine);

	assert!(service.health_check().await);

	engine.set_health(None);

	assert!(!service.health_check().await);
}
