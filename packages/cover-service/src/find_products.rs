use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use cover_domain::{BuyerCharacteristics, DetailedProduct};

use crate::{MatchingService, QueryPlan, Result};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FindProductsRequest {
	pub characteristics: BuyerCharacteristics,
	/// Falls back to `matching.default_limit`.
	#[serde(default)]
	pub limit: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FindProductsResponse {
	pub request_id: Uuid,
	pub products: Vec<DetailedProduct>,
}

impl MatchingService {
	/// Ranks and hydrates products for one buyer.
	///
	/// An empty list is a normal outcome: nothing matched, or the search engine could not be
	/// reached. Only characteristics no query can be built from are an error.
	pub async fn find_products(&self, req: FindProductsRequest) -> Result<FindProductsResponse> {
		let request_id = Uuid::new_v4();
		let span = tracing::info_span!("find_products", %request_id);

		self.find_products_in_span(req, request_id).instrument(span).await
	}

	async fn find_products_in_span(
		&self,
		req: FindProductsRequest,
		request_id: Uuid,
	) -> Result<FindProductsResponse> {
		let buyer = req.characteristics.resolve(self.cfg.matching.default_budget)?;
		let limit = req.limit.unwrap_or(self.cfg.matching.default_limit) as usize;

		if limit == 0 {
			return Ok(FindProductsResponse { request_id, products: Vec::new() });
		}

		let plan = QueryPlan::build(&buyer);
		let ranked = self.rank_candidates(&plan, limit).await;

		if ranked.is_empty() {
			tracing::warn!("No product could be recommended.");

			return Ok(FindProductsResponse { request_id, products: Vec::new() });
		}

		let product_ids = ranked.into_iter().map(|result| result.product_id).collect::<Vec<_>>();
		let products = self.hydrate(&product_ids).await;

		tracing::info!(
			ranked = product_ids.len(),
			returned = products.len(),
			"Product recommendation finished."
		);

		Ok(FindProductsResponse { request_id, products })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		Error,
		test_support::{self, ScriptedBackend},
	};

	#[tokio::test]
	async fn invalid_budget_is_rejected_before_any_search() {
		let backend = ScriptedBackend::with_outcomes(Vec::new());
		let service = test_support::service(backend.clone());
		let req = FindProductsRequest {
			characteristics: BuyerCharacteristics {
				insurance_budget: Some(-1.0),
				..Default::default()
			},
			limit: None,
		};
		let err = service.find_products(req).await.expect_err("Expected InvalidRequest.");

		assert!(matches!(err, Error::InvalidRequest { .. }), "Unexpected error: {err:?}");
		assert!(backend.searches().is_empty());
	}

	#[tokio::test]
	async fn zero_limit_issues_no_search() {
		let backend = ScriptedBackend::with_outcomes(Vec::new());
		let service = test_support::service(backend.clone());
		let req = FindProductsRequest { limit: Some(0), ..Default::default() };
		let response = service.find_products(req).await.expect("find_products failed");

		assert!(response.products.is_empty());
		assert!(backend.searches().is_empty());
	}

	#[tokio::test]
	async fn ranking_then_hydration_in_ranked_order() {
		let backend = ScriptedBackend::with_outcomes([
			Ok(test_support::hits(&["B", "A"])),
			Ok(test_support::records(&["A", "B"])),
		]);
		let service = test_support::service(backend.clone());
		let response = service
			.find_products(FindProductsRequest::default())
			.await
			.expect("find_products failed");
		let order =
			response.products.iter().map(|product| product.product_id.as_str()).collect::<Vec<_>>();
		let searches = backend.searches();

		assert_eq!(order, vec!["B", "A"]);
		assert_eq!(searches[0].1["size"], 10);
		assert_eq!(searches[1].1["query"]["terms"]["product_id"], serde_json::json!(["B", "A"]));
	}

	#[tokio::test]
	async fn empty_ranking_skips_hydration() {
		let backend = ScriptedBackend::with_outcomes([
			Ok(test_support::hits(&[])),
			Ok(test_support::hits(&[])),
		]);
		let service = test_support::service(backend.clone());
		let response = service
			.find_products(FindProductsRequest::default())
			.await
			.expect("find_products failed");

		assert!(response.products.is_empty());
		assert_eq!(backend.searches().len(), 2);
	}
}
