use std::collections::HashMap;

use serde_json::Value;

use cover_domain::DetailedProduct;
use cover_search::SearchResponse;

use crate::{MatchingService, Stage, query};

impl MatchingService {
	/// Fetches full records for `product_ids` from the catalog index, in the given order.
	///
	/// Ids without a catalog record are dropped. A failed lookup yields an empty list.
	pub async fn hydrate(&self, product_ids: &[String]) -> Vec<DetailedProduct> {
		if product_ids.is_empty() {
			return Vec::new();
		}

		let index = &self.cfg.search.catalog_index;
		let body = query::catalog_body(product_ids);
		let Some(response) = self.search_with_retry(Stage::Hydration, index, &body).await else {
			return Vec::new();
		};
		let hits = match SearchResponse::<Value>::decode(response) {
			Ok(response) => response.into_hits(),
			Err(err) => {
				tracing::error!(error = %err, "Unreadable catalog response.");

				return Vec::new();
			},
		};
		let mut by_id = hits
			.into_iter()
			.filter_map(|hit| match hit.decode_source::<DetailedProduct>() {
				Ok(hit) => Some((hit.source.product_id.clone(), hit.source)),
				Err(err) => {
					tracing::warn!(error = %err, "Skipping unreadable catalog record.");

					None
				},
			})
			.collect::<HashMap<_, _>>();
		let mut products = Vec::with_capacity(product_ids.len());

		for product_id in product_ids {
			match by_id.remove(product_id) {
				Some(product) => products.push(product),
				None => {
					tracing::warn!(product_id = %product_id, "Ranked product has no catalog record.");
				},
			}
		}

		products
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{self, ScriptedBackend};

	fn ids(raw: &[&str]) -> Vec<String> {
		raw.iter().map(|id| id.to_string()).collect()
	}

	#[tokio::test]
	async fn records_follow_ranking_order_and_misses_are_dropped() {
		let backend = ScriptedBackend::with_outcomes([Ok(test_support::records(&["C", "A"]))]);
		let service = test_support::service(backend.clone());
		let products = service.hydrate(&ids(&["A", "B", "C"])).await;
		let order = products.iter().map(|product| product.product_id.as_str()).collect::<Vec<_>>();

		assert_eq!(order, vec!["A", "C"]);
		assert_eq!(
			products[0].field("product_name"),
			Some(&serde_json::Value::from("Product A"))
		);

		let searches = backend.searches();

		assert_eq!(searches.len(), 1);
		assert_eq!(searches[0].0, "insurance_total_fields");
		assert_eq!(searches[0].1["size"], 3);
	}

	#[tokio::test]
	async fn unreadable_records_do_not_discard_the_rest() {
		let mut response = test_support::records(&["A", "B"]);

		response["hits"]["hits"][0]["_source"]["product_id"] = serde_json::json!(7);

		let backend = ScriptedBackend::with_outcomes([Ok(response)]);
		let service = test_support::service(backend.clone());
		let products = service.hydrate(&ids(&["A", "B"])).await;

		assert_eq!(products.len(), 1);
		assert_eq!(products[0].product_id, "B");
	}

	#[tokio::test]
	async fn no_ids_means_no_lookup() {
		let backend = ScriptedBackend::with_outcomes(Vec::new());
		let service = test_support::service(backend.clone());

		assert!(service.hydrate(&[]).await.is_empty());
		assert!(backend.searches().is_empty());
	}

	#[tokio::test]
	async fn transport_failure_is_retried_once() {
		let backend = ScriptedBackend::with_outcomes([
			Err(test_support::connection_refused().await),
			Ok(test_support::records(&["A"])),
		]);
		let service = test_support::service(backend.clone());
		let products = service.hydrate(&ids(&["A"])).await;

		assert_eq!(products.len(), 1);
		assert_eq!(backend.reconnects(), 1);
	}

	#[tokio::test]
	async fn rejected_lookup_yields_nothing() {
		let backend = ScriptedBackend::with_outcomes([Err(test_support::rejected())]);
		let service = test_support::service(backend.clone());

		assert!(service.hydrate(&ids(&["A"])).await.is_empty());
		assert_eq!(backend.reconnects(), 0);
	}
}
