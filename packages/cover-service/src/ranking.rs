use serde::Deserialize;
use serde_json::Value;

use cover_domain::ScoredResult;
use cover_search::SearchResponse;

use crate::{MatchingService, QueryPlan, Stage};

#[derive(Debug, Deserialize)]
struct ProductIdSource {
	product_id: String,
}

impl MatchingService {
	/// Ranks eligible products for `plan`, best first.
	///
	/// When the filtered query succeeds but nothing passes the hard filters, a small unfiltered
	/// query with the same scoring runs instead. Failures of either query yield an empty list.
	pub async fn rank_candidates(&self, plan: &QueryPlan, limit: usize) -> Vec<ScoredResult> {
		let index = &self.cfg.search.recommendation_index;
		let body = plan.ranking_body(&self.spec, limit);
		let Some(response) = self.search_with_retry(Stage::Ranking, index, &body).await else {
			return Vec::new();
		};
		let ranked = decode_ranked(Stage::Ranking, response);

		if !ranked.is_empty() {
			tracing::info!(candidates = ranked.len(), "Ranked eligible products.");

			return ranked;
		}

		let size = self.cfg.matching.fallback_size as usize;

		tracing::info!(size, "No product passed the hard filters. Running the fallback query.");

		let body = plan.fallback_body(&self.spec, size);
		let Some(response) = self.search_with_retry(Stage::Fallback, index, &body).await else {
			return Vec::new();
		};
		let ranked = decode_ranked(Stage::Fallback, response);

		tracing::info!(candidates = ranked.len(), "Fallback ranking finished.");

		ranked
	}
}

fn decode_ranked(stage: Stage, response: Value) -> Vec<ScoredResult> {
	let hits = match SearchResponse::<Value>::decode(response) {
		Ok(response) => response.into_hits(),
		Err(err) => {
			tracing::error!(stage = stage.as_str(), error = %err, "Unreadable ranking response.");

			return Vec::new();
		},
	};

	hits.into_iter()
		.filter_map(|hit| match hit.decode_source::<ProductIdSource>() {
			Ok(hit) => Some(ScoredResult {
				score: hit.sort_f64(0).or(hit.score).unwrap_or(0.0),
				cost_performance: hit.sort_f64(1),
				product_id: hit.source.product_id,
			}),
			Err(err) => {
				tracing::warn!(stage = stage.as_str(), error = %err, "Skipping unreadable ranking hit.");

				None
			},
		})
		.collect()
}
