use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::Result;

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
pub struct SearchResponse<T> {
	pub hits: Hits<T>,
}
impl<T> SearchResponse<T>
where
	T: DeserializeOwned,
{
	pub fn decode(value: Value) -> Result<Self> {
		Ok(serde_json::from_value(value)?)
	}

	pub fn into_hits(self) -> Vec<Hit<T>> {
		self.hits.hits
	}
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
pub struct Hits<T> {
	#[serde(default = "Vec::new")]
	pub hits: Vec<Hit<T>>,
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
pub struct Hit<T> {
	#[serde(rename = "_score", default)]
	pub score: Option<f64>,
	#[serde(rename = "_source")]
	pub source: T,
	/// Sort key values, in the order of the request's `sort` clause.
	#[serde(default)]
	pub sort: Vec<Value>,
}
impl<T> Hit<T> {
	pub fn sort_f64(&self, position: usize) -> Option<f64> {
		self.sort.get(position).and_then(Value::as_f64)
	}
}
impl Hit<Value> {
	/// Decodes `_source` as `T`, so one malformed document can be skipped without losing the
	/// rest of the page.
	pub fn decode_source<T>(self) -> Result<Hit<T>>
	where
		T: DeserializeOwned,
	{
		let Self { score, source, sort } = self;

		Ok(Hit { score, source: serde_json::from_value(source)?, sort })
	}
}

#[derive(Debug, Deserialize)]
pub struct ClusterHealth {
	#[serde(default = "unknown_status")]
	pub status: String,
	#[serde(default)]
	pub cluster_name: Option<String>,
}

fn unknown_status() -> String {
	"unknown".to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Deserialize)]
	struct IdOnly {
		product_id: String,
	}

	#[test]
	fn decodes_hits_in_response_order() {
		let json = serde_json::json!({
			"took": 3,
			"hits": {
				"total": { "value": 2, "relation": "eq" },
				"hits": [
					{ "_id": "x", "_score": null, "_source": { "product_id": "B" }, "sort": [91.5, 70] },
					{ "_id": "y", "_score": 12.0, "_source": { "product_id": "A" } }
				]
			}
		});
		let hits = SearchResponse::<IdOnly>::decode(json).expect("decode failed").into_hits();

		assert_eq!(hits.len(), 2);
		assert_eq!(hits[0].source.product_id, "B");
		assert_eq!(hits[0].sort_f64(0), Some(91.5));
		assert_eq!(hits[0].sort_f64(1), Some(70.0));
		assert_eq!(hits[1].score, Some(12.0));
		assert!(hits[1].sort.is_empty());
	}

	#[test]
	fn missing_source_field_is_an_invalid_response() {
		let json = serde_json::json!({ "hits": { "hits": [{ "_source": {} }] } });
		let err = SearchResponse::<IdOnly>::decode(json).expect_err("decode must fail");

		assert!(matches!(err, crate::Error::InvalidResponse { .. }));
	}

	#[test]
	fn sources_decode_one_hit_at_a_time() {
		let json = serde_json::json!({ "hits": { "hits": [
			{ "_source": { "product_id": 7 } },
			{ "_source": { "product_id": "A" }, "sort": [1.0] }
		] } });
		let hits = SearchResponse::<Value>::decode(json).expect("decode failed").into_hits();
		let decoded =
			hits.into_iter().map(Hit::<Value>::decode_source::<IdOnly>).collect::<Vec<_>>();

		assert!(matches!(decoded[0], Err(crate::Error::InvalidResponse { .. })));
		assert_eq!(decoded[1].as_ref().map(|hit| hit.source.product_id.as_str()).ok(), Some("A"));
	}

	#[test]
	fn cluster_health_defaults_status() {
		let health: ClusterHealth =
			serde_json::from_value(serde_json::json!({})).expect("decode failed");

		assert_eq!(health.status, "unknown");
		assert!(health.cluster_name.is_none());
	}
}
