use std::cmp::Ordering;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A record of the recommendation index. Only the fields that feed eligibility and scoring are
/// modelled; everything is optional because the index is populated by an external pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingCandidate {
	pub product_id: String,
	#[serde(default)]
	pub age_range: AgeRange,
	#[serde(default)]
	pub gender_requirement: Option<String>,
	#[serde(default, deserialize_with = "one_or_many")]
	pub excluded_occupations: Vec<String>,
	#[serde(default, deserialize_with = "one_or_many")]
	pub regions: Vec<String>,
	#[serde(default, deserialize_with = "one_or_many")]
	pub value_added_services: Vec<String>,
	#[serde(default)]
	pub company: Option<String>,
	#[serde(default)]
	pub renewal: Renewal,
	#[serde(default)]
	pub coverage: Coverage,
	#[serde(default)]
	pub premium: Premium,
	#[serde(default)]
	pub cost_performance_score: Option<f64>,
	#[serde(default)]
	pub overall_rating: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgeRange {
	pub min_age: Option<u32>,
	pub max_age: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Renewal {
	pub guaranteed_renewal_years: Option<f64>,
	pub renewal_underwriting_required: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
	#[serde(default)]
	pub general_medical: GeneralMedical,
	#[serde(default)]
	pub critical_illness: CriticalIllness,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub vip_medical: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralMedical {
	pub amount: Option<f64>,
	pub deductible: Option<f64>,
	pub reimbursement_rate_with_social: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticalIllness {
	pub amount: Option<f64>,
}

/// Annual premium quotes by entry-age bracket.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Premium {
	pub age_20: Option<f64>,
	pub age_25: Option<f64>,
	pub age_30: Option<f64>,
}
impl Premium {
	/// Quote for the bracket containing `age`. Ages outside 20-34 have no bracket.
	pub fn for_age(&self, age: u32) -> Option<f64> {
		match age {
			20..=24 => self.age_20,
			25..=29 => self.age_25,
			30..=34 => self.age_30,
			_ => None,
		}
	}
}

/// A record of the catalog index: the product id plus whatever descriptive fields the catalog
/// carries, passed through untouched for presentation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetailedProduct {
	pub product_id: String,
	#[serde(flatten)]
	pub fields: Map<String, Value>,
}
impl DetailedProduct {
	pub fn field(&self, name: &str) -> Option<&Value> {
		self.fields.get(name)
	}
}

/// One ranked hit of the recommendation index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
	pub product_id: String,
	pub score: f64,
	#[serde(default)]
	pub cost_performance: Option<f64>,
}
impl ScoredResult {
	/// Final score descending, then cost-performance descending. Products without a
	/// cost-performance score sort after those with one.
	pub fn ranking_order(&self, other: &Self) -> Ordering {
		cmp_f64_desc(self.score, other.score)
			.then_with(|| match (self.cost_performance, other.cost_performance) {
				(Some(lhs), Some(rhs)) => cmp_f64_desc(lhs, rhs),
				(Some(_), None) => Ordering::Less,
				(None, Some(_)) => Ordering::Greater,
				(None, None) => Ordering::Equal,
			})
			.then_with(|| self.product_id.cmp(&other.product_id))
	}
}

pub fn sort_ranked(results: &mut [ScoredResult]) {
	results.sort_by(ScoredResult::ranking_order);
}

fn cmp_f64_desc(lhs: f64, rhs: f64) -> Ordering {
	rhs.partial_cmp(&lhs).unwrap_or(Ordering::Equal)
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum OneOrMany {
		One(String),
		Many(Vec<String>),
		Null,
	}

	Ok(match OneOrMany::deserialize(deserializer)? {
		OneOrMany::One(value) => vec![value],
		OneOrMany::Many(values) => values,
		OneOrMany::Null => Vec::new(),
	})
}
