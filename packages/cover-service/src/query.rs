//! Turns resolved buyer characteristics into search request bodies.

use serde_json::{Value, json};

use cover_domain::{
	Gender, ResolvedCharacteristics, ScoringParams, ScoringSpec, UserSegment, fields,
};

/// Eligibility constraints. A product failing any of them is never returned by the primary
/// query.
#[derive(Clone, Debug, PartialEq)]
pub enum HardFilter {
	/// `min_age <= age <= max_age`.
	AgeWithin(u32),
	/// The product accepts this gender or is unrestricted.
	GenderAccepted(Gender),
	/// None of the listed occupation categories is excluded by the product.
	OccupationsNotExcluded(&'static [&'static str]),
	/// The product is sold without regional restriction.
	Nationwide,
}
impl HardFilter {
	fn clauses(&self) -> Vec<Value> {
		match self {
			Self::AgeWithin(age) => vec![
				json!({ "range": { (fields::MIN_AGE): { "lte": age } } }),
				json!({ "range": { (fields::MAX_AGE): { "gte": age } } }),
			],
			Self::GenderAccepted(gender) => vec![json!({ "terms": {
				(fields::GENDER_REQUIREMENT): [gender.index_term(), fields::UNRESTRICTED]
			}})],
			Self::OccupationsNotExcluded(categories) => vec![json!({ "bool": {
				"must_not": [{ "terms": { (fields::EXCLUDED_OCCUPATIONS): categories } }]
			}})],
			Self::Nationwide => vec![json!({ "bool": {
				"should": [
					{ "term": { (fields::REGIONS): fields::UNRESTRICTED_REGION } },
					{ "match": {
						(fields::REGIONS): { "query": fields::NATIONWIDE, "fuzziness": "AUTO" }
					}}
				],
				"minimum_should_match": 1
			}})],
		}
	}
}

/// A preference that raises base relevance without affecting eligibility.
#[derive(Clone, Debug, PartialEq)]
pub struct SoftBoost {
	pub condition: BoostCondition,
	pub boost: f64,
}
impl SoftBoost {
	fn new(condition: BoostCondition, boost: f64) -> Self {
		Self { condition, boost }
	}

	fn clause(&self) -> Value {
		let boost = self.boost;

		match &self.condition {
			BoostCondition::ServicesAny(services) =>
				json!({ "terms": { (fields::VALUE_ADDED_SERVICES): services, "boost": boost } }),
			BoostCondition::IssuerAny(issuers) =>
				json!({ "terms": { (fields::COMPANY): issuers, "boost": boost } }),
			BoostCondition::RenewalYearsAtLeast(years) => json!({ "range": {
				(fields::GUARANTEED_RENEWAL_YEARS): { "gte": years, "boost": boost }
			}}),
			BoostCondition::GeneralMedicalAtLeast(amount) => json!({ "range": {
				(fields::GENERAL_MEDICAL_AMOUNT): { "gte": amount, "boost": boost }
			}}),
			BoostCondition::VipMedicalCovered =>
				json!({ "exists": { "field": fields::VIP_MEDICAL, "boost": boost } }),
			BoostCondition::RenewalWithoutUnderwriting => json!({ "term": {
				(fields::RENEWAL_UNDERWRITING_REQUIRED): { "value": false, "boost": boost }
			}}),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum BoostCondition {
	ServicesAny(&'static [&'static str]),
	IssuerAny(&'static [&'static str]),
	RenewalYearsAtLeast(u32),
	GeneralMedicalAtLeast(u64),
	VipMedicalCovered,
	RenewalWithoutUnderwriting,
}

/// Everything the ranking and fallback requests are built from.
#[derive(Clone, Debug)]
pub struct QueryPlan {
	pub hard_filters: Vec<HardFilter>,
	pub soft_boosts: Vec<SoftBoost>,
	pub params: ScoringParams,
}
impl QueryPlan {
	pub fn build(buyer: &ResolvedCharacteristics) -> Self {
		Self {
			hard_filters: hard_filters(buyer),
			soft_boosts: soft_boosts(buyer),
			params: buyer.scoring_params(),
		}
	}

	/// Filtered, boosted and script-scored request returning product ids only.
	pub fn ranking_body(&self, spec: &ScoringSpec, size: usize) -> Value {
		let filter = self.hard_filters.iter().flat_map(HardFilter::clauses).collect::<Vec<_>>();
		let should = self.soft_boosts.iter().map(SoftBoost::clause).collect::<Vec<_>>();

		self.scored_body(json!({ "bool": { "filter": filter, "should": should } }), spec, size)
	}

	/// Same scoring as [`QueryPlan::ranking_body`] but over every indexed product.
	pub fn fallback_body(&self, spec: &ScoringSpec, size: usize) -> Value {
		self.scored_body(json!({ "match_all": {} }), spec, size)
	}

	fn scored_body(&self, query: Value, spec: &ScoringSpec, size: usize) -> Value {
		json!({
			"size": size,
			"_source": [fields::PRODUCT_ID],
			"track_scores": true,
			"query": { "script_score": {
				"query": query,
				"script": { "source": spec.script_source(), "params": self.params },
			}},
			"sort": [
				{ "_score": { "order": "desc" } },
				{ (fields::COST_PERFORMANCE_SCORE): { "order": "desc", "missing": "_last" } },
			],
		})
	}
}

/// Exact-id lookup against the catalog index, sized to the number of ids.
pub fn catalog_body(product_ids: &[String]) -> Value {
	json!({
		"size": product_ids.len(),
		"query": { "terms": { (fields::PRODUCT_ID): product_ids } },
	})
}

fn hard_filters(buyer: &ResolvedCharacteristics) -> Vec<HardFilter> {
	let mut filters = Vec::new();

	if let Some(age) = buyer.age {
		filters.push(HardFilter::AgeWithin(age));
	}
	if let Some(gender) = buyer.gender {
		filters.push(HardFilter::GenderAccepted(gender));
	}

	filters.push(HardFilter::OccupationsNotExcluded(&fields::HIGH_RISK_OCCUPATIONS));
	filters.push(HardFilter::Nationwide);

	filters
}

fn soft_boosts(buyer: &ResolvedCharacteristics) -> Vec<SoftBoost> {
	let mut boosts = match buyer.segment {
		UserSegment::TechYoung => vec![
			SoftBoost::new(BoostCondition::ServicesAny(&fields::TECH_YOUNG_SERVICES), 2.0),
			SoftBoost::new(BoostCondition::IssuerAny(&fields::TECH_YOUNG_ISSUERS), 1.5),
			SoftBoost::new(BoostCondition::RenewalYearsAtLeast(15), 2.0),
		],
		UserSegment::FamilyOriented => vec![
			SoftBoost::new(BoostCondition::ServicesAny(&fields::FAMILY_SERVICES), 2.0),
			SoftBoost::new(BoostCondition::GeneralMedicalAtLeast(3_000_000), 1.5),
		],
		UserSegment::HighIncome => vec![
			SoftBoost::new(BoostCondition::VipMedicalCovered, 2.0),
			SoftBoost::new(BoostCondition::IssuerAny(&fields::HIGH_INCOME_ISSUERS), 1.5),
		],
		UserSegment::YoungProfessional | UserSegment::Unknown => Vec::new(),
	};

	if buyer.is_young() {
		boosts.push(SoftBoost::new(BoostCondition::RenewalYearsAtLeast(15), 1.5));
		boosts.push(SoftBoost::new(BoostCondition::RenewalWithoutUnderwriting, 1.0));
	}

	boosts
}
