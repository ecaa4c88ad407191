//! Four-layer matching score.
//!
//! The layer functions are the reference definition of the score. [`ScoringSpec::script_source`]
//! renders the same formula as a Painless expression so the search engine can apply it
//! server-side; both read the constants from one [`ScoringSpec`] value.

use serde::{Deserialize, Serialize};

use crate::{RankingCandidate, fields};

/// Named parameters handed to the server-side scoring script.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringParams {
	pub user_age: u32,
	pub user_budget: f64,
	pub user_gender: String,
	pub user_industry: String,
	pub user_segment: String,
}

/// Demand-coverage layer weights. Expected coverage amounts scale with the budget.
#[derive(Clone, Debug, PartialEq)]
pub struct CoverageWeights {
	pub general_budget_multiple: f64,
	pub general_weight: f64,
	pub critical_budget_multiple: f64,
	pub critical_weight: f64,
	pub deductible_budget_multiple: f64,
	pub deductible_weight: f64,
	pub reimbursement_weight: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PreferenceWeights {
	pub renewal_years_cap: f64,
	pub renewal_weight: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValueWeights {
	pub budget_weight: f64,
	/// Over-budget ratio up to which the mild penalty applies.
	pub mild_over_ratio: f64,
	pub mild_penalty: f64,
	pub severe_base: f64,
	pub severe_penalty: f64,
	pub cost_performance_weight: f64,
	pub rating_weight: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoringSpec {
	pub coverage: CoverageWeights,
	pub preference: PreferenceWeights,
	pub value: ValueWeights,
}
impl ScoringSpec {
	/// Layer two: how well the coverage amounts, deductible and reimbursement rate meet the
	/// demand implied by the budget. At most 100.
	pub fn coverage_layer(&self, candidate: &RankingCandidate, budget: f64) -> f64 {
		let weights = &self.coverage;
		let general = &candidate.coverage.general_medical;
		let mut score = 0.0;

		if let Some(amount) = general.amount {
			score += (amount / (budget * weights.general_budget_multiple)).min(1.0)
				* weights.general_weight;
		}
		if let Some(amount) = candidate.coverage.critical_illness.amount {
			score += (amount / (budget * weights.critical_budget_multiple)).min(1.0)
				* weights.critical_weight;
		}
		if let Some(deductible) = general.deductible {
			let acceptable = budget * weights.deductible_budget_multiple;

			score += ((acceptable - deductible) / acceptable).max(0.0) * weights.deductible_weight;
		}
		if let Some(rate) = general.reimbursement_rate_with_social {
			score += rate * weights.reimbursement_weight;
		}

		score
	}

	/// Layer three: guaranteed renewal length. At most 50.
	pub fn preference_layer(&self, candidate: &RankingCandidate) -> f64 {
		let weights = &self.preference;

		candidate
			.renewal
			.guaranteed_renewal_years
			.map(|years| (years / weights.renewal_years_cap).min(1.0) * weights.renewal_weight)
			.unwrap_or(0.0)
	}

	/// Layer four: premium against budget, plus the precomputed cost-performance and rating.
	pub fn value_layer(&self, candidate: &RankingCandidate, age: u32, budget: f64) -> f64 {
		let weights = &self.value;
		let mut score = candidate
			.premium
			.for_age(age)
			.filter(|premium| *premium > 0.0)
			.map(|premium| self.budget_fit(premium, budget))
			.unwrap_or(0.0);

		if let Some(cost_performance) = candidate.cost_performance_score {
			score += cost_performance * weights.cost_performance_weight;
		}
		if let Some(rating) = candidate.overall_rating {
			score += rating * weights.rating_weight;
		}

		score
	}

	/// Premium-based part of the value layer. Never negative.
	pub fn budget_fit(&self, premium: f64, budget: f64) -> f64 {
		let weights = &self.value;

		if premium <= budget {
			return (budget - premium) / budget * weights.budget_weight;
		}

		let over_ratio = (premium - budget) / budget;

		if over_ratio <= weights.mild_over_ratio {
			(weights.budget_weight - over_ratio * weights.mild_penalty).max(0.0)
		} else {
			(weights.severe_base - (over_ratio - weights.mild_over_ratio) * weights.severe_penalty)
				.max(0.0)
		}
	}

	/// Base relevance plus the three computed layers, clamped at zero.
	pub fn final_score(
		&self,
		base_relevance: f64,
		candidate: &RankingCandidate,
		params: &ScoringParams,
	) -> f64 {
		let total = base_relevance
			+ self.coverage_layer(candidate, params.user_budget)
			+ self.preference_layer(candidate)
			+ self.value_layer(candidate, params.user_age, params.user_budget);

		if total.is_nan() { 0.0 } else { total.max(0.0) }
	}

	/// Painless source of [`Self::final_score`] for a `script_score` query.
	pub fn script_source(&self) -> String {
		let c = &self.coverage;
		let p = &self.preference;
		let v = &self.value;

		format!(
			"\
double total_score = _score;
double coverage_score = 0;
double budget = params.userBudget;
if (doc['{general_amount}'].size() > 0) {{
	coverage_score += Math.min(doc['{general_amount}'].value / (budget * {general_multiple}), 1.0) * {general_weight};
}}
if (doc['{critical_amount}'].size() > 0) {{
	coverage_score += Math.min(doc['{critical_amount}'].value / (budget * {critical_multiple}), 1.0) * {critical_weight};
}}
if (doc['{deductible}'].size() > 0) {{
	double acceptable = budget * {deductible_multiple};
	coverage_score += Math.max(0, (acceptable - doc['{deductible}'].value) / acceptable) * {deductible_weight};
}}
if (doc['{reimbursement}'].size() > 0) {{
	coverage_score += doc['{reimbursement}'].value * {reimbursement_weight};
}}
double preference_score = 0;
if (doc['{renewal_years}'].size() > 0) {{
	preference_score += Math.min(doc['{renewal_years}'].value / {renewal_cap}, 1.0) * {renewal_weight};
}}
double value_score = 0;
double premium = 0;
int age = params.userAge;
if (age >= 20 && age < 25 && doc['{premium_20}'].size() > 0) {{
	premium = doc['{premium_20}'].value;
}} else if (age >= 25 && age < 30 && doc['{premium_25}'].size() > 0) {{
	premium = doc['{premium_25}'].value;
}} else if (age >= 30 && age < 35 && doc['{premium_30}'].size() > 0) {{
	premium = doc['{premium_30}'].value;
}}
if (premium > 0) {{
	if (premium <= budget) {{
		value_score += (budget - premium) / budget * {budget_weight};
	}} else {{
		double over_ratio = (premium - budget) / budget;
		if (over_ratio <= {mild_ratio}) {{
			value_score += Math.max(0, {budget_weight} - over_ratio * {mild_penalty});
		}} else {{
			value_score += Math.max(0, {severe_base} - (over_ratio - {mild_ratio}) * {severe_penalty});
		}}
	}}
}}
if (doc['{cost_performance}'].size() > 0) {{
	value_score += doc['{cost_performance}'].value * {cost_performance_weight};
}}
if (doc['{rating}'].size() > 0) {{
	value_score += doc['{rating}'].value * {rating_weight};
}}
return Math.max(0.0, total_score + coverage_score + preference_score + value_score);",
			general_amount = fields::GENERAL_MEDICAL_AMOUNT,
			general_multiple = lit(c.general_budget_multiple),
			general_weight = lit(c.general_weight),
			critical_amount = fields::CRITICAL_ILLNESS_AMOUNT,
			critical_multiple = lit(c.critical_budget_multiple),
			critical_weight = lit(c.critical_weight),
			deductible = fields::GENERAL_MEDICAL_DEDUCTIBLE,
			deductible_multiple = lit(c.deductible_budget_multiple),
			deductible_weight = lit(c.deductible_weight),
			reimbursement = fields::REIMBURSEMENT_RATE_WITH_SOCIAL,
			reimbursement_weight = lit(c.reimbursement_weight),
			renewal_years = fields::GUARANTEED_RENEWAL_YEARS,
			renewal_cap = lit(p.renewal_years_cap),
			renewal_weight = lit(p.renewal_weight),
			premium_20 = fields::PREMIUM_AGE_20,
			premium_25 = fields::PREMIUM_AGE_25,
			premium_30 = fields::PREMIUM_AGE_30,
			budget_weight = lit(v.budget_weight),
			mild_ratio = lit(v.mild_over_ratio),
			mild_penalty = lit(v.mild_penalty),
			severe_base = lit(v.severe_base),
			severe_penalty = lit(v.severe_penalty),
			cost_performance = fields::COST_PERFORMANCE_SCORE,
			cost_performance_weight = lit(v.cost_performance_weight),
			rating = fields::OVERALL_RATING,
			rating_weight = lit(v.rating_weight),
		)
	}
}
impl Default for ScoringSpec {
	fn default() -> Self {
		Self {
			coverage: CoverageWeights {
				general_budget_multiple: 600.0,
				general_weight: 30.0,
				critical_budget_multiple: 800.0,
				critical_weight: 25.0,
				deductible_budget_multiple: 2.0,
				deductible_weight: 20.0,
				reimbursement_weight: 25.0,
			},
			preference: PreferenceWeights { renewal_years_cap: 20.0, renewal_weight: 50.0 },
			value: ValueWeights {
				budget_weight: 35.0,
				mild_over_ratio: 0.2,
				mild_penalty: 50.0,
				severe_base: 15.0,
				severe_penalty: 30.0,
				cost_performance_weight: 0.4,
				rating_weight: 0.3,
			},
		}
	}
}

// Debug formatting keeps the decimal point, so Painless always sees a double literal.
fn lit(value: f64) -> String {
	format!("{value:?}")
}
