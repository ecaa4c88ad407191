use serde::{Deserialize, Serialize};
use time::{Date, macros::format_description};

use crate::{BuyerCharacteristics, Gender, UserSegment, fields};

/// Structured buyer profile as persisted by the conversational front end. Income and budget
/// share the profile's units (income in units of ten thousand).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuyerProfile {
	pub gender: Option<String>,
	/// `YYYY-MM-DD`.
	pub date_of_birth: Option<String>,
	pub marital_status: Option<String>,
	pub industry: Option<String>,
	pub annual_total_income: Option<f64>,
	pub annual_insurance_budget: Option<f64>,
	pub overall_health_status: Option<String>,
	pub has_chronic_disease: Option<String>,
	pub number_of_children: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskPreference {
	Aggressive,
	ModerateAggressive,
	Moderate,
	Conservative,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetSensitivity {
	Low,
	Medium,
	High,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileAnalysis {
	pub characteristics: BuyerCharacteristics,
	pub risk_preference: RiskPreference,
	pub budget_sensitivity: BudgetSensitivity,
}

impl BuyerProfile {
	pub fn analyze(&self, today: Date) -> ProfileAnalysis {
		let age = self.date_of_birth.as_deref().and_then(|raw| age_on(raw, today));
		let characteristics = BuyerCharacteristics {
			age,
			gender: self.gender.as_deref().and_then(Gender::parse),
			industry: self.industry.clone(),
			insurance_budget: self.annual_insurance_budget,
			user_segment: self.segment(age),
		};

		ProfileAnalysis {
			characteristics,
			risk_preference: self.risk_preference(age),
			budget_sensitivity: self.budget_sensitivity(),
		}
	}

	fn segment(&self, age: Option<u32>) -> UserSegment {
		let young_under = |limit: u32| age.map(|age| age < limit).unwrap_or(false);

		if self.industry.as_deref() == Some(fields::INTERNET_INDUSTRY) && young_under(35) {
			UserSegment::TechYoung
		} else if self.annual_total_income.map(|income| income > 50.0).unwrap_or(false) {
			UserSegment::HighIncome
		} else if young_under(30) {
			UserSegment::YoungProfessional
		} else if self.marital_status.as_deref() == Some(fields::MARRIED)
			&& self.number_of_children.unwrap_or(0) > 0
		{
			UserSegment::FamilyOriented
		} else {
			UserSegment::Unknown
		}
	}

	fn risk_preference(&self, age: Option<u32>) -> RiskPreference {
		let chronic = self
			.has_chronic_disease
			.as_deref()
			.map(|value| !value.trim().is_empty() && value != fields::NO_CHRONIC_DISEASE)
			.unwrap_or(false);

		if age.map(|age| age < 30).unwrap_or(false) {
			RiskPreference::Aggressive
		} else if chronic {
			RiskPreference::Conservative
		} else if self.annual_total_income.map(|income| income > 30.0).unwrap_or(false) {
			RiskPreference::ModerateAggressive
		} else {
			RiskPreference::Moderate
		}
	}

	fn budget_sensitivity(&self) -> BudgetSensitivity {
		let (Some(budget), Some(income)) = (self.annual_insurance_budget, self.annual_total_income)
		else {
			return BudgetSensitivity::Medium;
		};

		if budget <= 0.0 || income <= 0.0 {
			return BudgetSensitivity::Medium;
		}

		let ratio = budget / income;

		if ratio > 0.05 {
			BudgetSensitivity::Low
		} else if ratio < 0.02 {
			BudgetSensitivity::High
		} else {
			BudgetSensitivity::Medium
		}
	}
}

/// Whole years between `date_of_birth` and `today`. `None` when the date is unparsable or in
/// the future.
pub fn age_on(date_of_birth: &str, today: Date) -> Option<u32> {
	let birth = Date::parse(date_of_birth.trim(), format_description!("[year]-[month]-[day]")).ok()?;
	let before_birthday =
		(u8::from(today.month()), today.day()) < (u8::from(birth.month()), birth.day());
	let years = today.year() - birth.year() - i32::from(before_birthday);

	u32::try_from(years).ok()
}

#[cfg(test)]
mod tests {
	use time::macros::date;

	use super::*;

	#[test]
	fn age_counts_completed_years() {
		let today = date!(2026 - 06 - 15);

		assert_eq!(age_on("1999-06-15", today), Some(27));
		assert_eq!(age_on("1999-06-16", today), Some(26));
		assert_eq!(age_on("1999-13-01", today), None);
		assert_eq!(age_on("2030-01-01", today), None);
	}

	#[test]
	fn young_internet_worker_is_tech_young() {
		let profile = BuyerProfile {
			gender: Some("女".to_string()),
			date_of_birth: Some("1999-01-01".to_string()),
			industry: Some(fields::INTERNET_INDUSTRY.to_string()),
			annual_total_income: Some(60.0),
			annual_insurance_budget: Some(5_000.0),
			..Default::default()
		};
		let analysis = profile.analyze(date!(2026 - 06 - 15));

		assert_eq!(analysis.characteristics.age, Some(27));
		assert_eq!(analysis.characteristics.gender, Some(Gender::Female));
		assert_eq!(analysis.characteristics.user_segment, UserSegment::TechYoung);
		assert_eq!(analysis.risk_preference, RiskPreference::Aggressive);
	}

	#[test]
	fn married_parent_is_family_oriented() {
		let profile = BuyerProfile {
			date_of_birth: Some("1986-03-01".to_string()),
			marital_status: Some(fields::MARRIED.to_string()),
			number_of_children: Some(2),
			annual_total_income: Some(25.0),
			has_chronic_disease: Some("高血压".to_string()),
			..Default::default()
		};
		let analysis = profile.analyze(date!(2026 - 06 - 15));

		assert_eq!(analysis.characteristics.user_segment, UserSegment::FamilyOriented);
		assert_eq!(analysis.risk_preference, RiskPreference::Conservative);
	}

	#[test]
	fn budget_sensitivity_follows_income_share() {
		let mut profile = BuyerProfile {
			annual_total_income: Some(100_000.0),
			annual_insurance_budget: Some(6_000.0),
			..Default::default()
		};

		assert_eq!(profile.budget_sensitivity(), BudgetSensitivity::Low);

		profile.annual_insurance_budget = Some(1_000.0);

		assert_eq!(profile.budget_sensitivity(), BudgetSensitivity::High);

		profile.annual_insurance_budget = Some(3_000.0);

		assert_eq!(profile.budget_sensitivity(), BudgetSensitivity::Medium);

		profile.annual_total_income = None;

		assert_eq!(profile.budget_sensitivity(), BudgetSensitivity::Medium);
	}

	#[test]
	fn empty_profile_is_unknown_and_moderate() {
		let analysis = BuyerProfile::default().analyze(date!(2026 - 06 - 15));

		assert_eq!(analysis.characteristics.user_segment, UserSegment::Unknown);
		assert_eq!(analysis.risk_preference, RiskPreference::Moderate);
		assert_eq!(analysis.budget_sensitivity, BudgetSensitivity::Medium);
		assert!(analysis.characteristics.insurance_budget.is_none());
	}
}
