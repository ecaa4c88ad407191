use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result, ScoringParams, fields};

/// Age passed to the scoring script when the buyer's age is unknown.
pub const DEFAULT_SCORING_AGE: u32 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
	#[serde(alias = "男")]
	Male,
	#[serde(alias = "女")]
	Female,
}
impl Gender {
	/// Parses free-form profile values. Anything that is not clearly male or female is treated
	/// as unknown so it never narrows eligibility.
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"male" | "m" | fields::MALE => Some(Self::Male),
			"female" | "f" | fields::FEMALE => Some(Self::Female),
			_ => None,
		}
	}

	/// The term stored in the index `gender_requirement` field.
	pub fn index_term(self) -> &'static str {
		match self {
			Self::Male => fields::MALE,
			Self::Female => fields::FEMALE,
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSegment {
	TechYoung,
	FamilyOriented,
	HighIncome,
	YoungProfessional,
	#[default]
	#[serde(other)]
	Unknown,
}
impl UserSegment {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::TechYoung => "tech_young",
			Self::FamilyOriented => "family_oriented",
			Self::HighIncome => "high_income",
			Self::YoungProfessional => "young_professional",
			Self::Unknown => "unknown",
		}
	}
}

/// Buyer characteristics as produced by the upstream analysis step.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BuyerCharacteristics {
	#[serde(default)]
	pub age: Option<u32>,
	/// Values other than male or female decode as unknown.
	#[serde(default, deserialize_with = "lenient_gender")]
	pub gender: Option<Gender>,
	#[serde(default)]
	pub industry: Option<String>,
	#[serde(default, alias = "budget")]
	pub insurance_budget: Option<f64>,
	#[serde(default, alias = "user_type")]
	pub user_segment: UserSegment,
}
impl BuyerCharacteristics {
	/// Applies the fallback budget and rejects values no query can be built from.
	pub fn resolve(&self, default_budget: f64) -> Result<ResolvedCharacteristics> {
		let budget = self.insurance_budget.unwrap_or(default_budget);

		if !budget.is_finite() {
			return Err(Error::InvalidCharacteristics {
				message: "insurance_budget must be a finite number.".to_string(),
			});
		}
		if budget <= 0.0 {
			return Err(Error::InvalidCharacteristics {
				message: format!("insurance_budget must be greater than zero, got {budget}."),
			});
		}

		let industry = self
			.industry
			.as_deref()
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.map(str::to_string);

		Ok(ResolvedCharacteristics {
			age: self.age,
			gender: self.gender,
			industry,
			budget,
			segment: self.user_segment,
		})
	}
}

fn lenient_gender<'de, D>(deserializer: D) -> std::result::Result<Option<Gender>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Option::<String>::deserialize(deserializer)?;

	Ok(raw.as_deref().and_then(Gender::parse))
}

/// Characteristics with defaults applied and the budget validated.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedCharacteristics {
	pub age: Option<u32>,
	pub gender: Option<Gender>,
	pub industry: Option<String>,
	pub budget: f64,
	pub segment: UserSegment,
}
impl ResolvedCharacteristics {
	pub fn is_young(&self) -> bool {
		self.age.map(|age| age < 35).unwrap_or(false)
	}

	pub fn scoring_params(&self) -> ScoringParams {
		ScoringParams {
			user_age: self.age.unwrap_or(DEFAULT_SCORING_AGE),
			user_budget: self.budget,
			user_gender: self
				.gender
				.map(Gender::index_term)
				.unwrap_or(fields::UNRESTRICTED)
				.to_string(),
			user_industry: self
				.industry
				.clone()
				.unwrap_or_else(|| fields::OTHER_INDUSTRY.to_string()),
			user_segment: self.segment.as_str().to_string(),
		}
	}
}
