pub mod characteristics;
pub mod fields;
pub mod product;
pub mod profile;
pub mod scoring;

mod error;

pub use characteristics::{BuyerCharacteristics, Gender, ResolvedCharacteristics, UserSegment};
pub use error::{Error, Result};
pub use product::{DetailedProduct, RankingCandidate, ScoredResult};
pub use profile::{BudgetSensitivity, BuyerProfile, ProfileAnalysis, RiskPreference};
pub use scoring::{ScoringParams, ScoringSpec};
