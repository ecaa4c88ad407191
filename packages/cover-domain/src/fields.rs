//! Field paths and stored literal terms of the pre-populated product indices.
//!
//! The indices are populated upstream with Chinese vocabulary, so the literal terms below must
//! match the stored values byte for byte.

pub const PRODUCT_ID: &str = "product_id";
pub const MIN_AGE: &str = "age_range.min_age";
pub const MAX_AGE: &str = "age_range.max_age";
pub const GENDER_REQUIREMENT: &str = "gender_requirement";
pub const EXCLUDED_OCCUPATIONS: &str = "excluded_occupations";
pub const REGIONS: &str = "regions";
pub const VALUE_ADDED_SERVICES: &str = "value_added_services";
pub const COMPANY: &str = "company";
pub const GUARANTEED_RENEWAL_YEARS: &str = "renewal.guaranteed_renewal_years";
pub const RENEWAL_UNDERWRITING_REQUIRED: &str = "renewal.renewal_underwriting_required";
pub const GENERAL_MEDICAL_AMOUNT: &str = "coverage.general_medical.amount";
pub const GENERAL_MEDICAL_DEDUCTIBLE: &str = "coverage.general_medical.deductible";
pub const REIMBURSEMENT_RATE_WITH_SOCIAL: &str =
	"coverage.general_medical.reimbursement_rate_with_social";
pub const CRITICAL_ILLNESS_AMOUNT: &str = "coverage.critical_illness.amount";
pub const VIP_MEDICAL: &str = "coverage.vip_medical";
pub const PREMIUM_AGE_20: &str = "premium.age_20";
pub const PREMIUM_AGE_25: &str = "premium.age_25";
pub const PREMIUM_AGE_30: &str = "premium.age_30";
pub const COST_PERFORMANCE_SCORE: &str = "cost_performance_score";
pub const OVERALL_RATING: &str = "overall_rating";

/// Gender requirement and scoring placeholder meaning "no restriction".
pub const UNRESTRICTED: &str = "不限";
/// Industry placeholder used when the buyer's industry is unknown.
pub const OTHER_INDUSTRY: &str = "其他";
pub const MALE: &str = "男";
pub const FEMALE: &str = "女";

/// Occupation categories excluded from every query, whatever the buyer's own occupation.
pub const HIGH_RISK_OCCUPATIONS: [&str; 2] = ["高危职业", "特殊职业"];
pub const UNRESTRICTED_REGION: &str = "不限地区";
pub const NATIONWIDE: &str = "全国";

pub const TECH_YOUNG_SERVICES: [&str; 2] = ["在线问诊", "智能核保"];
pub const TECH_YOUNG_ISSUERS: [&str; 2] = ["众安保险", "蚂蚁保险"];
pub const FAMILY_SERVICES: [&str; 2] = ["就医绿通", "费用垫付"];
pub const HIGH_INCOME_ISSUERS: [&str; 2] = ["太平洋健康险", "平安健康险"];

pub const INTERNET_INDUSTRY: &str = "互联网";
pub const MARRIED: &str = "已婚";
pub const NO_CHRONIC_DISEASE: &str = "无";
