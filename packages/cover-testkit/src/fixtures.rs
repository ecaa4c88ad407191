use serde_json::{Value, json};

use cover_domain::fields;

/// A recommendation-index document every hard filter admits for buyers aged 18 to 60.
pub fn eligible_candidate(product_id: &str) -> Value {
	json!({
		"product_id": product_id,
		"age_range": { "min_age": 18, "max_age": 60 },
		"gender_requirement": fields::UNRESTRICTED,
		"excluded_occupations": [],
		"regions": [fields::NATIONWIDE],
		"value_added_services": [],
		"company": "测试保险",
		"renewal": { "guaranteed_renewal_years": 5, "renewal_underwriting_required": true },
		"coverage": {
			"general_medical": {
				"amount": 2_000_000,
				"deductible": 10_000,
				"reimbursement_rate_with_social": 0.6
			},
			"critical_illness": { "amount": 100_000 }
		},
		"premium": { "age_20": 300, "age_25": 450, "age_30": 600 },
		"cost_performance_score": 60,
		"overall_rating": 70
	})
}

/// A catalog-index document for `product_id`.
pub fn catalog_product(product_id: &str) -> Value {
	json!({
		"product_id": product_id,
		"product_name": format!("Product {product_id}"),
		"product_type": "medical",
		"claims": { "process": "online" },
		"underwriting": { "health_notice": "standard" }
	})
}

/// Sets `value` at the dotted `path` inside `doc`, creating intermediate objects.
pub fn with_field(mut doc: Value, path: &str, value: Value) -> Value {
	let mut target = &mut doc;
	let mut segments = path.split('.').peekable();

	while let Some(segment) = segments.next() {
		if !target.is_object() {
			*target = json!({});
		}

		let Some(object) = target.as_object_mut() else {
			break;
		};

		if segments.peek().is_none() {
			object.insert(segment.to_string(), value);

			break;
		}

		target = object.entry(segment.to_string()).or_insert_with(|| json!({}));
	}

	doc
}
