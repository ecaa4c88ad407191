//! Evaluates the subset of the search query DSL the matching engine emits against plain JSON
//! documents: `bool`, `match_all`, `range`, `term`, `terms`, `match` and `exists`.

use serde_json::Value;

/// Relevance of `doc` for `query`, or `None` when the document does not match.
///
/// Filter clauses gate without scoring; each matching `should` clause adds its boost.
pub fn relevance(query: &Value, doc: &Value) -> Option<f64> {
	let Some((kind, body)) = single_entry(query) else {
		return Some(1.0);
	};

	match kind {
		"match_all" => Some(boost(body)),
		"bool" => {
			if !bool_gate(body, doc) {
				return None;
			}

			let score = clauses(body, "should")
				.filter(|clause| matches(clause, doc))
				.map(clause_boost)
				.sum::<f64>();

			Some(score)
		},
		_ => matches(query, doc).then(|| clause_boost(query)),
	}
}

/// Whether `clause` holds for `doc`, ignoring scoring.
pub fn matches(clause: &Value, doc: &Value) -> bool {
	let Some((kind, body)) = single_entry(clause) else {
		return true;
	};

	match kind {
		"match_all" => true,
		"bool" => bool_gate(body, doc),
		"range" =>
			field_entry(body).map(|(field, bounds)| in_range(doc, field, bounds)).unwrap_or(false),
		"term" => field_entry(body)
			.map(|(field, spec)| {
				let expected = spec.get("value").unwrap_or(spec);

				field_values(doc, field).iter().any(|value| same_term(value, expected))
			})
			.unwrap_or(false),
		"terms" => field_entry(body)
			.and_then(|(field, terms)| terms.as_array().map(|terms| (field, terms)))
			.map(|(field, terms)| {
				field_values(doc, field)
					.iter()
					.any(|value| terms.iter().any(|term| same_term(value, term)))
			})
			.unwrap_or(false),
		"match" => field_entry(body)
			.map(|(field, spec)| {
				let query = spec.get("query").unwrap_or(spec).as_str().unwrap_or_default();

				field_values(doc, field)
					.iter()
					.filter_map(|value| value.as_str())
					.any(|value| value.contains(query))
			})
			.unwrap_or(false),
		"exists" => body
			.get("field")
			.and_then(Value::as_str)
			.map(|field| !field_values(doc, field).is_empty())
			.unwrap_or(false),
		_ => false,
	}
}

/// Values stored at a dotted `path`, with arrays flattened and nulls dropped.
pub fn field_values<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
	let mut current = vec![doc];

	for segment in path.split('.') {
		current = current
			.into_iter()
			.flat_map(|value| match value {
				Value::Array(items) => items.iter().collect::<Vec<_>>(),
				other => vec![other],
			})
			.filter_map(|value| value.get(segment))
			.collect();
	}

	current
		.into_iter()
		.flat_map(|value| match value {
			Value::Array(items) => items.iter().collect::<Vec<_>>(),
			other => vec![other],
		})
		.filter(|value| !value.is_null())
		.collect()
}

fn bool_gate(body: &Value, doc: &Value) -> bool {
	let required = clauses(body, "must").chain(clauses(body, "filter")).all(|c| matches(c, doc));
	let excluded = clauses(body, "must_not").any(|c| matches(c, doc));
	let has_required = clauses(body, "must").chain(clauses(body, "filter")).next().is_some();
	let mut should = clauses(body, "should").peekable();
	let should_ok = has_required || should.peek().is_none() || should.any(|c| matches(c, doc));

	required && !excluded && should_ok
}

fn clauses<'a>(body: &'a Value, occur: &str) -> impl Iterator<Item = &'a Value> {
	let list: Vec<&Value> = match body.get(occur) {
		Some(Value::Array(items)) => items.iter().collect(),
		Some(single @ Value::Object(_)) => vec![single],
		_ => Vec::new(),
	};

	list.into_iter()
}

fn in_range(doc: &Value, field: &str, bounds: &Value) -> bool {
	let bound = |key: &str| bounds.get(key).and_then(Value::as_f64);

	field_values(doc, field).iter().filter_map(|value| value.as_f64()).any(|value| {
		bound("gte").map(|limit| value >= limit).unwrap_or(true)
			&& bound("gt").map(|limit| value > limit).unwrap_or(true)
			&& bound("lte").map(|limit| value <= limit).unwrap_or(true)
			&& bound("lt").map(|limit| value < limit).unwrap_or(true)
	})
}

fn same_term(stored: &Value, term: &Value) -> bool {
	match (stored, term) {
		(Value::Number(lhs), Value::Number(rhs)) => lhs.as_f64() == rhs.as_f64(),
		_ => stored == term,
	}
}

fn clause_boost(clause: &Value) -> f64 {
	let Some((kind, body)) = single_entry(clause) else {
		return 1.0;
	};

	match kind {
		"terms" | "exists" | "match_all" => boost(body),
		_ => field_entry(body).map(|(_, spec)| boost(spec)).unwrap_or(1.0),
	}
}

fn boost(body: &Value) -> f64 {
	body.get("boost").and_then(Value::as_f64).unwrap_or(1.0)
}

fn single_entry(value: &Value) -> Option<(&str, &Value)> {
	value.as_object()?.iter().next().map(|(key, value)| (key.as_str(), value))
}

/// The one field-keyed entry of a leaf clause, skipping options such as `boost`.
fn field_entry(body: &Value) -> Option<(&str, &Value)> {
	body.as_object()?
		.iter()
		.find(|(key, _)| key.as_str() != "boost")
		.map(|(key, value)| (key.as_str(), value))
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn bool_filters_gate_and_should_boosts_add() {
		let doc = json!({
			"age_range": { "min_age": 18, "max_age": 60 },
			"value_added_services": ["在线问诊", "其他"],
			"renewal": { "guaranteed_renewal_years": 20 }
		});
		let query = json!({ "bool": {
			"filter": [{ "range": { "age_range.min_age": { "lte": 27 } } }],
			"should": [
				{ "terms": { "value_added_services": ["在线问诊"], "boost": 2.0 } },
				{ "range": { "renewal.guaranteed_renewal_years": { "gte": 15, "boost": 1.5 } } },
				{ "exists": { "field": "coverage.vip_medical", "boost": 2.0 } }
			]
		}});

		assert_eq!(relevance(&query, &doc), Some(3.5));

		let too_young = json!({ "bool": {
			"filter": [{ "range": { "age_range.min_age": { "lte": 10 } } }]
		}});

		assert_eq!(relevance(&too_young, &doc), None);
	}

	#[test]
	fn must_not_and_nested_should_behave_like_the_engine() {
		let doc = json!({ "excluded_occupations": ["高危职业"], "regions": ["全国"] });
		let excluded = json!({ "bool": { "must_not": [
			{ "terms": { "excluded_occupations": ["高危职业", "特殊职业"] } }
		]}});
		let region = json!({ "bool": { "should": [
			{ "term": { "regions": "不限地区" } },
			{ "match": { "regions": { "query": "全国", "fuzziness": "AUTO" } } }
		]}});

		assert!(!matches(&excluded, &doc));
		assert!(matches(&region, &doc));
		assert!(!matches(&region, &json!({ "regions": ["北京"] })));
	}

	#[test]
	fn term_with_value_object_matches_booleans() {
		let doc = json!({ "renewal": { "renewal_underwriting_required": false } });
		let clause = json!({ "term": {
			"renewal.renewal_underwriting_required": { "value": false, "boost": 1.0 }
		}});

		assert!(matches(&clause, &doc));
		assert_eq!(clause_boost(&clause), 1.0);
	}
}
