//! # Form Encoding
//!
//! Flattens a structured value into the bracketed key paths used by
//! `application/x-www-form-urlencoded` APIs such as Stripe's:
//!
//! ```text
//! { "metadata": { "userId": "u1" },          metadata[userId]=u1
//!   "line_items": [ { "quantity": 1 } ] }  →  line_items[0][quantity]=1
//! ```

use serde::Serialize;
use serde_json::Value;

/// Flatten `value` into `(key, value)` pairs.
///
/// Maps produce `prefix[key]`, arrays produce `prefix[index]`, scalars produce
/// their string form and nulls are skipped. With an empty prefix the top-level
/// keys are used bare. Map keys come out in `serde_json::Map` order.
pub fn flatten(value: &Value, prefix: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    flatten_into(value, prefix, &mut pairs);
    pairs
}

fn flatten_into(value: &Value, prefix: &str, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => pairs.push((prefix.to_string(), b.to_string())),
        Value::Number(n) => pairs.push((prefix.to_string(), n.to_string())),
        Value::String(s) => pairs.push((prefix.to_string(), s.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(item, &child_key(prefix, &index.to_string()), pairs);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten_into(item, &child_key(prefix, key), pairs);
            }
        }
    }
}

fn child_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}[{}]", prefix, key)
    }
}

/// Serialize any `Serialize` value and flatten it from the top level.
pub fn to_form_pairs<T: Serialize>(value: &T) -> Result<Vec<(String, String)>, serde_json::Error> {
    Ok(flatten(&serde_json::to_value(value)?, ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_flat_scalars() {
        let pairs = flatten(&json!({ "mode": "payment", "count": 3, "live": false }), "");
        assert_eq!(lookup(&pairs, "mode"), Some("payment"));
        assert_eq!(lookup(&pairs, "count"), Some("3"));
        assert_eq!(lookup(&pairs, "live"), Some("false"));
    }

    #[test]
    fn test_nested_maps_and_lists() {
        let value = json!({
            "payment_method_types": ["card", "boleto"],
            "line_items": [
                { "price_data": { "currency": "brl", "product_data": { "name": "Milk" } }, "quantity": 1 },
                { "price_data": { "currency": "brl", "product_data": { "name": "Bread" } }, "quantity": 1 }
            ],
            "payment_method_options": { "boleto": { "expires_after_days": 3 } }
        });
        let pairs = flatten(&value, "");

        assert_eq!(lookup(&pairs, "payment_method_types[1]"), Some("boleto"));
        assert_eq!(
            lookup(&pairs, "line_items[1][price_data][product_data][name]"),
            Some("Bread")
        );
        assert_eq!(lookup(&pairs, "line_items[0][quantity]"), Some("1"));
        assert_eq!(
            lookup(&pairs, "payment_method_options[boleto][expires_after_days]"),
            Some("3")
        );
        assert_eq!(pairs.len(), 2 + 3 * 2 + 1);
    }

    #[test]
    fn test_nulls_and_empty_containers_skipped() {
        let pairs = flatten(&json!({ "a": null, "b": [], "c": {}, "d": [null, "x"] }), "");
        assert_eq!(pairs, vec![("d[1]".to_string(), "x".to_string())]);
    }

    #[test]
    fn test_prefix_applies_to_scalars_and_children() {
        assert_eq!(
            flatten(&json!("u1"), "metadata[userId]"),
            vec![("metadata[userId]".to_string(), "u1".to_string())]
        );
        assert_eq!(
            flatten(&json!({ "k": ["v"] }), "outer"),
            vec![("outer[k][0]".to_string(), "v".to_string())]
        );
    }

    #[test]
    fn test_deep_nesting() {
        let value = json!({ "a": { "b": [ { "c": { "d": [ 1, 2 ] } } ] } });
        let pairs = flatten(&value, "");
        assert_eq!(lookup(&pairs, "a[b][0][c][d][1]"), Some("2"));
    }

    #[test]
    fn test_to_form_pairs_from_struct() {
        #[derive(Serialize)]
        struct Params {
            mode: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            customer: Option<String>,
            metadata: std::collections::BTreeMap<&'static str, &'static str>,
        }
        let mut metadata = std::collections::BTreeMap::new();
        metadata.insert("userId", "");
        let mut pairs = to_form_pairs(&Params {
            mode: "payment",
            customer: None,
            metadata,
        })
        .unwrap();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("metadata[userId]".to_string(), "".to_string()),
                ("mode".to_string(), "payment".to_string()),
            ]
        );
    }
}
