// =============================================================================
// JSON boundary cleanup
// =============================================================================
//
// Every analysis payload passes through here before leaving the process.
// Non-finite floats (NaN, ±inf) become `null` at any depth; all other values
// are left untouched.

use serde::Serialize;
use serde_json::Value;

/// Serialise `value` into a JSON tree with every non-finite number nulled.
pub fn to_clean_json<T: Serialize>(value: &T) -> serde_json::Result<Value> {
    // `to_value` already maps non-finite floats to null; the walk keeps the
    // guarantee for trees built elsewhere.
    serde_json::to_value(value).map(clean_for_json)
}

/// Recursively replace non-finite numeric leaves with `null`.
pub fn clean_for_json(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, clean_for_json(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(clean_for_json).collect()),
        Value::Number(n) if n.as_f64().is_some_and(|f| !f.is_finite()) => Value::Null,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Sample {
        finite: f64,
        nan: f64,
        inf: Option<f64>,
        nested: Vec<f64>,
        label: &'static str,
    }

    #[test]
    fn non_finite_leaves_become_null() {
        let v = to_clean_json(&Sample {
            finite: 1.5,
            nan: f64::NAN,
            inf: Some(f64::INFINITY),
            nested: vec![1.0, f64::NEG_INFINITY],
            label: "ok",
        })
        .unwrap();

        assert_eq!(v["finite"], 1.5);
        assert!(v["nan"].is_null());
        assert!(v["inf"].is_null());
        assert_eq!(v["nested"], json!([1.0, null]));
        assert_eq!(v["label"], "ok");
    }

    #[test]
    fn clean_tree_is_unchanged() {
        let tree = json!({"a": [1, 2.5, {"b": true, "c": null}], "d": "x"});
        assert_eq!(clean_for_json(tree.clone()), tree);
    }
}
