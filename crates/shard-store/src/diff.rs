use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDiff {
    pub path: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

/// Field-level diff between two `structured_data` documents, used to build
/// the audit record emitted on every shard update. Flat, dot-path based;
/// nested objects are recursed into, arrays are compared wholesale.
pub fn diff_structured_data(before: &Value, after: &Value) -> Vec<FieldDiff> {
    let mut diffs = Vec::new();
    diff_into(before, after, "", &mut diffs);
    diffs
}

fn diff_into(before: &Value, after: &Value, prefix: &str, out: &mut Vec<FieldDiff>) {
    match (before, after) {
        (Value::Object(b), Value::Object(a)) => {
            let mut keys: Vec<&String> = b.keys().chain(a.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                match (b.get(key), a.get(key)) {
                    (Some(bv), Some(av)) if bv != av => diff_into(bv, av, &path, out),
                    (Some(bv), None) => out.push(FieldDiff {
                        path,
                        before: Some(bv.clone()),
                        after: None,
                    }),
                    (None, Some(av)) => out.push(FieldDiff {
                        path,
                        before: None,
                        after: Some(av.clone()),
                    }),
                    _ => {}
                }
            }
        }
        (b, a) if b != a => out.push(FieldDiff {
            path: prefix.to_string(),
            before: Some(b.clone()),
            after: Some(a.clone()),
        }),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_changed_added_and_removed_fields() {
        let before = json!({"name": "Jane", "title": "Eng"});
        let after = json!({"name": "Jane Doe", "team": "Platform"});
        let diffs = diff_structured_data(&before, &after);
        assert!(diffs.iter().any(|d| d.path == "name"));
        assert!(diffs.iter().any(|d| d.path == "title" && d.after.is_none()));
        assert!(diffs.iter().any(|d| d.path == "team" && d.before.is_none()));
    }

    #[test]
    fn nested_objects_diff_by_leaf_path() {
        let before = json!({"addr": {"city": "NYC"}});
        let after = json!({"addr": {"city": "SF"}});
        let diffs = diff_structured_data(&before, &after);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "addr.city");
    }
}
