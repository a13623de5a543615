use serde_json::Value;

pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

pub fn set_path(root: &mut Value, path: &str, new_value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    let mut current = root;
    for (i, segment) in segments.iter().enumerate() {
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
        let map = current.as_object_mut().expect("coerced to object above");
        if i == segments.len() - 1 {
            map.insert(segment.to_string(), new_value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_path_walks_nested_objects() {
        let v = json!({"a": {"b": {"c": 5}}});
        assert_eq!(get_path(&v, "a.b.c"), Some(&json!(5)));
        assert_eq!(get_path(&v, "a.x"), None);
    }

    #[test]
    fn set_path_creates_intermediate_objects() {
        let mut v = json!({});
        set_path(&mut v, "a.b.c", json!(5));
        assert_eq!(v, json!({"a": {"b": {"c": 5}}}));
    }
}
