use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::ConversionError;
use crate::path::{get_path, set_path};
use crate::schema::{ConversionSchema, DedupStrategy, FieldMapping, TransformKind};

pub struct ConvertedRecord {
    pub structured_data: Value,
    pub searchable_text: String,
    pub dedup_key: String,
}

fn apply_transform(value: &Value, kind: &TransformKind) -> Result<Value, String> {
    match kind {
        TransformKind::Uppercase => Ok(Value::String(
            value.as_str().ok_or("expected string")?.to_uppercase(),
        )),
        TransformKind::Lowercase => Ok(Value::String(
            value.as_str().ok_or("expected string")?.to_lowercase(),
        )),
        TransformKind::Trim => Ok(Value::String(
            value.as_str().ok_or("expected string")?.trim().to_string(),
        )),
        TransformKind::ToIso8601 => {
            let s = value.as_str().ok_or("expected string")?;
            chrono::DateTime::parse_from_rfc3339(s)
                .map(|dt| Value::String(dt.to_rfc3339()))
                .map_err(|e| e.to_string())
        }
        TransformKind::ParseNumber => {
            let s = value.as_str().ok_or("expected string")?;
            s.parse::<f64>()
                .map(|n| serde_json::json!(n))
                .map_err(|e| e.to_string())
        }
    }
}

fn apply_mapping(
    source: &Value,
    target: &mut Value,
    mapping: &FieldMapping,
) -> Result<(), ConversionError> {
    match mapping {
        FieldMapping::Direct {
            source_path,
            target_path,
        } => {
            if let Some(v) = get_path(source, source_path) {
                set_path(target, target_path, v.clone());
            }
            Ok(())
        }
        FieldMapping::Transform {
            source_path,
            target_path,
            transform,
        } => {
            if let Some(v) = get_path(source, source_path) {
                let transformed =
                    apply_transform(v, transform).map_err(|reason| ConversionError::Transform {
                        field: target_path.clone(),
                        reason,
                    })?;
                set_path(target, target_path, transformed);
            }
            Ok(())
        }
        FieldMapping::Conditional {
            condition_path,
            equals,
            then,
            otherwise,
        } => {
            let matched = get_path(source, condition_path).map(|v| v == equals).unwrap_or(false);
            if matched {
                apply_mapping(source, target, then)
            } else if let Some(otherwise) = otherwise {
                apply_mapping(source, target, otherwise)
            } else {
                Ok(())
            }
        }
        FieldMapping::Default { target_path, value } => {
            if get_path(target, target_path).is_none() {
                set_path(target, target_path, value.clone());
            }
            Ok(())
        }
        FieldMapping::Composite {
            source_paths,
            target_path,
            joiner,
        } => {
            let parts: Vec<String> = source_paths
                .iter()
                .filter_map(|p| get_path(source, p))
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            set_path(target, target_path, Value::String(parts.join(joiner)));
            Ok(())
        }
        FieldMapping::Flatten {
            source_path,
            target_prefix,
        } => {
            if let Some(Value::Object(map)) = get_path(source, source_path) {
                for (k, v) in map {
                    set_path(target, &format!("{target_prefix}.{k}"), v.clone());
                }
            }
            Ok(())
        }
        FieldMapping::Lookup {
            source_path,
            target_path,
            table,
        } => {
            let key = get_path(source, source_path)
                .and_then(|v| v.as_str())
                .ok_or_else(|| ConversionError::Validation {
                    field: source_path.clone(),
                    reason: "lookup key missing or not a string".to_string(),
                })?;
            let mapped = table.get(key).ok_or_else(|| ConversionError::LookupMiss {
                field: target_path.clone(),
                key: key.to_string(),
            })?;
            set_path(target, target_path, mapped.clone());
            Ok(())
        }
    }
}

fn dedup_key(source: &Value, strategy: &DedupStrategy) -> Result<String, ConversionError> {
    match strategy {
        DedupStrategy::ExternalId { field } => get_path(source, field)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ConversionError::Validation {
                field: field.clone(),
                reason: "external id field missing".to_string(),
            }),
        DedupStrategy::FieldMatch { fields } | DedupStrategy::Composite { fields } => {
            let mut hasher = Sha256::new();
            for field in fields {
                let v = get_path(source, field).cloned().unwrap_or(Value::Null);
                hasher.update(v.to_string().as_bytes());
                hasher.update([0u8]);
            }
            Ok(hex::encode(hasher.finalize()))
        }
    }
}

/// Pure transform: external source record -> canonical target record, no I/O.
pub fn convert(schema: &ConversionSchema, source: &Value) -> Result<ConvertedRecord, ConversionError> {
    let mut target = Value::Object(serde_json::Map::new());
    for mapping in &schema.mappings {
        apply_mapping(source, &mut target, mapping)?;
    }

    let searchable_text = schema
        .searchable_fields
        .iter()
        .filter_map(|p| get_path(&target, p))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");

    let key = dedup_key(source, &schema.dedup)?;

    Ok(ConvertedRecord {
        structured_data: target,
        searchable_text,
        dedup_key: key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn contact_schema() -> ConversionSchema {
        ConversionSchema {
            schema_id: "salesforce.contact.v1".into(),
            shard_type: "crm.contact".into(),
            provider_id: "salesforce".into(),
            mappings: vec![
                FieldMapping::Direct {
                    source_path: "Id".into(),
                    target_path: "external_id".into(),
                },
                FieldMapping::Transform {
                    source_path: "Email".into(),
                    target_path: "email".into(),
                    transform: TransformKind::Lowercase,
                },
                FieldMapping::Composite {
                    source_paths: vec!["FirstName".into(), "LastName".into()],
                    target_path: "full_name".into(),
                    joiner: " ".into(),
                },
                FieldMapping::Default {
                    target_path: "status".into(),
                    value: json!("active"),
                },
                FieldMapping::Conditional {
                    condition_path: "IsDeleted".into(),
                    equals: json!(true),
                    then: Box::new(FieldMapping::Default {
                        target_path: "status".into(),
                        value: json!("deleted"),
                    }),
                    otherwise: None,
                },
            ],
            dedup: DedupStrategy::ExternalId {
                field: "Id".into(),
            },
            searchable_fields: vec!["full_name".into(), "email".into()],
        }
    }

    #[test]
    fn converts_fields_per_mapping_kind() {
        let schema = contact_schema();
        let source = json!({
            "Id": "003abc",
            "Email": "Jane@Example.com",
            "FirstName": "Jane",
            "LastName": "Doe",
            "IsDeleted": false,
        });
        let result = convert(&schema, &source).unwrap();
        assert_eq!(result.structured_data["email"], "jane@example.com");
        assert_eq!(result.structured_data["full_name"], "Jane Doe");
        assert_eq!(result.structured_data["status"], "active");
        assert_eq!(result.dedup_key, "003abc");
        assert_eq!(result.searchable_text, "Jane Doe jane@example.com");
    }

    #[test]
    fn conditional_overrides_default_when_matched() {
        let schema = contact_schema();
        let source = json!({
            "Id": "003abc",
            "Email": "jane@example.com",
            "FirstName": "Jane",
            "LastName": "Doe",
            "IsDeleted": true,
        });
        let result = convert(&schema, &source).unwrap();
        assert_eq!(result.structured_data["status"], "deleted");
    }

    #[test]
    fn lookup_miss_is_reported() {
        let mut table = HashMap::new();
        table.insert("Hot".to_string(), json!("hot"));
        let schema = ConversionSchema {
            schema_id: "x".into(),
            shard_type: "crm.lead".into(),
            provider_id: "salesforce".into(),
            mappings: vec![FieldMapping::Lookup {
                source_path: "Rating".into(),
                target_path: "rating".into(),
                table,
            }],
            dedup: DedupStrategy::ExternalId { field: "Id".into() },
            searchable_fields: vec![],
        };
        let source = json!({"Id": "1", "Rating": "Cold"});
        assert!(matches!(
            convert(&schema, &source),
            Err(ConversionError::LookupMiss { .. })
        ));
    }

    #[test]
    fn composite_dedup_is_stable_and_order_sensitive() {
        let schema = ConversionSchema {
            schema_id: "x".into(),
            shard_type: "crm.contact".into(),
            provider_id: "hubspot".into(),
            mappings: vec![],
            dedup: DedupStrategy::Composite {
                fields: vec!["email".into(), "company".into()],
            },
            searchable_fields: vec![],
        };
        let a = json!({"email": "a@b.com", "company": "Acme"});
        let b = json!({"email": "a@b.com", "company": "Acme"});
        let c = json!({"email": "a@b.com", "company": "Other"});
        assert_eq!(
            dedup_key(&a, &schema.dedup).unwrap(),
            dedup_key(&b, &schema.dedup).unwrap()
        );
        assert_ne!(
            dedup_key(&a, &schema.dedup).unwrap(),
            dedup_key(&c, &schema.dedup).unwrap()
        );
    }
}
