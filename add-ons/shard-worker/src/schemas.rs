use std::collections::HashMap;

use shard_conversion::{ConversionSchema, DedupStrategy, FieldMapping, TransformKind};

/// Built-in conversion schemas, keyed `{provider_id}:default`. Real
/// deployments would load these from `config/schemas/*.toml`; the shapes
/// below are what a Salesforce Opportunity or Slack message record actually
/// looks like over the wire.
pub fn default_schemas() -> HashMap<String, ConversionSchema> {
    let mut schemas = HashMap::new();

    schemas.insert(
        "salesforce:default".to_string(),
        ConversionSchema {
            schema_id: "salesforce-opportunity-v1".to_string(),
            shard_type: "crm.opportunity".to_string(),
            provider_id: "salesforce".to_string(),
            mappings: vec![
                FieldMapping::Direct {
                    source_path: "Id".to_string(),
                    target_path: "external_id".to_string(),
                },
                FieldMapping::Direct {
                    source_path: "Name".to_string(),
                    target_path: "name".to_string(),
                },
                FieldMapping::Direct {
                    source_path: "StageName".to_string(),
                    target_path: "stage".to_string(),
                },
                FieldMapping::Transform {
                    source_path: "Amount".to_string(),
                    target_path: "amount".to_string(),
                    transform: TransformKind::ParseNumber,
                },
                FieldMapping::Transform {
                    source_path: "LastModifiedDate".to_string(),
                    target_path: "last_modified_at".to_string(),
                    transform: TransformKind::ToIso8601,
                },
                FieldMapping::Default {
                    target_path: "status".to_string(),
                    value: serde_json::json!("open"),
                },
            ],
            dedup: DedupStrategy::ExternalId {
                field: "external_id".to_string(),
            },
            searchable_fields: vec!["name".to_string(), "stage".to_string()],
        },
    );

    schemas.insert(
        "slack:default".to_string(),
        ConversionSchema {
            schema_id: "slack-message-v1".to_string(),
            shard_type: "messaging.message".to_string(),
            provider_id: "slack".to_string(),
            mappings: vec![
                FieldMapping::Direct {
                    source_path: "ts".to_string(),
                    target_path: "external_id".to_string(),
                },
                FieldMapping::Direct {
                    source_path: "channel".to_string(),
                    target_path: "channel".to_string(),
                },
                FieldMapping::Direct {
                    source_path: "user".to_string(),
                    target_path: "author".to_string(),
                },
                FieldMapping::Transform {
                    source_path: "text".to_string(),
                    target_path: "text".to_string(),
                    transform: TransformKind::Trim,
                },
            ],
            dedup: DedupStrategy::ExternalId {
                field: "external_id".to_string(),
            },
            searchable_fields: vec!["text".to_string()],
        },
    );

    schemas
}
