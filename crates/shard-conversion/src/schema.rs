use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    Uppercase,
    Lowercase,
    Trim,
    ToIso8601,
    ParseNumber,
}

/// One declarative mapping rule. A schema is a list of these, applied in
/// order against the same source document to build one canonical record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldMapping {
    Direct {
        source_path: String,
        target_path: String,
    },
    Transform {
        source_path: String,
        target_path: String,
        transform: TransformKind,
    },
    Conditional {
        condition_path: String,
        equals: Value,
        then: Box<FieldMapping>,
        otherwise: Option<Box<FieldMapping>>,
    },
    Default {
        target_path: String,
        value: Value,
    },
    Composite {
        source_paths: Vec<String>,
        target_path: String,
        joiner: String,
    },
    Flatten {
        source_path: String,
        target_prefix: String,
    },
    Lookup {
        source_path: String,
        target_path: String,
        table: HashMap<String, Value>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DedupStrategy {
    ExternalId { field: String },
    FieldMatch { fields: Vec<String> },
    Composite { fields: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionSchema {
    pub schema_id: String,
    pub shard_type: String,
    pub provider_id: String,
    pub mappings: Vec<FieldMapping>,
    pub dedup: DedupStrategy,
    /// Dot-paths in the target record concatenated (space-joined) to build
    /// the embedding/full-text projection.
    pub searchable_fields: Vec<String>,
}
