pub mod convert;
pub mod error;
pub mod path;
pub mod schema;

pub use convert::{convert, ConvertedRecord};
pub use error::ConversionError;
pub use schema::{ConversionSchema, DedupStrategy, FieldMapping, TransformKind};
