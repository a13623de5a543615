pub mod acl;
pub mod audit;
pub mod redaction;

pub use acl::{is_visible, GovernancePolicy, RequesterGrants};
pub use audit::{audit_record_to_shard, new_audit_record};
pub use redaction::{RedactionPolicy, RedactionRegistry, PROTECTED_PLACEHOLDER};
