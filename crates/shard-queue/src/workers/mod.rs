pub mod enrichment;
pub mod normalization;
pub mod pull;
pub mod webhook;
pub mod writeback;

pub use enrichment::EnrichmentWorker;
pub use normalization::NormalizationWorker;
pub use pull::PullWorker;
pub use webhook::WebhookHandler;
pub use writeback::WriteBackWorker;
