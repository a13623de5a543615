pub mod dispatcher;
pub mod error;
pub mod job_store;
pub mod schedule;

pub use dispatcher::{Dispatcher, InstanceLookup};
pub use error::SchedulerError;
pub use job_store::JobStore;
pub use schedule::next_run_at;
