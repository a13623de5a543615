use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use shard_core::IntegrationInstance;
use shard_queue::{PullWorker, QueueBus};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::job_store::JobStore;
use crate::schedule::next_run_at;

const MAX_TOTAL_CONCURRENT_SYNCS: usize = 50;
const MAX_CONCURRENT_SYNCS_PER_TENANT: usize = 3;
const SYNC_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Resolves an integration instance and its tenant's timezone; implemented
/// by whatever owns tenant/integration state (the gateway's in-memory
/// registry in this workspace).
pub trait InstanceLookup: Send + Sync {
    fn get(&self, tenant_id: &str, integration_id: &str) -> Option<IntegrationInstance>;
    fn tenant_timezone(&self, tenant_id: &str) -> String;
    fn persist_cursor(&self, tenant_id: &str, integration_id: &str, cursor: Option<serde_json::Value>);
}

/// Ticks every `tick_interval`, pulling due jobs, enforcing the global and
/// per-tenant concurrency caps, leasing each selected job, and dispatching it
/// to the pull worker with a hard per-job timeout. Structurally the same
/// `tokio::time::interval` + `ctrl_c` `select!` loop as the rest of this
/// engine's long-running processes.
pub struct Dispatcher {
    jobs: Arc<JobStore>,
    pull_worker: Arc<PullWorker>,
    bus: Arc<QueueBus>,
    instances: Arc<dyn InstanceLookup>,
    global_permits: Arc<Semaphore>,
    worker_id: String,
}

impl Dispatcher {
    pub fn new(
        jobs: Arc<JobStore>,
        pull_worker: Arc<PullWorker>,
        bus: Arc<QueueBus>,
        instances: Arc<dyn InstanceLookup>,
        worker_id: impl Into<String>,
    ) -> Self {
        Self {
            jobs,
            pull_worker,
            bus,
            instances,
            global_permits: Arc::new(Semaphore::new(MAX_TOTAL_CONCURRENT_SYNCS)),
            worker_id: worker_id.into(),
        }
    }

    pub async fn tick(&self) {
        let now = Utc::now();
        for job_id in self.jobs.reclaim_expired_leases(now) {
            warn!(job_id = %job_id, "reclaimed expired lease");
        }

        for job in self.jobs.due_jobs(now) {
            if self.jobs.count_running_total() >= MAX_TOTAL_CONCURRENT_SYNCS {
                break;
            }
            if self.jobs.count_running_for_tenant(&job.tenant_id) >= MAX_CONCURRENT_SYNCS_PER_TENANT {
                continue;
            }
            if !self.jobs.try_lease(job.job_id, &self.worker_id, chrono::Duration::minutes(10)) {
                continue;
            }

            let Some(permit) = self.global_permits.clone().try_acquire_owned().ok() else {
                continue;
            };

            let Some(instance) = self.instances.get(&job.tenant_id, &job.integration_id) else {
                self.jobs.mark_failed(job.job_id, "integration instance not found", now + chrono::Duration::minutes(5));
                continue;
            };

            self.jobs.mark_running(job.job_id);

            let jobs = self.jobs.clone();
            let pull_worker = self.pull_worker.clone();
            let bus = self.bus.clone();
            let instances = self.instances.clone();
            let job_id = job.job_id;
            let tenant_id = job.tenant_id.clone();
            let tenant_timezone = self.instances.tenant_timezone(&job.tenant_id);

            tokio::spawn(async move {
                let _permit = permit;
                let outcome = tokio::time::timeout(SYNC_TIMEOUT, pull_worker.run_once(&instance, &bus)).await;
                match outcome {
                    Ok(Ok(cursor)) => {
                        instances.persist_cursor(&tenant_id, &instance.integration_id, cursor);
                        let next = next_run_at(&instance.schedule, &tenant_timezone, Utc::now())
                            .unwrap_or_else(|_| Utc::now() + chrono::Duration::minutes(5));
                        jobs.mark_succeeded(job_id, next, 0);
                        info!(job_id = %job_id, "sync job succeeded");
                    }
                    Ok(Err(e)) => {
                        jobs.mark_failed(job_id, e.to_string(), Utc::now() + chrono::Duration::minutes(5));
                        warn!(job_id = %job_id, error = %e, "sync job failed");
                    }
                    Err(_) => {
                        jobs.mark_failed(job_id, "sync timed out", Utc::now() + chrono::Duration::minutes(5));
                        warn!(job_id = %job_id, "sync job timed out");
                    }
                }
            });
        }
    }

    pub async fn run(self: Arc<Self>, tick_interval: Duration) {
        let mut tick = tokio::time::interval(tick_interval);
        loop {
            tokio::select! {
                _ = tick.tick() => self.tick().await,
                _ = tokio::signal::ctrl_c() => {
                    info!("scheduler shutting down");
                    break;
                }
            }
        }
    }
}
