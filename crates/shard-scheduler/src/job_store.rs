use chrono::{DateTime, Utc};
use dashmap::DashMap;
use shard_core::{SyncJobRecord, SyncJobStatus};
use uuid::Uuid;

/// In-memory job table the scheduler leases against. Kept separate from the
/// shard store proper -- sync jobs are operational bookkeeping, not
/// tenant-visible records, and don't need the durability or change-feed
/// machinery a `Shard` gets.
pub struct JobStore {
    jobs: DashMap<Uuid, SyncJobRecord>,
}

impl JobStore {
    pub fn new() -> Self {
        Self { jobs: DashMap::new() }
    }

    pub fn upsert(&self, job: SyncJobRecord) {
        self.jobs.insert(job.job_id, job);
    }

    pub fn due_jobs(&self, now: DateTime<Utc>) -> Vec<SyncJobRecord> {
        self.jobs
            .iter()
            .filter(|j| matches!(j.status, SyncJobStatus::Queued) && j.next_run_at <= now)
            .map(|j| j.clone())
            .collect()
    }

    /// Attempts to take the lease on a queued job. Returns `true` on success.
    pub fn try_lease(&self, job_id: Uuid, owner: &str, lease_duration: chrono::Duration) -> bool {
        match self.jobs.get_mut(&job_id) {
            Some(mut job) if matches!(job.status, SyncJobStatus::Queued) => {
                job.status = SyncJobStatus::Leased;
                job.lease_owner = Some(owner.to_string());
                job.lease_expires_at = Some(Utc::now() + lease_duration);
                job.started_at = Some(Utc::now());
                true
            }
            _ => false,
        }
    }

    pub fn mark_running(&self, job_id: Uuid) {
        if let Some(mut job) = self.jobs.get_mut(&job_id) {
            job.status = SyncJobStatus::Running;
        }
    }

    pub fn mark_succeeded(&self, job_id: Uuid, next_run_at: DateTime<Utc>, records_ingested: u64) {
        if let Some(mut job) = self.jobs.get_mut(&job_id) {
            job.status = SyncJobStatus::Queued;
            job.lease_owner = None;
            job.lease_expires_at = None;
            job.attempt = 0;
            job.next_run_at = next_run_at;
            job.records_ingested += records_ingested;
            job.finished_at = Some(Utc::now());
            job.last_error = None;
        }
    }

    pub fn mark_failed(&self, job_id: Uuid, error: impl Into<String>, retry_at: DateTime<Utc>) {
        if let Some(mut job) = self.jobs.get_mut(&job_id) {
            job.status = SyncJobStatus::Queued;
            job.lease_owner = None;
            job.lease_expires_at = None;
            job.attempt += 1;
            job.next_run_at = retry_at;
            job.last_error = Some(error.into());
            job.finished_at = Some(Utc::now());
        }
    }

    /// Reclaims jobs whose lease expired without the worker reporting back --
    /// a crashed worker must not permanently strand a job in `Leased`/`Running`.
    pub fn reclaim_expired_leases(&self, now: DateTime<Utc>) -> Vec<Uuid> {
        let mut reclaimed = Vec::new();
        for mut job in self.jobs.iter_mut() {
            let expired = matches!(job.status, SyncJobStatus::Leased | SyncJobStatus::Running)
                && job.lease_expires_at.map(|e| e <= now).unwrap_or(false);
            if expired {
                job.status = SyncJobStatus::Queued;
                job.lease_owner = None;
                job.lease_expires_at = None;
                job.next_run_at = now;
                reclaimed.push(job.job_id);
            }
        }
        reclaimed
    }

    pub fn count_running_for_tenant(&self, tenant_id: &str) -> usize {
        self.jobs
            .iter()
            .filter(|j| j.tenant_id == tenant_id && matches!(j.status, SyncJobStatus::Leased | SyncJobStatus::Running))
            .count()
    }

    pub fn count_running_total(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| matches!(j.status, SyncJobStatus::Leased | SyncJobStatus::Running))
            .count()
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shard_core::SyncJobStatus;

    fn sample_job() -> SyncJobRecord {
        SyncJobRecord {
            job_id: Uuid::new_v4(),
            tenant_id: "tenant-a".into(),
            integration_id: "int-1".into(),
            provider_id: "salesforce".into(),
            status: SyncJobStatus::Queued,
            lease_owner: None,
            lease_expires_at: None,
            attempt: 0,
            next_run_at: Utc::now() - chrono::Duration::seconds(1),
            last_error: None,
            records_ingested: 0,
            started_at: None,
            finished_at: None,
        }
    }

    #[test]
    fn lease_then_reclaim_on_expiry() {
        let store = JobStore::new();
        let job = sample_job();
        let id = job.job_id;
        store.upsert(job);

        assert!(store.try_lease(id, "worker-1", chrono::Duration::seconds(-1)));
        let reclaimed = store.reclaim_expired_leases(Utc::now());
        assert_eq!(reclaimed, vec![id]);
    }

    #[test]
    fn due_jobs_only_returns_queued_past_next_run() {
        let store = JobStore::new();
        let mut job = sample_job();
        job.next_run_at = Utc::now() + chrono::Duration::hours(1);
        store.upsert(job);
        assert!(store.due_jobs(Utc::now()).is_empty());
    }
}
