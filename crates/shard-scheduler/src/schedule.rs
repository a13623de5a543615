use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;
use shard_core::{Schedule, ScheduleKind};
use std::str::FromStr;

use crate::error::SchedulerError;

/// Computes the next run time for a schedule, evaluating cron expressions in
/// the tenant's own timezone so "9am" means 9am local, not UTC.
pub fn next_run_at(schedule: &Schedule, tenant_timezone: &str, after: DateTime<Utc>) -> Result<DateTime<Utc>, SchedulerError> {
    match schedule.kind {
        ScheduleKind::Interval => {
            let seconds = schedule
                .interval_seconds
                .ok_or_else(|| SchedulerError::InvalidCron("interval schedule missing interval_seconds".into()))?;
            Ok(after + chrono::Duration::seconds(seconds as i64))
        }
        ScheduleKind::Cron => {
            let expr = schedule
                .cron_expression
                .as_deref()
                .ok_or_else(|| SchedulerError::InvalidCron("cron schedule missing cron_expression".into()))?;
            let tz: Tz = tenant_timezone
                .parse()
                .map_err(|_| SchedulerError::InvalidCron(format!("unknown timezone {tenant_timezone}")))?;
            let schedule = CronSchedule::from_str(expr)
                .map_err(|e| SchedulerError::InvalidCron(e.to_string()))?;
            let local_after = after.with_timezone(&tz);
            schedule
                .after(&local_after)
                .next()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| SchedulerError::InvalidCron("cron schedule has no future occurrence".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_schedule_adds_seconds() {
        let schedule = Schedule {
            kind: ScheduleKind::Interval,
            interval_seconds: Some(300),
            cron_expression: None,
        };
        let now = Utc::now();
        let next = next_run_at(&schedule, "UTC", now).unwrap();
        assert_eq!((next - now).num_seconds(), 300);
    }

    #[test]
    fn cron_schedule_resolves_in_tenant_timezone() {
        let schedule = Schedule {
            kind: ScheduleKind::Cron,
            interval_seconds: None,
            cron_expression: Some("0 0 9 * * * *".to_string()),
        };
        let now = Utc::now();
        let next = next_run_at(&schedule, "America/Chicago", now).unwrap();
        assert!(next > now);
    }
}
