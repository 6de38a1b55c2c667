// Lock listing helpers for the `locks` commands

use chrono::{DateTime, Utc};
use clap::ValueEnum;

use crate::api::types::{Lock, LockType};

/// Which locks a listing shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LockView {
    #[default]
    All,
    Manual,
    /// Timer locks whose timeout is still ahead
    ActiveTimer,
}

impl LockView {
    pub fn includes(self, lock: &Lock, now: DateTime<Utc>) -> bool {
        match self {
            LockView::All => true,
            LockView::Manual => lock.lock_type == LockType::Manual,
            LockView::ActiveTimer => lock.is_active_timer(now),
        }
    }
}

pub fn filter_locks(locks: Vec<Lock>, view: LockView, now: DateTime<Utc>) -> Vec<Lock> {
    locks
        .into_iter()
        .filter(|lock| view.includes(lock, now))
        .collect()
}

/// "Ends in 1d 2h 3m" ahead of `timeout`, "Expired 2h ago" past it
pub fn describe_timeout(timeout: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = timeout - now;
    let expired = diff < chrono::Duration::zero();
    let total_minutes = diff.num_minutes().unsigned_abs();

    let days = total_minutes / (24 * 60);
    let hours = (total_minutes % (24 * 60)) / 60;
    let minutes = total_minutes % 60;
    let day_part = if days > 0 {
        format!("{days}d ")
    } else {
        String::new()
    };

    if expired {
        format!("Expired {day_part}{hours}h ago")
    } else {
        format!("Ends in {day_part}{hours}h {minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap()
    }

    fn lock(id: &str, lock_type: LockType, timeout: Option<DateTime<Utc>>) -> Lock {
        Lock {
            lock_id: id.to_string(),
            name: id.to_string(),
            lock_type,
            created_by: "admin".to_string(),
            created_at: None,
            timeout,
            description: String::new(),
        }
    }

    #[test]
    fn test_describe_future_timeout() {
        let timeout = now() + Duration::days(1) + Duration::hours(2) + Duration::minutes(3);
        assert_eq!(describe_timeout(timeout, now()), "Ends in 1d 2h 3m");
        assert_eq!(
            describe_timeout(now() + Duration::minutes(45), now()),
            "Ends in 0h 45m"
        );
    }

    #[test]
    fn test_describe_expired_timeout() {
        let timeout = now() - Duration::hours(2) - Duration::minutes(59);
        assert_eq!(describe_timeout(timeout, now()), "Expired 2h ago");
        assert_eq!(
            describe_timeout(now() - Duration::days(3), now()),
            "Expired 3d 0h ago"
        );
    }

    #[test]
    fn test_views() {
        let locks = vec![
            lock("manual", LockType::Manual, None),
            lock("running", LockType::Timer, Some(now() + Duration::hours(1))),
            lock("done", LockType::Timer, Some(now() - Duration::hours(1))),
        ];

        let ids = |view| -> Vec<String> {
            filter_locks(locks.clone(), view, now())
                .into_iter()
                .map(|l| l.lock_id)
                .collect()
        };
        assert_eq!(ids(LockView::All).len(), 3);
        assert_eq!(ids(LockView::Manual), vec!["manual"]);
        assert_eq!(ids(LockView::ActiveTimer), vec!["running"]);
    }
}
