use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::api::errors::ApiError;
use crate::api::http::HttpClient;
use crate::api::types::{CreateLockRequest, Lock, LockFilters, LockType, UpdateLockRequest};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

const LOCKS_PATH: &str = "/locks";
const LOCKS_SEARCH_PATH: &str = "/locks/search";

/// Lock service boundary.
///
/// Timer locks cannot be deleted once created; see [`delete_manual_lock`].
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait LockService: Send + Sync {
    async fn create(&self, request: &CreateLockRequest) -> Result<Lock, ApiError>;

    async fn update(&self, request: &UpdateLockRequest) -> Result<Lock, ApiError>;

    async fn search(&self, filters: &LockFilters) -> Result<Vec<Lock>, ApiError>;

    async fn get_by_id(&self, lock_id: &str) -> Result<Lock, ApiError>;

    async fn delete(&self, lock_id: &str) -> Result<(), ApiError>;
}

pub struct HttpLockService {
    http: Arc<HttpClient>,
}

impl HttpLockService {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl LockService for HttpLockService {
    async fn create(&self, request: &CreateLockRequest) -> Result<Lock, ApiError> {
        self.http.post(LOCKS_PATH, request).await
    }

    async fn update(&self, request: &UpdateLockRequest) -> Result<Lock, ApiError> {
        self.http.put(LOCKS_PATH, &[], request).await
    }

    async fn search(&self, filters: &LockFilters) -> Result<Vec<Lock>, ApiError> {
        let locks: Option<Vec<Lock>> = self.http.post(LOCKS_SEARCH_PATH, filters).await?;
        Ok(locks.unwrap_or_default())
    }

    async fn get_by_id(&self, lock_id: &str) -> Result<Lock, ApiError> {
        self.http
            .get(LOCKS_PATH, &[("lock_id", lock_id.to_string())])
            .await
    }

    async fn delete(&self, lock_id: &str) -> Result<(), ApiError> {
        self.http
            .delete(LOCKS_PATH, &[("lock_id", lock_id.to_string())])
            .await
    }
}

/// Delete a lock after checking it is not a timer lock
pub async fn delete_manual_lock(locks: &dyn LockService, lock_id: &str) -> Result<Lock, ApiError> {
    let lock = locks.get_by_id(lock_id).await?;
    if lock.is_timer() {
        return Err(ApiError::Rejected(format!(
            "Lock '{}' is a timer lock; timer locks cannot be deleted",
            lock.name
        )));
    }

    locks.delete(lock_id).await?;
    info!(lock_id = %lock_id, name = %lock.name, "Lock deleted");
    Ok(lock)
}

/// Build a create request. A timer lock needs a timeout in the future;
/// a manual lock never carries one.
pub fn new_lock_request(
    name: &str,
    description: &str,
    lock_type: LockType,
    timeout: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<CreateLockRequest, ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::Rejected("Lock name is required".to_string()));
    }
    let timeout = match lock_type {
        LockType::Manual => None,
        LockType::Timer => match timeout {
            None => {
                return Err(ApiError::Rejected(
                    "Timer locks need an unlock time (--timeout)".to_string(),
                ))
            }
            Some(timeout) if timeout <= now => {
                return Err(ApiError::Rejected(
                    "Unlock time must be in the future".to_string(),
                ))
            }
            Some(timeout) => Some(timeout),
        },
    };

    Ok(CreateLockRequest {
        name: name.trim().to_string(),
        description: description.to_string(),
        lock_type,
        timeout,
    })
}

/// Rename or re-describe a manual lock. Fields left as `None` keep their
/// current value; the type is kept and the timeout is cleared.
pub async fn update_manual_lock(
    locks: &dyn LockService,
    lock_id: &str,
    name: Option<String>,
    description: Option<String>,
) -> Result<Lock, ApiError> {
    let lock = locks.get_by_id(lock_id).await?;
    if lock.is_timer() {
        return Err(ApiError::Rejected(format!(
            "Lock '{}' is a timer lock; timer locks cannot be edited",
            lock.name
        )));
    }

    let request = UpdateLockRequest {
        lock_id: lock.lock_id.clone(),
        name: name.unwrap_or(lock.name),
        description: description.unwrap_or(lock.description),
        lock_type: lock.lock_type,
        timeout: None,
    };
    let updated = locks.update(&request).await?;
    info!(lock_id = %lock_id, name = %updated.name, "Lock updated");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use mockall::predicate::eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap()
    }

    fn lock(lock_type: LockType) -> Lock {
        Lock {
            lock_id: "lock-1".to_string(),
            name: "Finals".to_string(),
            lock_type,
            created_by: "admin".to_string(),
            created_at: None,
            timeout: None,
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_delete_manual_lock_deletes() {
        let mut mock = MockLockService::new();
        mock.expect_get_by_id()
            .with(eq("lock-1"))
            .times(1)
            .returning(|_| Ok(lock(LockType::Manual)));
        mock.expect_delete()
            .with(eq("lock-1"))
            .times(1)
            .returning(|_| Ok(()));

        let deleted = delete_manual_lock(&mock, "lock-1").await.unwrap();
        assert_eq!(deleted.name, "Finals");
    }

    #[tokio::test]
    async fn test_delete_refuses_timer_lock() {
        let mut mock = MockLockService::new();
        mock.expect_get_by_id()
            .returning(|_| Ok(lock(LockType::Timer)));
        mock.expect_delete().never();

        let err = delete_manual_lock(&mock, "lock-1").await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected(_)));
    }

    #[test]
    fn test_timer_lock_needs_future_timeout() {
        let err = new_lock_request("Finals", "", LockType::Timer, None, now()).unwrap_err();
        assert_eq!(err.user_message(), "Timer locks need an unlock time (--timeout)");

        let err = new_lock_request("Finals", "", LockType::Timer, Some(now()), now()).unwrap_err();
        assert_eq!(err.user_message(), "Unlock time must be in the future");

        let timeout = now() + Duration::hours(3);
        let request =
            new_lock_request("Finals", "gate", LockType::Timer, Some(timeout), now()).unwrap();
        assert_eq!(request.timeout, Some(timeout));
    }

    #[test]
    fn test_manual_lock_drops_timeout() {
        let request = new_lock_request(
            " Practice ",
            "",
            LockType::Manual,
            Some(now() + Duration::hours(1)),
            now(),
        )
        .unwrap();
        assert_eq!(request.name, "Practice");
        assert_eq!(request.timeout, None);

        assert!(new_lock_request("  ", "", LockType::Manual, None, now()).is_err());
    }

    #[tokio::test]
    async fn test_update_keeps_type_and_unset_fields() {
        let mut mock = MockLockService::new();
        mock.expect_get_by_id().returning(|_| {
            let mut current = lock(LockType::Manual);
            current.description = "old text".to_string();
            Ok(current)
        });
        mock.expect_update()
            .withf(|request| {
                request.name == "Semifinals"
                    && request.description == "old text"
                    && request.lock_type == LockType::Manual
                    && request.timeout.is_none()
            })
            .times(1)
            .returning(|request| {
                let mut updated = lock(request.lock_type);
                updated.name = request.name.clone();
                Ok(updated)
            });

        let updated = update_manual_lock(&mock, "lock-1", Some("Semifinals".to_string()), None)
            .await
            .unwrap();
        assert_eq!(updated.name, "Semifinals");
    }

    #[tokio::test]
    async fn test_update_refuses_timer_lock() {
        let mut mock = MockLockService::new();
        mock.expect_get_by_id()
            .returning(|_| Ok(lock(LockType::Timer)));
        mock.expect_update().never();

        let err = update_manual_lock(&mock, "lock-1", None, Some("new".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(_)));
    }
}
