pub mod contests;
pub mod errors;
pub mod http;
pub mod locks;
pub mod memory;
pub mod problems;
pub mod types;

use std::sync::Arc;

pub use contests::{ContestService, HttpContestService};
pub use errors::ApiError;
pub use http::HttpClient;
pub use locks::{
    delete_manual_lock, new_lock_request, update_manual_lock, HttpLockService, LockService,
};
pub use memory::{BackendCall, FailPoint, InMemoryBackend};
pub use problems::{HttpProblemService, ProblemService};

use crate::config::ApiConfig;

/// The three service boundaries the submission flow talks to
#[derive(Clone)]
pub struct Services {
    pub locks: Arc<dyn LockService>,
    pub problems: Arc<dyn ProblemService>,
    pub contests: Arc<dyn ContestService>,
}

impl Services {
    /// HTTP-backed services sharing one cookie-carrying client
    pub fn http(config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self::from_client(Arc::new(HttpClient::new(config)?)))
    }

    /// Like [`Services::http`], but logs in first when credentials are
    /// configured and no session cookie was given.
    pub async fn connect(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = Arc::new(HttpClient::new(config)?);
        if config.session_cookie.is_none() {
            match (config.username.as_deref(), config.password.as_deref()) {
                (Some(username), Some(password)) => http.login(username, password).await?,
                (Some(_), None) => {
                    return Err(ApiError::Rejected(
                        "api.password is required when api.username is set".to_string(),
                    ))
                }
                _ => {}
            }
        }
        Ok(Self::from_client(http))
    }

    fn from_client(http: Arc<HttpClient>) -> Self {
        Self {
            locks: Arc::new(HttpLockService::new(http.clone())),
            problems: Arc::new(HttpProblemService::new(http.clone())),
            contests: Arc::new(HttpContestService::new(http)),
        }
    }

    pub fn in_memory(backend: Arc<InMemoryBackend>) -> Self {
        Self {
            locks: backend.clone(),
            problems: backend.clone(),
            contests: backend,
        }
    }
}
