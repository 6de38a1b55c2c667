use async_trait::async_trait;
use std::sync::Arc;

use crate::api::errors::ApiError;
use crate::api::http::HttpClient;
use crate::api::types::{Contest, CreateContestRequest};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

const CONTESTS_PATH: &str = "/contests";

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ContestService: Send + Sync {
    async fn create(&self, request: &CreateContestRequest) -> Result<Contest, ApiError>;
}

pub struct HttpContestService {
    http: Arc<HttpClient>,
}

impl HttpContestService {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ContestService for HttpContestService {
    async fn create(&self, request: &CreateContestRequest) -> Result<Contest, ApiError> {
        self.http.post(CONTESTS_PATH, request).await
    }
}
