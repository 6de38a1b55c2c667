use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::api::errors::ApiError;
use crate::api::http::HttpClient;
use crate::api::types::{Problem, ProblemId, ProblemMetadataUpdate, SearchProblemsRequest};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

const PROBLEMS_PATH: &str = "/problems";
const PROBLEMS_SEARCH_PATH: &str = "/problems/search";

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ProblemService: Send + Sync {
    /// Full overwrite of the problem's metadata
    async fn update_metadata(
        &self,
        problem_id: ProblemId,
        update: &ProblemMetadataUpdate,
    ) -> Result<Problem, ApiError>;

    async fn search(&self, request: &SearchProblemsRequest) -> Result<Vec<Problem>, ApiError>;
}

pub struct HttpProblemService {
    http: Arc<HttpClient>,
}

impl HttpProblemService {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ProblemService for HttpProblemService {
    async fn update_metadata(
        &self,
        problem_id: ProblemId,
        update: &ProblemMetadataUpdate,
    ) -> Result<Problem, ApiError> {
        self.http
            .put(PROBLEMS_PATH, &[("id", problem_id.to_string())], update)
            .await
    }

    async fn search(&self, request: &SearchProblemsRequest) -> Result<Vec<Problem>, ApiError> {
        let payload: Value = self.http.post(PROBLEMS_SEARCH_PATH, request).await?;
        problems_from_payload(payload)
    }
}

/// The search endpoint answers either with an array or with an id-keyed object
fn problems_from_payload(payload: Value) -> Result<Vec<Problem>, ApiError> {
    let items = match payload {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        other => {
            return Err(ApiError::InvalidResponse {
                message: format!("unexpected problem search payload: {other}"),
            })
        }
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item).map_err(|e| ApiError::InvalidResponse {
                message: e.to_string(),
            })
        })
        .collect()
}
