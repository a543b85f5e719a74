pub mod dto;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::CanvasConfig;
use crate::error::{ApiError, AppError};

pub use dto::{
    AssignmentFields, AssignmentRequest, OverrideFields, OverrideRequest, QuizAssignmentOverrides,
    QuizFields, QuizRequest, RawAssignment, RawOverride, RawQuiz, Section,
};

/// Page size for every list endpoint. Larger courses are truncated.
pub const PER_PAGE: u32 = 100;

#[async_trait]
pub trait CanvasClient: Send + Sync {
    async fn list_sections(&self) -> Result<Vec<Section>, AppError>;
    /// Assignments with all override dates expanded.
    async fn list_assignments(&self) -> Result<Vec<RawAssignment>, AppError>;
    async fn list_quizzes(&self) -> Result<Vec<RawQuiz>, AppError>;
    async fn get_assignment(&self, assignment_id: u64) -> Result<RawAssignment, AppError>;
    async fn get_quiz(&self, quiz_id: u64) -> Result<RawQuiz, AppError>;
    async fn create_assignment(&self, request: &AssignmentRequest) -> Result<RawAssignment, AppError>;
    async fn edit_assignment(
        &self,
        assignment_id: u64,
        request: &AssignmentRequest,
    ) -> Result<RawAssignment, AppError>;
    async fn create_quiz(&self, request: &QuizRequest) -> Result<RawQuiz, AppError>;
    async fn edit_quiz(&self, quiz_id: u64, request: &QuizRequest) -> Result<RawQuiz, AppError>;
    async fn list_overrides(&self, assignment_id: u64) -> Result<Vec<RawOverride>, AppError>;
    async fn create_override(
        &self,
        assignment_id: u64,
        request: &OverrideRequest,
    ) -> Result<RawOverride, AppError>;
    async fn delete_override(&self, assignment_id: u64, override_id: u64) -> Result<(), AppError>;
    async fn list_quiz_overrides(&self) -> Result<Vec<QuizAssignmentOverrides>, AppError>;
}

pub struct CanvasHttpClient {
    client: Client,
    config: CanvasConfig,
}

impl CanvasHttpClient {
    pub fn new(config: CanvasConfig) -> Result<Self, AppError> {
        config.validate()?;
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    fn course_url(&self, path: &str) -> String {
        format!(
            "{}courses/{}/{}",
            self.config.api_root(),
            self.config.course_id,
            path
        )
    }

    async fn send(&self, method: Method, url: &str, body: Option<Value>) -> Result<Value, AppError> {
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), url)
            .header("Authorization", format!("Bearer {}", self.config.token));
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let err = ApiError {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                body: response.text().await.unwrap_or_default(),
            };
            tracing::error!("Error in response to {} {}: {}", method, url, err);
            return Err(AppError::Api(err));
        }

        let body_text = response.text().await?;
        if body_text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body_text)
            .map_err(|e| AppError::Decode(format!("{} (body: {})", e, body_text)))
    }

    async fn get_list<T: DeserializeOwned>(&self, url: &str, keep: &[&str]) -> Result<Vec<T>, AppError> {
        let value = self.send(Method::GET, url, None).await?;
        let records = value
            .as_array()
            .ok_or_else(|| AppError::Decode(format!("expected a JSON array from {}", url)))?;
        decode(Value::Array(filter_fields(records, keep)))
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| AppError::Decode(e.to_string()))
}

fn to_body<T: serde::Serialize>(request: &T) -> Result<Option<Value>, AppError> {
    Ok(Some(serde_json::to_value(request)?))
}

/// Returns copies of `records` holding only the fields named in `keep`.
/// Non-object records are copied through untouched.
pub fn filter_fields(records: &[Value], keep: &[&str]) -> Vec<Value> {
    records
        .iter()
        .map(|record| match record {
            Value::Object(fields) => Value::Object(
                fields
                    .iter()
                    .filter(|(key, _)| keep.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect::<Map<String, Value>>(),
            ),
            other => other.clone(),
        })
        .collect()
}

#[async_trait]
impl CanvasClient for CanvasHttpClient {
    async fn list_sections(&self) -> Result<Vec<Section>, AppError> {
        let url = self.course_url(&format!("sections?per_page={}", PER_PAGE));
        self.get_list(&url, dto::SECTION_FIELDS).await
    }

    async fn list_assignments(&self) -> Result<Vec<RawAssignment>, AppError> {
        let url = self.course_url(&format!("assignments?all_dates=1&per_page={}", PER_PAGE));
        self.get_list(&url, dto::ASSIGNMENT_FIELDS).await
    }

    async fn list_quizzes(&self) -> Result<Vec<RawQuiz>, AppError> {
        let url = self.course_url(&format!("quizzes?per_page={}", PER_PAGE));
        let value = self.send(Method::GET, &url, None).await?;
        decode(value)
    }

    async fn get_assignment(&self, assignment_id: u64) -> Result<RawAssignment, AppError> {
        let url = self.course_url(&format!("assignments/{}", assignment_id));
        decode(self.send(Method::GET, &url, None).await?)
    }

    async fn get_quiz(&self, quiz_id: u64) -> Result<RawQuiz, AppError> {
        let url = self.course_url(&format!("quizzes/{}", quiz_id));
        decode(self.send(Method::GET, &url, None).await?)
    }

    async fn create_assignment(&self, request: &AssignmentRequest) -> Result<RawAssignment, AppError> {
        let url = self.course_url("assignments");
        decode(self.send(Method::POST, &url, to_body(request)?).await?)
    }

    async fn edit_assignment(
        &self,
        assignment_id: u64,
        request: &AssignmentRequest,
    ) -> Result<RawAssignment, AppError> {
        let url = self.course_url(&format!("assignments/{}", assignment_id));
        decode(self.send(Method::PUT, &url, to_body(request)?).await?)
    }

    async fn create_quiz(&self, request: &QuizRequest) -> Result<RawQuiz, AppError> {
        let url = self.course_url("quizzes");
        decode(self.send(Method::POST, &url, to_body(request)?).await?)
    }

    async fn edit_quiz(&self, quiz_id: u64, request: &QuizRequest) -> Result<RawQuiz, AppError> {
        let url = self.course_url(&format!("quizzes/{}", quiz_id));
        decode(self.send(Method::PUT, &url, to_body(request)?).await?)
    }

    async fn list_overrides(&self, assignment_id: u64) -> Result<Vec<RawOverride>, AppError> {
        let url = self.course_url(&format!(
            "assignments/{}/overrides?per_page={}",
            assignment_id, PER_PAGE
        ));
        self.get_list(&url, dto::OVERRIDE_FIELDS).await
    }

    async fn create_override(
        &self,
        assignment_id: u64,
        request: &OverrideRequest,
    ) -> Result<RawOverride, AppError> {
        let url = self.course_url(&format!("assignments/{}/overrides", assignment_id));
        decode(self.send(Method::POST, &url, to_body(request)?).await?)
    }

    async fn delete_override(&self, assignment_id: u64, override_id: u64) -> Result<(), AppError> {
        let url = self.course_url(&format!(
            "assignments/{}/overrides/{}",
            assignment_id, override_id
        ));
        self.send(Method::DELETE, &url, None).await?;
        Ok(())
    }

    async fn list_quiz_overrides(&self) -> Result<Vec<QuizAssignmentOverrides>, AppError> {
        let url = self.course_url("quizzes/assignment_overrides");
        let response: dto::QuizOverridesResponse = decode(self.send(Method::GET, &url, None).await?)?;
        Ok(response.quiz_assignment_overrides)
    }
}
