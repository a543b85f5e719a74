#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use assignment_sync::canvas::{
    AssignmentRequest, CanvasClient, OverrideRequest, QuizAssignmentOverrides, QuizRequest,
    RawAssignment, RawOverride, RawQuiz, Section,
};
use assignment_sync::error::{ApiError, AppError};
use async_trait::async_trait;
use chrono::FixedOffset;

/// A write the sync service issued against Canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    DeleteOverride { assignment_id: u64, override_id: u64 },
    CreateOverride { assignment_id: u64, request: OverrideRequest },
    EditAssignment { assignment_id: u64, request: AssignmentRequest },
}

/// A course held in memory. Reads come from the fields, writes are recorded.
#[derive(Default)]
pub struct MemoryCanvasClient {
    pub sections: Vec<Section>,
    pub assignments: Vec<RawAssignment>,
    pub quizzes: Vec<RawQuiz>,
    pub overrides: HashMap<u64, Vec<RawOverride>>,
    /// Override creation for these section IDs answers 400.
    pub failing_sections: Vec<u64>,
    pub calls: Mutex<Vec<Call>>,
}

impl MemoryCanvasClient {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn not_found() -> AppError {
    AppError::Api(ApiError {
        status: 404,
        reason: "Not Found".to_string(),
        body: r#"{"errors":[{"message":"The specified resource does not exist."}]}"#.to_string(),
    })
}

#[async_trait]
impl CanvasClient for MemoryCanvasClient {
    async fn list_sections(&self) -> Result<Vec<Section>, AppError> {
        Ok(self.sections.clone())
    }

    async fn list_assignments(&self) -> Result<Vec<RawAssignment>, AppError> {
        Ok(self.assignments.clone())
    }

    async fn list_quizzes(&self) -> Result<Vec<RawQuiz>, AppError> {
        Ok(self.quizzes.clone())
    }

    async fn get_assignment(&self, assignment_id: u64) -> Result<RawAssignment, AppError> {
        self.assignments
            .iter()
            .find(|a| a.id == assignment_id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn get_quiz(&self, quiz_id: u64) -> Result<RawQuiz, AppError> {
        self.quizzes
            .iter()
            .find(|q| q.id == quiz_id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn create_assignment(&self, _request: &AssignmentRequest) -> Result<RawAssignment, AppError> {
        Err(not_found())
    }

    async fn edit_assignment(
        &self,
        assignment_id: u64,
        request: &AssignmentRequest,
    ) -> Result<RawAssignment, AppError> {
        let mut assignment = self.get_assignment(assignment_id).await?;
        self.record(Call::EditAssignment {
            assignment_id,
            request: request.clone(),
        });
        assignment.name = request.assignment.name.clone();
        assignment.due_at = request.assignment.due_at.clone();
        Ok(assignment)
    }

    async fn create_quiz(&self, _request: &QuizRequest) -> Result<RawQuiz, AppError> {
        Err(not_found())
    }

    async fn edit_quiz(&self, quiz_id: u64, _request: &QuizRequest) -> Result<RawQuiz, AppError> {
        self.get_quiz(quiz_id).await
    }

    async fn list_overrides(&self, assignment_id: u64) -> Result<Vec<RawOverride>, AppError> {
        Ok(self.overrides.get(&assignment_id).cloned().unwrap_or_default())
    }

    async fn create_override(
        &self,
        assignment_id: u64,
        request: &OverrideRequest,
    ) -> Result<RawOverride, AppError> {
        let fields = &request.assignment_override;
        if self.failing_sections.contains(&fields.course_section_id) {
            return Err(AppError::Api(ApiError {
                status: 400,
                reason: "Bad Request".to_string(),
                body: r#"{"errors":{"due_at":[{"message":"must be between lock dates"}]}}"#
                    .to_string(),
            }));
        }
        self.record(Call::CreateOverride {
            assignment_id,
            request: request.clone(),
        });
        Ok(RawOverride {
            id: 90_000 + fields.course_section_id,
            title: String::new(),
            due_at: fields.due_at.clone(),
            course_section_id: Some(fields.course_section_id),
        })
    }

    async fn delete_override(&self, assignment_id: u64, override_id: u64) -> Result<(), AppError> {
        self.record(Call::DeleteOverride {
            assignment_id,
            override_id,
        });
        Ok(())
    }

    async fn list_quiz_overrides(&self) -> Result<Vec<QuizAssignmentOverrides>, AppError> {
        Ok(Vec::new())
    }
}

pub fn central() -> FixedOffset {
    FixedOffset::west_opt(6 * 3600).unwrap()
}

pub fn section(id: u64, name: &str) -> Section {
    Section {
        id,
        name: name.to_string(),
    }
}

pub fn assignment(id: u64, name: &str, due: Option<&str>) -> RawAssignment {
    RawAssignment {
        id,
        name: name.to_string(),
        due_at: due.map(str::to_string),
        unlock_at: None,
        lock_at: None,
        published: true,
        muted: false,
        is_quiz_assignment: false,
        quiz_id: None,
    }
}

pub fn lab_override(id: u64, section_id: u64, title: &str, due: &str) -> RawOverride {
    RawOverride {
        id,
        title: title.to_string(),
        due_at: Some(due.to_string()),
        course_section_id: Some(section_id),
    }
}

pub const HEADER_TAIL: &str = "Available from\tAvailable until\tPublished\tMuted\tCanvas ID";
