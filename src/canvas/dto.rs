use serde::{Deserialize, Serialize};

/// Fields kept from a section listing.
pub const SECTION_FIELDS: &[&str] = &["id", "name"];

/// Fields kept from an assignment listing.
pub const ASSIGNMENT_FIELDS: &[&str] = &[
    "id",
    "name",
    "due_at",
    "unlock_at",
    "lock_at",
    "published",
    "muted",
    "is_quiz_assignment",
    "quiz_id",
];

/// Fields kept from an override listing.
pub const OVERRIDE_FIELDS: &[&str] = &["id", "due_at", "course_section_id", "title"];

#[derive(Debug, Clone, Deserialize)]
pub struct Section {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAssignment {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub unlock_at: Option<String>,
    #[serde(default)]
    pub lock_at: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub muted: bool,
    #[serde(default)]
    pub is_quiz_assignment: bool,
    #[serde(default)]
    pub quiz_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawQuiz {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub assignment_id: Option<u64>,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub unlock_at: Option<String>,
    #[serde(default)]
    pub lock_at: Option<String>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawOverride {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub course_section_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct QuizOverridesResponse {
    pub quiz_assignment_overrides: Vec<QuizAssignmentOverrides>,
}

#[derive(Debug, Deserialize)]
pub struct QuizAssignmentOverrides {
    pub quiz_id: u64,
    #[serde(default)]
    pub due_dates: Vec<QuizDueDate>,
}

#[derive(Debug, Deserialize)]
pub struct QuizDueDate {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub unlock_at: Option<String>,
    #[serde(default)]
    pub lock_at: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub base: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverrideRequest {
    pub assignment_override: OverrideFields,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverrideFields {
    pub course_section_id: u64,
    pub due_at: Option<String>,
    pub lock_at: Option<String>,
    pub unlock_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentRequest {
    pub assignment: AssignmentFields,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentFields {
    pub name: String,
    pub due_at: Option<String>,
    pub muted: bool,
    pub published: bool,
    pub lock_at: Option<String>,
    pub unlock_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizRequest {
    pub quiz: QuizFields,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizFields {
    pub title: String,
    pub due_at: Option<String>,
    pub published: bool,
    pub lock_at: Option<String>,
    pub unlock_at: Option<String>,
}

/// Empty strings go over the wire as `null`.
pub fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
