use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use crate::canvas::dto::non_empty;
use crate::canvas::{
    AssignmentFields, AssignmentRequest, CanvasClient, OverrideFields, OverrideRequest,
    RawAssignment, RawOverride,
};
use crate::error::AppError;
use crate::models::section::{LabSection, is_lab};

/// One lab section's view of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionEntry {
    pub section_id: u64,
    pub name: String,
    /// Due date carried by this section's override, if it has one.
    pub due: Option<String>,
    pub override_id: Option<u64>,
}

impl SectionEntry {
    pub fn has_override(&self) -> bool {
        self.override_id.is_some()
    }
}

/// Fields readable through [`Assignment::get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Due,
    Id,
    Overrides,
    Muted,
    Published,
    Unlock,
    Lock,
    /// Effective due date for one section.
    Section(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Id(u64),
    Overrides(Vec<RawOverride>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Flag(flag) => f.write_str(if *flag { "1" } else { "0" }),
            FieldValue::Id(id) => write!(f, "{}", id),
            FieldValue::Overrides(overrides) => write!(f, "{} overrides", overrides.len()),
        }
    }
}

/// An assignment (or quiz assignment) as Canvas currently has it.
///
/// Every lab section of the course has an entry in `sections`, whether or
/// not an override exists for it.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub id: u64,
    pub name: String,
    pub due: Option<String>,
    pub unlock: Option<String>,
    pub lock: Option<String>,
    pub published: bool,
    pub muted: bool,
    pub overrides: Vec<RawOverride>,
    pub sections: Vec<SectionEntry>,
}

impl Assignment {
    /// Builds the assignment from its raw payload and override list.
    /// Overrides that are not titled as labs or that target a section
    /// outside `lab_sections` are dropped.
    pub fn new(raw: RawAssignment, overrides: Vec<RawOverride>, lab_sections: &[LabSection]) -> Self {
        let mut sections: Vec<SectionEntry> = lab_sections
            .iter()
            .map(|s| SectionEntry {
                section_id: s.id,
                name: s.name.clone(),
                due: None,
                override_id: None,
            })
            .collect();

        let mut kept = Vec::new();
        for o in overrides {
            if !is_lab(&o.title) {
                continue;
            }
            let entry = o
                .course_section_id
                .and_then(|id| sections.iter_mut().find(|s| s.section_id == id));
            match entry {
                Some(entry) => {
                    entry.due = o.due_at.clone();
                    entry.override_id = Some(o.id);
                    kept.push(o);
                }
                None => debug!(
                    "Ignoring override {} on \"{}\": not a lab section",
                    o.id, raw.name
                ),
            }
        }

        Self {
            id: raw.id,
            name: raw.name,
            due: raw.due_at,
            unlock: raw.unlock_at,
            lock: raw.lock_at,
            published: raw.published,
            muted: raw.muted,
            overrides: kept,
            sections,
        }
    }

    pub fn section(&self, section_id: u64) -> Option<&SectionEntry> {
        self.sections.iter().find(|s| s.section_id == section_id)
    }

    pub fn get(&self, field: Field) -> Result<FieldValue, AppError> {
        let value = match field {
            Field::Name => FieldValue::Text(self.name.clone()),
            Field::Due => FieldValue::Text(text(&self.due)),
            Field::Id => FieldValue::Id(self.id),
            Field::Overrides => FieldValue::Overrides(self.overrides.clone()),
            Field::Muted => FieldValue::Flag(self.muted),
            Field::Published => FieldValue::Flag(self.published),
            Field::Unlock => FieldValue::Text(text(&self.unlock)),
            Field::Lock => FieldValue::Text(text(&self.lock)),
            Field::Section(id) => FieldValue::Text(self.effective_due(id)?),
        };
        Ok(value)
    }

    /// The date a section actually sees: its override's date when it has
    /// an override, otherwise the assignment due date. Empty when neither.
    pub fn effective_due(&self, section_id: u64) -> Result<String, AppError> {
        let entry = self.section(section_id).ok_or_else(|| {
            AppError::Lookup(format!(
                "section {} is not a lab section of \"{}\"",
                section_id, self.name
            ))
        })?;

        if entry.has_override() {
            Ok(text(&entry.due))
        } else {
            Ok(text(&self.due))
        }
    }

    /// The assignment's own values in candidate form.
    pub fn state(&self) -> AssignmentUpdate {
        AssignmentUpdate {
            name: self.name.clone(),
            due: text(&self.due),
            muted: self.muted,
            published: self.published,
            sections: self
                .sections
                .iter()
                .map(|s| (s.section_id, text(&s.due)))
                .collect(),
            lock: text(&self.lock),
            unlock: text(&self.unlock),
            single_due_date: self.overrides.is_empty(),
        }
    }

    pub fn compare(&self, other: &AssignmentUpdate) -> Comparison {
        Comparison {
            name: self.name == other.name,
            due: text(&self.due) == other.due,
            muted: self.muted == other.muted,
            published: self.published == other.published,
            sections: self.sections_match(&other.sections),
            lock: text(&self.lock) == other.lock,
            unlock: text(&self.unlock) == other.unlock,
        }
    }

    // A section with no override only matches an empty candidate.
    fn sections_match(&self, candidates: &BTreeMap<u64, String>) -> bool {
        candidates.iter().all(|(id, candidate)| match self.section(*id) {
            Some(entry) => text(&entry.due) == *candidate,
            None => false,
        })
    }

    /// Deletes every override this assignment carries. Failures are logged
    /// and skipped. Returns `(deleted, failed)`.
    pub async fn delete_overrides(&self, canvas: &dyn CanvasClient) -> (usize, usize) {
        let mut deleted = 0;
        let mut failed = 0;
        for o in &self.overrides {
            match canvas.delete_override(self.id, o.id).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    warn!(
                        "Failed to delete override {} of \"{}\": {}",
                        o.id, self.name, e
                    );
                    failed += 1;
                }
            }
        }
        (deleted, failed)
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "\tdue_date:\n\t\t{}", self.due.as_deref().unwrap_or("None"))?;
        writeln!(f, "\tsections:")?;
        for s in &self.sections {
            writeln!(f, "\t\t{}-> {}", s.name, s.due.as_deref().unwrap_or("None"))?;
        }
        writeln!(f, "\tpublished:\n\t\t{}", self.published)?;
        writeln!(f, "\tlock:\n\t\t{}", self.lock.as_deref().unwrap_or("None"))?;
        write!(f, "\tunlock:\n\t\t{}", self.unlock.as_deref().unwrap_or("None"))
    }
}

/// Candidate values for an assignment, read from one spreadsheet row.
/// Dates are ISO-8601 UTC strings, empty meaning "no date".
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentUpdate {
    pub name: String,
    pub due: String,
    pub muted: bool,
    pub published: bool,
    pub sections: BTreeMap<u64, String>,
    pub lock: String,
    pub unlock: String,
    /// All sections share `due`; no overrides are needed.
    pub single_due_date: bool,
}

impl AssignmentUpdate {
    /// The override to create for `section_id`, or `None` when the section
    /// is covered by the shared due date or has no date.
    pub fn override_request(&self, section_id: u64) -> Option<OverrideRequest> {
        if self.single_due_date {
            return None;
        }
        let due = self.sections.get(&section_id).filter(|d| !d.is_empty())?;
        Some(OverrideRequest {
            assignment_override: OverrideFields {
                course_section_id: section_id,
                due_at: Some(due.clone()),
                lock_at: non_empty(&self.lock),
                unlock_at: non_empty(&self.unlock),
            },
        })
    }

    pub fn assignment_request(&self) -> AssignmentRequest {
        AssignmentRequest {
            assignment: AssignmentFields {
                name: self.name.clone(),
                due_at: non_empty(&self.due),
                muted: self.muted,
                published: self.published,
                lock_at: non_empty(&self.lock),
                unlock_at: non_empty(&self.unlock),
            },
        }
    }
}

/// Per-field result of [`Assignment::compare`]; `true` means unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    pub name: bool,
    pub due: bool,
    pub muted: bool,
    pub published: bool,
    pub sections: bool,
    pub lock: bool,
    pub unlock: bool,
}

impl Comparison {
    pub fn entries(&self) -> [(&'static str, bool); 7] {
        [
            ("name", self.name),
            ("due", self.due),
            ("muted", self.muted),
            ("published", self.published),
            ("sections", self.sections),
            ("lock", self.lock),
            ("unlock", self.unlock),
        ]
    }

    pub fn is_unchanged(&self) -> bool {
        self.entries().iter().all(|(_, same)| *same)
    }

    pub fn changed_fields(&self) -> Vec<&'static str> {
        self.entries()
            .iter()
            .filter(|(_, same)| !same)
            .map(|(name, _)| *name)
            .collect()
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}
