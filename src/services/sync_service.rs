use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{Local, TimeZone};
use tracing::{debug, info, warn};

use crate::canvas::{CanvasClient, RawQuiz};
use crate::error::AppError;
use crate::models::{Assignment, AssignmentUpdate, LabSection, lab_sections};
use crate::sheet;

pub struct SyncService<Tz: TimeZone = Local> {
    canvas: Arc<dyn CanvasClient>,
    tz: Tz,
}

#[derive(Debug, Default)]
pub struct SyncStats {
    pub assignments_written: usize,
    pub rows_read: usize,
    pub assignments_updated: usize,
    pub assignments_unchanged: usize,
    pub assignments_failed: usize,
    pub overrides_deleted: usize,
    pub overrides_created: usize,
    pub overrides_failed: usize,
}

/// Everything one sync pass needs to know about the course.
pub struct CourseState {
    pub sections: Vec<LabSection>,
    pub assignments: Vec<Assignment>,
    pub quizzes: Vec<RawQuiz>,
}

impl SyncService<Local> {
    pub fn new(canvas: Arc<dyn CanvasClient>) -> Self {
        Self { canvas, tz: Local }
    }
}

impl<Tz> SyncService<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    /// Uses `tz` instead of the system timezone for spreadsheet dates.
    pub fn with_timezone(canvas: Arc<dyn CanvasClient>, tz: Tz) -> Self {
        Self { canvas, tz }
    }

    pub async fn fetch_course(&self) -> Result<CourseState, AppError> {
        info!("Step 1: Fetching lab sections");
        let sections = lab_sections(self.canvas.list_sections().await?);
        info!("Found {} lab sections", sections.len());

        info!("Step 2: Fetching quizzes and assignments");
        let quizzes = self.canvas.list_quizzes().await?;
        let raw_assignments = self.canvas.list_assignments().await?;

        info!("Step 3: Fetching overrides");
        let mut assignments = Vec::with_capacity(raw_assignments.len());
        for raw in raw_assignments {
            let overrides = self.canvas.list_overrides(raw.id).await?;
            let assignment = Assignment::new(raw, overrides, &sections);
            debug!("{}", assignment);
            assignments.push(assignment);
        }

        let quiz_backed = assignments
            .iter()
            .filter(|a| quizzes.iter().any(|q| q.assignment_id == Some(a.id)))
            .count();
        info!(
            "Fetched {} assignments ({} quizzes, {} matched)",
            assignments.len(),
            quizzes.len(),
            quiz_backed
        );

        Ok(CourseState {
            sections,
            assignments,
            quizzes,
        })
    }

    /// Writes every assignment of the course to a spreadsheet at `path`.
    pub async fn download(&self, path: &Path) -> Result<SyncStats, AppError> {
        let mut course = self.fetch_course().await?;

        // Sorted by the first lab section's date; all sections usually agree.
        if let Some(key_section) = course.sections.first() {
            course
                .assignments
                .sort_by_key(|a| a.effective_due(key_section.id).unwrap_or_default());
        }

        info!("Step 4: Writing {}", path.display());
        let text = sheet::render_sheet(&course.assignments, &course.sections, &self.tz)?;
        fs::write(path, text)?;

        let stats = SyncStats {
            assignments_written: course.assignments.len(),
            ..Default::default()
        };
        info!("Download completed: {:?}", stats);
        Ok(stats)
    }

    /// Pushes every row of the spreadsheet at `path` that differs from
    /// Canvas. With `dry_run` nothing is written.
    pub async fn upload(&self, path: &Path, dry_run: bool) -> Result<SyncStats, AppError> {
        let course = self.fetch_course().await?;
        let existing: HashMap<u64, &Assignment> =
            course.assignments.iter().map(|a| (a.id, a)).collect();

        info!("Step 4: Reading {}", path.display());
        let text = fs::read_to_string(path)?;
        let rows = sheet::parse_sheet(&text, &course.sections, &self.tz)?;

        // Resolve every row before the first write.
        let pairs = rows
            .iter()
            .map(|row| {
                existing
                    .get(&row.canvas_id)
                    .map(|a| (*a, &row.update))
                    .ok_or(AppError::UnknownAssignment(row.canvas_id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!("Step 5: Uploading changed assignments");
        let mut stats = SyncStats {
            rows_read: rows.len(),
            ..Default::default()
        };

        for (assignment, update) in pairs {
            let comparison = assignment.compare(update);
            if comparison.is_unchanged() {
                stats.assignments_unchanged += 1;
                continue;
            }

            let changed = comparison.changed_fields().join(", ");
            if dry_run {
                info!("[DRY RUN] Would update \"{}\" ({})", assignment.name, changed);
                stats.assignments_updated += 1;
                continue;
            }

            debug!("Updating \"{}\" ({})", assignment.name, changed);
            self.push_update(assignment, update, &mut stats).await;
        }

        info!("Upload completed: {:?}", stats);
        Ok(stats)
    }

    /// Replaces the assignment's overrides and then edits the assignment.
    /// Individual failures are logged and counted, not returned.
    async fn push_update(&self, assignment: &Assignment, update: &AssignmentUpdate, stats: &mut SyncStats) {
        let (deleted, failed) = assignment.delete_overrides(self.canvas.as_ref()).await;
        stats.overrides_deleted += deleted;
        stats.overrides_failed += failed;

        for section in &assignment.sections {
            let Some(request) = update.override_request(section.section_id) else {
                continue;
            };
            match self.canvas.create_override(assignment.id, &request).await {
                Ok(_) => stats.overrides_created += 1,
                Err(e) => {
                    warn!(
                        "--> Assignment: \"{}\" due date for section \"{}\" not updated: {}",
                        assignment.name, section.name, e
                    );
                    stats.overrides_failed += 1;
                }
            }
        }

        match self
            .canvas
            .edit_assignment(assignment.id, &update.assignment_request())
            .await
        {
            Ok(_) => {
                info!("Assignment updated: {}", update.name);
                stats.assignments_updated += 1;
            }
            Err(e) => {
                warn!("Failed to update assignment \"{}\": {}", assignment.name, e);
                stats.assignments_failed += 1;
            }
        }
    }
}
