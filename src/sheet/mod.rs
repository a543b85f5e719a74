pub mod timestamp;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Display;

use chrono::TimeZone;

use crate::error::AppError;
use crate::models::{Assignment, AssignmentUpdate, Field, LabSection};

pub const TITLE: &str = "Title";
pub const AVAILABLE_FROM: &str = "Available from";
pub const AVAILABLE_UNTIL: &str = "Available until";
pub const PUBLISHED: &str = "Published";
pub const MUTED: &str = "Muted";
pub const CANVAS_ID: &str = "Canvas ID";

/// One data row of an uploaded spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub canvas_id: u64,
    pub update: AssignmentUpdate,
}

fn columns(sections: &[LabSection]) -> Vec<(String, Field)> {
    let mut columns = vec![(TITLE.to_string(), Field::Name)];
    columns.extend(sections.iter().map(|s| (s.name.clone(), Field::Section(s.id))));
    columns.extend([
        (AVAILABLE_FROM.to_string(), Field::Unlock),
        (AVAILABLE_UNTIL.to_string(), Field::Lock),
        (PUBLISHED.to_string(), Field::Published),
        (MUTED.to_string(), Field::Muted),
        (CANVAS_ID.to_string(), Field::Id),
    ]);
    columns
}

fn is_date(field: Field) -> bool {
    matches!(
        field,
        Field::Due | Field::Unlock | Field::Lock | Field::Section(_)
    )
}

/// Renders assignments as a tab-separated sheet, one column per lab
/// section in `sections` order, with dates shown in `tz`.
pub fn render_sheet<Tz>(
    assignments: &[Assignment],
    sections: &[LabSection],
    tz: &Tz,
) -> Result<String, AppError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let columns = columns(sections);

    let header: Vec<String> = columns.iter().map(|(name, _)| clean(name)).collect();
    let mut out = header.join("\t");
    out.push('\n');

    for assignment in assignments {
        let mut cells = Vec::with_capacity(columns.len());
        for (_, field) in &columns {
            let mut cell = assignment.get(*field)?.to_string();
            if cell.eq_ignore_ascii_case("none") {
                cell.clear();
            }
            if is_date(*field) && timestamp::is_iso(&cell) {
                cell = timestamp::iso_to_local_in(&cell, tz)?;
            }
            cells.push(clean(&cell));
        }
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }

    Ok(out)
}

// Tabs and line breaks would split the cell.
fn clean(cell: &str) -> String {
    cell.replace(['\t', '\r', '\n'], " ")
}

/// Parses a sheet produced by [`render_sheet`] (possibly edited) into one
/// candidate update per row, with dates converted from `tz` to UTC.
pub fn parse_sheet<Tz: TimeZone>(
    text: &str,
    sections: &[LabSection],
    tz: &Tz,
) -> Result<Vec<ParsedRow>, AppError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines
        .next()
        .ok_or_else(|| AppError::Sheet("file has no header row".to_string()))?;
    let headers: Vec<&str> = header_line
        .trim_start_matches('\u{feff}')
        .split('\t')
        .map(str::trim)
        .collect();

    let index: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (*h, i))
        .collect();
    let column = |name: &str| {
        index
            .get(name)
            .copied()
            .ok_or_else(|| AppError::Sheet(format!("missing column \"{}\"", name)))
    };

    let title = column(TITLE)?;
    let available_from = column(AVAILABLE_FROM)?;
    let available_until = column(AVAILABLE_UNTIL)?;
    let published = column(PUBLISHED)?;
    let muted = column(MUTED)?;
    let canvas_id = column(CANVAS_ID)?;
    if sections.is_empty() {
        return Err(AppError::Sheet(
            "course has no lab sections, so the sheet has no due date columns".to_string(),
        ));
    }
    let section_columns = section_columns(&headers, sections)?;

    let mut rows = Vec::new();
    for (line_no, line) in lines {
        let row = line_no + 1;
        let cells: Vec<&str> = line.split('\t').collect();
        let raw = |i: usize| cells.get(i).copied().unwrap_or("");
        let cell = |i: usize| raw(i).trim();

        let mut dates = BTreeMap::new();
        for (section_id, i) in &section_columns {
            dates.insert(*section_id, timestamp::local_to_iso_in(cell(*i), tz)?);
        }

        let distinct: BTreeSet<&String> = dates.values().collect();
        let single_due_date = distinct.len() <= 1;
        let due = if single_due_date {
            let shared = distinct.into_iter().next().cloned().unwrap_or_default();
            dates.values_mut().for_each(String::clear);
            shared
        } else {
            String::new()
        };

        let id_text = cell(canvas_id);
        let id = id_text.parse::<u64>().map_err(|_| {
            AppError::Sheet(format!("row {}: invalid Canvas ID {:?}", row, id_text))
        })?;

        rows.push(ParsedRow {
            canvas_id: id,
            update: AssignmentUpdate {
                // Canvas keeps surrounding spaces in names.
                name: raw(title).to_string(),
                due,
                muted: parse_flag(cell(muted), row, MUTED)?,
                published: parse_flag(cell(published), row, PUBLISHED)?,
                sections: dates,
                lock: timestamp::local_to_iso_in(cell(available_until), tz)?,
                unlock: timestamp::local_to_iso_in(cell(available_from), tz)?,
                single_due_date,
            },
        });
    }

    Ok(rows)
}

/// Finds each section's column: an exact header match first, otherwise the
/// first header containing the section name.
fn section_columns(headers: &[&str], sections: &[LabSection]) -> Result<Vec<(u64, usize)>, AppError> {
    sections
        .iter()
        .map(|s| {
            headers
                .iter()
                .position(|h| *h == s.name)
                .or_else(|| headers.iter().position(|h| h.contains(s.name.as_str())))
                .map(|i| (s.id, i))
                .ok_or_else(|| AppError::Sheet(format!("missing column for section \"{}\"", s.name)))
        })
        .collect()
}

fn parse_flag(value: &str, row: usize, column: &str) -> Result<bool, AppError> {
    if let Ok(n) = value.parse::<i64>() {
        return Ok(n != 0);
    }
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(AppError::Sheet(format!(
            "row {}: {} must be 0 or 1, got {:?}",
            row, column, value
        ))),
    }
}
