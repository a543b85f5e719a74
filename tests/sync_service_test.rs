mod common;

use std::fs;
use std::sync::Arc;

use assignment_sync::canvas::{AssignmentFields, AssignmentRequest, OverrideFields, OverrideRequest, RawQuiz};
use assignment_sync::error::AppError;
use assignment_sync::services::SyncService;
use common::{Call, HEADER_TAIL, MemoryCanvasClient, assignment, central, lab_override, section};
use tempfile::tempdir;

fn three_lab_course() -> MemoryCanvasClient {
    MemoryCanvasClient {
        sections: vec![
            section(101, "Lab 301"),
            section(1, "Lecture 001"),
            section(102, "Lab 302"),
            section(103, "Lab 303"),
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_download_writes_sorted_sheet() {
    let mut canvas = three_lab_course();
    canvas.assignments = vec![
        assignment(2, "Postlab 1", Some("2024-01-10T15:00:00Z")),
        assignment(1, "Prelab 1", Some("2024-01-08T15:00:00Z")),
        assignment(3, "Syllabus quiz", None),
    ];
    canvas.overrides.insert(
        2,
        vec![lab_override(500, 102, "Lab 302", "2024-01-11T15:00:00Z")],
    );
    canvas.quizzes = vec![RawQuiz {
        id: 40,
        title: "Syllabus quiz".to_string(),
        assignment_id: Some(3),
        due_at: None,
        unlock_at: None,
        lock_at: None,
        published: true,
    }];

    let dir = tempdir().unwrap();
    let path = dir.path().join("assignments.tsv");
    let service = SyncService::with_timezone(Arc::new(canvas), central());

    let stats = service.download(&path).await.expect("download failed");

    assert_eq!(stats.assignments_written, 3);
    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], format!("Title\tLab 301\tLab 302\tLab 303\t{}", HEADER_TAIL));
    assert_eq!(lines[1], "Syllabus quiz\t\t\t\t\t\t1\t0\t3");
    assert_eq!(
        lines[2],
        "Prelab 1\t01/08/2024 09:00:00\t01/08/2024 09:00:00\t01/08/2024 09:00:00\t\t\t1\t0\t1"
    );
    assert_eq!(
        lines[3],
        "Postlab 1\t01/10/2024 09:00:00\t01/11/2024 09:00:00\t01/10/2024 09:00:00\t\t\t1\t0\t2"
    );
}

#[tokio::test]
async fn test_reuploading_downloaded_sheet_changes_nothing() {
    let mut canvas = three_lab_course();
    canvas.assignments = vec![
        assignment(1, "Prelab 1", Some("2024-01-08T15:00:00Z")),
        assignment(2, "Postlab 1", None),
    ];
    canvas.overrides.insert(
        2,
        vec![
            lab_override(500, 101, "Lab 301", "2024-01-10T15:00:00Z"),
            lab_override(501, 102, "Lab 302", "2024-01-11T15:00:00Z"),
            lab_override(502, 103, "Lab 303", "2024-01-12T15:00:00Z"),
        ],
    );
    let canvas = Arc::new(canvas);
    let service = SyncService::with_timezone(canvas.clone(), central());

    let dir = tempdir().unwrap();
    let path = dir.path().join("assignments.tsv");
    service.download(&path).await.unwrap();
    let stats = service.upload(&path, false).await.unwrap();

    assert_eq!(stats.rows_read, 2);
    assert_eq!(stats.assignments_unchanged, 2);
    assert!(canvas.calls().is_empty(), "{:?}", canvas.calls());
}

#[tokio::test]
async fn test_shared_date_replaces_overrides_with_due_date() {
    let mut canvas = three_lab_course();
    canvas.assignments = vec![assignment(55, "Prelab 1", None)];
    canvas.overrides.insert(
        55,
        vec![
            lab_override(9001, 101, "Lab 301", "2024-01-08T15:00:00Z"),
            lab_override(9002, 102, "Lab 302", "2024-01-09T15:00:00Z"),
        ],
    );
    let canvas = Arc::new(canvas);

    let dir = tempdir().unwrap();
    let path = dir.path().join("edited.tsv");
    fs::write(
        &path,
        format!(
            "Title\tLab 301\tLab 302\tLab 303\t{}\n\
             Prelab 1\t1/1/2024 9:00\t1/1/2024 9:00\t1/1/2024 9:00\t\t\t1\t0\t55\n",
            HEADER_TAIL
        ),
    )
    .unwrap();

    let service = SyncService::with_timezone(canvas.clone(), central());
    let stats = service.upload(&path, false).await.unwrap();

    assert_eq!(
        canvas.calls(),
        vec![
            Call::DeleteOverride { assignment_id: 55, override_id: 9001 },
            Call::DeleteOverride { assignment_id: 55, override_id: 9002 },
            Call::EditAssignment {
                assignment_id: 55,
                request: AssignmentRequest {
                    assignment: AssignmentFields {
                        name: "Prelab 1".to_string(),
                        due_at: Some("2024-01-01T15:00:00Z".to_string()),
                        muted: false,
                        published: true,
                        lock_at: None,
                        unlock_at: None,
                    },
                },
            },
        ]
    );
    assert_eq!(stats.overrides_deleted, 2);
    assert_eq!(stats.overrides_created, 0);
    assert_eq!(stats.assignments_updated, 1);
}

fn two_lab_course() -> MemoryCanvasClient {
    MemoryCanvasClient {
        sections: vec![section(101, "Lab 301"), section(102, "Lab 302")],
        assignments: vec![assignment(55, "Prelab 1", Some("2024-01-01T15:00:00Z"))],
        ..Default::default()
    }
}

fn two_date_sheet() -> String {
    format!(
        "Title\tLab 301\tLab 302\t{}\n\
         Prelab 1\t1/1/2024 9:00\t1/2/2024 9:00\t\t1/20/2024 23:59\t1\t0\t55\n",
        HEADER_TAIL
    )
}

fn expected_override(section_id: u64, due: &str) -> Call {
    Call::CreateOverride {
        assignment_id: 55,
        request: OverrideRequest {
            assignment_override: OverrideFields {
                course_section_id: section_id,
                due_at: Some(due.to_string()),
                lock_at: Some("2024-01-21T05:59:59Z".to_string()),
                unlock_at: None,
            },
        },
    }
}

#[tokio::test]
async fn test_distinct_dates_create_one_override_per_section() {
    let canvas = Arc::new(two_lab_course());
    let dir = tempdir().unwrap();
    let path = dir.path().join("edited.tsv");
    fs::write(&path, two_date_sheet()).unwrap();

    let service = SyncService::with_timezone(canvas.clone(), central());
    let stats = service.upload(&path, false).await.unwrap();

    let calls = canvas.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], expected_override(101, "2024-01-01T15:00:00Z"));
    assert_eq!(calls[1], expected_override(102, "2024-01-02T15:00:00Z"));
    match &calls[2] {
        Call::EditAssignment { assignment_id, request } => {
            assert_eq!(*assignment_id, 55);
            assert_eq!(request.assignment.due_at, None);
            assert_eq!(
                request.assignment.lock_at.as_deref(),
                Some("2024-01-21T05:59:59Z")
            );
        }
        other => panic!("expected an assignment edit, got {:?}", other),
    }
    assert_eq!(stats.overrides_created, 2);
}

#[tokio::test]
async fn test_failed_override_does_not_stop_assignment_edit() {
    let mut course = two_lab_course();
    course.failing_sections = vec![101];
    let canvas = Arc::new(course);
    let dir = tempdir().unwrap();
    let path = dir.path().join("edited.tsv");
    fs::write(&path, two_date_sheet()).unwrap();

    let service = SyncService::with_timezone(canvas.clone(), central());
    let stats = service.upload(&path, false).await.unwrap();

    let calls = canvas.calls();
    assert_eq!(calls[0], expected_override(102, "2024-01-02T15:00:00Z"));
    assert!(matches!(calls[1], Call::EditAssignment { assignment_id: 55, .. }));
    assert_eq!(stats.overrides_created, 1);
    assert_eq!(stats.overrides_failed, 1);
    assert_eq!(stats.assignments_updated, 1);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let canvas = Arc::new(two_lab_course());
    let dir = tempdir().unwrap();
    let path = dir.path().join("edited.tsv");
    fs::write(&path, two_date_sheet()).unwrap();

    let service = SyncService::with_timezone(canvas.clone(), central());
    let stats = service.upload(&path, true).await.unwrap();

    assert!(canvas.calls().is_empty());
    assert_eq!(stats.assignments_updated, 1);
}

#[tokio::test]
async fn test_unknown_canvas_id_aborts_before_writing() {
    let canvas = Arc::new(two_lab_course());
    let dir = tempdir().unwrap();
    let path = dir.path().join("edited.tsv");
    let mut text = two_date_sheet();
    text.push_str("Ghost\t1/3/2024 9:00\t1/3/2024 9:00\t\t\t1\t0\t999\n");
    fs::write(&path, text).unwrap();

    let service = SyncService::with_timezone(canvas.clone(), central());
    let result = service.upload(&path, false).await;

    assert!(matches!(result, Err(AppError::UnknownAssignment(999))));
    assert!(canvas.calls().is_empty());
}

#[tokio::test]
async fn test_course_without_lab_sections_uploads_nothing() {
    let canvas = Arc::new(MemoryCanvasClient {
        sections: vec![section(1, "Lecture 001")],
        assignments: vec![assignment(55, "Prelab 1", Some("2024-01-01T15:00:00Z"))],
        ..Default::default()
    });
    let service = SyncService::with_timezone(canvas.clone(), central());

    let dir = tempdir().unwrap();
    let path = dir.path().join("assignments.tsv");
    service.download(&path).await.unwrap();
    let result = service.upload(&path, false).await;

    assert!(matches!(result, Err(AppError::Sheet(_))), "{:?}", result);
    assert!(canvas.calls().is_empty(), "{:?}", canvas.calls());
}

#[tokio::test]
async fn test_name_with_surrounding_spaces_survives_round_trip() {
    let canvas = Arc::new(MemoryCanvasClient {
        sections: vec![section(101, "Lab 301")],
        assignments: vec![assignment(55, "Prelab 1 ", Some("2024-01-01T15:00:00Z"))],
        ..Default::default()
    });
    let service = SyncService::with_timezone(canvas.clone(), central());

    let dir = tempdir().unwrap();
    let path = dir.path().join("assignments.tsv");
    service.download(&path).await.unwrap();
    let stats = service.upload(&path, false).await.unwrap();

    assert_eq!(stats.assignments_unchanged, 1);
    assert!(canvas.calls().is_empty(), "{:?}", canvas.calls());
}
