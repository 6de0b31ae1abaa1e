//! Integration tests for the roster and its sheet service seam.

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, TimeZone, Utc};
use rollcall::prelude::*;
use rollcall::{ROSTER_HEADER, sheet_id_from_url};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Create { title: String, header: Vec<String> },
    Rename { id: String, title: String },
}

/// Records every call; optionally fails them all.
#[derive(Clone, Default)]
struct RecordingSheets {
    calls: Arc<Mutex<Vec<Call>>>,
    fail: bool,
}

impl RecordingSheets {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl RosterSheetService for RecordingSheets {
    async fn create_roster_sheet(&self, title: &str, header: &[&str]) -> Result<String, RosterError> {
        if self.fail {
            return Err(RosterError::Service("quota exceeded".into()));
        }
        self.calls.lock().unwrap().push(Call::Create {
            title: title.to_owned(),
            header: header.iter().map(|h| h.to_string()).collect(),
        });
        Ok("https://docs.google.com/spreadsheets/d/sheet42/edit#gid=0".to_owned())
    }

    async fn rename_roster_sheet(&self, sheet_id: &str, new_title: &str) -> Result<(), RosterError> {
        if self.fail {
            return Err(RosterError::Service("quota exceeded".into()));
        }
        self.calls.lock().unwrap().push(Call::Rename {
            id: sheet_id.to_owned(),
            title: new_title.to_owned(),
        });
        Ok(())
    }
}

fn descriptor() -> SessionDescriptor {
    SessionDescriptor::new(
        "CAS",
        LectureType::Lab,
        "Batch 2",
        NaiveDate::from_ymd_opt(2024, 11, 4).unwrap(),
        TimeSlot::starting_at(11).unwrap(),
    )
    .unwrap()
}

fn record(student_id: &str, minute: u32) -> AttendanceRecord {
    AttendanceRecord::present(
        student_id,
        Some(format!("Student {student_id}")),
        &LocationSample::new(18.5204, 73.8567, 0),
        Utc.with_ymd_and_hms(2024, 11, 4, 11, minute, 0).unwrap(),
    )
}

#[tokio::test]
async fn test_open_creates_titled_sheet_with_header_once() {
    let sheets = RecordingSheets::default();
    let mut roster = Roster::new(sheets.clone(), descriptor());

    let url = roster.open().await.unwrap().to_owned();
    assert_eq!(url, "https://docs.google.com/spreadsheets/d/sheet42/edit#gid=0");
    assert_eq!(roster.open().await.unwrap(), url);

    assert_eq!(
        sheets.calls(),
        vec![Call::Create {
            title: "CAS_Lab_Batch 2_11-12_2024_11_04".into(),
            header: ROSTER_HEADER.iter().map(|h| h.to_string()).collect(),
        }]
    );
    assert_eq!(roster.sheet_url(), Some(url.as_str()));
}

#[tokio::test]
async fn test_rename_uses_sheet_id_from_url() {
    let sheets = RecordingSheets::default();
    let mut roster = Roster::new(sheets.clone(), descriptor());

    roster.open().await.unwrap();
    roster.rename("CAS lab, week 10").await.unwrap();

    assert_eq!(roster.title(), "CAS lab, week 10");
    assert_eq!(
        sheets.calls().last(),
        Some(&Call::Rename {
            id: "sheet42".into(),
            title: "CAS lab, week 10".into(),
        })
    );
}

#[tokio::test]
async fn test_rename_before_open_fails() {
    let mut roster = Roster::new(RecordingSheets::default(), descriptor());
    assert_eq!(roster.rename("x").await.unwrap_err(), RosterError::NotOpen);
}

#[tokio::test]
async fn test_service_failure_surfaces_as_roster_error() {
    let sheets = RecordingSheets {
        fail: true,
        ..Default::default()
    };
    let mut roster = Roster::new(sheets, descriptor());

    let err = roster.open().await.unwrap_err();
    assert!(matches!(err, RosterError::Service(_)));
    assert!(roster.sheet_url().is_none());

    let err: RollcallError = err.into();
    assert!(err.to_string().contains("quota exceeded"));
}

#[test]
fn test_record_dedupes_by_student_id_and_keeps_order() {
    let mut roster = Roster::new(RecordingSheets::default(), descriptor());

    assert!(roster.record(record("21BCE007", 2)));
    assert!(roster.record(record("21BCE001", 3)));
    assert!(!roster.record(record("21BCE007", 9)));

    assert_eq!(roster.present_count(), 2);
    assert!(roster.is_present("21BCE001"));
    assert!(!roster.is_present("21BCE099"));

    let ids: Vec<&str> = roster.records().iter().map(|r| r.student_id.as_str()).collect();
    assert_eq!(ids, ["21BCE007", "21BCE001"]);
    // The first record wins.
    assert_eq!(roster.records()[0].timestamp.format("%M").to_string(), "02");
}

#[test]
fn test_sheet_id_from_url_handles_bare_ids() {
    assert_eq!(sheet_id_from_url("sheet42"), "sheet42");
}

#[test]
fn test_record_serializes_for_export() {
    let json = serde_json::to_value(record("21BCE001", 5)).unwrap();
    assert_eq!(json["student_id"], "21BCE001");
    assert_eq!(json["location_valid"], true);
    assert_eq!(json["timestamp"], "2024-11-04T11:05:00Z");
}
