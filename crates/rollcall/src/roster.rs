//! The attendance roster and the sheet service it is mirrored to.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rollcall_geo::LocationSample;
use rollcall_token::SessionDescriptor;
use serde::{Deserialize, Serialize};

/// Column headers of every roster sheet, in order.
pub const ROSTER_HEADER: [&str; 6] = [
    "Student ID",
    "Student Name",
    "Timestamp",
    "Location Valid",
    "Latitude",
    "Longitude",
];

/// Name of the tab attendance rows are written to.
pub const ROSTER_TAB: &str = "Attendance";

/// Errors from the roster layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    /// The sheet service refused or failed the request.
    #[error("roster sheet service failed: {0}")]
    Service(String),

    /// The roster has no sheet yet; call [`Roster::open`] first.
    #[error("roster sheet has not been created")]
    NotOpen,
}

/// Where roster sheets live.
///
/// # Example
///
/// ```rust
/// use rollcall::{RosterError, RosterSheetService};
///
/// /// Pretends every sheet exists at a predictable URL.
/// struct NullSheets;
///
/// impl RosterSheetService for NullSheets {
///     async fn create_roster_sheet(
///         &self,
///         title: &str,
///         _header: &[&str],
///     ) -> Result<String, RosterError> {
///         Ok(format!("https://docs.google.com/spreadsheets/d/{title}/edit#gid=0"))
///     }
///
///     async fn rename_roster_sheet(&self, _id: &str, _title: &str) -> Result<(), RosterError> {
///         Ok(())
///     }
/// }
/// ```
pub trait RosterSheetService: Send + Sync + 'static {
    /// Creates a sheet called `title` whose first row is `header` and
    /// returns its URL.
    fn create_roster_sheet(
        &self,
        title: &str,
        header: &[&str],
    ) -> impl std::future::Future<Output = Result<String, RosterError>> + Send;

    /// Renames the sheet with id `sheet_id`.
    fn rename_roster_sheet(
        &self,
        sheet_id: &str,
        new_title: &str,
    ) -> impl std::future::Future<Output = Result<(), RosterError>> + Send;
}

/// Extracts the spreadsheet id from a sheet URL of the form
/// `https://docs.google.com/spreadsheets/d/{id}/edit...`.
///
/// URLs without a `/d/` segment are taken to be the id itself.
pub fn sheet_id_from_url(url: &str) -> &str {
    match url.split_once("/d/") {
        Some((_, rest)) => rest.split(['/', '?', '#']).next().unwrap_or(rest),
        None => url,
    }
}

/// One row of the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub student_id: String,
    pub student_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Whether the student passed the geofence check.
    pub location_valid: bool,
    pub latitude: f64,
    pub longitude: f64,
}

impl AttendanceRecord {
    /// A record for a student who passed the geofence at `location`.
    pub fn present(
        student_id: impl Into<String>,
        student_name: Option<String>,
        location: &LocationSample,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            student_name,
            timestamp,
            location_valid: true,
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }

    /// The record as sheet cells, in [`ROSTER_HEADER`] order.
    pub fn to_row(&self) -> [String; 6] {
        [
            self.student_id.clone(),
            self.student_name.clone().unwrap_or_default(),
            self.timestamp.to_rfc3339(),
            if self.location_valid { "Yes" } else { "No" }.to_owned(),
            self.latitude.to_string(),
            self.longitude.to_string(),
        ]
    }
}

/// The attendance of one session.
///
/// Records are kept in arrival order. A student is counted once; later
/// records for the same student id are ignored.
pub struct Roster<R: RosterSheetService> {
    service: R,
    descriptor: SessionDescriptor,
    title: String,
    sheet_url: Option<String>,
    records: Vec<AttendanceRecord>,
    present: HashSet<String>,
}

impl<R: RosterSheetService> Roster<R> {
    pub fn new(service: R, descriptor: SessionDescriptor) -> Self {
        let title = descriptor.sheet_title();
        Self {
            service,
            descriptor,
            title,
            sheet_url: None,
            records: Vec::new(),
            present: HashSet::new(),
        }
    }

    /// Creates the session's sheet and returns its URL. Once a sheet exists
    /// this returns the same URL without calling the service again.
    pub async fn open(&mut self) -> Result<&str, RosterError> {
        if self.sheet_url.is_none() {
            let url = self
                .service
                .create_roster_sheet(&self.title, &ROSTER_HEADER)
                .await?;
            tracing::info!(title = %self.title, %url, "roster sheet created");
            self.sheet_url = Some(url);
        }
        self.sheet_url.as_deref().ok_or(RosterError::NotOpen)
    }

    /// Renames the session's sheet.
    pub async fn rename(&mut self, new_title: impl Into<String>) -> Result<(), RosterError> {
        let new_title = new_title.into();
        let url = self.sheet_url.as_deref().ok_or(RosterError::NotOpen)?;
        self.service
            .rename_roster_sheet(sheet_id_from_url(url), &new_title)
            .await?;
        tracing::info!(from = %self.title, to = %new_title, "roster sheet renamed");
        self.title = new_title;
        Ok(())
    }

    /// Adds a record. Returns `false` if the student was already recorded.
    pub fn record(&mut self, record: AttendanceRecord) -> bool {
        if !self.present.insert(record.student_id.clone()) {
            tracing::debug!(student = %record.student_id, "duplicate attendance ignored");
            return false;
        }
        tracing::info!(
            student = %record.student_id,
            present = self.present.len(),
            "attendance recorded"
        );
        self.records.push(record);
        true
    }

    pub fn is_present(&self, student_id: &str) -> bool {
        self.present.contains(student_id)
    }

    pub fn present_count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    pub fn descriptor(&self) -> &SessionDescriptor {
        &self.descriptor
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sheet_url(&self) -> Option<&str> {
        self.sheet_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_id_from_url() {
        assert_eq!(
            sheet_id_from_url("https://docs.google.com/spreadsheets/d/1E_kRt/edit#gid=0"),
            "1E_kRt"
        );
        assert_eq!(
            sheet_id_from_url("https://docs.google.com/spreadsheets/d/abc?usp=sharing"),
            "abc"
        );
        assert_eq!(sheet_id_from_url("abc"), "abc");
    }

    #[test]
    fn test_to_row_follows_header_order() {
        let at = DateTime::parse_from_rfc3339("2024-03-21T09:05:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let record = AttendanceRecord::present(
            "21BCE001",
            None,
            &LocationSample::new(18.5204, 73.8567, 0),
            at,
        );
        assert_eq!(
            record.to_row(),
            [
                "21BCE001".to_owned(),
                String::new(),
                "2024-03-21T09:05:00+00:00".to_owned(),
                "Yes".to_owned(),
                "18.5204".to_owned(),
                "73.8567".to_owned(),
            ]
        );
    }
}
