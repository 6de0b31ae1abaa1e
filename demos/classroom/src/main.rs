use std::time::Duration;

use rand::Rng;
use rollcall::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Everything the demo can be told. Every field is optional in the JSON
/// file; missing ones take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    rotation: RotationConfig,
    attendance: AttendanceConfig,
    scanner: ScannerConfig,
    /// The lecture to run. Defaults to a one-hour theory lecture today.
    session: Option<SessionDescriptor>,
    classroom: Option<LocationSample>,
    /// How many students try to check in. Every fourth one is across campus.
    students: usize,
}

fn load_config(path: Option<String>) -> Result<DemoConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(DemoConfig {
            students: 8,
            ..Default::default()
        });
    };
    let text = std::fs::read_to_string(&path)?;
    let config: DemoConfig = serde_json::from_str(&text)?;
    tracing::info!(%path, "loaded config");
    Ok(config)
}

// ---------------------------------------------------------------------------
// Simulated devices
// ---------------------------------------------------------------------------

/// A GPS that wanders a few meters around a fixed point.
struct SimulatedGps {
    center: LocationSample,
    /// Maximum error in degrees (~1 m per 0.00001).
    noise_deg: f64,
}

impl SimulatedGps {
    fn near(center: LocationSample, noise_m: f64) -> Self {
        Self {
            center,
            noise_deg: noise_m / 111_000.0,
        }
    }

    /// `meters` due north of `center`, with the same noise.
    fn offset_north(center: LocationSample, meters: f64, noise_m: f64) -> Self {
        let moved = LocationSample::new(
            center.latitude + meters / 111_000.0,
            center.longitude,
            center.captured_at,
        );
        Self::near(moved, noise_m)
    }
}

impl LocationSource for SimulatedGps {
    async fn current_location(&self) -> Result<LocationSample, LocationError> {
        let (dlat, dlon) = {
            let mut rng = rand::rng();
            (
                rng.random_range(-self.noise_deg..=self.noise_deg),
                rng.random_range(-self.noise_deg..=self.noise_deg),
            )
        };
        Ok(LocationSample::new(
            self.center.latitude + dlat,
            self.center.longitude + dlon,
            SystemClock.now_epoch_seconds(),
        ))
    }
}

/// Camera frames are the text a real decoder would have found.
struct PassthroughDecoder;

impl QrDecoder for PassthroughDecoder {
    type Frame = String;

    fn decode(&mut self, frame: &String) -> Option<String> {
        (!frame.is_empty()).then(|| frame.clone())
    }
}

/// A sheet service that only logs.
struct LogSheets;

impl RosterSheetService for LogSheets {
    async fn create_roster_sheet(&self, title: &str, header: &[&str]) -> Result<String, RosterError> {
        tracing::info!(%title, columns = header.len(), "creating roster sheet");
        Ok(format!("https://docs.google.com/spreadsheets/d/{}/edit#gid=0", title.replace(' ', "-")))
    }

    async fn rename_roster_sheet(&self, sheet_id: &str, new_title: &str) -> Result<(), RosterError> {
        tracing::info!(%sheet_id, %new_title, "renaming roster sheet");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// One student's check-in
// ---------------------------------------------------------------------------

/// Points a phone at the lecture-hall screen until the scanner reports a
/// verdict. `None` if `patience` runs out first.
async fn check_in(
    controller: &RotationHandle,
    config: &DemoConfig,
    gps: SimulatedGps,
    patience: Duration,
) -> Result<Option<ScanOutcome>, RollcallError> {
    let (frames_tx, frames_rx) = watch::channel(None);
    let scanner = Scanner::new(
        config.scanner.clone(),
        PassthroughDecoder,
        gps,
        AttendanceValidator::new(config.attendance.clone(), DelimitedCodec),
        SystemClock,
    );
    let mut session = scanner.spawn(frames_rx);

    let screen = controller.current_token().await?;
    let _ = frames_tx.send(screen.map(Token::into_string));

    let outcome = tokio::time::timeout(patience, session.next_outcome()).await;
    session.stop();
    Ok(outcome.ok().flatten())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config(std::env::args().nth(1))?;
    let classroom = config
        .classroom
        .unwrap_or_else(|| LocationSample::new(18.5204, 73.8567, 0));
    let descriptor = match config.session.clone() {
        Some(d) => d,
        None => SessionDescriptor::new(
            "SRM",
            LectureType::Theory,
            WHOLE_CLASS,
            chrono::Local::now().date_naive(),
            TimeSlot::starting_at(9)?,
        )?,
    };

    let controller = spawn_controller(
        RotationConfig {
            fallback_location: classroom,
            ..config.rotation.clone()
        },
        SimulatedGps::near(classroom, 5.0),
        DelimitedCodec,
        SystemClock,
    );

    let mut roster = Roster::new(LogSheets, descriptor.clone());
    let url = roster.open().await?.to_owned();
    tracing::info!(%url, "roster ready");

    let token = controller.start_session(descriptor).await?;
    tracing::info!(%token, "showing first code");

    for i in 0..config.students {
        let student_id = format!("21BCE{:03}", i + 1);
        let gps = if i % 4 == 3 {
            SimulatedGps::offset_north(classroom, 400.0, 5.0)
        } else {
            SimulatedGps::offset_north(classroom, 20.0, 5.0)
        };

        match check_in(&controller, &config, gps, Duration::from_secs(2)).await {
            Ok(Some(outcome)) => match &outcome.verdict {
                Verdict::Accepted(_) => {
                    let location = outcome.student_location.unwrap_or(classroom);
                    roster.record(AttendanceRecord::present(
                        student_id,
                        None,
                        &location,
                        chrono::Utc::now(),
                    ));
                }
                rejected => {
                    tracing::warn!(student = %student_id, verdict = %rejected, "{}", rejected.message());
                }
            },
            Ok(None) => tracing::warn!(student = %student_id, "no code scanned in time"),
            Err(e) => tracing::warn!(student = %student_id, error = %e, "check-in failed"),
        }
    }

    let snapshot = controller.snapshot().await?;
    controller.end_session().await?;
    controller.shutdown().await?;

    tracing::info!(
        present = roster.present_count(),
        of = config.students,
        sequence = snapshot.sequence,
        duration = %snapshot.session_duration().unwrap_or_default(),
        "session over"
    );
    Ok(())
}
