//! The student-side scan loop.
//!
//! A camera produces frames far faster than anyone needs to decode them,
//! so the scanner keeps only the latest frame (a `watch` channel) and polls
//! it on a fixed cadence. Frames with no QR code are skipped silently;
//! every decoded string becomes a [`ScanOutcome`]. The loop ends on the
//! first accepted scan, when the camera goes away, or when stopped.

use std::time::Duration;

use rollcall_geo::{LocationError, LocationSample, LocationSource};
use rollcall_tick::{TickConfig, TickScheduler};
use rollcall_token::{Clock, TokenCodec, TokenFields};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::{AttendanceValidator, Verdict};

/// Finds a QR payload in a camera frame.
///
/// Decoding is synchronous and CPU-bound; `&mut self` lets an
/// implementation reuse scratch buffers between frames.
///
/// # Example
///
/// ```rust
/// use rollcall::QrDecoder;
///
/// /// Frames that already are the decoded text, as a test camera emits.
/// struct TextFrames;
///
/// impl QrDecoder for TextFrames {
///     type Frame = String;
///
///     fn decode(&mut self, frame: &String) -> Option<String> {
///         (!frame.is_empty()).then(|| frame.clone())
///     }
/// }
/// ```
pub trait QrDecoder: Send + 'static {
    type Frame: Send + Sync + 'static;

    /// Returns the QR payload in `frame`, or `None` if there is none.
    fn decode(&mut self, frame: &Self::Frame) -> Option<String>;
}

/// Configuration for a [`Scanner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// How many frames per second are handed to the decoder.
    pub frames_per_second: u32,
    /// Give up on the student's location fix after this many milliseconds.
    pub location_timeout_ms: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            frames_per_second: 10,
            location_timeout_ms: 10_000,
        }
    }
}

impl ScannerConfig {
    pub fn validated(mut self) -> Self {
        if self.frames_per_second == 0 {
            tracing::warn!("scanner frame rate of 0 would never scan, using default");
            self.frames_per_second = Self::default().frames_per_second;
        }
        self
    }
}

/// One decoded QR code and what became of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    /// The decoded string.
    pub raw: String,
    pub verdict: Verdict,
    /// Where the student was, if a fix was obtained.
    pub student_location: Option<LocationSample>,
    /// Epoch seconds at the moment of the scan.
    pub scanned_at: i64,
}

/// Why a scan loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEnd {
    /// A scan was accepted; carries the accepted token's fields.
    Accepted(TokenFields),
    /// The frame sender was dropped.
    FramesClosed,
    /// [`ScanSession::stop`] was called or the session was dropped.
    Stopped,
}

/// Polls frames, validates what it decodes, and reports every verdict.
pub struct Scanner<D, L, C, K>
where
    D: QrDecoder,
    L: LocationSource,
    C: TokenCodec,
    K: Clock,
{
    config: ScannerConfig,
    decoder: D,
    location: L,
    validator: AttendanceValidator<C>,
    clock: K,
}

impl<D, L, C, K> Scanner<D, L, C, K>
where
    D: QrDecoder,
    L: LocationSource,
    C: TokenCodec,
    K: Clock,
{
    pub fn new(
        config: ScannerConfig,
        decoder: D,
        location: L,
        validator: AttendanceValidator<C>,
        clock: K,
    ) -> Self {
        Self {
            config: config.validated(),
            decoder,
            location,
            validator,
            clock,
        }
    }

    /// Starts scanning `frames` on a background task.
    pub fn spawn(self, frames: watch::Receiver<Option<D::Frame>>) -> ScanSession {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();

        let task = tokio::spawn(self.run(frames, outcome_tx, stop_rx));

        ScanSession {
            outcomes: outcome_rx,
            stop: Some(stop_tx),
            task,
        }
    }

    async fn run(
        mut self,
        mut frames: watch::Receiver<Option<D::Frame>>,
        outcomes: mpsc::UnboundedSender<ScanOutcome>,
        mut stop: oneshot::Receiver<()>,
    ) -> ScanEnd {
        let mut ticker = TickScheduler::new(TickConfig::per_second(self.config.frames_per_second));
        tracing::info!(fps = self.config.frames_per_second, "scanner started");

        let end = loop {
            tokio::select! {
                _ = &mut stop => break ScanEnd::Stopped,
                _ = ticker.wait_for_tick() => {
                    let raw = match self.poll_frame(&mut frames) {
                        Ok(Some(raw)) => raw,
                        Ok(None) => continue,
                        Err(closed) => break closed,
                    };

                    let outcome = self.scan(raw).await;
                    let accepted = outcome.verdict.accepted().cloned();
                    let _ = outcomes.send(outcome);

                    if let Some(fields) = accepted {
                        break ScanEnd::Accepted(fields);
                    }
                }
            }
        };

        tracing::info!(?end, "scanner stopped");
        end
    }

    /// Decodes the latest frame if it hasn't been looked at yet. A closed
    /// channel ends the loop only once its last frame has been seen.
    fn poll_frame(
        &mut self,
        frames: &mut watch::Receiver<Option<D::Frame>>,
    ) -> Result<Option<String>, ScanEnd> {
        match frames.has_changed() {
            Ok(true) => {}
            Ok(false) => return Ok(None),
            Err(_) if frames.borrow().has_changed() => {}
            Err(_) => return Err(ScanEnd::FramesClosed),
        }
        let frame = frames.borrow_and_update();
        Ok(frame.as_ref().and_then(|f| self.decoder.decode(f)))
    }

    async fn scan(&mut self, raw: String) -> ScanOutcome {
        let scanned_at = self.clock.now_epoch_seconds();

        let fields = match self.validator.check_token(&raw, scanned_at) {
            Ok(fields) => fields,
            Err(verdict) => {
                return ScanOutcome {
                    raw,
                    verdict,
                    student_location: None,
                    scanned_at,
                };
            }
        };

        match sample_student(&self.location, self.config.location_timeout_ms).await {
            Ok(student) => {
                let verdict = self.validator.check_location(&raw, fields, &student);
                ScanOutcome {
                    raw,
                    verdict,
                    student_location: Some(student),
                    scanned_at,
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "scan rejected: no student location");
                ScanOutcome {
                    raw,
                    verdict: Verdict::LocationUnavailable,
                    student_location: None,
                    scanned_at,
                }
            }
        }
    }
}

/// The student's position at scan time. A non-finite fix counts as no fix.
async fn sample_student<L: LocationSource>(
    location: &L,
    timeout_ms: u64,
) -> Result<LocationSample, LocationError> {
    let sample = tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        location.current_location(),
    )
    .await
    .map_err(|_| LocationError::Timeout(timeout_ms))??;

    if sample.is_finite() {
        Ok(sample)
    } else {
        Err(LocationError::Unavailable(format!(
            "non-finite fix ({}, {})",
            sample.latitude, sample.longitude
        )))
    }
}

/// A running scan loop.
///
/// Dropping the session stops the loop.
pub struct ScanSession {
    outcomes: mpsc::UnboundedReceiver<ScanOutcome>,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<ScanEnd>,
}

impl ScanSession {
    /// The next reported outcome; `None` once the loop has ended and every
    /// outcome has been read.
    pub async fn next_outcome(&mut self) -> Option<ScanOutcome> {
        self.outcomes.recv().await
    }

    /// Asks the loop to stop. Idempotent.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the loop to end and says why it did.
    pub async fn finish(mut self) -> ScanEnd {
        let task = &mut self.task;
        match task.await {
            Ok(end) => end,
            Err(e) => {
                tracing::warn!(error = %e, "scanner task failed");
                ScanEnd::Stopped
            }
        }
    }
}
