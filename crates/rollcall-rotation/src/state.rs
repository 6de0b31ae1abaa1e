//! Session bookkeeping owned by the controller.

use std::time::Duration;

use rollcall_token::{SessionDescriptor, Token};
use serde::{Deserialize, Serialize};

/// Sequence number and current token of one controller.
///
/// Lifecycle:
///
/// ```text
/// Inactive ──begin──▶ Active ──end──▶ Inactive
///                      │  ▲
///                      └──┘ advance / record (every tick)
/// ```
///
/// The sequence number stays in `1..=ceiling` in every state. A token is
/// only ever present while active.
#[derive(Debug, Clone)]
pub struct RotationState {
    ceiling: u32,
    sequence: u32,
    descriptor: Option<SessionDescriptor>,
    last_issued_token: Option<Token>,
    issued_at: Option<i64>,
    started_at: Option<i64>,
    rotations: u64,
}

impl RotationState {
    /// A fresh, inactive state. `ceiling` is raised to 1 if zero.
    pub fn new(ceiling: u32) -> Self {
        Self {
            ceiling: ceiling.max(1),
            sequence: 1,
            descriptor: None,
            last_issued_token: None,
            issued_at: None,
            started_at: None,
            rotations: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.descriptor.is_some()
    }

    /// Enters the active state with sequence 1 and its first token.
    pub fn begin(&mut self, descriptor: SessionDescriptor, first: Token, now: i64) {
        self.sequence = 1;
        self.descriptor = Some(descriptor);
        self.last_issued_token = Some(first);
        self.issued_at = Some(now);
        self.started_at = Some(now);
        self.rotations = 0;
    }

    /// Moves to the next sequence number, wrapping `ceiling` back to 1,
    /// and returns it. Has no effect while inactive.
    pub fn advance(&mut self) -> u32 {
        if self.is_active() {
            self.sequence = next_sequence(self.sequence, self.ceiling);
            self.rotations += 1;
        }
        self.sequence
    }

    /// Replaces the current token. Ignored while inactive, so a token minted
    /// for a session that has since ended is never shown.
    pub fn record(&mut self, token: Token, now: i64) {
        if self.is_active() {
            self.last_issued_token = Some(token);
            self.issued_at = Some(now);
        }
    }

    /// Returns to inactive and drops the token. Idempotent; returns whether
    /// a session was actually ended.
    pub fn end(&mut self) -> bool {
        let was_active = self.is_active();
        self.sequence = 1;
        self.descriptor = None;
        self.last_issued_token = None;
        self.issued_at = None;
        self.started_at = None;
        was_active
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    pub fn descriptor(&self) -> Option<&SessionDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn current_token(&self) -> Option<&Token> {
        self.last_issued_token.as_ref()
    }

    pub fn issued_at(&self) -> Option<i64> {
        self.issued_at
    }

    pub fn started_at(&self) -> Option<i64> {
        self.started_at
    }

    /// Ticks handled this session, successful or not.
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// Time since the session began, measured on the caller's clock.
    /// `None` while inactive.
    pub fn elapsed(&self, now: i64) -> Option<Duration> {
        self.started_at
            .map(|start| Duration::from_secs(now.saturating_sub(start).max(0) as u64))
    }

    pub fn snapshot(&self, now: i64) -> RotationSnapshot {
        RotationSnapshot {
            active: self.is_active(),
            sequence: self.sequence,
            token: self.last_issued_token.clone(),
            issued_at: self.issued_at,
            descriptor: self.descriptor.clone(),
            rotations: self.rotations,
            elapsed_seconds: self.elapsed(now).map(|d| d.as_secs()),
        }
    }
}

fn next_sequence(current: u32, ceiling: u32) -> u32 {
    current % ceiling + 1
}

/// A point-in-time copy of a controller's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationSnapshot {
    pub active: bool,
    pub sequence: u32,
    pub token: Option<Token>,
    pub issued_at: Option<i64>,
    pub descriptor: Option<SessionDescriptor>,
    pub rotations: u64,
    pub elapsed_seconds: Option<u64>,
}

impl RotationSnapshot {
    /// Session duration as shown on the instructor dashboard.
    pub fn session_duration(&self) -> Option<String> {
        self.elapsed_seconds
            .map(|s| format_duration(Duration::from_secs(s)))
    }
}

/// `HH:MM:SS`, with hours growing past two digits if they must.
pub fn format_duration(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3_600,
        (total % 3_600) / 60,
        total % 60
    )
}
