//! Live capture state machine.
//!
//! The session cycles Scanning → AwaitingConfirmation → Scanning on each
//! confirmed detection, and reaches Stopped on operator abort, external
//! abort request, or a fatal capture failure. Every transition is checked
//! against the abort flag first.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use crate::automation::form::{format_phone, FormDriver};
use crate::automation::tracker::has_changed;
use crate::capture::FrameSource;
use crate::config::ScanConfig;
use crate::ocr::extract::extract_record;
use crate::ocr::{CandidateRecord, FieldKind, TextRecognizer};

/// Process-wide abort flag, shared with whatever delivers the external
/// interrupt. The running session checks it before every step.
static ABORT_FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

pub fn abort_flag() -> Arc<AtomicBool> {
    ABORT_FLAG
        .get_or_init(|| Arc::new(AtomicBool::new(false)))
        .clone()
}

/// Requests abort of a running session.
pub fn request_abort() {
    abort_flag().store(true, Ordering::SeqCst);
}

/// Resets the abort flag. Call before starting a session.
pub fn reset_abort_flag() {
    abort_flag().store(false, Ordering::SeqCst);
}

/// Operator decision after a form fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Continue,
    Abort,
}

/// Blocks until the operator confirms or rejects a filled record. The wait
/// is indefinite, bounded only by the operator or an abort request.
pub trait ConfirmationGate {
    fn await_confirmation(&mut self, record: &CandidateRecord) -> Result<Confirmation>;
}

/// Session states.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Sampling frames, looking for a changed detection (initial state).
    Scanning,
    /// A detection was written to the form; waiting on the operator.
    AwaitingConfirmation(CandidateRecord),
    /// Terminal; the capture loop ends and resources are released.
    Stopped,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Scanning => write!(f, "Scanning"),
            SessionState::AwaitingConfirmation(_) => write!(f, "Awaiting confirmation"),
            SessionState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Timing parameters for the capture loop.
#[derive(Debug, Clone, Copy)]
pub struct SessionParams {
    /// Process one frame out of every `frame_interval` delivered frames.
    pub frame_interval: u64,
    /// Minimum elapsed time after an accepted detection before a new one
    /// may be acted on.
    pub cooldown: Duration,
}

impl SessionParams {
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            frame_interval: config.frame_interval.max(1),
            cooldown: Duration::from_secs(config.cooldown_secs),
        }
    }
}

/// Session context holding the state machine and its collaborators.
///
/// Generic over the four external seams so the transition table is testable
/// without a camera, Tesseract, or a browser.
pub struct SessionContext<S, R, D, G> {
    pub state: SessionState,
    params: SessionParams,
    source: S,
    recognizer: R,
    driver: D,
    gate: G,
    abort: Arc<AtomicBool>,
    frame_counter: u64,
    last_accepted: Option<CandidateRecord>,
    last_accepted_at: Option<Instant>,
}

impl<S, R, D, G> SessionContext<S, R, D, G>
where
    S: FrameSource,
    R: TextRecognizer,
    D: FormDriver,
    G: ConfirmationGate,
{
    pub fn new(
        source: S,
        recognizer: R,
        driver: D,
        gate: G,
        params: SessionParams,
        abort: Arc<AtomicBool>,
    ) -> Self {
        Self {
            state: SessionState::Scanning,
            params,
            source,
            recognizer,
            driver,
            gate,
            abort,
            frame_counter: 0,
            last_accepted: None,
            last_accepted_at: None,
        }
    }

    /// The record accepted by the most recent confirmed fill, if any.
    pub fn last_accepted(&self) -> Option<&CandidateRecord> {
        self.last_accepted.as_ref()
    }

    /// Advances the state machine by one step.
    ///
    /// Returns `Ok(true)` to keep going, `Ok(false)` once Stopped. An `Err`
    /// is a fatal capture failure; the state is already Stopped when it is
    /// returned.
    pub fn step(&mut self) -> Result<bool> {
        if self.abort.load(Ordering::SeqCst) {
            crate::log("Abort requested, stopping session");
            self.state = SessionState::Stopped;
            return Ok(false);
        }

        match self.state.clone() {
            SessionState::Scanning => self.step_scanning(),
            SessionState::AwaitingConfirmation(record) => self.step_confirmation(record),
            SessionState::Stopped => Ok(false),
        }
    }

    fn step_scanning(&mut self) -> Result<bool> {
        let frame = match self.source.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                self.state = SessionState::Stopped;
                return Err(e).context("frame capture failed, ending session");
            }
        };

        // Only every Nth delivered frame is worth a recognition pass.
        self.frame_counter += 1;
        if self.frame_counter % self.params.frame_interval != 0 {
            return Ok(true);
        }

        // The document that was just accepted is usually still in frame;
        // don't re-detect it until the cooldown has passed.
        if let Some(accepted_at) = self.last_accepted_at {
            if accepted_at.elapsed() < self.params.cooldown {
                return Ok(true);
            }
        }

        let text = self.recognizer.recognize(&frame);
        if text.trim().is_empty() {
            return Ok(true);
        }

        let record = extract_record(&text);
        if record.is_empty() {
            return Ok(true);
        }

        if has_changed(&record, self.last_accepted.as_ref()) {
            crate::log(&format!("Detection: {:?}", record));
            self.state = SessionState::AwaitingConfirmation(record);
        }

        Ok(true)
    }

    fn step_confirmation(&mut self, record: CandidateRecord) -> Result<bool> {
        let mut filled = 0usize;

        if let Some(name) = &record.name {
            match self.driver.set_field(FieldKind::Name, name) {
                Ok(()) => filled += 1,
                Err(e) => crate::log(&format!("Failed to fill name field: {}", e)),
            }
        }

        if let Some(phone) = &record.phone {
            let formatted = format_phone(phone);
            match self.driver.set_field(FieldKind::Phone, &formatted) {
                Ok(()) => filled += 1,
                Err(e) => crate::log(&format!("Failed to fill phone field: {}", e)),
            }
        }

        if filled == 0 {
            crate::log("No field could be written, resuming scan");
            self.state = SessionState::Scanning;
            return Ok(true);
        }

        let decision = match self.gate.await_confirmation(&record) {
            Ok(decision) => decision,
            Err(e) => {
                self.state = SessionState::Stopped;
                return Err(e).context("confirmation input failed, ending session");
            }
        };

        match decision {
            Confirmation::Continue => {
                self.last_accepted = Some(record);
                self.last_accepted_at = Some(Instant::now());
                self.state = SessionState::Scanning;
                Ok(true)
            }
            Confirmation::Abort => {
                crate::log("Operator aborted, stopping session");
                self.state = SessionState::Stopped;
                Ok(false)
            }
        }
    }
}
