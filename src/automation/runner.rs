//! Session runner - main entry point for a capture session.
//!
//! Wires the camera, recognizer, form driver and operator confirmation into
//! a session context and drives the state machine until it stops. Both
//! external resources live inside the context and are released when it goes
//! out of scope, on every exit path.

use anyhow::{Context, Result};
use std::io::{self, Write};

use crate::automation::form::{format_phone, FormFiller};
use crate::automation::state::{
    abort_flag, reset_abort_flag, Confirmation, ConfirmationGate, SessionContext, SessionParams,
};
use crate::capture::CameraSource;
use crate::config::ScanConfig;
use crate::ocr::{CandidateRecord, TesseractRecognizer};

/// Operator confirmation over stdin: ENTER continues, `q` aborts.
pub struct StdinGate;

impl ConfirmationGate for StdinGate {
    fn await_confirmation(&mut self, record: &CandidateRecord) -> Result<Confirmation> {
        println!();
        println!("Detected data:");
        if let Some(name) = &record.name {
            println!("  Name:  {}", name);
        }
        if let Some(phone) = &record.phone {
            println!("  Phone: {}", format_phone(phone));
        }
        println!("Check the filled form. ENTER to continue, 'q' to stop.");
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin()
            .read_line(&mut line)
            .context("confirmation input closed")?;

        if line.trim().eq_ignore_ascii_case("q") {
            Ok(Confirmation::Abort)
        } else {
            Ok(Confirmation::Continue)
        }
    }
}

/// Runs a full capture session: opens the camera and the form browser (both
/// fatal on failure), then steps the state machine until Stopped.
pub fn run_session(config: &ScanConfig) -> Result<()> {
    reset_abort_flag();

    let source = CameraSource::open(config)?;
    let driver = FormFiller::open(config)?;
    let recognizer = TesseractRecognizer::new(config.ocr_lang.clone());
    let params = SessionParams::from_config(config);

    let mut ctx = SessionContext::new(source, recognizer, driver, StdinGate, params, abort_flag());

    crate::log(&format!(
        "Scanning started: processing every {}th frame, {}s cooldown",
        params.frame_interval, config.cooldown_secs
    ));

    loop {
        match ctx.step() {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                crate::log(&format!("Session error: {}", e));
                break;
            }
        }
    }

    // Dropping the context drops the camera and the browser.
    drop(ctx);
    crate::log("Session finished, resources released");

    Ok(())
}
