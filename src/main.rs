//! Intake Scanner
//!
//! Watches a webcam for printed or handwritten name/phone snippets, extracts
//! validated values from them, and fills a browser intake form after operator
//! confirmation.

mod automation;
mod capture;
mod config;
mod ocr;
mod paths;

use anyhow::Result;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("intake_scanner.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        let log_path = paths::get_logs_dir().join("intake_scanner.log");
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));

    paths::ensure_directories()?;
    config::init_config();
    let config = config::get_config();

    // Make sure the recognition language is usable before opening anything
    // expensive; a miss here degrades to the engine default language.
    if let Err(e) = ocr::ensure_language(&config.ocr_lang) {
        log(&format!("Warning: OCR language setup failed: {}", e));
        log("Recognition may fall back to the engine default language.");
    }

    log("Point the camera at a printed NAME and/or PHONE");
    log("Good lighting, 15-20cm distance, hold the document steady for a few seconds");

    automation::run_session(config)
}
