//! RPA CAPTCHA toolkit
//!
//! Locates the gap in a slide CAPTCHA, synthesizes a human-like drag
//! trajectory for it, and drives pointer/keyboard input through a scoped
//! actuator session. Alphanumeric CAPTCHAs are handed to an external OCR
//! engine.

pub mod config;
pub mod input;
pub mod ocr;
pub mod paths;
pub mod slider;

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

/// Logs a message to both stderr and log file with timestamp.
///
/// Stdout is reserved for command results so `--json` output stays parseable.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    eprint!("{}", line);
    let log_path = paths::get_logs_dir().join("rpa_captcha.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}
