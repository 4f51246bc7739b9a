//! RPA CAPTCHA command-line tool
//!
//! Solves slide CAPTCHAs (gap distance and drag trajectory), drives the
//! drag or types text through the system input actuator, and reads
//! alphanumeric CAPTCHAs with Tesseract.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rpa_captcha::config::{get_config, init_config, Config};
use rpa_captcha::input::{
    open_system_actuator, switch_keyboard_layout, InputActuator, InputSession, KeyboardLayout,
    RecordingActuator,
};
use rpa_captcha::ocr::{recognize_captcha_file, TesseractClassifier};
use rpa_captcha::slider::{locate_gap, plan_drag, plan_for_distance, FilePairSource, ImageSource};
use rpa_captcha::{log, paths};

#[derive(Parser, Debug)]
#[command(name = "rpa-captcha", version, about = "Slide and alphanumeric CAPTCHA helper for RPA lessons")]
struct Cli {
    /// Path to config.json (defaults to the one next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the drag distance between the gap marker and the puzzle outline
    Distance {
        /// Intact background image
        #[arg(long)]
        background: PathBuf,
        /// Background with the gap cut in
        #[arg(long)]
        gap: PathBuf,
        /// Print the full scan result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the drag trajectory for a distance in pixels
    Tracks {
        distance: f64,
        #[arg(long)]
        json: bool,
    },
    /// Locate the gap and drag the pointer from its current position
    Drag {
        #[arg(long)]
        background: PathBuf,
        #[arg(long)]
        gap: PathBuf,
        /// Record the events instead of moving the pointer
        #[arg(long)]
        dry_run: bool,
    },
    /// Type text into the foreground window
    Type {
        text: String,
        /// Switch the foreground window to the English layout first
        #[arg(long)]
        switch_layout: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Read an alphanumeric CAPTCHA image
    Ocr {
        image: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    install_panic_hook();

    let cli = Cli::parse();

    // Logging still goes to stdout if the log directory cannot be created
    if let Err(e) = paths::ensure_directories() {
        eprintln!("Warning: failed to create log directory: {}", e);
    }

    init_config(cli.config.as_deref())?;
    let config = get_config();

    let result = run(cli.command, config);
    if let Err(e) = &result {
        log(&format!("Error: {:#}", e));
    }
    result
}

fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Distance {
            background,
            gap,
            json,
        } => {
            let pair = FilePairSource::new(background, gap).load_pair()?;
            let outcome = locate_gap(&pair.background, &pair.gap_background, &config.gap)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else if outcome.is_located() {
                println!("{}", outcome.distance());
            } else {
                return Err(anyhow!("No gap found within the scan bounds"));
            }
            Ok(())
        }
        Command::Tracks { distance, json } => {
            let plan = plan_for_distance(distance, &config.trajectory)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                println!("forward_tracks: {:?}", plan.forward_tracks);
                println!("back_tracks: {:?}", plan.back_tracks);
            }
            Ok(())
        }
        Command::Drag {
            background,
            gap,
            dry_run,
        } => {
            let source = FilePairSource::new(background, gap);
            let plan = plan_drag(&source, config)?;
            log(&format!("Gap distance: {} px", plan.distance));

            with_actuator(dry_run, |actuator| {
                let mut session = InputSession::new(actuator, &config.input);
                if !dry_run {
                    log(&format!(
                        "Dragging in {} ms, hold the pointer over the slider handle",
                        config.input.start_delay_ms
                    ));
                }
                session.wait(config.input.start_delay_ms);
                session.drag(&plan.trajectory)
            })
        }
        Command::Type {
            text,
            switch_layout,
            dry_run,
        } => with_actuator(dry_run, |actuator| {
            let mut session = InputSession::new(actuator, &config.input);
            session.settle();
            if switch_layout {
                if dry_run {
                    log("Dry run: skipping keyboard layout switch");
                } else {
                    switch_keyboard_layout(KeyboardLayout::English)?;
                }
                session.after_layout_switch();
            }
            session.type_text(&text)
        }),
        Command::Ocr { image, json } => {
            let classifier = TesseractClassifier::new(&config.ocr)?;
            let recognition = recognize_captcha_file(&image, &classifier)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&recognition)?);
            } else {
                println!("{}", recognition.text);
            }
            Ok(())
        }
    }
}

/// Runs `f` against the system actuator, or against a recorder whose events
/// are printed afterwards.
fn with_actuator<F>(dry_run: bool, f: F) -> Result<()>
where
    F: FnOnce(&mut dyn InputActuator) -> Result<()>,
{
    if dry_run {
        let mut recorder = RecordingActuator::new();
        f(&mut recorder)?;
        println!("{}", serde_json::to_string_pretty(&recorder.events)?);
        log(&format!(
            "Dry run: {} events, net dx {}, {} ms of pauses",
            recorder.events.len(),
            recorder.net_dx(),
            recorder.total_pause().as_millis()
        ));
        return Ok(());
    }

    let mut actuator = open_system_actuator().context("No input actuator available")?;
    f(actuator.as_mut())
}

/// Logs panics to the log file as well as stderr.
fn install_panic_hook() {
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
        let log_path = paths::get_logs_dir().join("rpa_captcha.log");
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            use std::io::Write;
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));
}
