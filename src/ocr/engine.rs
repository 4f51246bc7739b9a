use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, GrayImage};
use std::process::Command;
use tempfile::NamedTempFile;

use super::extract::extract_captcha_text;
use super::preprocess::prepare_for_ocr;
use super::setup::{locate_tesseract, TesseractPaths};
use super::{CaptchaClassifier, Recognition};
use crate::config::OcrConfig;

/// Represents a line of OCR text with confidence score
#[derive(Debug, Clone)]
pub struct OcrLine {
    pub text: String,
    pub words: Vec<OcrWord>,
    pub confidence: f32,
}

/// Represents a single word from OCR with confidence score
#[derive(Debug, Clone)]
pub struct OcrWord {
    pub text: String,
    pub confidence: f32,
}

/// Classifier that shells out to the Tesseract executable.
pub struct TesseractClassifier {
    paths: TesseractPaths,
    config: OcrConfig,
}

impl TesseractClassifier {
    /// Locates Tesseract according to `config`.
    pub fn new(config: &OcrConfig) -> Result<Self> {
        Ok(Self {
            paths: locate_tesseract(config)?,
            config: config.clone(),
        })
    }

    /// Runs Tesseract on a preprocessed grayscale image and returns its
    /// TSV output as lines with confidence scores.
    pub fn recognize_lines(&self, img: &GrayImage) -> Result<Vec<OcrLine>> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())?;

        let mut command = Command::new(&self.paths.executable);
        command.arg(temp_input.path()).arg("stdout");
        if let Some(tessdata) = &self.paths.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }
        command
            .arg("-l")
            .arg("eng")
            .arg("--psm")
            .arg(self.config.page_segmentation_mode.to_string());
        if !self.config.whitelist.is_empty() {
            command
                .arg("-c")
                .arg(format!("tessedit_char_whitelist={}", self.config.whitelist));
        }
        command.arg("tsv");

        let output = command
            .output()
            .with_context(|| format!("Failed to run {}", self.paths.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        parse_tsv_output(&String::from_utf8_lossy(&output.stdout))
    }
}

impl CaptchaClassifier for TesseractClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Recognition> {
        let prepared = prepare_for_ocr(image, self.config.binarize, self.config.threshold);
        let lines = self.recognize_lines(&prepared)?;
        extract_captcha_text(&lines, &self.config.whitelist)
    }
}

/// Parses Tesseract TSV output into structured OcrLine data
pub fn parse_tsv_output(tsv: &str) -> Result<Vec<OcrLine>> {
    let mut lines: Vec<OcrLine> = Vec::new();
    let mut current_line: Option<(i32, i32, i32)> = None;
    let mut current_words: Vec<OcrWord> = Vec::new();

    for line in tsv.lines().skip(1) {
        // Skip header
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let level: i32 = fields[0].parse().unwrap_or(-1);
        let key = (
            fields[2].parse().unwrap_or(-1),
            fields[3].parse().unwrap_or(-1),
            fields[4].parse().unwrap_or(-1),
        );
        let conf: f32 = fields[10].trim().parse().unwrap_or(-1.0);
        let text = fields[11].trim();

        // Level 5 = word
        if level != 5 || text.is_empty() || conf < 0.0 {
            continue;
        }

        if current_line.is_some_and(|k| k != key) {
            flush_line(&mut lines, std::mem::take(&mut current_words));
        }
        current_line = Some(key);

        current_words.push(OcrWord {
            text: text.to_string(),
            confidence: conf,
        });
    }

    // Don't forget the last line
    flush_line(&mut lines, current_words);

    Ok(lines)
}

fn flush_line(lines: &mut Vec<OcrLine>, words: Vec<OcrWord>) {
    if words.is_empty() {
        return;
    }
    let confidence = words.iter().map(|w| w.confidence).sum::<f32>() / words.len() as f32;
    let text = words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    lines.push(OcrLine {
        text,
        words,
        confidence,
    });
}
