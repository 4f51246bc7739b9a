use anyhow::{anyhow, Result};
use regex::Regex;

use super::engine::OcrLine;
use super::Recognition;
use crate::log;

/// Minimum confidence below which a recognition is still returned but logged
const LOW_CONFIDENCE: f32 = 60.0;

/// Builds a regex matching every character outside the whitelist.
fn rejected_chars(whitelist: &str) -> Result<Option<Regex>> {
    if whitelist.is_empty() {
        return Ok(None);
    }
    let class: String = whitelist
        .chars()
        .map(|c| regex::escape(&c.to_string()))
        .collect();
    Ok(Some(Regex::new(&format!("[^{}]", class))?))
}

/// Removes whitespace and any character outside `whitelist`.
/// An empty whitelist only strips whitespace.
pub fn normalize_captcha_text(raw: &str, whitelist: &str) -> Result<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(match rejected_chars(whitelist)? {
        Some(re) => re.replace_all(&compact, "").into_owned(),
        None => compact,
    })
}

/// Picks the most confident OCR line and normalizes it into CAPTCHA text.
///
/// CAPTCHAs are a single token, so words on the chosen line are joined
/// without spaces. Returns an error if nothing usable was recognized.
pub fn extract_captcha_text(lines: &[OcrLine], whitelist: &str) -> Result<Recognition> {
    let best = lines
        .iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        .ok_or_else(|| anyhow!("OCR produced no text"))?;

    let text = normalize_captcha_text(&best.text, whitelist)?;
    if text.is_empty() {
        return Err(anyhow!("OCR text {:?} has no allowed characters", best.text));
    }

    if best.confidence < LOW_CONFIDENCE {
        log(&format!(
            "Low OCR confidence for {:?}: {:.0}%",
            text, best.confidence
        ));
    }

    Ok(Recognition {
        text,
        confidence: best.confidence,
    })
}
