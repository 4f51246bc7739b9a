use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::process::Command;

use crate::config::OcrConfig;
use crate::log;
use crate::paths::get_tesseract_dir;

#[cfg(windows)]
const TESSERACT_EXE: &str = "tesseract.exe";
#[cfg(not(windows))]
const TESSERACT_EXE: &str = "tesseract";

/// Common Windows install locations
const COMMON_INSTALL_DIRS: [&str; 2] = [
    r"C:\Program Files\Tesseract-OCR",
    r"C:\Program Files (x86)\Tesseract-OCR",
];

#[derive(Clone, Debug)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// None means Tesseract uses its built-in tessdata location
    pub tessdata: Option<PathBuf>,
}

/// Finds Tesseract and its language data.
pub fn locate_tesseract(config: &OcrConfig) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable(config)?;
    let tessdata = find_tessdata_dir();

    log(&format!(
        "Tesseract: {} (tessdata: {})",
        executable.display(),
        tessdata
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "default".to_string())
    ));

    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

/// Finds the Tesseract executable: configured path, our local dir, PATH,
/// then common install locations.
pub fn find_tesseract_executable(config: &OcrConfig) -> Result<PathBuf> {
    if let Some(path) = &config.tesseract_path {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
        return Err(anyhow!("Configured Tesseract not found at {}", p.display()));
    }

    let local_exe = get_tesseract_dir().join(TESSERACT_EXE);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    // Check PATH
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for dir in &COMMON_INSTALL_DIRS {
        let p = PathBuf::from(dir).join("tesseract.exe");
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "Tesseract not found. Install Tesseract-OCR and add it to PATH, \
         set ocr.tesseract_path in config.json, or copy it to: {}",
        get_tesseract_dir().display()
    ))
}

/// Finds a tessdata directory containing eng.traineddata, if one is not
/// already known to the executable.
pub fn find_tessdata_dir() -> Option<PathBuf> {
    let mut candidates = vec![get_tesseract_dir().join("tessdata")];

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        candidates.push(PathBuf::from(&prefix));
        candidates.push(PathBuf::from(&prefix).join("tessdata"));
    }

    candidates.extend(
        COMMON_INSTALL_DIRS
            .iter()
            .map(|dir| PathBuf::from(dir).join("tessdata")),
    );

    candidates
        .into_iter()
        .find(|p| p.join("eng.traineddata").exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_configured_path_wins() {
        let fake = NamedTempFile::new().unwrap();
        let config = OcrConfig {
            tesseract_path: Some(fake.path().to_string_lossy().to_string()),
            ..OcrConfig::default()
        };
        assert_eq!(find_tesseract_executable(&config).unwrap(), fake.path());
    }

    #[test]
    fn test_missing_configured_path_is_error() {
        let config = OcrConfig {
            tesseract_path: Some("/nonexistent/tesseract-binary".to_string()),
            ..OcrConfig::default()
        };
        assert!(find_tesseract_executable(&config).is_err());
    }
}
