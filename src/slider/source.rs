//! Image sources for the gap locator.

use std::fs;
use std::path::PathBuf;

use crate::slider::error::SliderError;

/// Raw encoded bytes of the two CAPTCHA images.
#[derive(Clone, Debug)]
pub struct ImagePair {
    /// Intact background
    pub background: Vec<u8>,
    /// Background with the gap cut in
    pub gap_background: Vec<u8>,
}

/// Supplies the two images of a slide CAPTCHA.
pub trait ImageSource {
    fn load_pair(&self) -> Result<ImagePair, SliderError>;
}

impl ImageSource for ImagePair {
    fn load_pair(&self) -> Result<ImagePair, SliderError> {
        Ok(self.clone())
    }
}

/// Reads both images from disk.
#[derive(Clone, Debug)]
pub struct FilePairSource {
    pub background: PathBuf,
    pub gap_background: PathBuf,
}

impl FilePairSource {
    pub fn new(background: impl Into<PathBuf>, gap_background: impl Into<PathBuf>) -> Self {
        Self {
            background: background.into(),
            gap_background: gap_background.into(),
        }
    }
}

impl ImageSource for FilePairSource {
    fn load_pair(&self) -> Result<ImagePair, SliderError> {
        let read = |path: &PathBuf| {
            fs::read(path).map_err(|source| SliderError::Io {
                path: path.clone(),
                source,
            })
        };
        Ok(ImagePair {
            background: read(&self.background)?,
            gap_background: read(&self.gap_background)?,
        })
    }
}
