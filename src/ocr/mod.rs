//! Alphanumeric CAPTCHA recognition.
//!
//! Recognition itself is delegated to an external engine behind the
//! `CaptchaClassifier` trait; the bundled implementation runs Tesseract.

pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod setup;

pub use engine::{OcrLine, OcrWord, TesseractClassifier};
pub use extract::{extract_captcha_text, normalize_captcha_text};
pub use preprocess::{binarize_dark_text, prepare_for_ocr};
pub use setup::locate_tesseract;

use anyhow::{Context, Result};
use image::DynamicImage;
use serde::Serialize;
use std::path::Path;

/// Text read from a CAPTCHA image.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recognition {
    pub text: String,
    /// Engine confidence, 0-100
    pub confidence: f32,
}

/// Reads the text of an alphanumeric CAPTCHA image.
pub trait CaptchaClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Recognition>;
}

/// High-level function: encoded image bytes → CAPTCHA text.
pub fn recognize_captcha(bytes: &[u8], classifier: &dyn CaptchaClassifier) -> Result<Recognition> {
    let image = image::load_from_memory(bytes).context("Failed to decode CAPTCHA image")?;
    let recognition = classifier.classify(&image)?;
    crate::log(&format!(
        "CAPTCHA recognized as {:?} ({:.0}%)",
        recognition.text, recognition.confidence
    ));
    Ok(recognition)
}

/// Reads an image file and recognizes it.
pub fn recognize_captcha_file(
    path: &Path,
    classifier: &dyn CaptchaClassifier,
) -> Result<Recognition> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    recognize_captcha(&bytes, classifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    /// Reports the image size as its "text".
    struct SizeClassifier;

    impl CaptchaClassifier for SizeClassifier {
        fn classify(&self, image: &DynamicImage) -> Result<Recognition> {
            Ok(Recognition {
                text: format!("{}x{}", image.width(), image.height()),
                confidence: 100.0,
            })
        }
    }

    #[test]
    fn test_recognize_captcha_decodes_before_classifying() {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(12, 5, Rgba([0, 0, 0, 255])));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let recognition = recognize_captcha(&bytes, &SizeClassifier).unwrap();
        assert_eq!(recognition.text, "12x5");
    }

    #[test]
    fn test_recognize_captcha_rejects_garbage() {
        assert!(recognize_captcha(b"nope", &SizeClassifier).is_err());
    }

    #[test]
    fn test_recognize_missing_file() {
        let missing = Path::new("/nonexistent/captcha.png");
        assert!(recognize_captcha_file(missing, &SizeClassifier).is_err());
    }
}
