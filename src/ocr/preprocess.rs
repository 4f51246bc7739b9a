use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};

/// Minimum height handed to Tesseract; CAPTCHA images are often tiny.
const MIN_OCR_HEIGHT: u32 = 64;

/// Converts image to binary by keeping only dark pixels.
///
/// Pixels with BT.601 luma below `threshold` become black (text).
/// All other pixels become white (background), which drops the light noise
/// and colored backgrounds most alphanumeric CAPTCHAs use.
pub fn binarize_dark_text(img: &DynamicImage, threshold: u8) -> GrayImage {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    ImageBuffer::from_fn(width, height, |x, y| {
        let p = rgba.get_pixel(x, y);
        let luma = 0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32;
        let value = if luma < threshold as f32 { 0u8 } else { 255u8 };
        Luma([value])
    })
}

/// Upscales small images so the text is tall enough for Tesseract.
pub fn upscale_for_ocr(img: &DynamicImage) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    if height == 0 || height >= MIN_OCR_HEIGHT {
        return img.clone();
    }
    let scale = MIN_OCR_HEIGHT.div_ceil(height);
    img.resize(width * scale, height * scale, FilterType::CatmullRom)
}

/// Full preprocessing: upscale, then either binarize or convert to grayscale.
pub fn prepare_for_ocr(img: &DynamicImage, binarize: bool, threshold: u8) -> GrayImage {
    let scaled = upscale_for_ocr(img);
    if binarize {
        binarize_dark_text(&scaled, threshold)
    } else {
        scaled.to_luma8()
    }
}
