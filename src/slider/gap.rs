//! Slide-CAPTCHA gap location via image differencing.
//!
//! The intact background and the background with the gap cut into it are
//! differenced and binarized. Two column-major scans over the resulting mask
//! find the left edge of the marker block and, one block width further right,
//! the left edge of the puzzle-piece outline. Their horizontal offset is the
//! drag distance.

use image::{ImageBuffer, Rgba, RgbaImage};
use serde::Serialize;

use crate::config::GapConfig;
use crate::slider::error::SliderError;

/// Mask value for pixels that belong to the gap outline.
pub const FOREGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
/// Mask value for unchanged pixels.
pub const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Binary mask with the same dimensions as the differenced images.
pub type DifferenceMask = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// First foreground pixel met by a column-major scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ReferencePoint {
    pub x: u32,
    pub y: u32,
}

/// Result of a gap scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GapOutcome {
    /// Both reference points were found.
    Located {
        first: ReferencePoint,
        second: ReferencePoint,
        distance: u32,
    },
    /// The mask had no usable foreground. `anchor` holds the first point if
    /// only the second one is missing.
    NotFound { anchor: Option<ReferencePoint> },
}

impl GapOutcome {
    /// Drag distance in pixels; 0 when nothing was found.
    pub fn distance(&self) -> u32 {
        match self {
            GapOutcome::Located { distance, .. } => *distance,
            GapOutcome::NotFound { .. } => 0,
        }
    }

    pub fn is_located(&self) -> bool {
        matches!(self, GapOutcome::Located { .. })
    }
}

/// Decodes both buffers and locates the gap.
///
/// Fails if either buffer is not an image or the two sizes differ.
pub fn locate_gap(
    background: &[u8],
    gap_background: &[u8],
    config: &GapConfig,
) -> Result<GapOutcome, SliderError> {
    let background = decode_rgba(background, "background")?;
    let gap_background = decode_rgba(gap_background, "gap background")?;
    locate_gap_in(&background, &gap_background, config)
}

/// Locates the gap in two already decoded images.
pub fn locate_gap_in(
    background: &RgbaImage,
    gap_background: &RgbaImage,
    config: &GapConfig,
) -> Result<GapOutcome, SliderError> {
    let mask = difference_mask(background, gap_background, config.diff_threshold)?;
    let bounds = (config.scan_width, config.scan_height);

    let Some(first) = find_reference_point(&mask, 0, bounds) else {
        crate::log("Gap scan: no foreground pixel in scan bounds");
        return Ok(GapOutcome::NotFound { anchor: None });
    };

    let resume_x = first.x.saturating_add(config.block_width);
    let Some(second) = find_reference_point(&mask, resume_x, bounds) else {
        crate::log(&format!(
            "Gap scan: marker at ({}, {}) but no outline after x={}",
            first.x, first.y, resume_x
        ));
        return Ok(GapOutcome::NotFound {
            anchor: Some(first),
        });
    };

    let distance = second.x - first.x;
    crate::log(&format!(
        "Gap scan: first=({}, {}) second=({}, {}) distance={}",
        first.x, first.y, second.x, second.y, distance
    ));

    Ok(GapOutcome::Located {
        first,
        second,
        distance,
    })
}

/// Binarizes the per-channel absolute difference of two images.
///
/// A pixel becomes [`FOREGROUND`] when the red, green or blue difference is
/// at least `threshold`, otherwise [`BACKGROUND`]. Alpha is ignored.
pub fn difference_mask(
    a: &RgbaImage,
    b: &RgbaImage,
    threshold: u8,
) -> Result<DifferenceMask, SliderError> {
    if a.dimensions() != b.dimensions() {
        return Err(SliderError::DimensionMismatch {
            background: a.dimensions(),
            gap_background: b.dimensions(),
        });
    }

    let (width, height) = a.dimensions();
    Ok(ImageBuffer::from_fn(width, height, |x, y| {
        let pa = a.get_pixel(x, y);
        let pb = b.get_pixel(x, y);
        let changed = (0..3).any(|c| pa[c].abs_diff(pb[c]) >= threshold);
        if changed { FOREGROUND } else { BACKGROUND }
    }))
}

/// Scans columns from `start_x` rightwards, rows top to bottom, and returns
/// the first foreground pixel inside `bounds` (clipped to the mask).
pub fn find_reference_point(
    mask: &DifferenceMask,
    start_x: u32,
    bounds: (u32, u32),
) -> Option<ReferencePoint> {
    let max_x = bounds.0.min(mask.width());
    let max_y = bounds.1.min(mask.height());

    (start_x..max_x)
        .flat_map(|x| (0..max_y).map(move |y| (x, y)))
        .find(|&(x, y)| *mask.get_pixel(x, y) != BACKGROUND)
        .map(|(x, y)| ReferencePoint { x, y })
}

fn decode_rgba(bytes: &[u8], which: &'static str) -> Result<RgbaImage, SliderError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|source| SliderError::Decode { which, source })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    const SKY: Rgba<u8> = Rgba([40, 90, 160, 255]);
    const GAP: Rgba<u8> = Rgba([220, 220, 220, 255]);

    /// 260x116 background with a gentle gradient.
    pub(crate) fn background() -> RgbaImage {
        ImageBuffer::from_fn(260, 116, |x, y| {
            Rgba([SKY[0] + (x / 10) as u8, SKY[1] + (y / 10) as u8, SKY[2], 255])
        })
    }

    /// Paints two 30x40 blocks, the second `distance` pixels right of the first.
    pub(crate) fn with_blocks(base: &RgbaImage, left: u32, distance: u32) -> RgbaImage {
        let mut img = base.clone();
        for start in [left, left + distance] {
            for x in start..start + 30 {
                for y in 30..70 {
                    img.put_pixel(x, y, GAP);
                }
            }
        }
        img
    }

    pub(crate) fn encode_png(img: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img.clone())
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_identical_images_not_found() {
        let bg = background();
        let mask = difference_mask(&bg, &bg, 100).unwrap();
        assert!(mask.pixels().all(|p| *p == BACKGROUND));

        let outcome = locate_gap_in(&bg, &bg, &GapConfig::default()).unwrap();
        assert_eq!(outcome, GapOutcome::NotFound { anchor: None });
        assert_eq!(outcome.distance(), 0);
    }

    #[test]
    fn test_two_blocks_report_their_separation() {
        let bg = background();
        for distance in [50, 73, 120, 180, 220] {
            let gapped = with_blocks(&bg, 10, distance);
            let outcome = locate_gap_in(&bg, &gapped, &GapConfig::default()).unwrap();
            assert_eq!(outcome.distance(), distance, "separation {}", distance);
            match outcome {
                GapOutcome::Located { first, second, .. } => {
                    assert_eq!(first, ReferencePoint { x: 10, y: 30 });
                    assert_eq!(second, ReferencePoint { x: 10 + distance, y: 30 });
                }
                other => panic!("expected a located gap, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_block_width_skips_marker() {
        // Second block starts inside the skipped columns, so the second scan
        // lands on its interior at the resume column.
        let bg = background();
        let gapped = with_blocks(&bg, 10, 35);
        let outcome = locate_gap_in(&bg, &gapped, &GapConfig::default()).unwrap();
        assert_eq!(outcome.distance(), 50);

        let narrow = GapConfig { block_width: 30, ..GapConfig::default() };
        let outcome = locate_gap_in(&bg, &gapped, &narrow).unwrap();
        assert_eq!(outcome.distance(), 35);
    }

    #[test]
    fn test_threshold_boundary() {
        let a: RgbaImage = ImageBuffer::from_pixel(3, 1, Rgba([100, 100, 100, 255]));
        let mut b = a.clone();
        b.put_pixel(0, 0, Rgba([200, 100, 100, 255])); // red differs by 100
        b.put_pixel(1, 0, Rgba([100, 199, 100, 255])); // green differs by 99
        b.put_pixel(2, 0, Rgba([100, 100, 0, 255])); // blue differs by 100

        let mask = difference_mask(&a, &b, 100).unwrap();
        assert_eq!(*mask.get_pixel(0, 0), FOREGROUND, "difference of 100 is foreground");
        assert_eq!(*mask.get_pixel(1, 0), BACKGROUND, "difference of 99 is background");
        assert_eq!(*mask.get_pixel(2, 0), FOREGROUND);
    }

    #[test]
    fn test_alpha_difference_ignored() {
        let a: RgbaImage = ImageBuffer::from_pixel(2, 2, Rgba([10, 10, 10, 255]));
        let b: RgbaImage = ImageBuffer::from_pixel(2, 2, Rgba([10, 10, 10, 0]));
        let mask = difference_mask(&a, &b, 100).unwrap();
        assert!(mask.pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn test_mask_has_input_dimensions() {
        let bg = background();
        let mask = difference_mask(&bg, &with_blocks(&bg, 10, 60), 100).unwrap();
        assert_eq!(mask.dimensions(), bg.dimensions());
    }

    #[test]
    fn test_dimension_mismatch_is_invalid_input() {
        let a: RgbaImage = ImageBuffer::new(10, 10);
        let b: RgbaImage = ImageBuffer::new(10, 11);
        let err = locate_gap_in(&a, &b, &GapConfig::default()).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(matches!(err, SliderError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_undecodable_buffer_is_invalid_input() {
        let png = encode_png(&background());
        let err = locate_gap(&png, b"definitely not an image", &GapConfig::default())
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert!(matches!(err, SliderError::Decode { which: "gap background", .. }));
    }

    #[test]
    fn test_locate_gap_from_png_bytes_is_idempotent() {
        let bg = background();
        let background_png = encode_png(&bg);
        let gap_png = encode_png(&with_blocks(&bg, 20, 90));

        let first = locate_gap(&background_png, &gap_png, &GapConfig::default()).unwrap();
        let second = locate_gap(&background_png, &gap_png, &GapConfig::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.distance(), 90);
    }

    #[test]
    fn test_scan_bounds_limit_search() {
        let bg = background();
        let gapped = with_blocks(&bg, 10, 150);

        // Scan area ends before the second block.
        let cfg = GapConfig { scan_width: 120, ..GapConfig::default() };
        let outcome = locate_gap_in(&bg, &gapped, &cfg).unwrap();
        assert!(!outcome.is_located());
        assert_eq!(
            outcome,
            GapOutcome::NotFound {
                anchor: Some(ReferencePoint { x: 10, y: 30 })
            }
        );

        // Rows above the blocks only.
        let cfg = GapConfig { scan_height: 30, ..GapConfig::default() };
        let outcome = locate_gap_in(&bg, &gapped, &cfg).unwrap();
        assert_eq!(outcome, GapOutcome::NotFound { anchor: None });
    }

    #[test]
    fn test_marker_at_origin_is_found() {
        let a: RgbaImage = ImageBuffer::new(120, 10);
        let mut b = a.clone();
        b.put_pixel(0, 0, FOREGROUND);
        b.put_pixel(80, 5, FOREGROUND);

        let outcome = locate_gap_in(&a, &b, &GapConfig::default()).unwrap();
        assert_eq!(
            outcome,
            GapOutcome::Located {
                first: ReferencePoint { x: 0, y: 0 },
                second: ReferencePoint { x: 80, y: 5 },
                distance: 80,
            }
        );
    }
}
