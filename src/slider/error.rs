use std::path::PathBuf;

/// Errors produced while locating a slide-CAPTCHA gap or planning a drag.
#[derive(Debug, thiserror::Error)]
pub enum SliderError {
    /// One of the two image buffers is not a decodable image.
    #[error("failed to decode {which} image: {source}")]
    Decode {
        which: &'static str,
        #[source]
        source: image::ImageError,
    },

    /// The background and gap images have different sizes.
    #[error("image dimensions differ: background is {background:?}, gap background is {gap_background:?}")]
    DimensionMismatch {
        background: (u32, u32),
        gap_background: (u32, u32),
    },

    /// An image file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No foreground pixel was found for one of the reference points.
    #[error("no gap found within the scan bounds")]
    GapNotFound,

    /// The drag distance is negative or not finite.
    #[error("drag distance must be finite and non-negative, got {0}")]
    InvalidDistance(f64),
}

impl SliderError {
    /// True for errors caused by the input images themselves
    /// (undecodable buffers or mismatched sizes).
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            SliderError::Decode { .. } | SliderError::DimensionMismatch { .. }
        )
    }
}
