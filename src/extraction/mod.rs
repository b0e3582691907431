//! Scoreboard extraction through a multimodal language model.
//!
//! The model is an external collaborator: image plus hints in, raw player rows
//! out. This module provides:
//! - the `Extractor` trait the pipeline talks to
//! - image preparation (decode, downscale, base64)
//! - prompt construction and response parsing
//! - the HTTP client for the hosted model

pub mod client;
pub mod parse;
pub mod preprocess;
pub mod prompt;

pub use client::GeminiExtractor;
pub use preprocess::{EncodedImage, prepare_image};

use std::path::Path;
use thiserror::Error;

use crate::league::{ExtractedRow, RaceNumber};

/// Failure signal from the extraction collaborator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractionError {
    /// Overload or rate limiting; worth retrying after a pause
    #[error("service temporarily unavailable: {0}")]
    Transient(String),
    /// Anything else; surfaced immediately
    #[error("extraction failed: {0}")]
    Fatal(String),
}

impl ExtractionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExtractionError::Transient(_))
    }
}

/// Reads player rows off one scoreboard image.
pub trait Extractor: Send {
    fn extract(
        &self,
        image: &EncodedImage,
        race: RaceNumber,
        hints: &[String],
    ) -> Result<Vec<ExtractedRow>, ExtractionError>;
}

/// High-level function: image file → extracted rows.
///
/// Image decoding problems are fatal; the extractor decides the rest.
pub fn extract_race(
    extractor: &dyn Extractor,
    image_path: &Path,
    race: RaceNumber,
    hints: &[String],
    max_dimension: u32,
) -> Result<Vec<ExtractedRow>, ExtractionError> {
    let image = prepare_image(image_path, max_dimension)
        .map_err(|e| ExtractionError::Fatal(format!("{:#}", e)))?;

    crate::log(&format!(
        "Extracting race {} from {} ({}x{}, {} hints)",
        race,
        image_path.display(),
        image.width,
        image.height,
        hints.len()
    ));

    let rows = extractor.extract(&image, race, hints)?;

    crate::log(&format!(
        "Race {}: extracted {} rows ({} without a name)",
        race,
        rows.len(),
        rows.iter().filter(|row| !row.is_valid()).count()
    ));

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use tempfile::tempdir;

    struct EchoExtractor;

    impl Extractor for EchoExtractor {
        fn extract(
            &self,
            image: &EncodedImage,
            race: RaceNumber,
            hints: &[String],
        ) -> Result<Vec<ExtractedRow>, ExtractionError> {
            Ok(vec![ExtractedRow::new(
                &hints.join("+"),
                image.mime_type,
                image.width,
                &race.to_string(),
            )])
        }
    }

    #[test]
    fn test_retryable_only_for_transient() {
        assert!(ExtractionError::Transient("503".into()).is_retryable());
        assert!(!ExtractionError::Fatal("401".into()).is_retryable());
    }

    #[test]
    fn test_extract_race_passes_image_and_hints() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("board.png");
        ImageBuffer::from_pixel(40, 20, Rgba([10u8, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let hints = vec!["Alice".to_string(), "Bob".to_string()];
        let rows = extract_race(&EchoExtractor, &path, RaceNumber::LAST, &hints, 1600).unwrap();

        assert_eq!(rows[0].player, "Alice+Bob");
        assert_eq!(rows[0].team, "image/png");
        assert_eq!(rows[0].score, 40);
        assert_eq!(rows[0].rank, "12");
    }

    #[test]
    fn test_unreadable_image_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let err = extract_race(&EchoExtractor, &path, RaceNumber::FIRST, &[], 1600).unwrap_err();
        assert!(!err.is_retryable());
    }
}
