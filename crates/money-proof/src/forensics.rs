//! Rule-based forensics pass (spec §4.6, §9 non-goal: no ML model training
//! — heuristics only). Flags are independent booleans; confidence is a
//! single heuristic score in [0, 1] derived from how many of them fire.
//!
//! Routing decision (an explicit choice, not fully specified by the source
//! — see DESIGN.md): a submission only auto-verifies when confidence clears
//! the floor *and* no flag fired. Anything else escalates to human review;
//! there is no automatic rejection path, matching the error-handling
//! table's "uncertain → escalate, never auto-accept."

use money_core::constants::FORENSICS_SCREENSHOT_CONFIDENCE_FLOOR;
use money_core::proof::{ForensicsResult, ProofMetadata};

const SCREENSHOT_PENALTY: f64 = 0.30;
const LIKELY_AI_PENALTY: f64 = 0.40;
const LIKELY_EDITED_PENALTY: f64 = 0.20;
const TIMESTAMP_ANOMALY_PENALTY: f64 = 0.30;
const MISSING_GPS_PENALTY: f64 = 0.05;

/// Square resolutions common to image-generation model defaults.
const AI_SQUARE_SIDES: &[u32] = &[256, 512, 768, 1024, 1536, 2048];

pub fn analyze(metadata: &ProofMetadata, mime: &str, now: i64) -> ForensicsResult {
    let is_screenshot = metadata.exif.is_none() && (mime == "image/png" || mime == "image/webp");

    let likely_ai = metadata
        .resolution
        .map(|(w, h)| w == h && AI_SQUARE_SIDES.contains(&w))
        .unwrap_or(false);

    let likely_edited = metadata.exif.is_some() && metadata.capture_time.is_none();

    let timestamp_anomaly = match metadata.capture_time {
        Some(t) => t > now || t < 0,
        None => false,
    };

    let mut confidence = 1.0_f64;
    if is_screenshot {
        confidence -= SCREENSHOT_PENALTY;
    }
    if likely_ai {
        confidence -= LIKELY_AI_PENALTY;
    }
    if likely_edited {
        confidence -= LIKELY_EDITED_PENALTY;
    }
    if timestamp_anomaly {
        confidence -= TIMESTAMP_ANOMALY_PENALTY;
    }
    if metadata.gps.is_none() {
        confidence -= MISSING_GPS_PENALTY;
    }
    confidence = confidence.clamp(0.0, 1.0);

    ForensicsResult {
        confidence,
        is_screenshot,
        likely_ai,
        likely_edited,
        timestamp_anomaly,
    }
}

/// `true` iff the result clears automatic verification: confidence at or
/// above the floor and no heuristic flag raised.
pub fn auto_verifies(result: &ForensicsResult) -> bool {
    result.confidence >= FORENSICS_SCREENSHOT_CONFIDENCE_FLOOR
        && !result.is_screenshot
        && !result.likely_ai
        && !result.likely_edited
        && !result.timestamp_anomaly
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_submission_with_full_metadata_auto_verifies() {
        let metadata = ProofMetadata {
            exif: Some("Canon EOS 90D".into()),
            resolution: Some((4000, 3000)),
            capture_time: Some(500),
            gps: Some((37.77, -122.41)),
        };
        let result = analyze(&metadata, "image/jpeg", 1000);
        assert!(auto_verifies(&result));
    }

    #[test]
    fn exif_free_png_is_flagged_as_screenshot_and_escalates() {
        let metadata = ProofMetadata::default();
        let result = analyze(&metadata, "image/png", 1000);
        assert!(result.is_screenshot);
        assert!(!auto_verifies(&result));
    }

    #[test]
    fn square_ai_resolution_is_flagged() {
        let metadata = ProofMetadata {
            exif: Some("SomeEditor".into()),
            resolution: Some((1024, 1024)),
            capture_time: Some(500),
            gps: Some((0.0, 0.0)),
        };
        let result = analyze(&metadata, "image/jpeg", 1000);
        assert!(result.likely_ai);
        assert!(!auto_verifies(&result));
    }

    #[test]
    fn future_capture_time_is_a_timestamp_anomaly() {
        let metadata = ProofMetadata {
            exif: Some("Pixel 7".into()),
            resolution: Some((4000, 3000)),
            capture_time: Some(5000),
            gps: Some((0.0, 0.0)),
        };
        let result = analyze(&metadata, "image/jpeg", 1000);
        assert!(result.timestamp_anomaly);
        assert!(!auto_verifies(&result));
    }
}
