use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ProcessQuery {
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

/// Pixel-space bounding box of a detected face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FaceRectangle {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityForRecognition {
    Low,
    Medium,
    High,
}

impl QualityForRecognition {
    pub fn is_lowest(self) -> bool {
        self == QualityForRecognition::Low
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedFace {
    pub rectangle: FaceRectangle,
    pub quality: Option<QualityForRecognition>,
}

impl DetectedFace {
    /// An absent classification counts as usable.
    pub fn is_low_quality(&self) -> bool {
        self.quality.is_some_and(QualityForRecognition::is_lowest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(quality: Option<QualityForRecognition>) -> DetectedFace {
        DetectedFace {
            rectangle: FaceRectangle {
                left: 0,
                top: 0,
                width: 1,
                height: 1,
            },
            quality,
        }
    }

    #[test]
    fn only_low_tier_is_low_quality() {
        assert!(face(Some(QualityForRecognition::Low)).is_low_quality());
        assert!(!face(Some(QualityForRecognition::Medium)).is_low_quality());
        assert!(!face(Some(QualityForRecognition::High)).is_low_quality());
    }

    #[test]
    fn missing_quality_is_not_low() {
        assert!(!face(None).is_low_quality());
    }

    #[test]
    fn quality_parses_lowercase_wire_values() {
        let q: QualityForRecognition = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(q, QualityForRecognition::Medium);
        assert!(serde_json::from_str::<QualityForRecognition>("\"Medium\"").is_err());
    }
}
