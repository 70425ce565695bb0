use std::fmt;

use anyhow::{Result, anyhow};
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    Override,
    Bom,
    ValidUtf8,
    Detector,
}

impl fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DetectionSource::Override => "override",
            DetectionSource::Bom => "bom",
            DetectionSource::ValidUtf8 => "valid-utf8",
            DetectionSource::Detector => "detector",
        })
    }
}

#[derive(Debug, Clone)]
pub struct DecodedFile {
    pub text: String,
    pub encoding: &'static Encoding,
    pub source: DetectionSource,
    pub lossy: bool,
}

// Optional user-forced encoding; without it files go through
// BOM → UTF-8 validity → chardetng.
#[derive(Debug, Clone, Default)]
pub struct EncodingOverride {
    forced: Option<&'static Encoding>,
}

impl EncodingOverride {
    pub fn parse(label: Option<&str>) -> Result<Self> {
        let Some(label) = label else {
            return Ok(Self::default());
        };
        let trimmed = label.trim();
        let encoding = Encoding::for_label(trimmed.as_bytes())
            .ok_or_else(|| anyhow!("unknown encoding override '{trimmed}'"))?;
        Ok(Self {
            forced: Some(encoding),
        })
    }

    pub fn describe(&self) -> String {
        match self.forced {
            Some(encoding) => format!("forced {}", encoding.name()),
            None => "auto-detect (BOM, then UTF-8, then detector)".to_string(),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> DecodedFile {
        let (encoding, source) = match self.forced {
            Some(encoding) => (encoding, DetectionSource::Override),
            None => detect(bytes),
        };
        let (text, _, lossy) = encoding.decode(bytes);
        DecodedFile {
            text: text.into_owned(),
            encoding,
            source,
            lossy,
        }
    }
}

fn detect(bytes: &[u8]) -> (&'static Encoding, DetectionSource) {
    if let Some(encoding) = bom_encoding(bytes) {
        return (encoding, DetectionSource::Bom);
    }
    if std::str::from_utf8(bytes).is_ok() {
        return (UTF_8, DetectionSource::ValidUtf8);
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    (detector.guess(None, true), DetectionSource::Detector)
}

fn bom_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        Some(UTF_8)
    } else if bytes.starts_with(&[0xFF, 0xFE]) {
        Some(UTF_16LE)
    } else if bytes.starts_with(&[0xFE, 0xFF]) {
        Some(UTF_16BE)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_utf8_is_accepted_without_bom() {
        let decoded = EncodingOverride::default().decode("héllo".as_bytes());
        assert_eq!(decoded.source, DetectionSource::ValidUtf8);
        assert_eq!(decoded.text, "héllo");
        assert!(!decoded.lossy);
    }

    #[test]
    fn utf16_bom_wins_over_detection() {
        let bytes = [0xFF, 0xFE, 0x61, 0x00, 0x62, 0x00];
        let decoded = EncodingOverride::default().decode(&bytes);
        assert_eq!(decoded.source, DetectionSource::Bom);
        assert_eq!(decoded.text, "ab");
    }

    #[test]
    fn unknown_override_label_is_rejected() {
        assert!(EncodingOverride::parse(Some("not-a-real-encoding")).is_err());
        assert!(EncodingOverride::parse(Some("utf-16le")).is_ok());
    }
}
