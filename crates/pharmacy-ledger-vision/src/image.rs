//! Prescription image input.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::extraction::{ScanError, ScanResult};

/// A decoded still image of a prescription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrescriptionImage {
    mime_type: String,
    bytes: Vec<u8>,
}

impl PrescriptionImage {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> ScanResult<Self> {
        let mime_type = mime_type.into().trim().to_lowercase();
        if !mime_type.starts_with("image/") || mime_type.len() == "image/".len() {
            return Err(ScanError::InvalidImage(format!(
                "unsupported MIME type: {}",
                mime_type
            )));
        }
        if bytes.is_empty() {
            return Err(ScanError::InvalidImage("image is empty".into()));
        }
        Ok(Self { mime_type, bytes })
    }

    /// Parse a `data:<mime>;base64,<data>` URI as produced by camera capture.
    pub fn from_data_uri(uri: &str) -> ScanResult<Self> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| ScanError::InvalidImage("not a data URI".into()))?;
        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| ScanError::InvalidImage("data URI has no payload".into()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| ScanError::InvalidImage("data URI is not base64 encoded".into()))?;

        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|e| ScanError::InvalidImage(format!("bad base64: {}", e)))?;

        Self::new(mime_type, bytes)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Re-encode as a data URI for backends that take one.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}
