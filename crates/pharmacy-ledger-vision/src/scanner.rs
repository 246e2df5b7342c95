//! Scanner backends.

use tracing::{debug, warn};

use crate::extraction::{parse_scan_output, ScanError, ScanResult};
use crate::image::PrescriptionImage;
use crate::prompts::{build_scan_prompt, SYSTEM_PROMPT};

/// Something that can read medicine names off a prescription image.
pub trait PrescriptionScanner {
    fn scan(&self, image: &PrescriptionImage) -> ScanResult<Vec<String>>;
}

/// One vision model call: prompts plus the image as a data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub image_data_uri: String,
}

impl ScanRequest {
    pub fn for_image(image: &PrescriptionImage) -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: build_scan_prompt(),
            image_data_uri: image.to_data_uri(),
        }
    }
}

/// A vision model that answers a [`ScanRequest`] with its raw text reply.
///
/// Every backend is a [`PrescriptionScanner`]; the reply goes through
/// [`parse_scan_output`].
pub trait VisionBackend {
    fn complete(&self, request: &ScanRequest) -> anyhow::Result<String>;
}

impl<B: VisionBackend> PrescriptionScanner for B {
    fn scan(&self, image: &PrescriptionImage) -> ScanResult<Vec<String>> {
        let request = ScanRequest::for_image(image);
        let reply = self.complete(&request).map_err(ScanError::Backend)?;
        Ok(parse_scan_output(&reply)?.medicines)
    }
}

/// Scan, degrading any failure to an empty list.
///
/// Scanning is a convenience for pre-filling search; it never blocks a sale.
pub fn scan_or_empty<S: PrescriptionScanner + ?Sized>(
    scanner: &S,
    image: &PrescriptionImage,
) -> Vec<String> {
    match scanner.scan(image) {
        Ok(names) => {
            debug!(count = names.len(), "prescription scanned");
            names
        }
        Err(e) => {
            warn!(error = %e, "prescription scan failed, returning no names");
            Vec::new()
        }
    }
}

/// Mock backend for testing without a vision model.
///
/// Returns a fixed model reply, run through the same parser a real backend
/// uses.
pub struct MockScanner {
    response: String,
}

impl MockScanner {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }

    /// A scanner that replies with the given names.
    pub fn with_names(names: &[&str]) -> Self {
        let body = serde_json::json!({ "medicines": names });
        Self::new(body.to_string())
    }
}

impl VisionBackend for MockScanner {
    fn complete(&self, _request: &ScanRequest) -> anyhow::Result<String> {
        Ok(self.response.clone())
    }
}
