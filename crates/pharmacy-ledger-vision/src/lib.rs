//! Prescription scanning boundary.
//!
//! A vision model reads a photo of a prescription and returns the medicine
//! names it can make out. This crate owns everything on our side of that
//! call: the prompt, image input validation and best-effort parsing of the
//! model's reply. The names carry no dosage and may be wrong; callers match
//! them against the catalog before anything reaches a bill.

pub mod extraction;
pub mod image;
pub mod prompts;
pub mod scanner;

pub use extraction::*;
pub use image::*;
pub use prompts::*;
pub use scanner::*;
