//! Prompts for prescription scanning.

/// System prompt for the vision model.
pub const SYSTEM_PROMPT: &str = r#"You are an expert pharmacist. Your task is to analyze the provided image of a medical prescription.

The handwriting may be messy. Use your knowledge of common medicines to decipher the text.
Identify only the names of the medicines prescribed and list them.

Do not include dosages, frequencies, patient details or doctor details.
Output JSON with a "medicines" array of strings."#;

/// JSON schema the model's reply must follow.
pub const OUTPUT_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "medicines": {
      "type": "array",
      "items": { "type": "string" },
      "description": "A list of medicine names identified from the prescription."
    }
  },
  "required": ["medicines"]
}"#;

/// User prompt sent alongside the image.
pub fn build_scan_prompt() -> String {
    format!(
        r#"Read the attached prescription image and list every medicine prescribed.

Return a JSON object matching this schema:
{}

Example: {{"medicines":["Paracetamol 500mg","Amoxicillin 250mg"]}}
Return {{"medicines":[]}} if no medicine can be read."#,
        OUTPUT_SCHEMA
    )
}
