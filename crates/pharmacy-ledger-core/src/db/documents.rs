//! Versioned JSON documents stored in the catalog and sales slots.
//!
//! Current documents are wrapped in an envelope:
//!
//! ```text
//! { "schemaVersion": 2, "checksum": "<sha256 hex>", "payload": [...] }
//! ```
//!
//! The checksum covers the canonical (key-sorted) JSON text of `payload`.
//! A bare JSON array is a version 1 document written before envelopes
//! existed and goes through [`migrate_legacy_catalog`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::{Category, Medicine, SaleRecord, Stock};

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Version assigned to unversioned (bare array) documents.
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

/// Reasons a stored document could not be read.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("checksum mismatch (expected {expected}, found {found})")]
    ChecksumMismatch { expected: String, found: String },

    #[error("unsupported schema version {0}")]
    UnsupportedVersion(u32),

    #[error("unexpected document shape: {0}")]
    Shape(String),
}

/// A decoded document and the version it was stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub schema_version: u32,
}

impl<T> Decoded<T> {
    /// Whether the stored document predates the current schema.
    pub fn was_migrated(&self) -> bool {
        self.schema_version < CURRENT_SCHEMA_VERSION
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    schema_version: u32,
    checksum: String,
    payload: Value,
}

/// Encode the catalog as a current-version document.
pub fn encode_catalog(catalog: &[Medicine]) -> Result<String, serde_json::Error> {
    encode(catalog)
}

/// Encode the sale history as a current-version document.
pub fn encode_sales(sales: &[SaleRecord]) -> Result<String, serde_json::Error> {
    encode(sales)
}

/// Decode a catalog document, migrating legacy shapes.
///
/// `fallback_per_strip` fills in a missing or zero pack size.
pub fn decode_catalog(
    document: &str,
    fallback_per_strip: u32,
) -> Result<Decoded<Vec<Medicine>>, DocumentError> {
    let (schema_version, payload) = open(document)?;
    let catalog = if schema_version == LEGACY_SCHEMA_VERSION {
        let legacy: Vec<LegacyMedicine> = serde_json::from_value(payload)?;
        migrate_legacy_catalog(legacy, fallback_per_strip)
    } else {
        serde_json::from_value(payload)?
    };
    let value = catalog
        .into_iter()
        .map(|m| repair_loaded(m, fallback_per_strip))
        .collect();
    Ok(Decoded {
        value,
        schema_version,
    })
}

/// Decode a sale history document. Version 1 records share the current shape.
pub fn decode_sales(document: &str) -> Result<Decoded<Vec<SaleRecord>>, DocumentError> {
    let (schema_version, payload) = open(document)?;
    Ok(Decoded {
        value: from_payload(payload)?,
        schema_version,
    })
}

fn encode<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    let payload = serde_json::to_value(payload)?;
    let envelope = Envelope {
        schema_version: CURRENT_SCHEMA_VERSION,
        checksum: checksum(&payload),
        payload,
    };
    serde_json::to_string(&envelope)
}

fn from_payload<T: DeserializeOwned>(payload: Value) -> Result<T, DocumentError> {
    Ok(serde_json::from_value(payload)?)
}

/// Split a document into its schema version and verified payload.
fn open(document: &str) -> Result<(u32, Value), DocumentError> {
    let value: Value = serde_json::from_str(document)?;
    match value {
        Value::Array(_) => Ok((LEGACY_SCHEMA_VERSION, value)),
        Value::Object(_) => {
            let envelope: Envelope = serde_json::from_value(value)?;
            if envelope.schema_version > CURRENT_SCHEMA_VERSION
                || envelope.schema_version < LEGACY_SCHEMA_VERSION
            {
                return Err(DocumentError::UnsupportedVersion(envelope.schema_version));
            }
            let found = checksum(&envelope.payload);
            if found != envelope.checksum {
                return Err(DocumentError::ChecksumMismatch {
                    expected: envelope.checksum,
                    found,
                });
            }
            Ok((envelope.schema_version, envelope.payload))
        }
        other => Err(DocumentError::Shape(format!(
            "expected array or envelope object, found {}",
            json_kind(&other)
        ))),
    }
}

/// Bring a loaded entry back in line with the catalog invariants.
///
/// Stock kept in the wrong representation for its category is converted,
/// keeping its unit count. A negative price becomes 0; a missing or zero
/// price is kept and logged so it can be corrected from the catalog screen.
fn repair_loaded(mut medicine: Medicine, fallback_per_strip: u32) -> Medicine {
    if !medicine.category.accepts(&medicine.stock) {
        let units = medicine.stock.available_units();
        tracing::warn!(
            id = %medicine.id,
            category = %medicine.category,
            units,
            "stored stock does not match category, converting"
        );
        medicine.stock = if medicine.category.is_decomposed() {
            Stock::tablets_from_units(units, fallback_per_strip)
        } else {
            Stock::flat(units)
        };
    }
    medicine.stock = medicine.stock.normalized(fallback_per_strip);

    if medicine.price.is_nan() || medicine.price < 0.0 {
        tracing::warn!(id = %medicine.id, price = medicine.price, "invalid stored price, using 0");
        medicine.price = 0.0;
    } else if medicine.price == 0.0 {
        tracing::warn!(id = %medicine.id, "stored medicine has no price");
    }
    medicine
}

fn checksum(payload: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =========================================================================
// Legacy catalog migration
// =========================================================================

/// Catalog entry as written by earlier revisions.
///
/// Revisions differ in which stock fields exist, so all of them are
/// optional and numeric fields accept fractions.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyMedicine {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub strips: Option<f64>,
    #[serde(default)]
    pub loose_tablets: Option<f64>,
    #[serde(default)]
    pub tablets_per_strip: Option<f64>,
}

/// Convert legacy entries into canonical current-schema medicines.
///
/// - No category: tablets. `strips`/`looseTablets` are used when present,
///   otherwise `quantity` counts strips and a fractional part becomes
///   loose tablets (rounded to nearest).
/// - Tablet category: same, with `quantity` standing in for missing strips.
/// - Other categories: flat `quantity` units.
pub fn migrate_legacy_catalog(
    legacy: Vec<LegacyMedicine>,
    fallback_per_strip: u32,
) -> Vec<Medicine> {
    legacy
        .into_iter()
        .map(|m| migrate_one(m, fallback_per_strip))
        .collect()
}

fn migrate_one(legacy: LegacyMedicine, fallback_per_strip: u32) -> Medicine {
    let category = match legacy.category.as_deref() {
        None => Category::Tablet,
        Some(raw) => Category::parse(raw).unwrap_or_else(|| {
            tracing::warn!(id = %legacy.id, category = raw, "unknown legacy category, using Other");
            Category::Other
        }),
    };

    let stock = if category.is_decomposed() {
        let per_strip = legacy
            .tablets_per_strip
            .map(|n| non_negative(&legacy.id, "tabletsPerStrip", n).round())
            .filter(|n| *n >= 1.0 && *n <= f64::from(u32::MAX))
            .map(|n| n as u32)
            .unwrap_or(fallback_per_strip);
        let strips = non_negative(
            &legacy.id,
            "strips",
            legacy.strips.or(legacy.quantity).unwrap_or(0.0),
        );
        let loose = non_negative(&legacy.id, "looseTablets", legacy.loose_tablets.unwrap_or(0.0));
        let total = (strips * f64::from(per_strip)).round() + loose.round();
        Stock::tablets_from_units(total as u64, per_strip)
    } else {
        let quantity = non_negative(&legacy.id, "quantity", legacy.quantity.unwrap_or(0.0));
        Stock::flat(quantity.round() as u64)
    };

    Medicine {
        id: legacy.id,
        name: legacy.name,
        location: legacy.location,
        category,
        price: legacy.price,
        stock,
    }
}

fn non_negative(id: &str, field: &str, value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        return value;
    }
    tracing::warn!(id, field, value, "negative or invalid legacy stock value, using 0");
    0.0
}
