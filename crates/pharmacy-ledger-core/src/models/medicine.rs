//! Medicine catalog models.

use serde::{Deserialize, Serialize};

use super::stock::Stock;

/// Medicine category. Decides which stock representation applies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Tablet,
    Syrup,
    Veterinary,
    Injection,
    Other,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 5] = [
        Category::Tablet,
        Category::Syrup,
        Category::Veterinary,
        Category::Injection,
        Category::Other,
    ];

    /// Whether this category keeps strips and loose tablets.
    pub fn is_decomposed(self) -> bool {
        matches!(self, Category::Tablet)
    }

    /// Whether `stock` is the representation this category uses.
    pub fn accepts(self, stock: &Stock) -> bool {
        match stock {
            Stock::DecomposedTablet { .. } => self.is_decomposed(),
            Stock::FlatUnit { .. } => !self.is_decomposed(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Tablet => "Tablet",
            Category::Syrup => "Syrup",
            Category::Veterinary => "Veterinary",
            Category::Injection => "Injection",
            Category::Other => "Other",
        }
    }

    /// Parse a category name, case-insensitively.
    pub fn parse(s: &str) -> Option<Category> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in the pharmacy catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    /// Opaque identifier, assigned at creation
    pub id: String,
    /// Display name (e.g., "Paracetamol 500mg")
    pub name: String,
    /// Shelf location (e.g., "Rack A-1")
    pub location: String,
    pub category: Category,
    /// Price per strip for tablets, per unit otherwise
    pub price: f64,
    pub stock: Stock,
}

/// Caller-supplied fields for creating or editing a medicine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicineInput {
    pub name: String,
    pub location: String,
    pub category: Category,
    pub price: f64,
    pub stock: Stock,
}

impl Medicine {
    /// Build a catalog entry with a fresh id.
    pub fn new(input: MedicineInput) -> Self {
        Self::with_id(new_medicine_id(), input)
    }

    /// Build a catalog entry under an existing id.
    pub fn with_id(id: String, input: MedicineInput) -> Self {
        Self {
            id,
            name: input.name,
            location: input.location,
            category: input.category,
            price: input.price,
            stock: input.stock,
        }
    }

    /// Units currently available in the native unit (tablets or units).
    pub fn available_units(&self) -> u64 {
        self.stock.available_units()
    }

    pub fn in_stock(&self) -> bool {
        self.available_units() > 0
    }

    /// Whether availability has dropped to `threshold` units or fewer.
    pub fn is_low_stock(&self, threshold: u64) -> bool {
        self.available_units() <= threshold
    }

    /// Price of one native unit: one tablet for tablets, one unit otherwise.
    pub fn unit_price(&self) -> f64 {
        match self.stock.tablets_per_strip() {
            Some(per_strip) => self.price / f64::from(per_strip),
            None => self.price,
        }
    }
}

impl MedicineInput {
    /// Tablet entry with strips and loose tablets, as entered.
    ///
    /// The stock is not normalized here: a zero pack size is filled in from
    /// the ledger's configured default when the entry is saved.
    pub fn tablet(
        name: impl Into<String>,
        location: impl Into<String>,
        price_per_strip: f64,
        strips: u64,
        loose_tablets: u64,
        tablets_per_strip: u32,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            category: Category::Tablet,
            price: price_per_strip,
            stock: Stock::DecomposedTablet {
                strips,
                loose_tablets,
                tablets_per_strip,
            },
        }
    }

    /// Non-tablet entry counted in plain units.
    pub fn units(
        name: impl Into<String>,
        location: impl Into<String>,
        category: Category,
        price: f64,
        quantity: u64,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            category,
            price,
            stock: Stock::flat(quantity),
        }
    }

    /// Problem with the input, if any.
    ///
    /// Price problems are reported separately from descriptive ones so the
    /// caller can map them to distinct messages.
    pub fn problem(&self) -> Option<InputProblem> {
        if self.name.trim().is_empty() {
            return Some(InputProblem::Field("name must not be blank".into()));
        }
        if self.location.trim().is_empty() {
            return Some(InputProblem::Field("location must not be blank".into()));
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Some(InputProblem::Price(self.price));
        }
        if !self.category.accepts(&self.stock) {
            return Some(InputProblem::Field(format!(
                "{} stock does not match category {}",
                stock_kind(&self.stock),
                self.category
            )));
        }
        None
    }
}

/// Why a [`MedicineInput`] was refused.
#[derive(Debug, Clone, PartialEq)]
pub enum InputProblem {
    Field(String),
    Price(f64),
}

fn stock_kind(stock: &Stock) -> &'static str {
    match stock {
        Stock::FlatUnit { .. } => "unit",
        Stock::DecomposedTablet { .. } => "tablet",
    }
}

/// Fresh medicine id.
pub fn new_medicine_id() -> String {
    format!("med-{}", uuid::Uuid::new_v4())
}
