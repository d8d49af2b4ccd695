//! Record Module
//!
//! One row of the revenue dataset and its fixed-width store encoding.
//!
//! ## Store Text
//! ```text
//! period,total,hardware,software,accessories\0\0\0...
//! └──────────── ≤ MAX_RECORD_LEN ──────────┘└─ NUL padding to SLOT_WIDTH ─┘
//! ```
//! Numbers are always written with exactly two decimals.

mod codec;

pub use codec::{decode, encode, encode_slot, format_amount, MAX_RECORD_LEN, SLOT_WIDTH};

use std::fmt;

use crate::error::Result;

/// A single record of revenue data
#[derive(Debug, Clone, PartialEq)]
pub struct DataRecord {
    /// Month and year of the captured revenue, e.g. `Jan '21`
    pub period: String,
    pub accessories: f64,
    pub hardware: f64,
    pub software: f64,
    /// Sum of the three categories as of the last [`DataRecord::update_total`]
    pub total: f64,
    /// 1-based slot in the record store; `None` until the record is stored or read
    pub index: Option<u32>,
}

impl DataRecord {
    /// Build a record from explicit field values (index unassigned)
    ///
    /// `total` is taken as given; call [`DataRecord::update_total`] to derive it.
    pub fn new(
        period: impl Into<String>,
        accessories: f64,
        hardware: f64,
        software: f64,
        total: f64,
    ) -> Self {
        Self {
            period: period.into(),
            accessories,
            hardware,
            software,
            total,
            index: None,
        }
    }

    /// Build a record whose total is the sum of the categories
    pub fn with_computed_total(
        period: impl Into<String>,
        accessories: f64,
        hardware: f64,
        software: f64,
    ) -> Self {
        let mut record = Self::new(period, accessories, hardware, software, 0.0);
        record.update_total();
        record
    }

    /// Parse a record from its store text, tagging it with the slot it came from
    pub fn from_store_text(text: &str, index: Option<u32>) -> Result<Self> {
        let mut record = decode(text)?;
        record.index = index;
        Ok(record)
    }

    /// Encode to store text (without slot padding)
    pub fn to_store_text(&self) -> Result<String> {
        encode(self)
    }

    pub fn set_accessories(&mut self, value: f64) {
        self.accessories = value;
    }

    pub fn set_hardware(&mut self, value: f64) {
        self.hardware = value;
    }

    pub fn set_software(&mut self, value: f64) {
        self.software = value;
    }

    pub fn set_total(&mut self, value: f64) {
        self.total = value;
    }

    /// Recompute `total` from the three categories
    pub fn update_total(&mut self) {
        self.total = self.accessories + self.hardware + self.software;
    }

    /// Whether `total` matches the categories at two-decimal precision
    pub fn total_is_consistent(&self) -> bool {
        format_amount(self.total)
            == format_amount(self.accessories + self.hardware + self.software)
    }
}

impl fmt::Display for DataRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>9}{:>13}{:>11}{:>11}{:>11}",
            self.period,
            format!("${} bil", format_amount(self.accessories)),
            format!("${} bil", format_amount(self.hardware)),
            format!("${} bil", format_amount(self.software)),
            format!("${} bil", format_amount(self.total)),
        )
    }
}

