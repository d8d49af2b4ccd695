//! Record codec
//!
//! Fixed-width textual encoding of a single [`DataRecord`].

use crate::error::{Result, StoreError};

use super::DataRecord;

/// Maximum length of encoded record text (bytes)
pub const MAX_RECORD_LEN: usize = 63;

/// Width of one slot in the record store: text + at least one NUL terminator
pub const SLOT_WIDTH: usize = MAX_RECORD_LEN + 1;

/// Number of comma-separated fields in store text
const FIELD_COUNT: usize = 5;

/// Format a numeric field with the store's fixed two-decimal precision
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

/// Encode a record as `period,total,hardware,software,accessories`
pub fn encode(record: &DataRecord) -> Result<String> {
    if record.period.contains(',') || record.period.contains('\0') {
        return Err(StoreError::Codec(format!(
            "period {:?} may not contain ',' or NUL",
            record.period
        )));
    }

    let text = format!(
        "{},{},{},{},{}",
        record.period,
        format_amount(record.total),
        format_amount(record.hardware),
        format_amount(record.software),
        format_amount(record.accessories),
    );

    if text.len() > MAX_RECORD_LEN {
        return Err(StoreError::RecordTooLong {
            len: text.len(),
            max: MAX_RECORD_LEN,
        });
    }

    Ok(text)
}

/// Encode a record into a full NUL-padded slot
pub fn encode_slot(record: &DataRecord) -> Result<[u8; SLOT_WIDTH]> {
    let text = encode(record)?;
    let mut slot = [0u8; SLOT_WIDTH];
    slot[..text.len()].copy_from_slice(text.as_bytes());
    Ok(slot)
}

/// Decode store text (NUL padding allowed) into a record with no index
pub fn decode(text: &str) -> Result<DataRecord> {
    let text = text.split('\0').next().unwrap_or_default().trim_end();

    if text.is_empty() {
        return Err(StoreError::Codec("empty record".to_string()));
    }

    let fields: Vec<&str> = text.split(',').collect();
    if fields.len() != FIELD_COUNT {
        return Err(StoreError::Codec(format!(
            "expected {} fields, got {} in {:?}",
            FIELD_COUNT,
            fields.len(),
            text
        )));
    }

    let amount = |name: &str, raw: &str| -> Result<f64> {
        raw.trim().parse::<f64>().map_err(|e| {
            StoreError::Codec(format!("{} field {:?}: {}", name, raw, e))
        })
    };

    Ok(DataRecord {
        period: fields[0].to_string(),
        total: amount("total", fields[1])?,
        hardware: amount("hardware", fields[2])?,
        software: amount("software", fields[3])?,
        accessories: amount("accessories", fields[4])?,
        index: None,
    })
}

