//! Field checks shared by the request forms

use validator::{Validate, ValidationError};

use crate::error::{MarketError, Result};

pub fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() { Err(ValidationError::new("required")) } else { Ok(()) }
}

/// Runs the derived checks plus any `(field, ok)` pairs the derive cannot express,
/// reporting every failing field at once.
pub fn require(form: &impl Validate, extra: &[(&str, bool)]) -> Result<()> {
    let mut fields: Vec<String> = match form.validate() {
        Ok(()) => vec![],
        Err(errors) => errors.field_errors().keys().map(|f| f.to_string()).collect(),
    };
    fields.extend(extra.iter().filter(|(_, ok)| !ok).map(|(name, _)| name.to_string()));
    fields.sort();
    fields.dedup();
    if fields.is_empty() { Ok(()) } else { Err(MarketError::MissingFields(fields)) }
}

/// Strips spaces and dashes and folds `+92` into the local `0` prefix.
pub fn normalize_pk_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    match digits.strip_prefix("+92") {
        Some(rest) => format!("0{rest}"),
        None => digits,
    }
}

/// Mobile wallet numbers look like `03XX XXXXXXX`.
pub fn is_pk_mobile(raw: &str) -> bool {
    let phone = normalize_pk_phone(raw);
    phone.len() == 11 && phone.starts_with("03") && phone.chars().all(|c| c.is_ascii_digit())
}
