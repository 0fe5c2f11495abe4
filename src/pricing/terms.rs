//! Typed agreement terms.
//!
//! Vendor agreements store their pricing terms as a nested JSON document.
//! Each scope type has a typed schema parsed once at the read boundary, so a
//! malformed record fails in one place with the offending field path instead
//! of surfacing as a zero amount deep inside a calculation.

use rust_decimal::Decimal;
use serde_json::Value;

/// Default tier size when an agreement does not state one.
pub const DEFAULT_INCLUDED_DIVERS: i32 = 4;

/// A terms document that could not be parsed against its schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TermsError {
    #[error("missing required field '{path}'")]
    MissingField { path: String },
    #[error("field '{path}' is not a valid decimal amount")]
    InvalidAmount { path: String },
    #[error("field '{path}' is not an integer")]
    InvalidInteger { path: String },
    #[error("field '{path}' is not a string")]
    InvalidString { path: String },
}

impl TermsError {
    /// Path of the offending field within the terms document.
    pub fn path(&self) -> &str {
        match self {
            TermsError::MissingField { path }
            | TermsError::InvalidAmount { path }
            | TermsError::InvalidInteger { path }
            | TermsError::InvalidString { path } => path,
        }
    }
}

/// Tiered boat charter pricing from a `vendor_pricing` agreement.
///
/// The vendor charges `base_cost` for up to `included_divers` divers and
/// `overage_per_diver` for each diver beyond that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoatCharterTerms {
    pub base_cost: Decimal,
    pub included_divers: i32,
    pub overage_per_diver: Decimal,
    pub currency: String,
}

impl BoatCharterTerms {
    /// Parse the `boat_charter` section of an agreement terms document.
    pub fn from_terms(terms: &Value) -> Result<Self, TermsError> {
        let tier = terms.get("boat_charter").ok_or_else(|| TermsError::MissingField {
            path: "boat_charter".to_string(),
        })?;

        Ok(Self {
            base_cost: decimal_field(tier, "boat_charter", "base_cost")?,
            included_divers: int_field_or(tier, "boat_charter", "included_divers", DEFAULT_INCLUDED_DIVERS)?,
            overage_per_diver: decimal_field(tier, "boat_charter", "overage_per_diver")?,
            currency: string_field(tier, "boat_charter", "currency")?,
        })
    }
}

/// Per-fill pricing for one gas type from a `gas_vendor_pricing` agreement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasFillTerms {
    pub cost: Decimal,
    pub charge: Decimal,
    pub currency: String,
}

impl GasFillTerms {
    /// Parse the `gas_fills.<gas_type>` section of an agreement terms document.
    ///
    /// `gas_type` must already be lowercased by the caller.
    pub fn for_gas(terms: &Value, gas_type: &str) -> Result<Self, TermsError> {
        let fills = terms.get("gas_fills").ok_or_else(|| TermsError::MissingField {
            path: "gas_fills".to_string(),
        })?;

        let path = format!("gas_fills.{gas_type}");
        let pricing = fills.get(gas_type).ok_or_else(|| TermsError::MissingField {
            path: path.clone(),
        })?;

        Ok(Self {
            cost: decimal_field(pricing, &path, "cost")?,
            charge: decimal_field(pricing, &path, "charge")?,
            currency: string_field(pricing, &path, "currency")?,
        })
    }
}

/// Amounts arrive either as decimal strings ("1800.00") or as JSON numbers,
/// depending on how the agreement was entered. Numbers are re-parsed from
/// their literal text so no float round-trip occurs.
fn decimal_field(obj: &Value, parent: &str, key: &str) -> Result<Decimal, TermsError> {
    let path = || format!("{parent}.{key}");
    let value = obj.get(key).ok_or_else(|| TermsError::MissingField { path: path() })?;

    match value {
        Value::String(s) => s.trim().parse().map_err(|_| TermsError::InvalidAmount { path: path() }),
        Value::Number(n) => n
            .to_string()
            .parse()
            .map_err(|_| TermsError::InvalidAmount { path: path() }),
        _ => Err(TermsError::InvalidAmount { path: path() }),
    }
}

fn int_field_or(obj: &Value, parent: &str, key: &str, default: i32) -> Result<i32, TermsError> {
    let path = || format!("{parent}.{key}");
    match obj.get(key) {
        None => Ok(default),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| TermsError::InvalidInteger { path: path() }),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| TermsError::InvalidInteger { path: path() }),
        Some(_) => Err(TermsError::InvalidInteger { path: path() }),
    }
}

fn string_field(obj: &Value, parent: &str, key: &str) -> Result<String, TermsError> {
    let path = format!("{parent}.{key}");
    obj.get(key)
        .ok_or_else(|| TermsError::MissingField { path: path.clone() })?
        .as_str()
        .map(str::to_string)
        .ok_or(TermsError::InvalidString { path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_boat_charter_terms_string_amounts() {
        let terms = json!({
            "boat_charter": {
                "base_cost": "1800.00",
                "included_divers": 4,
                "overage_per_diver": "150.00",
                "currency": "MXN"
            }
        });

        let parsed = BoatCharterTerms::from_terms(&terms).unwrap();
        assert_eq!(parsed.base_cost, dec!(1800.00));
        assert_eq!(parsed.included_divers, 4);
        assert_eq!(parsed.overage_per_diver, dec!(150.00));
        assert_eq!(parsed.currency, "MXN");
    }

    #[test]
    fn test_boat_charter_terms_numeric_amounts() {
        let terms = json!({
            "boat_charter": {
                "base_cost": 1800,
                "overage_per_diver": 150.5,
                "currency": "MXN"
            }
        });

        let parsed = BoatCharterTerms::from_terms(&terms).unwrap();
        assert_eq!(parsed.base_cost, dec!(1800));
        assert_eq!(parsed.overage_per_diver, dec!(150.5));
        // included_divers falls back to the default tier size
        assert_eq!(parsed.included_divers, DEFAULT_INCLUDED_DIVERS);
    }

    #[test]
    fn test_boat_charter_terms_missing_section() {
        let err = BoatCharterTerms::from_terms(&json!({})).unwrap_err();
        assert_eq!(err.path(), "boat_charter");
    }

    #[test]
    fn test_boat_charter_terms_missing_base_cost() {
        let terms = json!({
            "boat_charter": {
                "overage_per_diver": "150.00",
                "currency": "MXN"
            }
        });

        let err = BoatCharterTerms::from_terms(&terms).unwrap_err();
        assert_eq!(
            err,
            TermsError::MissingField {
                path: "boat_charter.base_cost".to_string()
            }
        );
    }

    #[test]
    fn test_boat_charter_terms_malformed_amount() {
        let terms = json!({
            "boat_charter": {
                "base_cost": "eighteen hundred",
                "overage_per_diver": "150.00",
                "currency": "MXN"
            }
        });

        let err = BoatCharterTerms::from_terms(&terms).unwrap_err();
        assert_eq!(err.path(), "boat_charter.base_cost");
        assert!(matches!(err, TermsError::InvalidAmount { .. }));
    }

    #[test]
    fn test_gas_fill_terms() {
        let terms = json!({
            "gas_fills": {
                "air": { "cost": "50.00", "charge": "100.00", "currency": "MXN" },
                "ean32": { "cost": "120.00", "charge": "250.00", "currency": "MXN" }
            }
        });

        let air = GasFillTerms::for_gas(&terms, "air").unwrap();
        assert_eq!(air.cost, dec!(50.00));
        assert_eq!(air.charge, dec!(100.00));

        let ean32 = GasFillTerms::for_gas(&terms, "ean32").unwrap();
        assert_eq!(ean32.charge, dec!(250.00));
    }

    #[test]
    fn test_gas_fill_terms_missing_gas_type() {
        let terms = json!({
            "gas_fills": {
                "air": { "cost": "50.00", "charge": "100.00", "currency": "MXN" }
            }
        });

        let err = GasFillTerms::for_gas(&terms, "trimix").unwrap_err();
        assert_eq!(err.path(), "gas_fills.trimix");
    }

    #[test]
    fn test_gas_fill_terms_missing_charge() {
        let terms = json!({
            "gas_fills": {
                "air": { "cost": "50.00", "currency": "MXN" }
            }
        });

        let err = GasFillTerms::for_gas(&terms, "air").unwrap_err();
        assert_eq!(err.path(), "gas_fills.air.charge");
    }
}
