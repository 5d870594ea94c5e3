//! Policy Configuration
//!
//! Decodes the merchant's serialized discount policy. Parsing never fails: malformed
//! payloads fall back to [`PolicyConfig::default`], which disables every discount track,
//! and individual fields that can't be read fall back to zero, `false` or empty. Every
//! fallback is reported to the [`EvaluationObserver`].

use std::fmt;

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashSet;
use serde_json::{Map, Value};

use crate::observer::EvaluationObserver;

/// JSON key for the per-item discount percentage.
pub const CART_LINE_PERCENTAGE: &str = "cartLinePercentage";

/// JSON key for the order discount percentage.
pub const ORDER_PERCENTAGE: &str = "orderPercentage";

/// JSON key for the eligible collection identifiers.
pub const COLLECTION_IDS: &str = "collectionIds";

/// JSON key for the single-cheapest-line flag.
pub const APPLY_TO_CHEAPEST_LINE_ONLY: &str = "applyToCheapestLineOnly";

/// JSON key for the minimum eligible quantity.
pub const MINIMUM_QUANTITY: &str = "minimumQuantity";

/// JSON key for the discounted unit cap.
pub const QUANTITY_TO_DISCOUNT: &str = "quantityToDiscount";

/// Why the whole configuration fell back to defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigFault {
    /// The discount carried no metafield.
    MissingMetafield,

    /// The metafield value was not valid JSON.
    Malformed(String),

    /// The metafield value was valid JSON but not an object.
    NotAnObject,
}

impl fmt::Display for ConfigFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMetafield => f.write_str("no configuration metafield"),
            Self::Malformed(reason) => write!(f, "malformed configuration: {reason}"),
            Self::NotAnObject => f.write_str("configuration is not a JSON object"),
        }
    }
}

/// Parsed discount policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyConfig {
    /// Percentage taken off eligible lines (`10` means 10%).
    pub cart_line_percentage: Decimal,

    /// Percentage taken off the order subtotal.
    pub order_percentage: Decimal,

    /// Collections that restrict line eligibility. Empty means no restriction.
    pub collection_ids: FxHashSet<String>,

    /// Restrict the percentage discount to the single cheapest eligible line.
    pub apply_to_cheapest_line_only: bool,

    /// Minimum total quantity of eligible lines. Zero disables the check.
    pub minimum_quantity: u64,

    /// Number of cheapest units to discount. Zero means no cap.
    pub quantity_to_discount: u64,
}

impl PolicyConfig {
    /// Parse a serialized policy, falling back to defaults on any failure.
    ///
    /// `raw` is `None` when the host supplied no metafield.
    pub fn parse<O: EvaluationObserver>(raw: Option<&str>, observer: &mut O) -> Self {
        let Some(raw) = raw else {
            observer.on_config_fallback(&ConfigFault::MissingMetafield);
            return Self::default();
        };

        let fields = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                observer.on_config_fallback(&ConfigFault::NotAnObject);
                return Self::default();
            }
            Err(error) => {
                observer.on_config_fallback(&ConfigFault::Malformed(error.to_string()));
                return Self::default();
            }
        };

        let config = Self::from_fields(&fields, observer);

        observer.on_config_parsed(&config);

        config
    }

    fn from_fields<O: EvaluationObserver>(fields: &Map<String, Value>, observer: &mut O) -> Self {
        Self {
            cart_line_percentage: decimal_field(fields, CART_LINE_PERCENTAGE, observer),
            order_percentage: decimal_field(fields, ORDER_PERCENTAGE, observer),
            collection_ids: collection_ids_field(fields, observer),
            apply_to_cheapest_line_only: bool_field(
                fields,
                APPLY_TO_CHEAPEST_LINE_ONLY,
                observer,
            ),
            minimum_quantity: count_field(fields, MINIMUM_QUANTITY, Rounding::Up, observer),
            quantity_to_discount: count_field(
                fields,
                QUANTITY_TO_DISCOUNT,
                Rounding::Down,
                observer,
            ),
        }
    }

    /// Check if the per-item track has a positive percentage.
    pub fn has_cart_line_discount(&self) -> bool {
        self.cart_line_percentage > Decimal::ZERO
    }

    /// Check if the order track has a positive percentage.
    pub fn has_order_discount(&self) -> bool {
        self.order_percentage > Decimal::ZERO
    }
}

/// How a fractional count becomes a whole number of units.
#[derive(Debug, Clone, Copy)]
enum Rounding {
    Up,
    Down,
}

fn decimal_field<O: EvaluationObserver>(
    fields: &Map<String, Value>,
    key: &'static str,
    observer: &mut O,
) -> Decimal {
    let raw = fields.get(key);

    match raw.and_then(parse_decimal) {
        Some(value) => value,
        None => {
            observer.on_field_defaulted(key, raw);
            Decimal::ZERO
        }
    }
}

fn count_field<O: EvaluationObserver>(
    fields: &Map<String, Value>,
    key: &'static str,
    rounding: Rounding,
    observer: &mut O,
) -> u64 {
    let value = decimal_field(fields, key, observer);

    if value <= Decimal::ZERO {
        return 0;
    }

    let whole = match rounding {
        Rounding::Up => value.ceil(),
        Rounding::Down => value.trunc(),
    };

    whole.to_u64().unwrap_or(u64::MAX)
}

fn bool_field<O: EvaluationObserver>(
    fields: &Map<String, Value>,
    key: &'static str,
    observer: &mut O,
) -> bool {
    match fields.get(key) {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Null) | None => {
            observer.on_field_defaulted(key, fields.get(key));
            false
        }
        Some(other) => {
            let flag = is_truthy(other);
            observer.on_field_defaulted(key, Some(other));
            flag
        }
    }
}

fn collection_ids_field<O: EvaluationObserver>(
    fields: &Map<String, Value>,
    observer: &mut O,
) -> FxHashSet<String> {
    match fields.get(COLLECTION_IDS) {
        Some(Value::Array(ids)) => ids
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        Some(Value::String(id)) if !id.is_empty() => {
            observer.on_field_defaulted(COLLECTION_IDS, fields.get(COLLECTION_IDS));
            FxHashSet::from_iter([id.clone()])
        }
        raw => {
            observer.on_field_defaulted(COLLECTION_IDS, raw);
            FxHashSet::default()
        }
    }
}

/// Truthiness of a JSON value as the policy editor treats flags.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n.abs() > 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Read a number from a JSON value, accepting numeric strings with trailing junk.
fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => decimal_from_str(&number.to_string()),
        Value::String(text) => leading_number(text).as_deref().and_then(decimal_from_str),
        _ => None,
    }
}

fn decimal_from_str(text: &str) -> Option<Decimal> {
    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
        .or_else(|| saturate(text))
}

/// Clamp a well-formed number outside the decimal range to the nearest representable
/// value: `Decimal::MAX` or `Decimal::MIN` for huge magnitudes, zero for tiny ones.
fn saturate(text: &str) -> Option<Decimal> {
    let value = text.parse::<f64>().ok().filter(|value| !value.is_nan())?;

    if value.abs() < 1.0 {
        Some(Decimal::ZERO)
    } else if value.is_sign_negative() {
        Some(Decimal::MIN)
    } else {
        Some(Decimal::MAX)
    }
}

/// Read the longest prefix of `text` (after leading whitespace) that forms a decimal
/// number with an optional exponent, e.g. `"15%"` gives `"15"` and `".5"` gives `"0.5"`.
fn leading_number(text: &str) -> Option<String> {
    let bytes = text.trim_start().as_bytes();

    let mut number = String::new();
    let mut pos = 0;
    if let Some(sign @ (b'+' | b'-')) = bytes.first() {
        number.push(char::from(*sign));
        pos += 1;
    }

    let int_digits = push_digits(bytes, pos, &mut number);
    pos += int_digits;

    let mut frac_digits = 0;
    if bytes.get(pos) == Some(&b'.') {
        let mut fraction = String::new();
        frac_digits = push_digits(bytes, pos + 1, &mut fraction);
        if frac_digits > 0 {
            if int_digits == 0 {
                number.push('0');
            }
            number.push('.');
            number.push_str(&fraction);
            pos += 1 + frac_digits;
        } else {
            pos += 1;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if let Some(marker @ (b'e' | b'E')) = bytes.get(pos) {
        let mut exponent = String::from(char::from(*marker));
        let mut exp_pos = pos + 1;
        if let Some(sign @ (b'+' | b'-')) = bytes.get(exp_pos) {
            exponent.push(char::from(*sign));
            exp_pos += 1;
        }

        if push_digits(bytes, exp_pos, &mut exponent) > 0 {
            number.push_str(&exponent);
        }
    }

    Some(number)
}

fn push_digits(bytes: &[u8], start: usize, out: &mut String) -> usize {
    let before = out.len();

    out.extend(
        bytes
            .iter()
            .skip(start)
            .take_while(|byte| byte.is_ascii_digit())
            .map(|byte| char::from(*byte)),
    );

    out.len() - before
}
