//! Discounts
//!
//! Discount classes enabled by the host and the shared percentage arithmetic used by
//! the discount tracks.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Number of decimal places in emitted monetary amounts.
pub const AMOUNT_SCALE: u32 = 2;

/// Errors specific to discount calculations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// Decimal arithmetic overflowed.
    #[error("discount calculation overflowed")]
    Overflow,
}

/// A class of discount the host allows this evaluation to produce.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DiscountClass {
    /// Discounts on the order subtotal.
    Order,

    /// Discounts on individual cart lines.
    Product,

    /// Discounts on delivery. Never produced here.
    Shipping,

    /// A class this crate doesn't know about.
    Other(String),
}

impl DiscountClass {
    /// Return the host wire name of this class.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Order => "ORDER",
            Self::Product => "PRODUCT",
            Self::Shipping => "SHIPPING",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for DiscountClass {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ORDER" => Self::Order,
            "PRODUCT" => Self::Product,
            "SHIPPING" => Self::Shipping,
            _ => Self::Other(value),
        }
    }
}

impl From<DiscountClass> for String {
    fn from(value: DiscountClass) -> Self {
        match value {
            DiscountClass::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DiscountClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The discount classes enabled for an evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscountClassSet(SmallVec<[DiscountClass; 3]>);

impl DiscountClassSet {
    /// Create a set from the given classes.
    pub fn new(classes: impl IntoIterator<Item = DiscountClass>) -> Self {
        Self(classes.into_iter().collect())
    }

    /// Check if a class is enabled.
    pub fn contains(&self, class: &DiscountClass) -> bool {
        self.0.contains(class)
    }

    /// Check if order-level discounts are enabled.
    pub fn has_order(&self) -> bool {
        self.contains(&DiscountClass::Order)
    }

    /// Check if product-level discounts are enabled.
    pub fn has_product(&self) -> bool {
        self.contains(&DiscountClass::Product)
    }
}

impl FromIterator<DiscountClass> for DiscountClassSet {
    fn from_iter<I: IntoIterator<Item = DiscountClass>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Calculate `percentage` percent of `amount`, rounded to [`AMOUNT_SCALE`] places.
///
/// Midpoints round away from zero and the result always carries exactly two decimal
/// places, so `15` is returned as `15.00`.
///
/// # Errors
///
/// Returns [`DiscountError::Overflow`] if the multiplication leaves the decimal range.
pub fn percent_of(amount: Decimal, percentage: Decimal) -> Result<Decimal, DiscountError> {
    let mut discount = amount
        .checked_mul(percentage)
        .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(DiscountError::Overflow)?
        .round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);

    discount.rescale(AMOUNT_SCALE);

    Ok(discount)
}

/// Format a percentage the way it appears in discount messages (`10`, `12.5`).
pub fn percent_label(percentage: Decimal) -> String {
    percentage.normalize().to_string()
}
