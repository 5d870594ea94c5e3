//! Cart
//!
//! Read-only snapshot of the checkout cart as supplied by the host. Lines are never
//! mutated during an evaluation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A decimal money amount.
///
/// Amounts arrive either as JSON strings (`"10.00"`) or numbers; both decode losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyAmount {
    /// Decimal amount in the cart currency.
    pub amount: Decimal,
}

impl MoneyAmount {
    /// Create a new amount.
    pub const fn new(amount: Decimal) -> Self {
        Self { amount }
    }
}

/// Cost fields for a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCost {
    /// Cost of a single unit. Absent when the host cannot decompose the line.
    #[serde(default)]
    pub amount_per_quantity: Option<MoneyAmount>,

    /// Cost of the whole line.
    pub subtotal_amount: MoneyAmount,
}

/// Catalog product a variant belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product identifier.
    #[serde(default)]
    pub id: Option<String>,

    /// Whether the product is in any of the configured collections.
    #[serde(default)]
    pub in_any_collection: Option<bool>,
}

impl Product {
    /// Return whether the product was flagged as a collection member.
    pub fn in_any_collection(&self) -> bool {
        self.in_any_collection.unwrap_or(false)
    }
}

/// What a cart line is selling.
///
/// Only product variants carry a `product`; custom lines don't.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchandise {
    /// Host type name, e.g. `ProductVariant` or `CustomProduct`.
    #[serde(default, rename = "__typename", skip_serializing_if = "Option::is_none")]
    pub typename: Option<String>,

    /// Merchandise identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Catalog product, when the merchandise resolves to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

/// A single line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Line identifier, echoed back in discount targets.
    pub id: String,

    /// Number of units on the line.
    pub quantity: u32,

    /// Line cost.
    pub cost: CartLineCost,

    /// Merchandise on the line.
    #[serde(default)]
    pub merchandise: Merchandise,
}

impl CartLine {
    /// Create a product line with a per-unit cost.
    pub fn product(id: impl Into<String>, quantity: u32, unit_cost: Decimal) -> Self {
        Self {
            id: id.into(),
            quantity,
            cost: CartLineCost {
                amount_per_quantity: Some(MoneyAmount::new(unit_cost)),
                subtotal_amount: MoneyAmount::new(
                    unit_cost.saturating_mul(Decimal::from(quantity)),
                ),
            },
            merchandise: Merchandise {
                typename: Some("ProductVariant".to_string()),
                id: None,
                product: Some(Product::default()),
            },
        }
    }

    /// Set whether the line's product is flagged as a collection member.
    #[must_use]
    pub fn in_collection(mut self, in_any_collection: bool) -> Self {
        if let Some(product) = self.merchandise.product.as_mut() {
            product.in_any_collection = Some(in_any_collection);
        }

        self
    }

    /// Return the catalog product, if the merchandise resolves to one.
    pub fn catalog_product(&self) -> Option<&Product> {
        self.merchandise.product.as_ref()
    }

    /// Cost of one unit, falling back to the line subtotal when no per-unit cost is given.
    pub fn unit_cost(&self) -> Decimal {
        self.cost
            .amount_per_quantity
            .map_or(self.cost.subtotal_amount.amount, |per_unit| per_unit.amount)
    }
}

/// The cart under evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart lines in host order.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Create a cart from lines.
    pub fn with_lines(lines: impl Into<Vec<CartLine>>) -> Self {
        Self {
            lines: lines.into(),
        }
    }

    /// Return the cart lines.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Check if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
