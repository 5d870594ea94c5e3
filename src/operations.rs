//! Operations
//!
//! The host's discount operation format and the builder that fills it from the
//! discount tracks.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{allocation::Allocation, discounts::percent_label};

/// How the host picks among candidates in one operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionStrategy {
    /// Redeem the first candidate whose targets match.
    #[default]
    First,
}

/// A line targeted by a product discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineTarget {
    /// Cart line identifier.
    pub id: String,
}

/// The order subtotal targeted by an order discount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubtotalTarget {
    /// Lines left out of the subtotal.
    pub excluded_cart_line_ids: Vec<String>,
}

/// What a discount candidate applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Target {
    /// A single cart line.
    CartLine(CartLineTarget),

    /// The order subtotal.
    OrderSubtotal(OrderSubtotalTarget),
}

impl Target {
    /// Target a cart line by id.
    pub fn cart_line(id: impl Into<String>) -> Self {
        Self::CartLine(CartLineTarget { id: id.into() })
    }

    /// Target the whole order subtotal.
    pub fn order_subtotal() -> Self {
        Self::OrderSubtotal(OrderSubtotalTarget::default())
    }

    /// Return the cart line id for line targets.
    pub fn cart_line_id(&self) -> Option<&str> {
        match self {
            Target::CartLine(target) => Some(&target.id),
            Target::OrderSubtotal(_) => None,
        }
    }
}

/// A fixed monetary discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedAmount {
    /// Amount taken off, with two decimal places.
    pub amount: Decimal,
}

/// A percentage discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentageValue {
    /// Percent taken off (`10` means 10%).
    pub value: Decimal,
}

/// The value of a discount candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiscountValue {
    /// A fixed amount off the targets.
    FixedAmount(FixedAmount),

    /// A percentage off each target.
    Percentage(PercentageValue),
}

impl DiscountValue {
    /// Create a fixed amount value.
    pub const fn fixed_amount(amount: Decimal) -> Self {
        Self::FixedAmount(FixedAmount { amount })
    }

    /// Create a percentage value.
    pub const fn percentage(value: Decimal) -> Self {
        Self::Percentage(PercentageValue { value })
    }
}

/// A single proposed discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountCandidate {
    /// Message shown to the buyer.
    pub message: String,

    /// What the discount applies to.
    pub targets: Vec<Target>,

    /// How much is taken off.
    pub value: DiscountValue,
}

/// A bundle of candidates redeemed under one selection strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountsAdd {
    /// Candidates in priority order.
    pub candidates: Vec<DiscountCandidate>,

    /// How the host picks among the candidates.
    pub selection_strategy: SelectionStrategy,
}

impl DiscountsAdd {
    fn first(candidates: Vec<DiscountCandidate>) -> Self {
        Self {
            candidates,
            selection_strategy: SelectionStrategy::First,
        }
    }
}

/// A top-level discount operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Discounts on cart lines.
    ProductDiscountsAdd(DiscountsAdd),

    /// Discounts on the order subtotal.
    OrderDiscountsAdd(DiscountsAdd),
}

impl Operation {
    /// Return the operation's candidates.
    pub fn candidates(&self) -> &[DiscountCandidate] {
        match self {
            Operation::ProductDiscountsAdd(add) | Operation::OrderDiscountsAdd(add) => {
                &add.candidates
            }
        }
    }
}

/// The result handed back to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionResult {
    /// Product operation first, then order operation. Either may be absent.
    pub operations: Vec<Operation>,
}

impl FunctionResult {
    /// A result with no operations: no discount applies.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if no discount applies.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Collects candidates from each track and emits the operations in host order.
#[derive(Debug, Default)]
pub struct OperationBuilder {
    product: Vec<DiscountCandidate>,
    order: Vec<DiscountCandidate>,
}

impl OperationBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the candidates for a per-item allocation.
    ///
    /// Unit allocations become one single-line fixed-amount candidate each; line
    /// allocations become one percentage candidate across all their lines.
    pub fn add_product_allocation(&mut self, allocation: &Allocation<'_>, percentage: Decimal) {
        match allocation {
            Allocation::Units(units) => {
                let message = format!("{}% OFF CHEAPEST", percent_label(percentage));

                self.product.extend(units.iter().map(|unit| DiscountCandidate {
                    message: message.clone(),
                    targets: vec![Target::cart_line(unit.line().id())],
                    value: DiscountValue::fixed_amount(unit.amount()),
                }));
            }
            Allocation::Lines(lines) if lines.is_empty() => {}
            Allocation::Lines(lines) => self.product.push(DiscountCandidate {
                message: format!("{}% OFF", percent_label(percentage)),
                targets: lines
                    .iter()
                    .map(|line| Target::cart_line(line.id()))
                    .collect(),
                value: DiscountValue::percentage(percentage.normalize()),
            }),
        }
    }

    /// Add a percentage discount on the whole order subtotal.
    pub fn add_order_percentage(&mut self, percentage: Decimal) {
        self.order.push(DiscountCandidate {
            message: format!("{}% OFF ORDER", percent_label(percentage)),
            targets: vec![Target::order_subtotal()],
            value: DiscountValue::percentage(percentage.normalize()),
        });
    }

    /// Emit the operations, skipping any track without candidates.
    pub fn build(self) -> FunctionResult {
        let mut operations = Vec::with_capacity(2);

        if !self.product.is_empty() {
            operations.push(Operation::ProductDiscountsAdd(DiscountsAdd::first(
                self.product,
            )));
        }

        if !self.order.is_empty() {
            operations.push(Operation::OrderDiscountsAdd(DiscountsAdd::first(
                self.order,
            )));
        }

        FunctionResult { operations }
    }
}
