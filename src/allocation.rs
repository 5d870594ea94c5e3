//! Allocation
//!
//! Decides which eligible lines, and how many of their units, receive the per-item
//! discount. The decision is made once per evaluation by an [`AllocationStrategy`]:
//!
//! - [`AllocationStrategy::CappedQuantity`] walks lines from cheapest to most expensive,
//!   discounting at most `cap` units in total and pricing each line's share as a fixed
//!   amount.
//! - [`AllocationStrategy::UnlimitedPercentage`] targets every eligible line (or only the
//!   cheapest) with a percentage the host redeems per line.

use rust_decimal::Decimal;

use crate::{
    discounts::{DiscountError, percent_of},
    eligibility::{EligibleLine, cheapest_line},
    policy::PolicyConfig,
};

/// How the per-item discount is spread over eligible lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationStrategy {
    /// Discount the `cap` cheapest units, each line priced as a fixed amount.
    CappedQuantity {
        /// Maximum number of units to discount.
        cap: u64,
    },

    /// Discount whole lines by percentage.
    ///
    /// With `cheapest_line_only`, only the single cheapest line is targeted, across all of
    /// its units.
    UnlimitedPercentage {
        /// Restrict the discount to the cheapest line.
        cheapest_line_only: bool,
    },
}

impl AllocationStrategy {
    /// Select the strategy for a configuration. A positive unit cap always wins.
    pub fn from_config(config: &PolicyConfig) -> Self {
        if config.quantity_to_discount > 0 {
            Self::CappedQuantity {
                cap: config.quantity_to_discount,
            }
        } else {
            Self::UnlimitedPercentage {
                cheapest_line_only: config.apply_to_cheapest_line_only,
            }
        }
    }
}

/// Units of a single line discounted by a fixed amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitAllocation<'a> {
    line: EligibleLine<'a>,
    quantity: u64,
    amount: Decimal,
}

impl<'a> UnitAllocation<'a> {
    /// Return the discounted line.
    pub fn line(&self) -> &EligibleLine<'a> {
        &self.line
    }

    /// Return the number of discounted units.
    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    /// Return the discount amount, rounded to two decimal places.
    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

/// Outcome of the per-item allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allocation<'a> {
    /// Fixed-amount discounts, cheapest line first.
    Units(Vec<UnitAllocation<'a>>),

    /// One percentage discount across the targeted lines, in cart order.
    Lines(Vec<EligibleLine<'a>>),
}

impl Allocation<'_> {
    /// Check if nothing was allocated.
    pub fn is_empty(&self) -> bool {
        match self {
            Allocation::Units(units) => units.is_empty(),
            Allocation::Lines(lines) => lines.is_empty(),
        }
    }
}

/// Allocate the per-item discount over eligible lines.
///
/// # Errors
///
/// Returns [`DiscountError::Overflow`] if a fixed amount can't be represented.
pub fn allocate<'a>(
    strategy: AllocationStrategy,
    lines: Vec<EligibleLine<'a>>,
    percentage: Decimal,
) -> Result<Allocation<'a>, DiscountError> {
    match strategy {
        AllocationStrategy::CappedQuantity { cap } => {
            cheapest_units(lines, cap, percentage).map(Allocation::Units)
        }
        AllocationStrategy::UnlimitedPercentage { cheapest_line_only } => {
            Ok(Allocation::Lines(percentage_targets(lines, cheapest_line_only)))
        }
    }
}

/// Discount up to `cap` units, cheapest first.
///
/// Lines are stable-sorted by unit cost so equal costs keep cart order. A cap larger than
/// the eligible quantity simply consumes every line.
fn cheapest_units(
    mut lines: Vec<EligibleLine<'_>>,
    cap: u64,
    percentage: Decimal,
) -> Result<Vec<UnitAllocation<'_>>, DiscountError> {
    lines.sort_by_key(EligibleLine::unit_cost);

    let mut remaining = cap;
    let mut allocations = Vec::new();

    for line in lines {
        if remaining == 0 {
            break;
        }

        let quantity = u64::from(line.quantity()).min(remaining);
        if quantity == 0 {
            continue;
        }

        let line_cost = line
            .unit_cost()
            .checked_mul(Decimal::from(quantity))
            .ok_or(DiscountError::Overflow)?;

        allocations.push(UnitAllocation {
            line,
            quantity,
            amount: percent_of(line_cost, percentage)?,
        });

        remaining -= quantity;
    }

    Ok(allocations)
}

fn percentage_targets(
    lines: Vec<EligibleLine<'_>>,
    cheapest_line_only: bool,
) -> Vec<EligibleLine<'_>> {
    if cheapest_line_only {
        cheapest_line(&lines).copied().into_iter().collect()
    } else {
        lines
    }
}
