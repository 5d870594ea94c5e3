//! Eligibility
//!
//! Selects the cart lines the per-item discount track may touch. A line is eligible
//! when it sells a catalog product and, if the policy names any collections, that
//! product is flagged as belonging to one of them.

use rust_decimal::Decimal;

use crate::{cart::CartLine, policy::PolicyConfig};

/// A cart line that qualifies for the per-item discount track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibleLine<'a> {
    line: &'a CartLine,
    unit_cost: Decimal,
}

impl<'a> EligibleLine<'a> {
    /// Wrap a cart line, resolving its effective unit cost.
    pub fn new(line: &'a CartLine) -> Self {
        Self {
            line,
            unit_cost: line.unit_cost(),
        }
    }

    /// Return the cart line identifier.
    pub fn id(&self) -> &'a str {
        &self.line.id
    }

    /// Return the effective cost of one unit.
    pub fn unit_cost(&self) -> Decimal {
        self.unit_cost
    }

    /// Return the number of units on the line.
    pub fn quantity(&self) -> u32 {
        self.line.quantity
    }
}

/// Check whether a single line qualifies for the per-item track.
pub fn is_eligible(line: &CartLine, config: &PolicyConfig) -> bool {
    line.catalog_product().is_some_and(|product| {
        config.collection_ids.is_empty() || product.in_any_collection()
    })
}

/// Return the eligible lines, in cart order.
pub fn eligible_lines<'a>(lines: &'a [CartLine], config: &PolicyConfig) -> Vec<EligibleLine<'a>> {
    lines
        .iter()
        .filter(|line| is_eligible(line, config))
        .map(EligibleLine::new)
        .collect()
}

/// Sum the quantities of the given lines.
pub fn total_quantity(lines: &[EligibleLine<'_>]) -> u64 {
    lines.iter().map(|line| u64::from(line.quantity())).sum()
}

/// Returns the cheapest line. Ties go to the earliest line.
pub fn cheapest_line<'a, 'b>(lines: &'b [EligibleLine<'a>]) -> Option<&'b EligibleLine<'a>> {
    lines.iter().min_by_key(|line| line.unit_cost())
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashSet;

    use crate::cart::Merchandise;

    use super::*;

    fn restricted_config() -> PolicyConfig {
        PolicyConfig {
            collection_ids: FxHashSet::from_iter(["gid://shopify/Collection/1".to_string()]),
            ..PolicyConfig::default()
        }
    }

    fn custom_line(id: &str) -> CartLine {
        let mut line = CartLine::product(id, 1, Decimal::from(5));
        line.merchandise = Merchandise {
            typename: Some("CustomProduct".to_string()),
            ..Merchandise::default()
        };
        line
    }

    #[test]
    fn product_lines_are_eligible_without_collection_restriction() {
        let line = CartLine::product("a", 1, Decimal::from(10));

        assert!(is_eligible(&line, &PolicyConfig::default()));
    }

    #[test]
    fn custom_lines_are_never_eligible() {
        let line = custom_line("custom");

        assert!(!is_eligible(&line, &PolicyConfig::default()));
        assert!(!is_eligible(&line, &restricted_config()));
    }

    #[test]
    fn collection_restriction_requires_membership_flag() {
        let member = CartLine::product("a", 1, Decimal::from(10)).in_collection(true);
        let outsider = CartLine::product("b", 1, Decimal::from(10)).in_collection(false);
        let unflagged = CartLine::product("c", 1, Decimal::from(10));

        let config = restricted_config();

        assert!(is_eligible(&member, &config));
        assert!(!is_eligible(&outsider, &config));
        assert!(!is_eligible(&unflagged, &config));
    }

    #[test]
    fn eligible_lines_keep_cart_order() {
        let lines = [
            CartLine::product("a", 1, Decimal::from(30)),
            custom_line("b"),
            CartLine::product("c", 2, Decimal::from(10)),
        ];

        let eligible = eligible_lines(&lines, &PolicyConfig::default());
        let ids: Vec<&str> = eligible.iter().map(EligibleLine::id).collect();

        assert_eq!(ids, ["a", "c"]);
        assert_eq!(total_quantity(&eligible), 3);
    }

    #[test]
    fn eligible_line_uses_subtotal_when_unit_cost_missing() {
        let mut line = CartLine::product("a", 4, Decimal::from(3));
        line.cost.amount_per_quantity = None;

        let eligible = EligibleLine::new(&line);

        assert_eq!(eligible.unit_cost(), Decimal::from(12));
        assert_eq!(eligible.quantity(), 4);
    }

    #[test]
    fn cheapest_line_prefers_first_on_ties() {
        let lines = [
            CartLine::product("a", 1, Decimal::from(20)),
            CartLine::product("b", 1, Decimal::from(5)),
            CartLine::product("c", 1, Decimal::from(5)),
        ];

        let eligible = eligible_lines(&lines, &PolicyConfig::default());

        assert_eq!(cheapest_line(&eligible).map(EligibleLine::id), Some("b"));
    }

    #[test]
    fn cheapest_line_of_nothing_is_none() {
        assert!(cheapest_line(&[]).is_none());
    }
}
