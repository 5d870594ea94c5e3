//! Evaluation Observer

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    discounts::{DiscountClassSet, DiscountError},
    operations::Operation,
    policy::{ConfigFault, PolicyConfig},
};

/// Observer trait for diagnostics raised during an evaluation.
///
/// Soft failures (bad configuration, an unmet minimum quantity, an aborted track) never
/// surface as errors. They are reported here instead, so callers decide whether they are
/// logged, collected or ignored. Every method has an empty default.
pub trait EvaluationObserver {
    /// Called when the whole configuration falls back to defaults.
    fn on_config_fallback(&mut self, _fault: &ConfigFault) {}

    /// Called when a single configuration field is absent or had to be coerced.
    ///
    /// `raw` is the value as found in the payload, `None` when the key was missing.
    fn on_field_defaulted(&mut self, _field: &'static str, _raw: Option<&Value>) {}

    /// Called once the configuration has been parsed from a well-formed payload.
    fn on_config_parsed(&mut self, _config: &PolicyConfig) {}

    /// Called with the discount classes enabled for the evaluation.
    fn on_classes(&mut self, _classes: &DiscountClassSet) {}

    /// Called with the total eligible quantity before the minimum quantity check.
    fn on_eligible_quantity(&mut self, _total: u64, _minimum: u64) {}

    /// Called when the eligible quantity falls short of the configured minimum.
    fn on_minimum_not_met(&mut self, _total: u64, _minimum: u64) {}

    /// Called when the per-item track is abandoned because its calculation failed.
    ///
    /// The order track is unaffected.
    fn on_product_track_aborted(&mut self, _error: &DiscountError) {}

    /// Called with the final operations.
    fn on_operations(&mut self, _operations: &[Operation]) {}
}

/// No-op observer for unobserved evaluations.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl EvaluationObserver for NoopObserver {}

/// Observer that reports every diagnostic as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl EvaluationObserver for TracingObserver {
    fn on_config_fallback(&mut self, fault: &ConfigFault) {
        warn!(%fault, "discount configuration unusable; all discounts disabled");
    }

    fn on_field_defaulted(&mut self, field: &'static str, raw: Option<&Value>) {
        match raw {
            Some(raw) => debug!(field, %raw, "configuration field coerced"),
            None => debug!(field, "configuration field missing; using default"),
        }
    }

    fn on_config_parsed(&mut self, config: &PolicyConfig) {
        debug!(
            cart_line_percentage = %config.cart_line_percentage,
            order_percentage = %config.order_percentage,
            collection_ids = config.collection_ids.len(),
            apply_to_cheapest_line_only = config.apply_to_cheapest_line_only,
            minimum_quantity = config.minimum_quantity,
            quantity_to_discount = config.quantity_to_discount,
            "parsed discount configuration"
        );
    }

    fn on_classes(&mut self, classes: &DiscountClassSet) {
        debug!(
            order = classes.has_order(),
            product = classes.has_product(),
            ?classes,
            "discount classes"
        );
    }

    fn on_eligible_quantity(&mut self, total: u64, minimum: u64) {
        debug!(total, minimum, "eligible quantity");
    }

    fn on_minimum_not_met(&mut self, total: u64, minimum: u64) {
        info!(total, minimum, "minimum quantity not met; no discounts apply");
    }

    fn on_product_track_aborted(&mut self, error: &DiscountError) {
        warn!(%error, "product discount track aborted");
    }

    fn on_operations(&mut self, operations: &[Operation]) {
        debug!(count = operations.len(), ?operations, "discount operations");
    }
}
