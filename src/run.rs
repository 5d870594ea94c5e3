//! Run
//!
//! Entry point for a single discount evaluation. An evaluation is a pure function of
//! the cart snapshot, the enabled discount classes and the serialized policy:
//!
//! 1. An empty cart is rejected outright.
//! 2. The policy is parsed, falling back to defaults.
//! 3. The per-item track filters eligible lines, checks the minimum quantity and
//!    allocates the discount.
//! 4. The order track adds its percentage independently.
//! 5. The operation builder emits the product operation, then the order operation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    allocation::{AllocationStrategy, allocate},
    cart::Cart,
    discounts::DiscountClassSet,
    eligibility::{eligible_lines, total_quantity},
    observer::{EvaluationObserver, TracingObserver},
    operations::{FunctionResult, OperationBuilder},
    policy::PolicyConfig,
};

/// Errors that abort an evaluation.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// The cart has no lines.
    #[error("no cart lines found")]
    EmptyCart,

    /// Input or output JSON could not be decoded or encoded.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Metafield holding the serialized policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metafield {
    /// Raw JSON policy. A metafield without a value is treated as no policy at all.
    #[serde(default)]
    pub value: Option<String>,
}

/// The discount being evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    /// Discount classes the host allows.
    #[serde(default)]
    pub discount_classes: DiscountClassSet,

    /// Policy metafield, when configured.
    #[serde(default)]
    pub metafield: Option<Metafield>,
}

impl Discount {
    /// Return the raw policy, if any.
    pub fn policy(&self) -> Option<&str> {
        self.metafield
            .as_ref()
            .and_then(|metafield| metafield.value.as_deref())
    }
}

/// Everything the host supplies for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInput {
    /// Cart snapshot.
    pub cart: Cart,

    /// Discount classes and policy.
    pub discount: Discount,
}

impl FunctionInput {
    /// Decode host input from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Json`] if the document doesn't match the input shape.
    pub fn from_json(json: &str) -> Result<Self, EvaluationError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl FunctionResult {
    /// Encode the result as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Json`] if serialization fails.
    pub fn to_json(&self, pretty: bool) -> Result<String, EvaluationError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };

        Ok(json)
    }
}

/// Evaluate the discount, reporting diagnostics through `tracing`.
///
/// # Errors
///
/// Returns [`EvaluationError::EmptyCart`] if the cart has no lines.
pub fn run(input: &FunctionInput) -> Result<FunctionResult, EvaluationError> {
    run_with_observer(input, &mut TracingObserver)
}

/// Evaluate the discount, reporting diagnostics to `observer`.
///
/// # Errors
///
/// Returns [`EvaluationError::EmptyCart`] if the cart has no lines. Every other problem,
/// including an unusable policy, degrades to fewer (or no) operations.
pub fn run_with_observer<O: EvaluationObserver>(
    input: &FunctionInput,
    observer: &mut O,
) -> Result<FunctionResult, EvaluationError> {
    if input.cart.is_empty() {
        return Err(EvaluationError::EmptyCart);
    }

    let lines = input.cart.lines();

    let config = PolicyConfig::parse(input.discount.policy(), observer);

    let classes = &input.discount.discount_classes;
    observer.on_classes(classes);

    if !classes.has_order() && !classes.has_product() {
        return Ok(FunctionResult::empty());
    }

    let mut builder = OperationBuilder::new();

    if classes.has_product() && config.has_cart_line_discount() {
        let eligible = eligible_lines(lines, &config);
        let total = total_quantity(&eligible);

        observer.on_eligible_quantity(total, config.minimum_quantity);

        if config.minimum_quantity > 0 && total < config.minimum_quantity {
            observer.on_minimum_not_met(total, config.minimum_quantity);
            return Ok(FunctionResult::empty());
        }

        let strategy = AllocationStrategy::from_config(&config);

        match allocate(strategy, eligible, config.cart_line_percentage) {
            Ok(allocation) => {
                builder.add_product_allocation(&allocation, config.cart_line_percentage);
            }
            Err(error) => observer.on_product_track_aborted(&error),
        }
    }

    if classes.has_order() && config.has_order_discount() {
        builder.add_order_percentage(config.order_percentage);
    }

    let result = builder.build();

    observer.on_operations(&result.operations);

    Ok(result)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        cart::CartLine,
        discounts::{DiscountClass, DiscountError},
        observer::NoopObserver,
        operations::{DiscountValue, Operation},
        policy::ConfigFault,
    };

    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        minimum_not_met: Option<(u64, u64)>,
        aborted: Vec<DiscountError>,
        operations: Option<usize>,
    }

    impl EvaluationObserver for Recorder {
        fn on_minimum_not_met(&mut self, total: u64, minimum: u64) {
            self.minimum_not_met = Some((total, minimum));
        }

        fn on_product_track_aborted(&mut self, error: &DiscountError) {
            self.aborted.push(error.clone());
        }

        fn on_operations(&mut self, operations: &[Operation]) {
            self.operations = Some(operations.len());
        }
    }

    #[derive(Debug, Default)]
    struct ConfigRecorder {
        faults: Vec<ConfigFault>,
    }

    impl EvaluationObserver for ConfigRecorder {
        fn on_config_fallback(&mut self, fault: &ConfigFault) {
            self.faults.push(fault.clone());
        }
    }

    fn input(
        lines: Vec<CartLine>,
        classes: &[DiscountClass],
        policy: &serde_json::Value,
    ) -> FunctionInput {
        FunctionInput {
            cart: Cart::with_lines(lines),
            discount: Discount {
                discount_classes: classes.iter().cloned().collect(),
                metafield: Some(Metafield {
                    value: Some(policy.to_string()),
                }),
            },
        }
    }

    fn both() -> [DiscountClass; 2] {
        [DiscountClass::Product, DiscountClass::Order]
    }

    #[test]
    fn empty_cart_is_a_hard_failure() {
        let input = input(Vec::new(), &both(), &json!({ "orderPercentage": 10 }));

        let result = run_with_observer(&input, &mut NoopObserver);

        assert!(matches!(result, Err(EvaluationError::EmptyCart)));
    }

    #[test]
    fn no_enabled_classes_yield_no_operations() -> TestResult {
        let input = input(
            vec![CartLine::product("a", 1, Decimal::from(10))],
            &[DiscountClass::Shipping],
            &json!({ "cartLinePercentage": 10, "orderPercentage": 10 }),
        );

        let result = run_with_observer(&input, &mut NoopObserver)?;

        assert!(result.is_empty());

        Ok(())
    }

    #[test]
    fn unmet_minimum_suppresses_every_operation() -> TestResult {
        let input = input(
            vec![
                CartLine::product("a", 1, Decimal::from(10)),
                CartLine::product("b", 2, Decimal::from(10)),
            ],
            &both(),
            &json!({ "cartLinePercentage": 10, "orderPercentage": 10, "minimumQuantity": 5 }),
        );
        let mut recorder = Recorder::default();

        let result = run_with_observer(&input, &mut recorder)?;

        assert!(result.is_empty());
        assert_eq!(recorder.minimum_not_met, Some((3, 5)));
        assert_eq!(recorder.operations, None);

        Ok(())
    }

    #[test]
    fn minimum_is_ignored_without_product_class() -> TestResult {
        let input = input(
            vec![CartLine::product("a", 1, Decimal::from(10))],
            &[DiscountClass::Order],
            &json!({ "cartLinePercentage": 10, "orderPercentage": 10, "minimumQuantity": 5 }),
        );

        let result = run_with_observer(&input, &mut NoopObserver)?;

        assert!(matches!(
            result.operations.as_slice(),
            [Operation::OrderDiscountsAdd(_)]
        ));

        Ok(())
    }

    #[test]
    fn overflow_aborts_only_the_product_track() -> TestResult {
        let line = CartLine {
            quantity: 3,
            ..CartLine::product("huge", 1, Decimal::MAX)
        };
        let input = input(
            vec![line],
            &both(),
            &json!({ "cartLinePercentage": 10, "orderPercentage": 5, "quantityToDiscount": 3 }),
        );
        let mut recorder = Recorder::default();

        let result = run_with_observer(&input, &mut recorder)?;

        assert_eq!(recorder.aborted, [DiscountError::Overflow]);
        assert!(matches!(
            result.operations.as_slice(),
            [Operation::OrderDiscountsAdd(_)]
        ));

        Ok(())
    }

    #[test]
    fn product_track_only_runs_with_product_class() -> TestResult {
        let input = input(
            vec![CartLine::product("a", 1, Decimal::from(10))],
            &[DiscountClass::Order],
            &json!({ "cartLinePercentage": 10 }),
        );

        let result = run_with_observer(&input, &mut NoopObserver)?;

        assert!(result.is_empty());

        Ok(())
    }

    #[test]
    fn percentage_track_emits_single_candidate() -> TestResult {
        let input = input(
            vec![
                CartLine::product("a", 1, Decimal::from(10)),
                CartLine::product("b", 1, Decimal::from(4)),
            ],
            &both(),
            &json!({ "cartLinePercentage": "20" }),
        );

        let result = run_with_observer(&input, &mut NoopObserver)?;

        let [Operation::ProductDiscountsAdd(add)] = result.operations.as_slice() else {
            panic!("expected a single product operation, got {result:?}");
        };
        let [candidate] = add.candidates.as_slice() else {
            panic!("expected a single candidate, got {add:?}");
        };

        assert_eq!(candidate.message, "20% OFF");
        assert_eq!(candidate.targets.len(), 2);
        assert_eq!(candidate.value, DiscountValue::percentage(Decimal::from(20)));

        Ok(())
    }

    #[test]
    fn round_trips_through_json() -> TestResult {
        let json = json!({
            "cart": {
                "lines": [{
                    "id": "gid://shopify/CartLine/1",
                    "quantity": 1,
                    "cost": { "subtotalAmount": { "amount": "9.99" } },
                    "merchandise": { "__typename": "ProductVariant", "product": {} }
                }]
            },
            "discount": {
                "discountClasses": ["ORDER"],
                "metafield": { "value": "{\"orderPercentage\":\"15\"}" }
            }
        });

        let input = FunctionInput::from_json(&json.to_string())?;
        let output = run_with_observer(&input, &mut NoopObserver)?.to_json(false)?;

        assert_eq!(
            output,
            r#"{"operations":[{"orderDiscountsAdd":{"candidates":[{"message":"15% OFF ORDER","targets":[{"orderSubtotal":{"excludedCartLineIds":[]}}],"value":{"percentage":{"value":"15"}}}],"selectionStrategy":"FIRST"}}]}"#
        );

        Ok(())
    }

    #[test]
    fn metafield_without_value_falls_back_to_defaults() -> TestResult {
        for metafield in [json!({}), json!({ "value": null }), json!(null)] {
            let json = json!({
                "cart": {
                    "lines": [{
                        "id": "gid://shopify/CartLine/1",
                        "quantity": 1,
                        "cost": { "subtotalAmount": { "amount": "9.99" } },
                        "merchandise": { "__typename": "ProductVariant", "product": {} }
                    }]
                },
                "discount": {
                    "discountClasses": ["ORDER", "PRODUCT"],
                    "metafield": metafield
                }
            });
            let mut recorder = ConfigRecorder::default();

            let input = FunctionInput::from_json(&json.to_string())?;
            let result = run_with_observer(&input, &mut recorder)?;

            assert!(input.discount.policy().is_none(), "metafield {metafield}");
            assert!(result.is_empty(), "metafield {metafield}");
            assert_eq!(
                recorder.faults,
                [ConfigFault::MissingMetafield],
                "metafield {metafield}"
            );
        }

        Ok(())
    }

    #[test]
    fn malformed_input_is_a_json_error() {
        let result = FunctionInput::from_json(r#"{ "cart": { "lines": "nope" } }"#);

        assert!(matches!(result, Err(EvaluationError::Json(_))));
    }
}
