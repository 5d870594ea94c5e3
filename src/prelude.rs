//! Cart Discounts prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    allocation::{Allocation, AllocationStrategy, UnitAllocation, allocate},
    cart::{Cart, CartLine, CartLineCost, Merchandise, MoneyAmount, Product},
    discounts::{DiscountClass, DiscountClassSet, DiscountError},
    eligibility::{EligibleLine, eligible_lines},
    observer::{EvaluationObserver, NoopObserver, TracingObserver},
    operations::{
        DiscountCandidate, DiscountValue, DiscountsAdd, FunctionResult, Operation,
        OperationBuilder, SelectionStrategy, Target,
    },
    policy::{ConfigFault, PolicyConfig},
    run::{Discount, EvaluationError, FunctionInput, Metafield, run, run_with_observer},
};
