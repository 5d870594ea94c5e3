//! Cart Discounts
//!
//! Computes discount operations for a checkout cart from a merchant-configured policy.
//! Each evaluation is a pure function of the cart snapshot, the enabled discount classes
//! and the serialized policy; see [`run::run`].

pub mod allocation;
pub mod cart;
pub mod discounts;
pub mod eligibility;
pub mod observer;
pub mod operations;
pub mod policy;
pub mod prelude;
pub mod run;
