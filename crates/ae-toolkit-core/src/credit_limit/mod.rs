//! Credit limit scoring for trade-credit applicants.
//!
//! An application is validated, checked for eligibility, then sized from a
//! revenue-based base limit that runs through a fixed sequence of percentage
//! adjustments before the final floor and ceiling.

pub mod adjustments;
pub mod evaluator;

pub use adjustments::{AdjustmentChain, AdjustmentRule, AdjustmentStep, ChainOutcome};
pub use evaluator::{
    evaluate_credit_limit, rules_overview, CreditApplication, CreditApplicationForm, CreditResult,
    IndustryType, LimitCoverage, ThresholdApplied,
};
