pub mod aggregate;
pub mod evaluator;
pub mod outcome;

pub use aggregate::{aggregate, DISCLAIMER};
pub use evaluator::{evaluate_scheme, resolve_confidence, EvaluationContext, PropertyLocation};
pub use outcome::{Confidence, Criterion, GrantEligibilityMatch, GrantEligibilityResult};
