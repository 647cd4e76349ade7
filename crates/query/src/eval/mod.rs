//! Expression evaluation.

mod evaluator;
pub(crate) mod ops;

pub use evaluator::Evaluator;
pub(crate) use evaluator::is_internal_key;
