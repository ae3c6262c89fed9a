//! Tree-walking evaluator for the Cassis HIR
//!
//! Runs a program after closure conversion. It exists to check that lifted
//! programs behave like their sources; it is not a production runtime.

pub mod eval;
pub mod value;

pub use eval::{EvalError, Interpreter};
pub use value::{Object, Value};

#[cfg(test)]
mod end_to_end;
