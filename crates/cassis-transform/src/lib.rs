//! IR Transformations for Cassis
//!
//! This crate contains the closure conversion pass that runs on the HIR:
//! - Free-variable analysis
//! - Capture reference rewriting
//! - Closure lifting (lambdas, method references, anonymous classes)
//! - Renaming anonymous classes to their lifted names
//! - The whole-program `convert_closures` driver

pub mod capture;
pub mod closure;
pub mod convert;
pub mod error;
pub mod free_vars;
pub mod method_reference;
pub mod options;
pub mod rename;

// Re-export main transformation functions
pub use closure::{lift, Capture, ClosureBody, GeneratedClosure};
pub use convert::{convert_closures, ClosureForm, LiftReport};
pub use error::LiftError;
pub use free_vars::{find_free_references, find_free_type_parameters, find_free_variables};
pub use method_reference::lift_method_reference;
pub use options::LiftOptions;
