//! Common test infrastructure
//!
//! AST builders and helpers shared across the test suite.

pub mod fixtures;
pub mod harness;

// Re-export commonly used items
pub use fixtures::*;
pub use harness::*;
