//! Type checking of whole modules
//!
//! Trees are built with the `Ast` fixtures and checked end to end.

mod bindings;
mod declarations;
