//! Diagnostics and their rendering

mod sema_errors;
