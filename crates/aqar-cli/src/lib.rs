//! # Aqar CLI
//!
//! Account and credential administration for operators.
//!
//! The binary wraps these functions; they are kept in a library so they can
//! be tested without spawning processes.

pub mod accounts;
pub mod tokens;
