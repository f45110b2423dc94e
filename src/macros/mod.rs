//! Declarative macros for try-this.

// attempt! and invoke! are defined with #[macro_export], which exports them at crate root
#[macro_use]
mod attempt;
