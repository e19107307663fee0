//! Tax arithmetic over a resolved slab schedule.
//!
//! - [`brackets`]: the progressive slab engine
//! - [`calculator`]: validation, deductions, cess and prepaid-tax netting
//! - [`cache`]: memoized wrapper around the calculator

pub mod brackets;
pub mod cache;
pub mod calculator;
pub mod common;

pub use brackets::{compute_from_base_tax, compute_marginal_tax};
pub use cache::{CacheStats, MemoizedCalculator};
pub use calculator::{CESS_RATE, TaxCalculator, TaxComputationInput};
