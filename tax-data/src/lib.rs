pub mod compare;
pub mod loader;

pub use compare::{TableDifference, compare_registries};
pub use loader::{RegimeTableLoader, RegimeTableLoaderError, RegimeTableRecord};
