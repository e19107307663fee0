pub mod calculations;
pub mod error;
pub mod models;
pub mod registry;
pub mod resolver;

pub use error::{TaxError, TaxErrorKind};
pub use models::*;
pub use registry::{RegimeKey, RegimeRegistry, RegistryConfig};
pub use resolver::EligibilityResolver;
