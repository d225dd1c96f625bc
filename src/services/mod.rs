pub mod http;
pub mod registry;

pub use registry::{RegistryController, RegistryError, RegistryStore, StoreConfig, StoreConfigError};
