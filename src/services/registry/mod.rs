//! Registry service module
//!
//! This module contains the in-memory service registry split into logical components:
//! - `types`: Data structures, configuration and errors
//! - `store`: The registry store and its operations
//! - `cleanup`: Background expiry sweep
//! - `grpc_impl`: gRPC trait implementation

pub mod cleanup;
pub mod grpc_impl;
pub mod store;
pub mod types;

// Re-export public types for easier access
pub use grpc_impl::RegistryController;
pub use store::RegistryStore;
pub use types::{RegistryError, ServiceInstance, StoreConfig, StoreConfigError};
