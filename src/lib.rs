pub mod registry {
    pub mod v1 {
        tonic::include_proto!("registry.v1");
    }
}
pub mod config;
pub mod server;
pub mod services;
