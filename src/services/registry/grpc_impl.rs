use tonic::{Request, Response, Status};

use super::store::RegistryStore;
use crate::registry::v1::{
    DeregisterServiceRequest, DeregisterServiceResponse, GetRandServiceRequest,
    GetRandServiceResponse, GetServicesRequest, GetServicesResponse, HeartbeatRequest,
    HeartbeatResponse, RegisterServiceRequest, RegisterServiceResponse,
    discovery_service_server::{DiscoveryService, DiscoveryServiceServer},
};

// gRPC 适配层，只负责请求/响应转换
#[derive(Debug, Clone)]
pub struct RegistryController {
    store: RegistryStore,
}

impl RegistryController {
    pub fn new(store: RegistryStore) -> Self {
        Self { store }
    }

    pub fn into_server(self) -> DiscoveryServiceServer<Self> {
        DiscoveryServiceServer::new(self)
    }
}

// 为结构体实现 gRPC 服务 trait
#[tonic::async_trait]
impl DiscoveryService for RegistryController {
    async fn register_service(
        &self,
        request: Request<RegisterServiceRequest>,
    ) -> Result<Response<RegisterServiceResponse>, Status> {
        let req = request.into_inner();
        self.store.register(&req.service_name, &req.address);

        Ok(Response::new(RegisterServiceResponse { success: true }))
    }

    async fn deregister_service(
        &self,
        request: Request<DeregisterServiceRequest>,
    ) -> Result<Response<DeregisterServiceResponse>, Status> {
        let req = request.into_inner();
        self.store.deregister(&req.service_name, &req.address)?;

        Ok(Response::new(DeregisterServiceResponse { success: true }))
    }

    async fn get_services(
        &self,
        request: Request<GetServicesRequest>,
    ) -> Result<Response<GetServicesResponse>, Status> {
        let req = request.into_inner();
        let addresses = self.store.list_addresses(&req.service_name);

        Ok(Response::new(GetServicesResponse { addresses }))
    }

    async fn get_rand_service(
        &self,
        request: Request<GetRandServiceRequest>,
    ) -> Result<Response<GetRandServiceResponse>, Status> {
        let req = request.into_inner();
        let address = self.store.pick_random_address(&req.service_name)?;

        Ok(Response::new(GetRandServiceResponse { address }))
    }

    async fn heartbeat(
        &self,
        request: Request<HeartbeatRequest>,
    ) -> Result<Response<HeartbeatResponse>, Status> {
        let req = request.into_inner();
        let refreshed = self.store.heartbeat(&req.service_name, &req.address);

        Ok(Response::new(HeartbeatResponse { success: refreshed }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::registry::StoreConfig;

    #[tokio::test]
    async fn deregister_unknown_maps_to_not_found() {
        let store = RegistryStore::new(StoreConfig::default()).unwrap();
        let controller = RegistryController::new(store);

        let status = controller
            .deregister_service(Request::new(DeregisterServiceRequest {
                service_name: "svc".into(),
                address: "1.2.3.4:80".into(),
            }))
            .await
            .unwrap_err();

        assert_eq!(status.code(), tonic::Code::NotFound);
    }

    #[tokio::test]
    async fn heartbeat_reports_implicit_registration() {
        let store = RegistryStore::new(StoreConfig::default()).unwrap();
        let controller = RegistryController::new(store);
        let request = || {
            Request::new(HeartbeatRequest {
                service_name: "svc".into(),
                address: "10.0.0.1:80".into(),
            })
        };

        let first = controller.heartbeat(request()).await.unwrap().into_inner();
        let second = controller.heartbeat(request()).await.unwrap().into_inner();

        assert!(!first.success);
        assert!(second.success);
    }

    #[tokio::test]
    async fn get_rand_service_without_instances_is_unavailable() {
        let store = RegistryStore::new(StoreConfig::default()).unwrap();
        let controller = RegistryController::new(store);

        let status = controller
            .get_rand_service(Request::new(GetRandServiceRequest {
                service_name: "missing".into(),
            }))
            .await
            .unwrap_err();

        assert_eq!(status.code(), tonic::Code::Unavailable);
    }
}
