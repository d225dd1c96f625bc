use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rand::seq::IteratorRandom;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::types::{RegistryError, ServiceInstance, ServiceTable, StoreConfig, StoreConfigError};

/// 内存服务注册表
///
/// 克隆得到的是同一张注册表的句柄。所有写操作（包括后台过期清理）持有写锁，
/// 读操作持有读锁并返回数据副本，调用方无法直接修改内部状态。
#[derive(Debug, Clone)]
pub struct RegistryStore {
    pub(super) services: Arc<RwLock<ServiceTable>>,
    pub(super) config: StoreConfig,
    pub(super) shutdown_token: CancellationToken,
    pub(super) task_tracker: TaskTracker,
}

impl RegistryStore {
    /// 创建注册表并启动后台过期清理任务，必须在 tokio 运行时内调用
    pub fn new(config: StoreConfig) -> Result<Self, StoreConfigError> {
        config.validate()?;

        let store = Self {
            services: Arc::new(RwLock::new(ServiceTable::new())),
            config,
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        };

        // 启动定期清理任务
        store.start_cleanup_task();

        Ok(store)
    }

    pub fn config(&self) -> StoreConfig {
        self.config
    }

    // 写操作期间不会 panic，锁中毒时数据仍然一致
    pub(super) fn read_table(&self) -> RwLockReadGuard<'_, ServiceTable> {
        self.services.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn write_table(&self) -> RwLockWriteGuard<'_, ServiceTable> {
        self.services.write().unwrap_or_else(PoisonError::into_inner)
    }

    // 注册或刷新服务实例
    pub fn register(&self, service_name: &str, address: &str) {
        let mut services = self.write_table();
        Self::upsert(&mut services, service_name, address);
    }

    // 注销服务实例
    pub fn deregister(&self, service_name: &str, address: &str) -> Result<(), RegistryError> {
        let mut services = self.write_table();

        let removed = match services.get_mut(service_name) {
            Some(instances) => {
                let removed = instances.remove(address).is_some();
                if instances.is_empty() {
                    services.remove(service_name);
                }
                removed
            }
            None => false,
        };

        if !removed {
            return Err(RegistryError::NotFound {
                service_name: service_name.to_string(),
                address: address.to_string(),
            });
        }

        tracing::info!(
            service_name = %service_name,
            address = %address,
            "Deregistered service instance"
        );
        Ok(())
    }

    /// 处理心跳
    ///
    /// 实例已存在时刷新 `last_seen` 并返回 `true`；
    /// 未知实例视为隐式注册，返回 `false`。
    pub fn heartbeat(&self, service_name: &str, address: &str) -> bool {
        let mut services = self.write_table();

        if let Some(instance) = services
            .get_mut(service_name)
            .and_then(|instances| instances.get_mut(address))
        {
            instance.touch();
            tracing::debug!(
                service_name = %service_name,
                address = %address,
                "Heartbeat received"
            );
            return true;
        }

        Self::upsert(&mut services, service_name, address);
        false
    }

    // 获取服务的全部地址，按字典序返回
    pub fn list_addresses(&self, service_name: &str) -> Vec<String> {
        let services = self.read_table();

        let mut addresses: Vec<String> = services
            .get(service_name)
            .map(|instances| instances.keys().cloned().collect())
            .unwrap_or_default();
        addresses.sort_unstable();
        addresses
    }

    // 从存活实例中均匀随机选择一个地址
    pub fn pick_random_address(&self, service_name: &str) -> Result<String, RegistryError> {
        let services = self.read_table();

        services
            .get(service_name)
            .and_then(|instances| instances.keys().choose(&mut rand::rng()))
            .cloned()
            .ok_or_else(|| RegistryError::NoInstancesAvailable {
                service_name: service_name.to_string(),
            })
    }

    // 各服务当前的实例数量
    pub fn instance_counts(&self) -> BTreeMap<String, usize> {
        self.read_table()
            .iter()
            .map(|(name, instances)| (name.clone(), instances.len()))
            .collect()
    }

    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read_table().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// 停止后台清理任务并等待其退出，之后注册表仍可读写，但不再过期淘汰
    pub async fn shutdown(&self) {
        self.shutdown_token.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;
    }

    fn upsert(services: &mut ServiceTable, service_name: &str, address: &str) {
        services
            .entry(service_name.to_string())
            .or_default()
            .entry(address.to_string())
            .and_modify(ServiceInstance::touch)
            .or_insert_with(|| ServiceInstance::new(address));

        tracing::info!(
            service_name = %service_name,
            address = %address,
            "Registered service instance"
        );
    }
}
