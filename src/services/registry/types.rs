use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tonic::Status;

// 服务实例信息
#[derive(Debug, Clone)]
pub struct ServiceInstance {
    pub address: String,
    pub last_seen: Instant,
}

impl ServiceInstance {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            last_seen: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        let now = Instant::now();
        // last_seen 只增不减
        if now > self.last_seen {
            self.last_seen = now;
        }
    }

    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > ttl
    }
}

// 单个服务的实例集合 (地址 -> 实例)
pub type ServiceInstances = HashMap<String, ServiceInstance>;

// 服务注册表 (服务名 -> 实例集合)
pub type ServiceTable = HashMap<String, ServiceInstances>;

/// 注册表配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// 过期清理的执行间隔
    pub sweep_interval: Duration,
    /// 实例在没有心跳的情况下保持存活的时长
    pub instance_ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(1),
            instance_ttl: Duration::from_secs(3),
        }
    }
}

impl StoreConfig {
    // 清理间隔必须大于 0，且 TTL 不短于一个清理间隔
    pub fn validate(&self) -> Result<(), StoreConfigError> {
        if self.sweep_interval.is_zero() {
            return Err(StoreConfigError::ZeroSweepInterval);
        }
        if self.instance_ttl < self.sweep_interval {
            return Err(StoreConfigError::TtlShorterThanInterval {
                instance_ttl: self.instance_ttl,
                sweep_interval: self.sweep_interval,
            });
        }
        Ok(())
    }
}

/// 注册表配置错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreConfigError {
    #[error("sweep interval must be greater than zero")]
    ZeroSweepInterval,

    #[error("instance ttl ({instance_ttl:?}) must not be shorter than sweep interval ({sweep_interval:?})")]
    TtlShorterThanInterval {
        instance_ttl: Duration,
        sweep_interval: Duration,
    },
}

/// 注册表错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("service instance not found: {service_name} at {address}")]
    NotFound {
        service_name: String,
        address: String,
    },

    #[error("no available instances for service: {service_name}")]
    NoInstancesAvailable { service_name: String },
}

impl From<RegistryError> for Status {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound { .. } => Status::not_found(err.to_string()),
            RegistryError::NoInstancesAvailable { .. } => Status::unavailable(err.to_string()),
        }
    }
}
