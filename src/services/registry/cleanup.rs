use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use super::store::RegistryStore;
use super::types::ServiceTable;

impl RegistryStore {
    // 启动清理任务
    pub(super) fn start_cleanup_task(&self) {
        let services = self.services.clone();
        let shutdown_token = self.shutdown_token.clone();
        let sweep_interval = self.config.sweep_interval;
        let instance_ttl = self.config.instance_ttl;

        // 第一次清理在一个间隔之后执行
        let mut interval =
            tokio::time::interval_at(Instant::now() + sweep_interval, sweep_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.task_tracker.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_token.cancelled() => {
                        tracing::debug!("Registry cleanup task stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        tracing::trace!("Executing instance expiration check...");
                        Self::run_sweep(&services, instance_ttl);
                    }
                }
            }
        });

        tracing::debug!(
            sweep_interval_ms = sweep_interval.as_millis() as u64,
            instance_ttl_ms = instance_ttl.as_millis() as u64,
            "Registry cleanup task started"
        );
    }

    /// 立即执行一次过期清理，返回被移除的实例数量
    pub fn sweep_expired(&self) -> usize {
        let mut table = self.write_table();
        Self::cleanup_expired_instances(&mut table, self.config.instance_ttl)
    }

    fn run_sweep(services: &RwLock<ServiceTable>, ttl: Duration) {
        let mut table = services.write().unwrap_or_else(PoisonError::into_inner);
        Self::cleanup_expired_instances(&mut table, ttl);
        Self::log_instance_counts(&table);
    }

    // 清理过期的实例，清空后的服务一并移除
    fn cleanup_expired_instances(table: &mut ServiceTable, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut expired_count = 0;

        for (service_name, instances) in table.iter_mut() {
            instances.retain(|address, instance| {
                if !instance.is_expired(now, ttl) {
                    return true;
                }

                tracing::warn!(
                    service_name = %service_name,
                    address = %address,
                    elapsed_ms = now.saturating_duration_since(instance.last_seen).as_millis() as u64,
                    ttl_ms = ttl.as_millis() as u64,
                    "Removing inactive service instance"
                );
                expired_count += 1;
                false
            });
        }

        if expired_count > 0 {
            table.retain(|_, instances| !instances.is_empty());
            tracing::info!(
                expired_count = expired_count,
                "Cleanup check completed, removed expired instances"
            );
        }

        expired_count
    }

    fn log_instance_counts(table: &ServiceTable) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        for (service_name, instances) in table.iter() {
            tracing::debug!(
                service_name = %service_name,
                instances = instances.len(),
                "Service instance count"
            );
        }
    }
}
