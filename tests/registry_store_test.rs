use std::collections::BTreeSet;
use std::thread;
use std::time::Duration;

use service_registry::services::{RegistryError, RegistryStore, StoreConfig};

const WRITERS: usize = 8;
const OPS_PER_WRITER: usize = 200;

fn long_lived_config() -> StoreConfig {
    StoreConfig {
        sweep_interval: Duration::from_millis(10),
        instance_ttl: Duration::from_secs(600),
    }
}

fn address(writer: usize, op: usize) -> String {
    format!("10.0.{writer}.{op}:8080")
}

// 每个写线程操作自己的地址段，因此最终状态可以用顺序模型计算
fn expected_addresses() -> BTreeSet<String> {
    let mut expected = BTreeSet::new();
    for writer in 0..WRITERS {
        for op in 0..OPS_PER_WRITER {
            let addr = address(writer, op);
            expected.insert(addr.clone());
            if op % 3 == 0 {
                expected.remove(&addr);
            }
        }
    }
    expected
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_operations_match_sequential_model() {
    let store = RegistryStore::new(long_lived_config()).unwrap();
    let service = "orders";

    thread::scope(|scope| {
        for writer in 0..WRITERS {
            let store = store.clone();
            scope.spawn(move || {
                for op in 0..OPS_PER_WRITER {
                    let addr = address(writer, op);
                    if op % 2 == 0 {
                        store.register(service, &addr);
                        assert!(store.heartbeat(service, &addr));
                    } else {
                        assert!(!store.heartbeat(service, &addr));
                        store.register(service, &addr);
                    }
                    if op % 3 == 0 {
                        assert_eq!(store.deregister(service, &addr), Ok(()));
                        assert!(store.deregister(service, &addr).is_err());
                    }
                }
            });
        }

        for _ in 0..4 {
            let store = store.clone();
            scope.spawn(move || {
                for _ in 0..OPS_PER_WRITER {
                    let addresses = store.list_addresses(service);
                    let unique: BTreeSet<&String> = addresses.iter().collect();
                    assert_eq!(unique.len(), addresses.len(), "duplicate address in snapshot");

                    match store.pick_random_address(service) {
                        Ok(addr) => assert!(addr.starts_with("10.0.")),
                        Err(err) => assert_eq!(
                            err,
                            RegistryError::NoInstancesAvailable {
                                service_name: service.to_string()
                            }
                        ),
                    }
                }
            });
        }
    });

    let actual: BTreeSet<String> = store.list_addresses(service).into_iter().collect();
    assert_eq!(actual, expected_addresses());
    assert_eq!(store.instance_counts()[service], actual.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_heartbeats_on_same_address_keep_one_instance() {
    let store = RegistryStore::new(long_lived_config()).unwrap();

    thread::scope(|scope| {
        for _ in 0..WRITERS {
            let store = store.clone();
            scope.spawn(move || {
                for _ in 0..OPS_PER_WRITER {
                    store.heartbeat("payments", "10.1.0.1:9000");
                    store.register("payments", "10.1.0.1:9000");
                }
            });
        }
    });

    assert_eq!(store.list_addresses("payments"), vec!["10.1.0.1:9000"]);
}

#[tokio::test]
async fn instances_expire_with_real_clock() {
    let store = RegistryStore::new(StoreConfig {
        sweep_interval: Duration::from_millis(20),
        instance_ttl: Duration::from_millis(150),
    })
    .unwrap();
    store.register("search", "10.2.0.1:7000");
    store.register("search", "10.2.0.2:7000");

    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.heartbeat("search", "10.2.0.1:7000");
    }

    assert_eq!(store.list_addresses("search"), vec!["10.2.0.1:7000"]);
    assert_eq!(store.pick_random_address("search").unwrap(), "10.2.0.1:7000");

    store.shutdown().await;
}
