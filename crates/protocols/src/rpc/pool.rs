//! Round-robin connection pool over RPC endpoints and outbound proxies.

use super::{ProxyCredential, ProxyError, RpcProvider};
use solana_rpc_client::http_sender::HttpSender;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::RpcClientConfig;
use solana_commitment_config::CommitmentConfig;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// HTTP timeout applied to every slot's transport.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Error building the pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No RPC endpoints configured.
    #[error("at least one RPC endpoint is required")]
    NoEndpoints,
    /// Pool size of zero.
    #[error("pool size must be at least 1")]
    ZeroPoolSize,
    /// Multi-proxy mode without proxies.
    #[error("multi-proxy mode requires at least one proxy")]
    NoProxies,
    /// A proxy tuple could not be parsed.
    #[error("invalid proxy: {0}")]
    Proxy(#[from] ProxyError),
    /// The HTTP client for a slot could not be built.
    #[error("failed to build client for {endpoint}: {message}")]
    Client {
        /// Endpoint of the failing slot.
        endpoint: String,
        /// Underlying error.
        message: String,
    },
}

/// Configuration for pool construction.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of slots.
    pub pool_size: usize,
    /// Spread slots over all endpoints instead of using the first one.
    pub use_multi_endpoint: bool,
    /// Route slots through the proxy list.
    pub use_multi_proxy: bool,
    /// Commitment used for reads and confirmations.
    pub commitment: CommitmentConfig,
    /// How long confirmation polling waits for a signature to appear.
    pub confirm_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_size: 5,
            use_multi_endpoint: true,
            use_multi_proxy: false,
            commitment: CommitmentConfig::confirmed(),
            confirm_timeout: Duration::from_secs(120),
        }
    }
}

/// One pool entry: endpoint, optional proxy and the long-lived client handle.
pub struct ConnectionSlot {
    /// RPC endpoint URL.
    pub endpoint: String,
    /// Proxy the slot's traffic goes through, if any.
    pub proxy: Option<ProxyCredential>,
    /// Shared client handle.
    pub client: Arc<dyn RpcProvider>,
}

impl fmt::Debug for ConnectionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSlot")
            .field("endpoint", &self.endpoint)
            .field("proxy", &self.proxy)
            .finish_non_exhaustive()
    }
}

/// Fixed set of RPC handles handed out round-robin.
///
/// Slots are read-only after construction. The cursor is the only mutable
/// state and advances atomically, so the pool can be shared freely across
/// tasks behind an `Arc`.
#[derive(Debug)]
pub struct ConnectionPool {
    slots: Vec<ConnectionSlot>,
    cursor: AtomicUsize,
}

impl ConnectionPool {
    /// Builds the pool with real `RpcClient` handles.
    ///
    /// # Errors
    /// Returns an error for an empty endpoint list, a zero pool size, a
    /// missing or malformed proxy list in multi-proxy mode, or a proxy URL the
    /// HTTP client rejects.
    pub fn initialize(
        endpoints: &[String],
        proxies: &[String],
        config: &PoolConfig,
    ) -> Result<Self, PoolError> {
        Self::initialize_with(endpoints, proxies, config, |endpoint, proxy| {
            build_rpc_client(endpoint, proxy, config)
        })
    }

    /// Builds the pool with a custom client factory.
    ///
    /// Slot `i` uses `endpoints[i % len]` in multi-endpoint mode (otherwise
    /// `endpoints[0]`) and `proxies[i % len]` in multi-proxy mode (otherwise a
    /// direct connection).
    pub fn initialize_with<F>(
        endpoints: &[String],
        proxies: &[String],
        config: &PoolConfig,
        mut factory: F,
    ) -> Result<Self, PoolError>
    where
        F: FnMut(&str, Option<&ProxyCredential>) -> Result<Arc<dyn RpcProvider>, PoolError>,
    {
        if endpoints.is_empty() {
            return Err(PoolError::NoEndpoints);
        }
        if config.pool_size == 0 {
            return Err(PoolError::ZeroPoolSize);
        }

        let proxies = if config.use_multi_proxy {
            if proxies.is_empty() {
                return Err(PoolError::NoProxies);
            }
            proxies
                .iter()
                .map(|raw| raw.parse::<ProxyCredential>())
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        let mut slots = Vec::with_capacity(config.pool_size);
        for i in 0..config.pool_size {
            let endpoint = if config.use_multi_endpoint {
                &endpoints[i % endpoints.len()]
            } else {
                &endpoints[0]
            };
            let proxy = (!proxies.is_empty()).then(|| proxies[i % proxies.len()].clone());

            let client = factory(endpoint, proxy.as_ref())?;
            debug!(
                slot = i,
                endpoint = %endpoint,
                proxy = ?proxy.as_ref().map(ToString::to_string),
                "Initialized connection slot"
            );

            slots.push(ConnectionSlot {
                endpoint: endpoint.clone(),
                proxy,
                client,
            });
        }

        info!(
            slots = slots.len(),
            endpoints = endpoints.len(),
            proxied = config.use_multi_proxy,
            "Connection pool ready"
        );

        Ok(Self {
            slots,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Returns the next client handle. Never blocks and never fails.
    pub fn get_connection(&self) -> Arc<dyn RpcProvider> {
        self.next_slot().client.clone()
    }

    /// Returns the slot at the cursor and advances the cursor by one.
    pub fn next_slot(&self) -> &ConnectionSlot {
        let len = self.slots.len();
        let index = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % len))
            .unwrap_or_else(|c| c);
        &self.slots[index]
    }

    /// All slots in construction order.
    #[must_use]
    pub fn slots(&self) -> &[ConnectionSlot] {
        &self.slots
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false: a constructed pool has at least one slot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn build_rpc_client(
    endpoint: &str,
    proxy: Option<&ProxyCredential>,
    config: &PoolConfig,
) -> Result<Arc<dyn RpcProvider>, PoolError> {
    let client_error = |e: reqwest::Error| PoolError::Client {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    };

    let mut builder = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .pool_idle_timeout(HTTP_TIMEOUT);
    if let Some(proxy) = proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy.url()).map_err(client_error)?);
    }
    let http = builder.build().map_err(client_error)?;

    let sender = HttpSender::new_with_client(endpoint.to_string(), http);
    let rpc_config = RpcClientConfig {
        commitment_config: config.commitment,
        confirm_transaction_initial_timeout: Some(config.confirm_timeout),
    };

    Ok(Arc::new(RpcClient::new_sender(sender, rpc_config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::ChainError;
    use async_trait::async_trait;
    use clmm_keeper_domain::entities::TokenBalance;
    use solana_sdk::hash::Hash;
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::signature::Signature;
    use solana_sdk::transaction::{Transaction, VersionedTransaction};

    struct StubRpc {
        endpoint: String,
    }

    #[async_trait]
    impl RpcProvider for StubRpc {
        fn endpoint(&self) -> String {
            self.endpoint.clone()
        }
        async fn get_latest_blockhash(&self) -> Result<Hash, ChainError> {
            Ok(Hash::default())
        }
        async fn get_balance(&self, _: &Pubkey) -> Result<u64, ChainError> {
            Ok(0)
        }
        async fn get_account_data(&self, _: &Pubkey) -> Result<Option<Vec<u8>>, ChainError> {
            Ok(None)
        }
        async fn get_token_balances(
            &self,
            _: &Pubkey,
            _: &Pubkey,
        ) -> Result<Vec<TokenBalance>, ChainError> {
            Ok(Vec::new())
        }
        async fn send_transaction(&self, _: &Transaction) -> Result<Signature, ChainError> {
            Ok(Signature::default())
        }
        async fn send_versioned_transaction(
            &self,
            _: &VersionedTransaction,
        ) -> Result<Signature, ChainError> {
            Ok(Signature::default())
        }
        async fn confirm_signature(&self, _: &Signature) -> Result<(), ChainError> {
            Ok(())
        }
    }

    fn endpoints(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://rpc-{i}.example")).collect()
    }

    fn stub_pool(endpoints: &[String], proxies: &[String], config: &PoolConfig) -> ConnectionPool {
        ConnectionPool::initialize_with(endpoints, proxies, config, |endpoint, _| {
            Ok(Arc::new(StubRpc {
                endpoint: endpoint.to_string(),
            }) as Arc<dyn RpcProvider>)
        })
        .unwrap()
    }

    fn slot_index(pool: &ConnectionPool, slot: &ConnectionSlot) -> usize {
        pool.slots()
            .iter()
            .position(|s| std::ptr::eq(s, slot))
            .unwrap()
    }

    #[test]
    fn test_round_robin_visits_every_slot_then_wraps() {
        for pool_size in 1..=7 {
            let config = PoolConfig {
                pool_size,
                ..Default::default()
            };
            let pool = stub_pool(&endpoints(3), &[], &config);

            let visited: Vec<usize> = (0..pool_size)
                .map(|_| slot_index(&pool, pool.next_slot()))
                .collect();
            assert_eq!(visited, (0..pool_size).collect::<Vec<_>>());

            assert_eq!(slot_index(&pool, pool.next_slot()), 0);
        }
    }

    #[test]
    fn test_multi_endpoint_assignment() {
        let config = PoolConfig {
            pool_size: 5,
            use_multi_endpoint: true,
            ..Default::default()
        };
        let eps = endpoints(2);
        let pool = stub_pool(&eps, &[], &config);

        let assigned: Vec<&str> = pool.slots().iter().map(|s| s.endpoint.as_str()).collect();
        assert_eq!(assigned, vec![&eps[0], &eps[1], &eps[0], &eps[1], &eps[0]]);
        assert!(pool.slots().iter().all(|s| s.proxy.is_none()));
        assert_eq!(pool.get_connection().endpoint(), eps[0]);
    }

    #[test]
    fn test_single_endpoint_mode_uses_first_endpoint() {
        let config = PoolConfig {
            pool_size: 4,
            use_multi_endpoint: false,
            ..Default::default()
        };
        let eps = endpoints(3);
        let pool = stub_pool(&eps, &[], &config);
        assert!(pool.slots().iter().all(|s| s.endpoint == eps[0]));
    }

    #[test]
    fn test_multi_proxy_assignment() {
        let config = PoolConfig {
            pool_size: 3,
            use_multi_proxy: true,
            ..Default::default()
        };
        let proxies = vec![
            "10.0.0.1:8080:u1:p1".to_string(),
            "10.0.0.2:8080:u2:p2".to_string(),
        ];
        let pool = stub_pool(&endpoints(1), &proxies, &config);

        let hosts: Vec<String> = pool
            .slots()
            .iter()
            .map(|s| s.proxy.as_ref().unwrap().host.clone())
            .collect();
        assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.2", "10.0.0.1"]);
    }

    #[test]
    fn test_proxies_ignored_when_multi_proxy_disabled() {
        let config = PoolConfig::default();
        let proxies = vec!["10.0.0.1:8080:u1:p1".to_string()];
        let pool = stub_pool(&endpoints(1), &proxies, &config);
        assert!(pool.slots().iter().all(|s| s.proxy.is_none()));
    }

    #[test]
    fn test_configuration_errors() {
        let config = PoolConfig::default();
        let factory = |_: &str, _: Option<&ProxyCredential>| -> Result<Arc<dyn RpcProvider>, PoolError> {
            unreachable!("factory must not run for invalid configuration")
        };

        assert!(matches!(
            ConnectionPool::initialize_with(&[], &[], &config, factory),
            Err(PoolError::NoEndpoints)
        ));

        let zero = PoolConfig {
            pool_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            ConnectionPool::initialize_with(&endpoints(1), &[], &zero, factory),
            Err(PoolError::ZeroPoolSize)
        ));

        let proxied = PoolConfig {
            use_multi_proxy: true,
            ..Default::default()
        };
        assert!(matches!(
            ConnectionPool::initialize_with(&endpoints(1), &[], &proxied, factory),
            Err(PoolError::NoProxies)
        ));
        assert!(matches!(
            ConnectionPool::initialize_with(
                &endpoints(1),
                &["bad".to_string()],
                &proxied,
                factory
            ),
            Err(PoolError::Proxy(ProxyError::FieldCount(1)))
        ));
    }

    #[test]
    fn test_initialize_builds_real_clients() {
        let config = PoolConfig {
            pool_size: 2,
            use_multi_proxy: true,
            ..Default::default()
        };
        let pool = ConnectionPool::initialize(
            &endpoints(2),
            &["127.0.0.1:3128:user:pass".to_string()],
            &config,
        )
        .unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get_connection().endpoint(), "https://rpc-0.example");
        assert_eq!(pool.get_connection().endpoint(), "https://rpc-1.example");
    }

    #[tokio::test]
    async fn test_concurrent_borrowing_is_balanced() {
        let config = PoolConfig {
            pool_size: 4,
            ..Default::default()
        };
        let pool = Arc::new(stub_pool(&endpoints(4), &[], &config));

        let mut handles = Vec::new();
        for _ in 0..40 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move { pool.get_connection().endpoint() }));
        }

        let mut counts = std::collections::HashMap::new();
        for handle in handles {
            *counts.entry(handle.await.unwrap()).or_insert(0) += 1;
        }
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|&c| c == 10));
    }
}
