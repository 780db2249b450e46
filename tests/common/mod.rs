//! Shared utilities for integration testing.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mock_host::config::PortConfig;
use mock_host::rules::DirectoryStorage;
use mock_host::{MockServer, Resolver, RuleStore, ServerConfig, Shutdown};

/// Default response body used by every test server.
pub const DEFAULT_BODY: &str = "nothing here";

/// Start a mock server on `port` serving rules from `rules_dir`.
///
/// The returned `Shutdown` must be kept alive for the server to keep running.
pub async fn start_server(port: u16, rules_dir: &Path) -> Shutdown {
    let mut config = ServerConfig::default();
    config.ports = vec![PortConfig::http(port)];
    config.default_response = DEFAULT_BODY.to_string();

    let storage = DirectoryStorage::open(rules_dir).unwrap();
    let store = RuleStore::new(Arc::new(storage), config.default_response.clone());
    let server = MockServer::new(config, Resolver::new(Arc::new(store)));

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(server_shutdown).await;
    });

    // Give the listener time to bind
    tokio::time::sleep(Duration::from_millis(300)).await;
    shutdown
}

/// HTTP client that never goes through a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
