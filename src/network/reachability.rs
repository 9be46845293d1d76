//! Network availability signal

use crate::config::ReachabilitySettings;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info};
use url::Url;

/// Answers "is the backend reachable right now"
pub trait Reachability: Send + Sync {
    fn is_reachable(&self) -> bool;
}

/// Manually controlled flag
#[derive(Debug, Clone)]
pub struct StaticReachability {
    flag: Arc<AtomicBool>,
}

impl StaticReachability {
    pub fn new(reachable: bool) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(reachable)),
        }
    }

    pub fn set(&self, reachable: bool) {
        self.flag.store(reachable, Ordering::SeqCst);
    }
}

impl Reachability for StaticReachability {
    fn is_reachable(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Periodically probes the backend host with a TCP connect
pub struct NetworkMonitor {
    rx: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl NetworkMonitor {
    /// Start probing `base_url`'s host. The first probe runs immediately; until
    /// it finishes the network is assumed available.
    pub fn start(base_url: &str, settings: &ReachabilitySettings) -> Result<Self, url::ParseError> {
        let url = Url::parse(base_url)?;
        let host = url.host_str().unwrap_or("localhost").to_string();
        let port = url.port_or_known_default().unwrap_or(443);
        let address = format!("{}:{}", host, port);

        let interval = Duration::from_secs(settings.probe_interval.max(1));
        let probe_timeout = Duration::from_secs(settings.probe_timeout.max(1));
        let (tx, rx) = watch::channel(true);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let reachable = matches!(
                    timeout(probe_timeout, TcpStream::connect(address.as_str())).await,
                    Ok(Ok(_))
                );
                let changed = tx.send_if_modified(|current| {
                    let changed = *current != reachable;
                    *current = reachable;
                    changed
                });
                if changed {
                    info!("Backend {} is now {}", address, if reachable { "reachable" } else { "unreachable" });
                } else {
                    debug!("Probe {} reachable={}", address, reachable);
                }
                if tx.is_closed() {
                    break;
                }
            }
        });

        Ok(Self { rx, task })
    }

    /// Observe availability changes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }
}

impl Reachability for NetworkMonitor {
    fn is_reachable(&self) -> bool {
        *self.rx.borrow()
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_static_flag() {
        let reachability = StaticReachability::new(true);
        let shared = reachability.clone();
        reachability.set(false);
        assert!(!shared.is_reachable());
    }

    #[tokio::test]
    async fn test_monitor_sees_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let monitor = NetworkMonitor::start(
            &format!("http://127.0.0.1:{}/app/key", port),
            &ReachabilitySettings::default(),
        )
        .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(monitor.is_reachable());
    }

    #[tokio::test]
    async fn test_monitor_detects_closed_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let monitor = NetworkMonitor::start(
            &format!("http://127.0.0.1:{}", port),
            &ReachabilitySettings::default(),
        )
        .unwrap();
        let mut rx = monitor.subscribe();
        timeout(Duration::from_secs(2), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(!monitor.is_reachable());
    }

    #[test]
    fn test_invalid_url() {
        assert!(NetworkMonitor::start("not a url", &ReachabilitySettings::default()).is_err());
    }
}
