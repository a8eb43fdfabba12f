use super::forwarder::{Forwarder, Upstream};
use crate::dns::endpoint::FailureReporter;
use arc_swap::{ArcSwap, ArcSwapOption};
use async_trait::async_trait;
use doh_relay_application::ports::{DnsTransport, ProxyControl, ServiceLogger};
use doh_relay_domain::{DomainError, Endpoint};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const MAX_UDP_MESSAGE: usize = 4096;
const TCP_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct DnsProxyOptions {
    pub listen: SocketAddr,
    pub query_timeout: Duration,
    pub tcp: bool,
    /// Bound on waiting for listener tasks during `stop`.
    pub stop_timeout: Duration,
}

impl Default for DnsProxyOptions {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 53)),
            query_timeout: Duration::from_secs(5),
            tcp: true,
            stop_timeout: Duration::from_secs(2),
        }
    }
}

struct Running {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

/// Plaintext DNS listener (UDP and optionally TCP) forwarding every query
/// through the currently installed upstream transport.
///
/// `start` and `stop` are idempotent. `stop` aborts in-flight forwards.
pub struct DnsProxy {
    options: DnsProxyOptions,
    forwarder: Arc<Forwarder>,
    running: Mutex<Option<Running>>,
    started: AtomicBool,
    local_addr: ArcSwapOption<SocketAddr>,
}

impl DnsProxy {
    pub fn new(
        options: DnsProxyOptions,
        logger: Arc<dyn ServiceLogger>,
        reporter: FailureReporter,
    ) -> Self {
        let forwarder = Forwarder {
            upstream: ArcSwapOption::empty(),
            path: ArcSwap::from_pointee(String::new()),
            timeout: options.query_timeout,
            logger,
            reporter,
        };
        Self {
            options,
            forwarder: Arc::new(forwarder),
            running: Mutex::new(None),
            started: AtomicBool::new(false),
            local_addr: ArcSwapOption::empty(),
        }
    }

    /// Publishes `transport` for every subsequent query. Queries already in
    /// flight finish on the transport they loaded.
    pub fn install_transport(&self, transport: Arc<dyn DnsTransport>) {
        self.forwarder
            .upstream
            .store(Some(Arc::new(Upstream { transport })));
    }

    /// Queries answer SERVFAIL until a transport is installed again.
    pub fn clear_transport(&self) {
        self.forwarder.upstream.store(None);
    }

    pub fn upstream_endpoint(&self) -> Option<Endpoint> {
        self.forwarder
            .upstream
            .load()
            .as_ref()
            .map(|u| u.transport.endpoint().clone())
    }

    pub fn upstream_path(&self) -> String {
        self.forwarder.path.load_full().to_string()
    }

    /// Bound address while running; resolves a port 0 listen address.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.load().as_deref().copied()
    }
}

#[async_trait]
impl ProxyControl for DnsProxy {
    async fn start(&self) -> Result<(), DomainError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            debug!("DNS proxy already running");
            return Ok(());
        }

        let listen = self.options.listen;
        let bind_failed = |e: std::io::Error| DomainError::ProxyBindFailed {
            addr: listen.to_string(),
            reason: e.to_string(),
        };

        let udp = UdpSocket::bind(listen).await.map_err(bind_failed)?;
        let local = udp.local_addr().map_err(bind_failed)?;
        let tcp = if self.options.tcp {
            Some(TcpListener::bind(local).await.map_err(bind_failed)?)
        } else {
            None
        };

        let cancel = CancellationToken::new();
        let mut tasks = vec![tokio::spawn(serve_udp(
            Arc::new(udp),
            Arc::clone(&self.forwarder),
            cancel.clone(),
        ))];
        if let Some(listener) = tcp {
            tasks.push(tokio::spawn(serve_tcp(
                listener,
                Arc::clone(&self.forwarder),
                cancel.clone(),
            )));
        }

        *running = Some(Running { cancel, tasks });
        self.local_addr.store(Some(Arc::new(local)));
        self.started.store(true, Ordering::SeqCst);
        info!(addr = %local, tcp = self.options.tcp, "DNS proxy listening");
        Ok(())
    }

    async fn stop(&self) -> Result<(), DomainError> {
        let mut running = self.running.lock().await;
        let Some(Running { cancel, tasks }) = running.take() else {
            debug!("DNS proxy already stopped");
            return Ok(());
        };

        self.started.store(false, Ordering::SeqCst);
        cancel.cancel();

        let mut stuck = 0usize;
        for task in tasks {
            let abort = task.abort_handle();
            if tokio::time::timeout(self.options.stop_timeout, task).await.is_err() {
                abort.abort();
                stuck += 1;
            }
        }
        self.local_addr.store(None);

        if stuck > 0 {
            warn!(stuck, "DNS proxy listener tasks aborted");
            return Err(DomainError::ProxyStopFailed(format!(
                "{} listener task(s) did not exit within {}ms",
                stuck,
                self.options.stop_timeout.as_millis()
            )));
        }
        info!("DNS proxy stopped");
        Ok(())
    }

    fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn set_upstream_path(&self, path: &str) {
        let path = path.trim().trim_matches('/').to_string();
        debug!(path = %path, "Upstream path updated");
        self.forwarder.path.store(Arc::new(path));
    }
}

async fn serve_udp(socket: Arc<UdpSocket>, forwarder: Arc<Forwarder>, cancel: CancellationToken) {
    let mut queries = JoinSet::new();
    let mut buf = vec![0u8; MAX_UDP_MESSAGE];

    loop {
        let (len, peer) = tokio::select! {
            _ = cancel.cancelled() => break,
            Some(_) = queries.join_next(), if !queries.is_empty() => continue,
            result = socket.recv_from(&mut buf) => match result {
                Ok(received) => received,
                Err(e) => {
                    debug!(error = %e, "UDP receive failed");
                    continue;
                }
            },
        };

        let query = buf[..len].to_vec();
        let socket = Arc::clone(&socket);
        let forwarder = Arc::clone(&forwarder);
        queries.spawn(async move {
            if let Some(response) = forwarder.resolve(&query).await {
                if let Err(e) = socket.send_to(&response, peer).await {
                    debug!(peer = %peer, error = %e, "UDP send failed");
                }
            }
        });
    }

    queries.shutdown().await;
}

async fn serve_tcp(listener: TcpListener, forwarder: Arc<Forwarder>, cancel: CancellationToken) {
    let mut connections = JoinSet::new();

    loop {
        let (stream, peer) = tokio::select! {
            _ = cancel.cancelled() => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => continue,
            result = listener.accept() => match result {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "TCP accept failed");
                    continue;
                }
            },
        };

        let forwarder = Arc::clone(&forwarder);
        connections.spawn(async move {
            if let Err(e) = handle_tcp(stream, &forwarder).await {
                debug!(peer = %peer, error = %e, "TCP connection closed");
            }
        });
    }

    connections.shutdown().await;
}

/// Serves length-prefixed queries (RFC 1035 §4.2.2) until the peer closes
/// or stays idle.
async fn handle_tcp(mut stream: TcpStream, forwarder: &Forwarder) -> std::io::Result<()> {
    loop {
        let mut len_buf = [0u8; 2];
        match tokio::time::timeout(TCP_IDLE_TIMEOUT, stream.read_exact(&mut len_buf)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Ok(Err(e)) => return Err(e),
            Err(_) => return Ok(()),
        }

        let len = u16::from_be_bytes(len_buf) as usize;
        let mut query = vec![0u8; len];
        stream.read_exact(&mut query).await?;

        let Some(response) = forwarder.resolve(&query).await else {
            return Ok(());
        };
        let Ok(response_len) = u16::try_from(response.len()) else {
            warn!(len = response.len(), "Upstream response too large for TCP framing");
            return Ok(());
        };
        stream.write_all(&response_len.to_be_bytes()).await?;
        stream.write_all(&response).await?;
    }
}
