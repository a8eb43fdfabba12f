use super::codec::{self, Frame};
use super::handler::ControlHandler;
use super::registry::ConnectionRegistry;
use doh_relay_domain::{ControlEvent, DomainError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const STOP_TIMEOUT: Duration = Duration::from_secs(5);
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

struct Accepting {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Control socket server: one reader and one writer task per connection,
/// every outbound event broadcast through the shared [`ConnectionRegistry`].
pub struct ControlServer {
    path: PathBuf,
    registry: Arc<ConnectionRegistry>,
    handler: Arc<dyn ControlHandler>,
    accepting: Mutex<Option<Accepting>>,
}

impl ControlServer {
    pub fn new(
        path: impl AsRef<Path>,
        registry: Arc<ConnectionRegistry>,
        handler: Arc<dyn ControlHandler>,
    ) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            registry,
            handler,
            accepting: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Binds the channel, then in the background runs the `on_start` hook and
    /// starts accepting controllers. Only a bind failure is an error.
    pub async fn start(&self) -> Result<(), DomainError> {
        let mut accepting = self.accepting.lock().await;
        if accepting.is_some() {
            return Ok(());
        }

        let listener = bind(&self.path)?;
        info!(path = %self.path.display(), "Control channel listening");

        let cancel = CancellationToken::new();
        let ctx = ConnectionContext {
            registry: Arc::clone(&self.registry),
            handler: Arc::clone(&self.handler),
            cancel: cancel.clone(),
        };
        let handler = Arc::clone(&self.handler);
        let task = tokio::spawn(async move {
            handler.on_start().await;
            accept_loop(listener, ctx).await;
        });

        *accepting = Some(Accepting { cancel, task });
        Ok(())
    }

    /// Closes every connection and releases the channel.
    pub async fn stop(&self) {
        let Some(Accepting { cancel, task }) = self.accepting.lock().await.take() else {
            return;
        };
        cancel.cancel();

        let abort = task.abort_handle();
        if tokio::time::timeout(STOP_TIMEOUT, task).await.is_err() {
            warn!("Control channel did not close in time, aborting");
            abort.abort();
        }
        cleanup(&self.path);
        info!("Control channel closed");
    }
}

#[derive(Clone)]
struct ConnectionContext {
    registry: Arc<ConnectionRegistry>,
    handler: Arc<dyn ControlHandler>,
    cancel: CancellationToken,
}

async fn serve_connection<S>(stream: S, ctx: ConnectionContext)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let (id, outbound) = ctx.registry.register();
    let writer_task = tokio::spawn(write_events(writer, outbound, ctx.cancel.clone()));

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        let frame = tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            frame = codec::read_frame(&mut reader, &mut buf) => frame,
        };
        match frame {
            Ok(Frame::Line(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match codec::decode(&line) {
                    Ok(event) => ctx.handler.handle(event).await,
                    Err(e) => warn!(connection = id, error = %e, "Ignoring malformed control message"),
                }
            }
            Ok(Frame::Oversized) => {
                warn!(connection = id, max = codec::MAX_LINE_LEN, "Ignoring oversized control message");
            }
            Ok(Frame::Closed) => break,
            Err(e) => {
                debug!(connection = id, error = %e, "Control connection read failed");
                break;
            }
        }
    }

    ctx.registry.unregister(id);
    // The writer drains what was already queued, then sees the closed queue.
    if tokio::time::timeout(DRAIN_TIMEOUT, writer_task).await.is_err() {
        debug!(connection = id, "Control writer did not finish");
    }
}

async fn write_events<W>(
    mut writer: W,
    mut outbound: mpsc::UnboundedReceiver<ControlEvent>,
    cancel: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = outbound.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        let line = match codec::encode(&event) {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "Cannot encode control event");
                continue;
            }
        };
        if writer.write_all(line.as_bytes()).await.is_err() || writer.flush().await.is_err() {
            break;
        }
    }
}

#[cfg(unix)]
type Listener = tokio::net::UnixListener;

#[cfg(unix)]
fn bind(path: &Path) -> Result<Listener, DomainError> {
    use std::os::unix::fs::PermissionsExt;

    // Stale socket from a previous run.
    let _ = std::fs::remove_file(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| bind_error(path, e))?;
        }
    }

    let listener = tokio::net::UnixListener::bind(path).map_err(|e| bind_error(path, e))?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| bind_error(path, e))?;
    Ok(listener)
}

#[cfg(unix)]
async fn accept_loop(listener: Listener, ctx: ConnectionContext) {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            result = listener.accept() => match result {
                Ok((stream, _)) => {
                    connections.spawn(serve_connection(stream, ctx.clone()));
                }
                Err(e) => warn!(error = %e, "Control socket accept failed"),
            },
        }
    }
    close_connections(connections).await;
}

#[cfg(unix)]
fn cleanup(path: &Path) {
    let _ = std::fs::remove_file(path);
}

#[cfg(windows)]
struct Listener {
    name: String,
    server: tokio::net::windows::named_pipe::NamedPipeServer,
}

#[cfg(windows)]
fn bind(path: &Path) -> Result<Listener, DomainError> {
    use tokio::net::windows::named_pipe::ServerOptions;

    let name = path.to_string_lossy().to_string();
    let server = ServerOptions::new()
        .first_pipe_instance(true)
        .create(&name)
        .map_err(|e| bind_error(path, e))?;
    Ok(Listener { name, server })
}

#[cfg(windows)]
async fn accept_loop(listener: Listener, ctx: ConnectionContext) {
    use tokio::net::windows::named_pipe::ServerOptions;

    let Listener { name, mut server } = listener;
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            result = server.connect() => {
                if let Err(e) = result {
                    warn!(error = %e, "Control pipe accept failed");
                    continue;
                }
                // The next instance must exist before this one is handed off.
                let next = match ServerOptions::new().create(&name) {
                    Ok(next) => next,
                    Err(e) => {
                        error!(error = %e, "Cannot create next control pipe instance");
                        break;
                    }
                };
                let connected = std::mem::replace(&mut server, next);
                connections.spawn(serve_connection(connected, ctx.clone()));
            }
        }
    }
    close_connections(connections).await;
}

#[cfg(windows)]
fn cleanup(_path: &Path) {}

/// Connections see the cancellation and unregister themselves; whatever is
/// still running after the drain timeout is aborted.
async fn close_connections(mut connections: JoinSet<()>) {
    let drained = tokio::time::timeout(DRAIN_TIMEOUT * 2, async {
        while connections.join_next().await.is_some() {}
    })
    .await
    .is_ok();
    if !drained {
        connections.shutdown().await;
    }
}

fn bind_error(path: &Path, e: std::io::Error) -> DomainError {
    DomainError::Io(format!(
        "Failed to open control channel {}: {}",
        path.display(),
        e
    ))
}
