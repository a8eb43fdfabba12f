use super::codec;
use doh_relay_domain::{ControlEvent, DomainError};
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, ReadHalf, WriteHalf};

#[cfg(unix)]
type Stream = tokio::net::UnixStream;

#[cfg(windows)]
type Stream = tokio::net::windows::named_pipe::NamedPipeClient;

/// One controller connection to a running service.
pub struct ControlClient {
    lines: Lines<BufReader<ReadHalf<Stream>>>,
    writer: WriteHalf<Stream>,
}

impl ControlClient {
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let stream = open(path.as_ref()).await?;
        let (reader, writer) = tokio::io::split(stream);
        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
        })
    }

    pub async fn send(&mut self, event: &ControlEvent) -> Result<(), DomainError> {
        let line = codec::encode(event)?;
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Waits up to `timeout` for the next event. `Ok(None)` means nothing
    /// arrived in time; a closed channel is an error.
    pub async fn next_event(&mut self, timeout: Duration) -> Result<Option<ControlEvent>, DomainError> {
        loop {
            let line = match tokio::time::timeout(timeout, self.lines.next_line()).await {
                Err(_) => return Ok(None),
                Ok(line) => line?,
            };
            let Some(line) = line else {
                return Err(DomainError::Io("control channel closed".to_string()));
            };
            if line.trim().is_empty() {
                continue;
            }
            return codec::decode(&line).map(Some);
        }
    }
}

#[cfg(unix)]
async fn open(path: &Path) -> Result<Stream, DomainError> {
    tokio::net::UnixStream::connect(path)
        .await
        .map_err(|e| connect_error(path, e))
}

#[cfg(windows)]
async fn open(path: &Path) -> Result<Stream, DomainError> {
    use tokio::net::windows::named_pipe::ClientOptions;

    let name = path.to_string_lossy().to_string();
    let mut attempts = 0;
    loop {
        match ClientOptions::new().open(&name) {
            Ok(pipe) => return Ok(pipe),
            // All instances busy; the server creates the next one shortly.
            Err(_) if attempts < 3 => {
                tokio::time::sleep(Duration::from_millis(100)).await;
                attempts += 1;
            }
            Err(e) => return Err(connect_error(path, e)),
        }
    }
}

fn connect_error(path: &Path, e: std::io::Error) -> DomainError {
    DomainError::Io(format!(
        "Failed to connect to control channel {}: {}. Is the service running?",
        path.display(),
        e
    ))
}
