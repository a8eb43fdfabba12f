use doh_relay_domain::{ControlEvent, DomainError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Longest accepted inbound line, in bytes.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Encodes `event` as one JSON line, newline included.
pub fn encode(event: &ControlEvent) -> Result<String, DomainError> {
    let mut line = serde_json::to_string(event)
        .map_err(|e| DomainError::MalformedEvent(format!("cannot encode event: {}", e)))?;
    line.push('\n');
    Ok(line)
}

pub fn decode(line: &str) -> Result<ControlEvent, DomainError> {
    if line.len() > MAX_LINE_LEN {
        return Err(DomainError::MalformedEvent(format!(
            "line of {} bytes exceeds {} bytes",
            line.len(),
            MAX_LINE_LEN
        )));
    }
    serde_json::from_str(line.trim()).map_err(|e| DomainError::MalformedEvent(e.to_string()))
}

/// One inbound read from a controller connection.
#[derive(Debug, PartialEq, Eq)]
pub enum Frame {
    Line(String),
    /// A line longer than [`MAX_LINE_LEN`]; its bytes were discarded.
    Oversized,
    Closed,
}

/// Reads the next newline-terminated line, never buffering more than
/// [`MAX_LINE_LEN`] + 1 bytes of it.
pub async fn read_frame<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    let limit = MAX_LINE_LEN as u64 + 1;
    buf.clear();
    let n = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(Frame::Closed);
    }

    if buf.last() != Some(&b'\n') && buf.len() > MAX_LINE_LEN {
        loop {
            buf.clear();
            let n = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
            if n == 0 || buf.last() == Some(&b'\n') {
                break;
            }
        }
        buf.clear();
        return Ok(Frame::Oversized);
    }

    Ok(Frame::Line(String::from_utf8_lossy(buf).into_owned()))
}
