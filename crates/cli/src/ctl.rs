use doh_relay_domain::control_event::EVENT_ERROR;
use doh_relay_domain::ControlEvent;
use doh_relay_infrastructure::control::ControlClient;
use serde_json::{Map, Value};
use std::time::Duration;

/// Sends one event and prints what the service broadcasts back, one JSON
/// object per line.
pub async fn run(
    path: &str,
    name: &str,
    data: Option<&str>,
    watch: bool,
    wait: Duration,
) -> anyhow::Result<()> {
    let event = build_event(name, data)?;
    let mut client = ControlClient::connect(path).await?;
    client.send(&event).await?;

    loop {
        match client.next_event(wait).await? {
            Some(reply) => {
                println!("{}", serde_json::to_string(&reply)?);
                if is_final(&reply, watch)? {
                    return Ok(());
                }
            }
            None if watch => continue,
            None => return Ok(()),
        }
    }
}

/// Whether `reply` ends a one-shot exchange. An `error` reply fails it;
/// in watch mode nothing ends the stream.
fn is_final(reply: &ControlEvent, watch: bool) -> anyhow::Result<bool> {
    if watch {
        return Ok(false);
    }
    if reply.name == EVENT_ERROR {
        let message = reply
            .data
            .as_ref()
            .and_then(|d| d.get("error"))
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        anyhow::bail!("service reported an error: {}", message);
    }
    Ok(true)
}

fn build_event(name: &str, data: Option<&str>) -> anyhow::Result<ControlEvent> {
    let Some(data) = data else {
        return Ok(ControlEvent::new(name));
    };
    let map: Map<String, Value> = serde_json::from_str(data)
        .map_err(|e| anyhow::anyhow!("--data must be a JSON object: {}", e))?;
    Ok(ControlEvent::with_data(name, map))
}
