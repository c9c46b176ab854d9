/* src/server/gateway/rust/src/realtime.rs */

//! Realtime change feed over the platform's Phoenix-style channel socket.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::tungstenite::Message;

use crate::{BoxStream, ChangeEvent, ChangeKind, GatewayError, GatewayResult};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
const CHANNEL_CAPACITY: usize = 64;

pub fn topic(table: &str) -> String {
  format!("realtime:public:{table}")
}

/// Websocket endpoint derived from the REST base URL.
pub fn socket_url(base: &Url, key: &str) -> GatewayResult<Url> {
  let mut url = base
    .join("realtime/v1/websocket")
    .map_err(|e| GatewayError::config(format!("invalid realtime URL: {e}")))?;
  let scheme = if base.scheme() == "https" { "wss" } else { "ws" };
  url
    .set_scheme(scheme)
    .map_err(|()| GatewayError::config("cannot derive websocket scheme"))?;
  url.query_pairs_mut().append_pair("apikey", key).append_pair("vsn", "1.0.0");
  Ok(url)
}

pub fn join_message(table: &str, join_ref: u64) -> Value {
  json!({
    "topic": topic(table),
    "event": "phx_join",
    "payload": {
      "config": {
        "postgres_changes": [{ "event": "*", "schema": "public", "table": table }]
      }
    },
    "ref": join_ref.to_string(),
  })
}

pub fn heartbeat_message(msg_ref: u64) -> Value {
  json!({ "topic": "phoenix", "event": "heartbeat", "payload": {}, "ref": msg_ref.to_string() })
}

fn parse_kind(raw: &str) -> Option<ChangeKind> {
  match raw {
    "INSERT" => Some(ChangeKind::Insert),
    "UPDATE" => Some(ChangeKind::Update),
    "DELETE" => Some(ChangeKind::Delete),
    _ => None,
  }
}

/// Classification of one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
  Change(ChangeEvent),
  JoinRejected(String),
  Ignored,
}

pub fn parse_frame(msg: &Value, table: &str) -> Frame {
  let event = msg["event"].as_str().unwrap_or_default();
  let payload = &msg["payload"];
  match event {
    "phx_reply" if msg["topic"] == topic(table) && payload["status"] == "error" => {
      Frame::JoinRejected(payload["response"].to_string())
    }
    "postgres_changes" => change_from(&payload["data"], table),
    "INSERT" | "UPDATE" | "DELETE" => change_from(payload, table),
    _ => Frame::Ignored,
  }
}

fn change_from(data: &Value, table: &str) -> Frame {
  let Some(kind) = data["type"].as_str().and_then(parse_kind) else {
    return Frame::Ignored;
  };
  Frame::Change(ChangeEvent {
    table: data["table"].as_str().unwrap_or(table).to_string(),
    kind,
    record: data.get("record").cloned().unwrap_or(Value::Null),
    old_record: data.get("old_record").cloned().unwrap_or(Value::Null),
  })
}

/// Open the socket, join the table's channel, and forward changes until the
/// returned stream is dropped or the socket closes.
pub async fn subscribe(
  base: &Url,
  key: &str,
  table: &str,
) -> GatewayResult<BoxStream<GatewayResult<ChangeEvent>>> {
  let url = socket_url(base, key)?;
  let (socket, _) = tokio_tungstenite::connect_async(url.as_str())
    .await
    .map_err(|e| GatewayError::transport(format!("realtime connect failed: {e}")))?;
  let (mut sink, mut source) = socket.split();

  sink
    .send(Message::Text(join_message(table, 1).to_string().into()))
    .await
    .map_err(|e| GatewayError::transport(format!("realtime join failed: {e}")))?;

  let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
  let table = table.to_string();
  tokio::spawn(async move {
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    let mut next_ref = 2u64;
    loop {
      tokio::select! {
        () = tx.closed() => break,
        _ = heartbeat.tick() => {
          let beat = Message::Text(heartbeat_message(next_ref).to_string().into());
          next_ref += 1;
          if sink.send(beat).await.is_err() {
            break;
          }
        }
        incoming = source.next() => {
          let item = match incoming {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<Value>(&text) {
              Ok(msg) => match parse_frame(&msg, &table) {
                Frame::Change(change) => Some(Ok(change)),
                Frame::JoinRejected(reason) => {
                  Some(Err(GatewayError::status(400, format!("realtime join rejected: {reason}"))))
                }
                Frame::Ignored => None,
              },
              Err(e) => Some(Err(GatewayError::decode(e.to_string()))),
            },
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => None,
            Some(Err(e)) => {
              let _ = tx.send(Err(GatewayError::transport(e.to_string()))).await;
              break;
            }
          };
          if let Some(item) = item {
            if tx.send(item).await.is_err() {
              break;
            }
          }
        }
      }
    }
    let _ = sink.close().await;
    tracing::debug!(table = %table, "realtime subscription closed");
  });

  Ok(Box::pin(ReceiverStream::new(rx)))
}
