//! Per-connection task: greeting, writer task, receive loop, teardown.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use raceline_protocol::{ClientEvent, Codec, ConnectionId, JsonCodec};
use raceline_transport::{Connection, WebSocketConnection};

use crate::coordinator::{handle_event, SharedState};

/// Runs one connection to completion: register, pump events, clean up.
///
/// Takes the concrete connection type so the futures produced by its
/// `send`/`recv` are known to be `Send` (the bare trait methods carry no
/// such bound, which `tokio::spawn` requires).
///
/// Inbound frames that fail to decode are logged and skipped — a buggy
/// client loses that message, not its connection. Cleanup happens through
/// a drop guard, so the room roster stays consistent even if this task
/// panics.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    shared: Arc<SharedState>,
) {
    let id = conn.id();
    let conn = Arc::new(conn);
    let codec = JsonCodec;

    // Outbound path: room operations push ServerEvents into this channel
    // under the coordinator lock; the writer task drains it onto the
    // socket with no lock held.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn({
        let conn = Arc::clone(&conn);
        async move {
            while let Some(event) = rx.recv().await {
                let frame = match codec.encode(&event) {
                    Ok(frame) => frame,
                    Err(err) => {
                        debug!(%id, error = %err, "failed to encode event");
                        continue;
                    }
                };
                if conn.send(&frame).await.is_err() {
                    break;
                }
            }
        }
    });

    {
        let mut c = shared.coordinator().await;
        let greeting = c.connect(id, tx);
        c.deliver(greeting);
    }
    info!(%id, "client connected");
    let _guard = DisconnectGuard {
        id,
        shared: Arc::clone(&shared),
    };

    loop {
        match conn.recv().await {
            Ok(Some(frame)) => {
                let event: ClientEvent = match codec.decode(&frame) {
                    Ok(event) => event,
                    Err(err) => {
                        debug!(%id, error = %err, "ignoring undecodable frame");
                        continue;
                    }
                };
                handle_event(&shared, id, event).await;
            }
            Ok(None) => {
                info!(%id, "client disconnected");
                break;
            }
            Err(err) => {
                debug!(%id, error = %err, "connection error, closing");
                break;
            }
        }
    }

    drop(_guard); // roster cleanup before the writer stops
    writer.abort();
}

/// Removes the connection from the registry and its room on drop, so the
/// departure broadcasts go out no matter how the receive loop ended.
struct DisconnectGuard {
    id: ConnectionId,
    shared: Arc<SharedState>,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let id = self.id;
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let mut c = shared.coordinator().await;
            let batch = c.disconnect(id);
            c.deliver(batch);
        });
    }
}
