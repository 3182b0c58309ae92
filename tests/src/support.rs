//! Shared fixtures for integration tests.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;
use shared_types::{Channel, ConnectionEvent, ConnectionState, Envelope, RawEnvelope};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::WebSocketStream;

/// Upper bound for any wait in the suite.
pub const WAIT: Duration = Duration::from_secs(5);

/// A server-side socket and the request path the client connected to.
pub struct Accepted {
    pub path: String,
    pub ws: WebSocketStream<TcpStream>,
}

/// Start a loopback WebSocket server. Returns its base URL
/// (`ws://127.0.0.1:<port>/stream`) and the stream of accepted sockets.
pub async fn spawn_server() -> (String, mpsc::UnboundedReceiver<Accepted>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let path = Arc::new(Mutex::new(String::new()));
            let seen = path.clone();
            let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                *seen.lock() = req.uri().path().to_string();
                Ok(resp)
            };
            if let Ok(ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await {
                let path = path.lock().clone();
                if tx.send(Accepted { path, ws }).is_err() {
                    break;
                }
            }
        }
    });

    (format!("ws://{addr}/stream"), rx)
}

/// Next accepted socket, failing the test after [`WAIT`].
pub async fn accept(rx: &mut mpsc::UnboundedReceiver<Accepted>) -> Accepted {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("no connection accepted")
        .expect("server stopped")
}

/// Wait until `channel` reports `state`.
pub async fn wait_for_state(
    events: &mut broadcast::Receiver<ConnectionEvent>,
    channel: Channel,
    state: ConnectionState,
) -> ConnectionEvent {
    tokio::time::timeout(WAIT, async {
        loop {
            let event = events.recv().await.unwrap();
            if event.channel == channel && event.state == state {
                return event;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("{channel} never became {state}"))
}

/// Poll `condition` until it holds.
pub async fn eventually(condition: impl Fn() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

/// A `tick` envelope on the market channel.
pub fn tick(sequence: u64, symbol: &str, price: f64) -> RawEnvelope {
    Envelope::new(
        "tick",
        Channel::Market,
        sequence,
        json!({"symbol": symbol, "price": price}),
    )
}
