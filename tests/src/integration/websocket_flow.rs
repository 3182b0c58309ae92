//! # WebSocket Flows
//!
//! The channel manager against a real loopback WebSocket server:
//!
//! 1. **Delivery**: text and binary envelopes reach subscribers in order
//! 2. **Gap detection**: skipped sequence numbers signal observers
//! 3. **Lifecycle**: server close, `close_all`, reconnection

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use parking_lot::Mutex;
    use shared_types::{Channel, ConnectionState, GapSignal};
    use stream_client::{
        decode_tick, ChannelConnectionManager, ExponentialBackoff, StreamConfig, WsTransport,
        DEFAULT_EVENT_CAPACITY,
    };
    use tokio_tungstenite::tungstenite::Message;

    use crate::support::{accept, eventually, spawn_server, tick, wait_for_state, WAIT};

    async fn send(ws: &mut tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>, text: String) {
        ws.send(Message::text(text)).await.unwrap();
    }

    #[tokio::test]
    async fn test_envelopes_dispatched_in_order() {
        let (base, mut server) = spawn_server().await;
        let manager = ChannelConnectionManager::websocket();
        let prices = Arc::new(Mutex::new(Vec::new()));
        let sink = prices.clone();
        manager.subscribe(Channel::Market, move |env| sink.lock().push(decode_tick(env).price));

        let mut events = manager.state_events();
        manager
            .connect(Channel::Market, format!("{base}/market"))
            .unwrap();
        let mut conn = accept(&mut server).await;
        assert_eq!(conn.path, "/stream/market");
        wait_for_state(&mut events, Channel::Market, ConnectionState::Open).await;

        send(&mut conn.ws, tick(1, "ES", 1.0).to_wire().unwrap()).await;
        conn.ws
            .send(Message::binary(tick(2, "ES", 2.0).to_wire().unwrap().into_bytes()))
            .await
            .unwrap();
        send(&mut conn.ws, "{not json".to_string()).await;
        conn.ws.send(Message::Ping(Vec::new().into())).await.unwrap();
        send(&mut conn.ws, tick(3, "ES", 3.0).to_wire().unwrap()).await;

        eventually(|| prices.lock().len() == 3).await;
        assert_eq!(*prices.lock(), vec![1.0, 2.0, 3.0]);
        assert_eq!(manager.last_accepted(Channel::Market), Some(3));
    }

    #[tokio::test]
    async fn test_gap_signal_over_websocket() {
        let (base, mut server) = spawn_server().await;
        let manager = ChannelConnectionManager::websocket();
        let gaps = Arc::new(Mutex::new(Vec::new()));
        let sink = gaps.clone();
        manager.on_gap_detected(move |gap| sink.lock().push(*gap));

        let mut events = manager.state_events();
        manager
            .connect(Channel::Market, format!("{base}/market"))
            .unwrap();
        let mut conn = accept(&mut server).await;
        wait_for_state(&mut events, Channel::Market, ConnectionState::Open).await;

        send(&mut conn.ws, tick(1, "NQ", 1.0).to_wire().unwrap()).await;
        send(&mut conn.ws, tick(3, "NQ", 1.0).to_wire().unwrap()).await;

        eventually(|| !gaps.lock().is_empty()).await;
        assert_eq!(*gaps.lock(), vec![GapSignal::new(Channel::Market, 2, 3)]);
    }

    #[tokio::test]
    async fn test_server_close_marks_channel_closed() {
        let (base, mut server) = spawn_server().await;
        let manager = ChannelConnectionManager::websocket();
        let mut events = manager.state_events();
        manager
            .connect(Channel::Orders, format!("{base}/orders"))
            .unwrap();
        let mut conn = accept(&mut server).await;
        wait_for_state(&mut events, Channel::Orders, ConnectionState::Open).await;

        conn.ws.close(None).await.unwrap();
        wait_for_state(&mut events, Channel::Orders, ConnectionState::Closed).await;
        assert_eq!(manager.state(Channel::Orders), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_close_all_disconnects() {
        let (base, mut server) = spawn_server().await;
        let manager = ChannelConnectionManager::websocket();
        let mut events = manager.state_events();
        manager
            .connect(Channel::System, format!("{base}/system"))
            .unwrap();
        let mut conn = accept(&mut server).await;
        wait_for_state(&mut events, Channel::System, ConnectionState::Open).await;

        manager.close_all();
        assert_eq!(manager.state(Channel::System), ConnectionState::Idle);

        // The aborted client drops its socket; the server sees the stream end.
        let ended = tokio::time::timeout(WAIT, async {
            loop {
                match conn.ws.next().await {
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return,
                    Some(Ok(_)) => {}
                }
            }
        })
        .await;
        assert!(ended.is_ok());
    }

    #[tokio::test]
    async fn test_reconnect_resumes_sequence() {
        let (base, mut server) = spawn_server().await;
        let policy = ExponentialBackoff::new(Duration::from_millis(10), Duration::from_millis(50), 5);
        let manager = ChannelConnectionManager::with_options(
            Arc::new(WsTransport::new()),
            Arc::new(policy),
            DEFAULT_EVENT_CAPACITY,
        );
        let gaps = Arc::new(Mutex::new(0usize));
        let sink = gaps.clone();
        manager.on_gap_detected(move |_| *sink.lock() += 1);

        let mut events = manager.state_events();
        let id = manager
            .connect(Channel::Market, format!("{base}/market"))
            .unwrap();

        let mut first = accept(&mut server).await;
        wait_for_state(&mut events, Channel::Market, ConnectionState::Open).await;
        send(&mut first.ws, tick(41, "ES", 1.0).to_wire().unwrap()).await;
        eventually(|| manager.last_accepted(Channel::Market) == Some(41)).await;
        first.ws.close(None).await.unwrap();

        wait_for_state(&mut events, Channel::Market, ConnectionState::Closed).await;
        let mut second = accept(&mut server).await;
        let reopened = wait_for_state(&mut events, Channel::Market, ConnectionState::Open).await;
        assert_eq!(reopened.connection_id, id);

        send(&mut second.ws, tick(42, "ES", 1.0).to_wire().unwrap()).await;
        eventually(|| manager.last_accepted(Channel::Market) == Some(42)).await;
        assert_eq!(*gaps.lock(), 0);
    }

    #[tokio::test]
    async fn test_configured_channels_use_their_own_paths() {
        let (base, mut server) = spawn_server().await;
        let config = StreamConfig {
            base_url: base,
            channels: vec![Channel::Market, Channel::Orders],
            ..StreamConfig::default()
        };
        let manager = ChannelConnectionManager::from_config(&config).unwrap();
        for &channel in &config.channels {
            manager.connect(channel, config.address_for(channel)).unwrap();
        }

        let mut paths = vec![accept(&mut server).await.path, accept(&mut server).await.path];
        paths.sort();
        assert_eq!(paths, vec!["/stream/market", "/stream/orders"]);
    }
}
