//! Realtime socket to the pub/sub fabric.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;

use super::ClientError;
use crate::objects::realtime::WEBPUBSUB_SUBPROTOCOL;
use crate::session::{
    BackendError, ChannelSignal, RealtimeConnection, RealtimeConnector, SignalKind, SignalSender,
};

/// Opens `tokio-tungstenite` connections to negotiated fabric URLs.
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

/// A live socket. Closing or dropping it stops the reader task.
#[derive(Debug)]
pub struct WsConnection {
    shutdown: Option<oneshot::Sender<()>>,
}

impl RealtimeConnection for WsConnection {
    fn close(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl WsConnector {
    async fn open(
        &self,
        url: &str,
        generation: u64,
        signals: SignalSender,
    ) -> Result<WsConnection, ClientError> {
        let mut request = url.into_client_request()?;
        request.headers_mut().insert(
            SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(WEBPUBSUB_SUBPROTOCOL),
        );
        let (stream, _) = tokio_tungstenite::connect_async(request).await?;
        let (mut write, mut read) = stream.split();
        let (shutdown, mut shutdown_rx) = oneshot::channel::<()>();

        let _ = signals.send(ChannelSignal::new(generation, SignalKind::Opened));

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    // an explicit close and a dropped handle both end up here
                    _ = &mut shutdown_rx => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                    frame = read.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            let signal = ChannelSignal::new(generation, SignalKind::Message(text));
                            if signals.send(signal).is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            let _ = signals.send(ChannelSignal::new(generation, SignalKind::Closed));
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, generation, "realtime socket failed");
                            let _ = signals.send(ChannelSignal::new(generation, SignalKind::Closed));
                            break;
                        }
                    }
                }
            }
            tracing::debug!(generation, "realtime reader stopped");
        });

        Ok(WsConnection {
            shutdown: Some(shutdown),
        })
    }
}

#[async_trait]
impl RealtimeConnector for WsConnector {
    type Connection = WsConnection;

    async fn connect(
        &self,
        url: &str,
        generation: u64,
        signals: SignalSender,
    ) -> Result<WsConnection, BackendError> {
        Ok(self.open(url, generation, signals).await?)
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    use super::*;

    /// Accept one socket, check the subprotocol, and hand the stream back.
    async fn fabric() -> (
        String,
        tokio::task::JoinHandle<
            tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
        >,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            tokio_tungstenite::accept_hdr_async(tcp, |req: &Request, mut resp: Response| -> Result<Response, ErrorResponse> {
                let requested = req.headers().get(SEC_WEBSOCKET_PROTOCOL).cloned();
                assert_eq!(
                    requested,
                    Some(HeaderValue::from_static(WEBPUBSUB_SUBPROTOCOL))
                );
                resp.headers_mut().insert(
                    SEC_WEBSOCKET_PROTOCOL,
                    HeaderValue::from_static(WEBPUBSUB_SUBPROTOCOL),
                );
                Ok(resp)
            })
            .await
            .unwrap()
        });
        (
            format!("ws://{addr}/client/hubs/quiz?access_token=t"),
            handle,
        )
    }

    #[tokio::test]
    async fn test_frames_and_close_are_signalled() {
        let (url, server) = fabric().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _conn = WsConnector.connect(&url, 7, tx).await.unwrap();

        let mut ws = server.await.unwrap();
        ws.send(Message::Text(r#"{"data":{"type":"quiz_processed"}}"#.into()))
            .await
            .unwrap();
        ws.close(None).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), ChannelSignal::new(7, SignalKind::Opened));
        assert_eq!(
            rx.recv().await.unwrap(),
            ChannelSignal::new(
                7,
                SignalKind::Message(r#"{"data":{"type":"quiz_processed"}}"#.into())
            )
        );
        assert_eq!(rx.recv().await.unwrap(), ChannelSignal::new(7, SignalKind::Closed));
    }

    #[tokio::test]
    async fn test_close_sends_close_frame() {
        let (url, server) = fabric().await;
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut conn = WsConnector.connect(&url, 1, tx).await.unwrap();
        let mut ws = server.await.unwrap();

        conn.close();
        let frame = ws.next().await;
        assert!(matches!(frame, Some(Ok(Message::Close(_))) | None));
    }

    #[tokio::test]
    async fn test_refused_connection_is_unreachable() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let err = WsConnector
            .connect("ws://127.0.0.1:1/client/hubs/quiz", 1, tx)
            .await
            .unwrap_err();
        assert_eq!(err.alert_message(), "Unable to connect to server");
    }
}
