/**
 * HUB WEBSOCKET - Diffusion temps réel des snapshots
 *
 * RÔLE : Pousse chaque snapshot du moteur vers tous les clients `/ws`.
 *
 * FONCTIONNEMENT :
 * - Snapshot sérialisé une seule fois par tick, partagé via `Arc<String>`
 * - Canal tokio broadcast : fire-and-forget, un client en retard saute les
 *   frames manquées (pas de backpressure)
 * - À la connexion : un snapshot immédiat, puis chaque diffusion
 * - Messages entrants ignorés, fermeture = fin de session
 */

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use servmon_engine::{Monitor, Snapshot};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::http::AppState;
use crate::state::{new_state, Shared, SharedEngine};

pub type Payload = Arc<String>;

const DEFAULT_HUB_CAPACITY: usize = 16;

#[derive(Clone)]
pub struct BroadcastHub {
    tx: broadcast::Sender<Payload>,
    sessions: Shared<HashSet<Uuid>>,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, sessions: new_state(HashSet::new()) }
    }

    /// Sérialise puis diffuse ; retourne le nombre de récepteurs atteints
    pub fn publish(&self, snapshot: &Snapshot) -> usize {
        match serde_json::to_string(snapshot) {
            Ok(json) => self.tx.send(Arc::new(json)).unwrap_or(0),
            Err(e) => {
                warn!("[ws] snapshot non sérialisable: {e}");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Payload> {
        self.tx.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.sessions.lock().len()
    }

    fn register(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.lock().insert(id);
        id
    }

    fn unregister(&self, id: &Uuid) {
        self.sessions.lock().remove(id);
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_CAPACITY)
    }
}

// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(app): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| client_session(socket, app.engine, app.hub))
}

async fn client_session(socket: WebSocket, engine: SharedEngine, hub: BroadcastHub) {
    let session = hub.register();
    // abonnement avant le snapshot initial : aucune frame perdue entre les deux
    let mut rx = hub.subscribe();
    info!(%session, clients = hub.client_count(), "[ws] client connecté");

    let (mut sender, mut receiver) = socket.split();

    let initial = {
        let engine = engine.lock();
        serde_json::to_string(&engine.snapshot())
    };
    let opened = match initial {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!("[ws] snapshot initial non sérialisable: {e}");
            true
        }
    };

    if opened {
        loop {
            tokio::select! {
                frame = rx.recv() => match frame {
                    Ok(payload) => {
                        if let Err(e) = sender.send(Message::Text(payload.as_str().to_owned().into())).await {
                            warn!(%session, "[ws] envoi échoué: {e}");
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(%session, skipped, "[ws] client en retard");
                    }
                    Err(RecvError::Closed) => break,
                },
                inbound = receiver.next() => match inbound {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {} // entrants ignorés
                },
            }
        }
    }

    hub.unregister(&session);
    info!(%session, clients = hub.client_count(), "[ws] client déconnecté");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthTracker;
    use crate::http::build_router;
    use servmon_engine::{EngineConfig, SimulationEngine};
    use std::time::Duration;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::{sleep, timeout};
    use tokio_tungstenite::{connect_async, tungstenite, MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn next_snapshot(client: &mut Client) -> serde_json::Value {
        loop {
            let frame = timeout(Duration::from_secs(5), client.next())
                .await
                .expect("no frame within 5s")
                .expect("stream ended")
                .unwrap();
            if let tungstenite::Message::Text(text) = frame {
                return serde_json::from_str(text.as_str()).unwrap();
            }
        }
    }

    #[test]
    fn test_publish_without_clients() {
        let hub = BroadcastHub::default();
        let engine = SimulationEngine::with_seed(EngineConfig::server(), 1);

        assert_eq!(hub.publish(&engine.snapshot()), 0);
        assert_eq!(hub.client_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let hub = BroadcastHub::default();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();
        let engine = SimulationEngine::with_seed(EngineConfig::server(), 2);

        assert_eq!(hub.publish(&engine.snapshot()), 2);

        let a = first.recv().await.unwrap();
        let b = second.recv().await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let json: serde_json::Value = serde_json::from_str(&a).unwrap();
        assert_eq!(json["alerts"].as_array().unwrap().len(), 10);
        assert_eq!(json["logs"].as_array().unwrap().len(), 50);
        assert!(json["metrics"]["network"]["bytesIn"].is_number());
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_frames() {
        let hub = BroadcastHub::new(2);
        let mut rx = hub.subscribe();
        let engine = SimulationEngine::with_seed(EngineConfig::server(), 3);

        for _ in 0..5 {
            hub.publish(&engine.snapshot());
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(3))));
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_ws_session_lifecycle() {
        let engine = new_state(SimulationEngine::with_seed(EngineConfig::server(), 5));
        let hub = BroadcastHub::default();
        let app = AppState {
            engine: engine.clone(),
            hub: hub.clone(),
            health_tracker: HealthTracker::new(),
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(app)).await.unwrap();
        });

        let (mut client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();

        // snapshot immédiat, vue limitée du profil serveur
        let initial = next_snapshot(&mut client).await;
        assert_eq!(initial["alerts"].as_array().unwrap().len(), 10);
        assert_eq!(initial["logs"].as_array().unwrap().len(), 50);
        assert_eq!(hub.client_count(), 1);

        // un message entrant ne ferme pas la session
        client.send(tungstenite::Message::Text("hello".into())).await.unwrap();

        let snapshot = engine.lock().snapshot();
        assert_eq!(hub.publish(&snapshot), 1);
        let pushed = next_snapshot(&mut client).await;
        let expected = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(pushed["alerts"], expected["alerts"]);
        assert_eq!(pushed["logs"], expected["logs"]);

        client.close(None).await.unwrap();
        timeout(Duration::from_secs(5), async {
            while hub.client_count() > 0 {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("session still registered after close");
    }

    #[test]
    fn test_session_tracking() {
        let hub = BroadcastHub::default();
        let a = hub.register();
        let b = hub.register();
        assert_eq!(hub.client_count(), 2);

        hub.unregister(&a);
        assert_eq!(hub.client_count(), 1);
        hub.unregister(&b);
        assert_eq!(hub.client_count(), 0);
    }
}
