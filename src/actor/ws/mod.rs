//! WebSocket Actor - Bidirectional Host Link
//!
//! This actor is responsible for:
//! - Managing WebSocket client connections
//! - Broadcasting `codechange`/`status` posts to all connected clients
//! - Receiving client commands (edit, select, cursor, move, details, vendor)
//!
//! # Architecture
//!
//! ```text
//! WorkspaceActor --[Post]--> WsActor --[broadcast]--> Clients
//!       ^                                                 |
//!       +---------------[ClientMessage]-------------------+
//! ```

mod client_io;
pub mod server;

use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::messages::{CoordinatorMsg, HostMsg};
use crate::protocol::HostMessage;
use crate::resolver::VendorRegistry;

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    /// Channel to receive messages
    rx: mpsc::Receiver<HostMsg>,
    /// Client commands are forwarded here
    coordinator_tx: mpsc::Sender<CoordinatorMsg>,
    /// Vendor bindings updated directly by clients
    vendors: VendorRegistry,
    /// Connected clients (shared for broadcast + read threads)
    clients: Clients,
    /// Last status post, replayed to new clients
    last_status: Arc<Mutex<Option<HostMessage>>>,
}

impl WsActor {
    pub fn new(
        rx: mpsc::Receiver<HostMsg>,
        coordinator_tx: mpsc::Sender<CoordinatorMsg>,
        vendors: VendorRegistry,
    ) -> Self {
        Self {
            rx,
            coordinator_tx,
            vendors,
            clients: Arc::new(Mutex::new(Vec::new())),
            last_status: Arc::new(Mutex::new(None)),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let clients = Arc::clone(&self.clients);
        let coordinator_tx = self.coordinator_tx.clone();
        let vendors = self.vendors.clone();
        std::thread::spawn(move || {
            Self::client_reader_loop(clients, coordinator_tx, vendors);
        });

        while let Some(msg) = self.rx.recv().await {
            match msg {
                HostMsg::Post(post) => {
                    if matches!(post, HostMessage::Status { .. }) {
                        *self.last_status.lock() = Some(post.clone());
                    }
                    self.broadcast(Message::Text(post.to_json().into()));
                }

                HostMsg::AddClient(stream) => {
                    self.add_client(stream);
                }

                HostMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down");
                    let mut clients = self.clients.lock();
                    for mut ws in clients.drain(..) {
                        let _ = ws.close(None);
                    }
                    break;
                }
            }
        }
    }

    /// Broadcast a message to all connected clients
    fn broadcast(&self, msg: Message) {
        let mut clients = self.clients.lock();
        let count = clients.len();

        if count == 0 {
            crate::debug!("ws"; "no clients connected");
            return;
        }

        clients.retain_mut(|ws| match ws.send(msg.clone()) {
            Ok(_) => true,
            Err(e) => {
                crate::debug!("ws"; "client disconnected: {}", e);
                false
            }
        });
        crate::debug!("ws"; "broadcast to {} clients", count);
    }
}
