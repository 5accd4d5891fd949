use std::net::TcpStream;

use tokio::sync::mpsc;
use tungstenite::protocol::Message;

use super::{Clients, WsActor};
use crate::actor::messages::CoordinatorMsg;
use crate::protocol::{ClientMessage, HostMessage};
use crate::resolver::VendorRegistry;

impl WsActor {
    /// Add a new client connection
    pub(super) fn add_client(&self, stream: TcpStream) {
        // Keep blocking mode during handshake, switch to non-blocking after
        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                if let Err(e) = ws.send(Message::Text(HostMessage::connected().to_json().into())) {
                    crate::log!("ws"; "failed to send connected message: {}", e);
                    return;
                }

                // Late joiners see the current status right away
                if let Some(ref status) = *self.last_status.lock()
                    && let Err(e) = ws.send(Message::Text(status.to_json().into()))
                {
                    crate::log!("ws"; "failed to send status: {}", e);
                }

                let _ = ws.get_ref().set_nonblocking(true);

                let mut clients = self.clients.lock();
                crate::debug!("ws"; "client connected (total: {})", clients.len() + 1);
                clients.push(ws);
            }
            Err(e) => {
                crate::log!("ws"; "handshake failed: {}", e);
            }
        }
    }

    /// Background thread to read client messages (non-blocking poll)
    pub(super) fn client_reader_loop(
        clients: Clients,
        coordinator_tx: mpsc::Sender<CoordinatorMsg>,
        vendors: VendorRegistry,
    ) {
        loop {
            std::thread::sleep(std::time::Duration::from_millis(100));
            if coordinator_tx.is_closed() {
                return;
            }

            let mut received = Vec::new();
            {
                let mut clients_guard = clients.lock();
                clients_guard.retain_mut(|ws| loop {
                    match ws.read() {
                        Ok(Message::Text(text)) => received.push(text.as_str().to_owned()),
                        Ok(Message::Close(_)) => return false,
                        Ok(_) => {}
                        Err(tungstenite::Error::Io(ref e))
                            if e.kind() == std::io::ErrorKind::WouldBlock =>
                        {
                            return true;
                        }
                        Err(_) => return false,
                    }
                });
            }

            // Forward outside the lock so broadcasts are not held up
            for text in received {
                let Some(msg) = ClientMessage::from_json(&text) else {
                    crate::debug!("ws"; "ignoring client message: {}", text);
                    continue;
                };
                if let Some(msg) = Self::apply_client_message(msg, &vendors)
                    && coordinator_tx.blocking_send(msg).is_err()
                {
                    return;
                }
            }
        }
    }

    /// Vendor updates land in the registry; everything else goes to the workspace.
    fn apply_client_message(msg: ClientMessage, vendors: &VendorRegistry) -> Option<CoordinatorMsg> {
        Some(match msg {
            ClientMessage::Edit { content } => CoordinatorMsg::Edit { content },
            ClientMessage::Select { index } => CoordinatorMsg::Select(index),
            ClientMessage::Cursor { pos, selection } => CoordinatorMsg::Cursor { pos, selection },
            ClientMessage::Move { index, direction } => CoordinatorMsg::Move { index, direction },
            ClientMessage::Details { show } => CoordinatorMsg::Details(show),
            ClientMessage::Vendor { name, value } => {
                // `null` keeps the name known but without a value.
                crate::debug!("ws"; "vendor registered: {} (value: {})", name, value.is_some());
                vendors.register(name, value);
                return None;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::resolver::{Binding, ModuleResolver};

    #[test]
    fn test_vendor_message_updates_registry() {
        let vendors = VendorRegistry::new();
        let msg = ClientMessage::Vendor {
            name: "Maps".into(),
            value: Some(json!({"a": 1})),
        };
        assert!(WsActor::apply_client_message(msg, &vendors).is_none());
        assert_eq!(vendors.len(), 1);

        let clear = ClientMessage::Vendor {
            name: "Maps".into(),
            value: None,
        };
        assert!(WsActor::apply_client_message(clear, &vendors).is_none());
        assert_eq!(vendors.len(), 1);
        let resolver = ModuleResolver::new("", vendors.clone());
        assert_eq!(resolver.resolve("Maps"), Binding::Empty);
    }

    #[test]
    fn test_commands_forwarded() {
        let vendors = VendorRegistry::new();
        let msg = WsActor::apply_client_message(ClientMessage::Details { show: true }, &vendors);
        assert!(matches!(msg, Some(CoordinatorMsg::Details(true))));
        let msg = WsActor::apply_client_message(
            ClientMessage::Edit {
                content: "x".into(),
            },
            &vendors,
        );
        assert!(matches!(msg, Some(CoordinatorMsg::Edit { content }) if content == "x"));
    }
}
