//! WebSocket listener.
//!
//! Accepts TCP connections on a background thread and hands the raw
//! streams to [`WsActor`](super::WsActor) for the handshake.

use std::net::{IpAddr, TcpListener};

use anyhow::Result;
use tokio::sync::mpsc;

use crate::actor::messages::HostMsg;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Bind near `base_port` and start the acceptor thread. Returns the bound port.
pub fn start(interface: IpAddr, base_port: u16, host_tx: mpsc::Sender<HostMsg>) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    std::thread::spawn(move || {
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("ws"; "client connected: {}", addr);

                    // Set blocking for the handshake
                    let _ = stream.set_nonblocking(false);

                    if host_tx.blocking_send(HostMsg::AddClient(stream)).is_err() {
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if host_tx.is_closed() {
                        break;
                    }
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
                Err(e) => {
                    crate::log!("ws"; "accept error: {}", e);
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
        }
    });

    Ok(actual_port)
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind((interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn test_busy_port_moves_on() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();
        match try_bind_port(IpAddr::V4(Ipv4Addr::LOCALHOST), port, 3) {
            Ok((_, actual)) => assert_ne!(actual, port),
            // Neighbors may be busy too on a crowded host
            Err(e) => assert!(e.to_string().contains("after 3 attempts")),
        }
    }

    #[tokio::test]
    async fn test_start_forwards_streams() {
        let (tx, mut rx) = mpsc::channel(4);
        let port = start(IpAddr::V4(Ipv4Addr::LOCALHOST), 0, tx).unwrap();
        assert_ne!(port, 0);

        let _client = std::net::TcpStream::connect(("127.0.0.1", port)).unwrap();
        let msg = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert!(matches!(msg, Some(HostMsg::AddClient(_))));
    }
}
