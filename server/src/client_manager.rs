//! Client connection management for the room server
//!
//! Tracks which network addresses map to which participant ids, enforces
//! the room capacity limit, and sweeps out connections that have gone
//! silent. Game-level player records live in the room's game state; this
//! module only owns the transport-side bookkeeping.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Connections are dropped after this long without any inbound packet.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// One connected participant as the transport layer sees it.
#[derive(Debug)]
pub struct Client {
    /// Session id assigned at connect time, stable for the connection's
    /// lifetime.
    pub id: u32,
    /// Network address for unicast replies.
    pub addr: SocketAddr,
    /// Last time any packet arrived from this client.
    pub last_seen: Instant,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Roster of connected clients, capped at the room's capacity.
///
/// Ids start at 1 and increment per connection, so a reconnecting
/// participant always gets a fresh session id.
pub struct ClientManager {
    clients: HashMap<u32, Client>,
    next_client_id: u32,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Admits a new connection, or returns None when the room is full.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<u32> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, Client::new(client_id, addr));

        Some(client_id)
    }

    /// Drops a connection. Returns false if it was already gone.
    pub fn remove_client(&mut self, client_id: &u32) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!("Client {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<u32> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    pub fn addr_of(&self, client_id: u32) -> Option<SocketAddr> {
        self.clients.get(&client_id).map(|client| client.addr)
    }

    /// Refreshes the liveness timestamp after any inbound packet.
    pub fn touch(&mut self, client_id: u32) {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.last_seen = Instant::now();
        }
    }

    /// Removes and returns every client that has gone silent for longer
    /// than the timeout.
    pub fn check_timeouts(&mut self) -> Vec<u32> {
        let timed_out: Vec<u32> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(CLIENT_TIMEOUT))
            .map(|(id, _)| *id)
            .collect();

        for client_id in &timed_out {
            self.remove_client(client_id);
        }

        timed_out
    }

    /// (id, address) pairs for broadcast fan-out.
    pub fn get_client_addrs(&self) -> Vec<(u32, SocketAddr)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    #[test]
    fn test_add_client() {
        let mut manager = ClientManager::new(2);

        let client_id = manager.add_client(test_addr()).unwrap();
        assert_eq!(client_id, 1);
        assert_eq!(manager.len(), 1);
        assert!(!manager.is_empty());
    }

    #[test]
    fn test_ids_increment() {
        let mut manager = ClientManager::new(3);

        assert_eq!(manager.add_client(test_addr()), Some(1));
        assert_eq!(manager.add_client(test_addr2()), Some(2));
    }

    #[test]
    fn test_capacity_enforced() {
        let mut manager = ClientManager::new(1);

        assert!(manager.add_client(test_addr()).is_some());
        assert!(manager.add_client(test_addr2()).is_none());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_remove_client() {
        let mut manager = ClientManager::new(2);
        let client_id = manager.add_client(test_addr()).unwrap();

        assert!(manager.remove_client(&client_id));
        assert!(!manager.remove_client(&client_id));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_find_client_by_addr() {
        let mut manager = ClientManager::new(2);
        let client_id = manager.add_client(test_addr()).unwrap();

        assert_eq!(manager.find_client_by_addr(test_addr()), Some(client_id));
        assert_eq!(manager.find_client_by_addr(test_addr2()), None);
    }

    #[test]
    fn test_addr_of() {
        let mut manager = ClientManager::new(2);
        let client_id = manager.add_client(test_addr()).unwrap();

        assert_eq!(manager.addr_of(client_id), Some(test_addr()));
        assert_eq!(manager.addr_of(999), None);
    }

    #[test]
    fn test_timeout_sweep() {
        let mut manager = ClientManager::new(2);
        let client_id = manager.add_client(test_addr()).unwrap();

        assert!(manager.check_timeouts().is_empty());

        manager.clients.get_mut(&client_id).unwrap().last_seen =
            Instant::now() - Duration::from_secs(10);

        assert_eq!(manager.check_timeouts(), vec![client_id]);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_touch_refreshes_liveness() {
        let mut manager = ClientManager::new(2);
        let client_id = manager.add_client(test_addr()).unwrap();

        manager.clients.get_mut(&client_id).unwrap().last_seen =
            Instant::now() - Duration::from_secs(10);
        manager.touch(client_id);

        assert!(manager.check_timeouts().is_empty());
    }
}
