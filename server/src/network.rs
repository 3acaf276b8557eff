//! UDP transport harness around the room
//!
//! Owns the socket, the connection roster, and the single sequential loop
//! that feeds inbound packets to the room one at a time. Delivery of the
//! room's outbound decisions and the periodic full-state sync broadcast
//! also live here; the room itself never touches the network.

use crate::client_manager::ClientManager;
use crate::room::{Outbound, Room};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::Packet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ClientTimeout {
        client_id: u32,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Messages sent from the main loop to the network sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
        exclude: Option<u32>,
    },
}

/// Main server coordinating the transport and one game room
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    room: Room,
    sync_interval: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        sync_interval: Duration,
        max_clients: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients))),
            room: Room::new(),
            sync_interval,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    /// Spawns task that continuously listens for incoming packets
    async fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 8192];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes the outgoing packet queue
    async fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet, exclude } => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        for (client_id, addr) in client_addrs {
                            if Some(client_id) == exclude {
                                continue;
                            }

                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    async fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    async fn send_packet(&self, packet: &Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket {
            packet: packet.clone(),
            addr,
        }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    async fn broadcast_packet(&self, packet: &Packet, exclude: Option<u32>) {
        if let Err(e) = self.game_tx.send(GameMessage::BroadcastPacket {
            packet: packet.clone(),
            exclude,
        }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Queues the room's delivery decisions onto the sender task.
    async fn dispatch(&self, outbound: Vec<Outbound>) {
        for delivery in outbound {
            match delivery {
                Outbound::Unicast { client_id, packet } => {
                    let addr = {
                        let clients = self.clients.read().await;
                        clients.addr_of(client_id)
                    };

                    match addr {
                        Some(addr) => self.send_packet(&packet, addr).await,
                        None => warn!("Dropping unicast to unknown client {}", client_id),
                    }
                }
                Outbound::Broadcast { packet, exclude } => {
                    self.broadcast_packet(&packet, exclude).await;
                }
            }
        }
    }

    /// Processes one inbound packet through the connection roster and the
    /// room. Every mutation is committed before this function returns, so
    /// the next packet always observes the updated state.
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        let packet = match packet {
            Packet::Connect { color, username } => {
                self.handle_connect(addr, color, username).await;
                return;
            }
            packet => packet,
        };

        let client_id = {
            let clients = self.clients.read().await;
            clients.find_client_by_addr(addr)
        };

        let client_id = match client_id {
            Some(client_id) => client_id,
            None => {
                warn!("Dropping packet from unconnected address {}", addr);
                return;
            }
        };

        {
            let mut clients = self.clients.write().await;
            clients.touch(client_id);
        }

        match packet {
            Packet::Disconnect => {
                let mut clients = self.clients.write().await;
                clients.remove_client(&client_id);
                self.room.handle_leave(client_id);
            }
            packet => {
                let outbound = self.room.handle_message(client_id, packet);
                self.dispatch(outbound).await;
            }
        }
    }

    async fn handle_connect(&mut self, addr: SocketAddr, color: u8, username: Option<String>) {
        info!("Client connecting from {} with color {}", addr, color);

        // A reconnect from the same address replaces the old session.
        let existing_client_id = {
            let clients = self.clients.read().await;
            clients.find_client_by_addr(addr)
        };

        if let Some(existing_id) = existing_client_id {
            info!("Removing existing client {} from {}", existing_id, addr);
            let mut clients = self.clients.write().await;
            clients.remove_client(&existing_id);
            self.room.handle_leave(existing_id);
        }

        let client_id = {
            let mut clients = self.clients.write().await;
            clients.add_client(addr)
        };

        let client_id = match client_id {
            Some(client_id) => client_id,
            None => {
                let response = Packet::Disconnected {
                    reason: "Server full".to_string(),
                };
                self.send_packet(&response, addr).await;
                return;
            }
        };

        match self.room.handle_join(client_id, color, username) {
            Ok(outbound) => self.dispatch(outbound).await,
            Err(e) => {
                warn!("Rejected join for client {}: {}", client_id, e);
                let mut clients = self.clients.write().await;
                clients.remove_client(&client_id);
                self.send_packet(
                    &Packet::Disconnected {
                        reason: e.to_string(),
                    },
                    addr,
                )
                .await;
            }
        }
    }

    /// Broadcasts the committed full state so every client converges on
    /// the authoritative roster and grid.
    async fn broadcast_sync(&self) {
        let client_count = {
            let clients = self.clients.read().await;
            clients.len()
        };

        if client_count == 0 {
            return;
        }

        self.broadcast_packet(&self.room.sync_packet(), None).await;
        debug!("Synced state to {} clients", client_count);
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver().await;
        self.spawn_network_sender().await;
        self.spawn_timeout_checker().await;

        let mut sync_interval = interval(self.sync_interval);

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            info!("Client {} timed out", client_id);
                            self.room.handle_leave(client_id);
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = sync_interval.tick() => {
                    self.broadcast_sync().await;
                },
            }
        }

        Ok(())
    }
}
