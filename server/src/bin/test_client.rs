//! Manual smoke-test client: joins the room, pops a few bubbles, moves
//! around, and prints everything the server sends back.

use bincode::{deserialize, serialize};
use shared::Packet;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout};

async fn send(socket: &UdpSocket, addr: SocketAddr, packet: &Packet) -> std::io::Result<()> {
    let data = serialize(packet).expect("packet serialization failed");
    socket.send_to(&data, addr).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Client socket bound to {}", socket.local_addr()?);

    let server_addr = "127.0.0.1:8080".parse::<SocketAddr>()?;

    println!("Connecting to {}", server_addr);
    send(
        &socket,
        server_addr,
        &Packet::Connect {
            color: 2,
            username: Some("smoke_test".to_string()),
        },
    )
    .await?;

    let mut buf = [0u8; 8192];

    // Wait for the join acknowledgement.
    let (len, _) = socket.recv_from(&mut buf).await?;
    match deserialize::<Packet>(&buf[0..len])? {
        Packet::Connected { player, players } => {
            println!(
                "Connected as {} ({}), {} players in room",
                player.id,
                player.username,
                players.len()
            );
        }
        Packet::Disconnected { reason } => {
            println!("Rejected: {}", reason);
            return Ok(());
        }
        other => println!("Unexpected first packet: {:?}", other),
    }

    // Pop a handful of bubbles and wander a bit.
    for index in [0u16, 1, 2, 2, 64, 129] {
        send(&socket, server_addr, &Packet::Pop { index }).await?;
        sleep(Duration::from_millis(50)).await;
    }
    send(
        &socket,
        server_addr,
        &Packet::Move { x: 320.0, y: 240.0 },
    )
    .await?;
    send(&socket, server_addr, &Packet::Time { time: 1 }).await?;

    // Print whatever comes back for a couple of seconds.
    loop {
        match timeout(Duration::from_secs(2), socket.recv_from(&mut buf)).await {
            Ok(Ok((len, _))) => match deserialize::<Packet>(&buf[0..len]) {
                Ok(Packet::Popped {
                    index,
                    player,
                    score,
                }) => {
                    println!("Bubble {} popped by {} for {} points", index, player, score);
                }
                Ok(Packet::RoundOver { players, .. }) => {
                    println!("Round over, {} players on scoreboard", players.len());
                }
                Ok(Packet::Sync { players, bubbles }) => {
                    let remaining = bubbles.iter().filter(|b| !b.popped).count();
                    println!(
                        "Sync: {} players, {} bubbles remaining",
                        players.len(),
                        remaining
                    );
                }
                Ok(other) => println!("Received: {:?}", other),
                Err(e) => println!("Bad packet: {}", e),
            },
            _ => break,
        }
    }

    send(&socket, server_addr, &Packet::Disconnect).await?;
    println!("Disconnected");

    Ok(())
}
