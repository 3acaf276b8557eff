//! # Bubble-Pop Game Server Library
//!
//! Authoritative server for the "pop the matching bubble" multiplayer
//! mini-game: a shared 13x10 grid of colored bubbles and a roster of
//! connected players competing to pop bubbles for points until the grid
//! is exhausted and reshuffled.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! The server owns the definitive roster and grid. Every pop, move and
//! join is recomputed here; clients only render what the server commits
//! and broadcasts. There is no client-side authority of any kind.
//!
//! ### Sequential Message Processing
//! The room processes messages one at a time, in arrival order. A pop's
//! read-check-mutate-broadcast sequence, including the round-completion
//! check and grid reset that may follow it, runs to completion before the
//! next message is looked at, which makes every mutation atomic without
//! locks inside the engine.
//!
//! ### State Broadcasting
//! Game events (pops, round resets, forced finishes) are broadcast as
//! they happen; a periodic full-state sync keeps every client converged
//! on the committed roster and grid regardless of lost packets.
//!
//! ## Module Organization
//!
//! ### Color Module (`color`)
//! The probabilistic bubble color selector (~10% rare color, ~15% each of
//! the six selectable colors) and guest-name synthesis. All randomness is
//! injected so tests run on seeded generators.
//!
//! ### Game Module (`game`)
//! The game state proper: player roster, the fixed 130-slot bubble grid,
//! the scoring rule applied on pops, round completion and grid resets.
//! Every mutation is guarded; a bad message is rejected, never a crash.
//!
//! ### Room Module (`room`)
//! The session controller. Translates inbound protocol messages into game
//! state operations and decides what gets sent to whom. Transport-agnostic
//! by construction: handlers return delivery decisions, they do not send.
//!
//! ### Client Manager Module (`client_manager`)
//! Transport-side connection bookkeeping: address-to-session mapping,
//! capacity limits, liveness timeouts.
//!
//! ### Network Module (`network`)
//! The UDP harness. Receiver, sender and timeout tasks around one
//! sequential event loop that drives the room and performs its delivery
//! decisions.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // One room, at most 6 players, full-state sync every 100ms
//!     let mut server = Server::new(
//!         "127.0.0.1:8080",
//!         Duration::from_millis(100),
//!         6,
//!     ).await?;
//!
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod color;
pub mod game;
pub mod network;
pub mod room;
