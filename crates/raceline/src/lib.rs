//! Raceline — real-time session coordination for multiplayer racing.
//!
//! The server groups WebSocket connections into code-keyed rooms, keeps
//! each room's roster consistent under concurrent joins and disconnects,
//! drives the race-start countdown, and relays per-tick position updates
//! between room members.
//!
//! Layering (each crate only knows the ones below it):
//!
//! ```text
//! raceline            server loop, coordinator, HTTP surface
//! raceline-room       rooms, roster, directory, registry
//! raceline-countdown  countdown timing
//! raceline-protocol   events, wire codec
//! raceline-transport  websocket framing, connection ids
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use raceline::RacelineServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), raceline::RacelineError> {
//!     RacelineServer::builder()
//!         .bind("0.0.0.0:3000")
//!         .http_bind("0.0.0.0:3001")
//!         .build()
//!         .await?
//!         .run()
//!         .await
//! }
//! ```

mod config;
mod coordinator;
mod error;
mod handler;
mod http;
mod server;

pub use config::ServerConfig;
pub use coordinator::{
    handle_event, now_ms, Coordinator, Outbound, SharedState,
};
pub use error::RacelineError;
pub use server::{RacelineServer, RacelineServerBuilder};
