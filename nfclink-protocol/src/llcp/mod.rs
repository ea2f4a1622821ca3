//! LLCP link layer
//!
//! One [`Connection`] drives a single logical link over a [`Transport`]:
//!
//! ```text
//! Idle ──activate──▶ Activated ──connect / wait_for_connection──▶ Connected
//!   ▲                                                                 │
//!   └──────────── disconnect / wait_for_disconnection / error ────────┘
//! ```
//!
//! SYMM PDUs are keep-alives and are answered transparently in every wait
//! loop. Any other unexpected PDU ends the current operation with an error
//! and drops the connection back to `Idle`.
//!
//! [`Transport`]: nfclink_hal::Transport

pub mod connection;
pub mod error;
mod handshake;

pub use connection::{Connection, LinkState, Mode, HEADER_BUF_SIZE};
pub use error::LlcpError;
