//! NFC peer-to-peer protocol stack
//!
//! This crate implements the two protocol layers that run on top of an
//! NFC-DEP link:
//!
//! - **LLCP** (Logical Link Control Protocol): addressed, sequenced and
//!   acknowledged delivery of PDUs over a single logical connection.
//! - **SNEP** (Simple NDEF Exchange Protocol): put and get of opaque byte
//!   payloads between a client and a server, carried in LLCP I PDUs.
//!
//! # Layering
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ snep::Session   [ver][code][len:4][payload]  │
//! ├──────────────────────────────────────────────┤
//! │ llcp::Connection  [dsap|ptype|ssap][N(S)N(R)]│
//! ├──────────────────────────────────────────────┤
//! │ nfclink_hal::Transport (half-duplex frames)  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Everything is blocking and single-threaded. Working buffers are fixed-size
//! fields of the connection and session; nothing is allocated.

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod llcp;
pub mod pdu;
pub mod snep;

#[cfg(test)]
mod mock;

pub use config::{ConfigError, LinkConfig, LlcpConfig, SnepConfig};
pub use llcp::{Connection, LinkState, LlcpError, Mode};
pub use pdu::{PduType, MAX_FRAME_SIZE};
pub use snep::{Poll, Served, Session, SnepError};

pub use nfclink_hal::{Activation, Role, Transport};
