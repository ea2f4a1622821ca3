//! nfclink Hardware Abstraction Layer
//!
//! This crate defines the boundary between the LLCP/SNEP protocol stack and
//! the NFC front-end that actually moves frames over the air. The protocol
//! crate only ever talks to a [`Transport`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  nfclink-protocol (LLCP + SNEP)         │
//! └─────────────────────────────────────────┘
//!                     │  Transport
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  MacLink (this crate)                   │
//! └─────────────────────────────────────────┘
//!         │                       │
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ DepInitiator  │       │   DepTarget   │
//! │  (chip cmds)  │       │  (chip cmds)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`transport::Transport`] - Role activation and framed half-duplex I/O
//! - [`dep::DepDevice`] - Chip setup shared by both roles
//! - [`dep::DepInitiator`], [`dep::DepTarget`] - Chip commands for each radio role
//! - [`dep::Endpoint`] - Per-role activate/write/read capability

#![no_std]
#![deny(unsafe_code)]

pub mod dep;
pub mod transport;

// Re-export key types at crate root for convenience
pub use dep::{
    DepDevice, DepInitiator, DepTarget, Endpoint, InitiatorEndpoint, MacLink, TargetEndpoint,
};
pub use transport::{Activation, Role, Transport, NO_TIMEOUT};
