//! SNEP object exchange
//!
//! SNEP messages ride in LLCP I PDUs:
//!
//! ```text
//! ┌─────────┬──────┬────────────────┬───────────────────────────┐
//! │ VERSION │ CODE │ LENGTH (BE u32)│ INFORMATION (LENGTH bytes)│
//! │ 1B      │ 1B   │ 4B             │                           │
//! └─────────┴──────┴────────────────┴───────────────────────────┘
//! ```
//!
//! A GET request's information field starts with the 4-byte acceptable
//! response length.

pub mod error;
pub mod message;
pub mod session;

pub use error::SnepError;
pub use message::{MessageError, MessageHeader, Request, Response};
pub use session::{Poll, Served, Session};
