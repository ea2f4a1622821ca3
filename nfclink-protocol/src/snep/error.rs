//! SNEP error type

use super::message::MessageError;
use crate::llcp::LlcpError;

/// Errors raised by SNEP session operations
///
/// `E` is the transport's error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SnepError<E> {
    /// The link layer failed
    Llcp(LlcpError<E>),
    /// No peer showed up during a required activation
    ActivationTimedOut,
    /// Message shorter than its header
    ShortMessage(usize),
    /// Peer speaks another SNEP version
    VersionMismatch(u8),
    /// Request code this operation does not handle
    UnexpectedRequest(u8),
    /// Response code other than the one expected
    UnexpectedResponse(u8),
    /// Declared length larger than the bytes received
    LengthExceedsReceived {
        /// Length field of the header
        declared: u32,
        /// Bytes received after the header
        received: usize,
    },
    /// Caller buffer cannot hold the payload
    BufferTooSmall {
        /// Bytes that had to be stored
        needed: usize,
        /// Capacity offered by the caller
        available: usize,
    },
    /// Response would exceed the requester's acceptable length
    ExcessData {
        /// Length of the response
        requested: usize,
        /// Acceptable length announced by the requester
        acceptable: u32,
    },
}

impl<E> From<LlcpError<E>> for SnepError<E> {
    fn from(e: LlcpError<E>) -> Self {
        SnepError::Llcp(e)
    }
}

impl<E> From<MessageError> for SnepError<E> {
    fn from(e: MessageError) -> Self {
        match e {
            MessageError::Short(len) => SnepError::ShortMessage(len),
            MessageError::Version(version) => SnepError::VersionMismatch(version),
            MessageError::LengthExceedsReceived { declared, received } => {
                SnepError::LengthExceedsReceived { declared, received }
            }
        }
    }
}
