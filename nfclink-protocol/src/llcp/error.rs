//! LLCP error type

use crate::pdu::PduType;

/// Errors raised by LLCP operations
///
/// `E` is the transport's error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LlcpError<E> {
    /// The transport failed
    Transport(E),
    /// Received a frame too short for the expected PDU
    ShortFrame(usize),
    /// Received a PDU other than the awaited one or SYMM
    UnexpectedPdu {
        /// PDU type the operation was waiting for
        expected: PduType,
        /// Raw 4-bit type actually received
        received: u8,
    },
    /// PAX parameters could not be parsed
    MalformedParameters,
    /// Peer runs an incompatible LLCP version
    VersionMismatch {
        /// Version we advertise
        local: u8,
        /// Version the peer advertised
        remote: u8,
    },
    /// Caller header does not fit the header buffer
    HeaderOverflow,
    /// Information field larger than the MIU
    ExceedsMiu,
    /// Frame larger than the transport can carry
    FrameTooLarge,
    /// Operation requires an activated link
    NotActivated,
    /// Operation requires an established connection
    NotConnected,
}

impl<E> From<E> for LlcpError<E> {
    fn from(e: E) -> Self {
        LlcpError::Transport(e)
    }
}

impl<E> LlcpError<E> {
    /// Check if the error came from the transport
    pub fn is_transport(&self) -> bool {
        matches!(self, LlcpError::Transport(_))
    }
}
