//! LLCP PDU codec
//!
//! Every LLCP PDU starts with a two byte address/type header:
//!
//! ```text
//!  byte 0                  byte 1
//! ┌───────────────┬──────┐┌──────┬───────────────┐
//! │ DSAP (6 bits) │ PT:2 ││ PT:2 │ SSAP (6 bits) │
//! └───────────────┴──────┘└──────┴───────────────┘
//! ```
//!
//! I and RR PDUs carry a third sequence byte: N(S) in the high nibble,
//! N(R) in the low nibble.
//!
//! PAX and CONNECT PDUs carry TLV parameters after the header.

use heapless::Vec;

/// Largest frame the transport carries (255 minus framing overhead)
pub const MAX_FRAME_SIZE: usize = 253;

/// Length of the address/type header
pub const HEADER_LEN: usize = 2;

/// Length of the header of a sequenced (I, RR) PDU
pub const SEQUENCED_HEADER_LEN: usize = 3;

/// Mask for 6-bit service access points
pub const SAP_MASK: u8 = 0x3F;

/// Mask for 4-bit sequence counters
pub const SEQUENCE_MASK: u8 = 0x0F;

/// The SYMM PDU: no addresses, no payload
pub const SYMM_PDU: [u8; HEADER_LEN] = [0x00, 0x00];

/// TLV parameter types
pub mod param {
    /// LLCP version number
    pub const VERSION: u8 = 0x01;
    /// Maximum information unit extension
    pub const MIUX: u8 = 0x02;
    /// Well-known service list
    pub const WKS: u8 = 0x03;
    /// Link timeout
    pub const LTO: u8 = 0x04;
    /// Receive window size
    pub const RW: u8 = 0x05;
    /// Service name
    pub const SN: u8 = 0x06;
}

/// Maximum length of a TLV value (length is a single byte)
pub const MAX_TLV_VALUE: usize = u8::MAX as usize;

/// LLCP PDU types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PduType {
    /// Symmetry (keep-alive)
    Symm = 0x0,
    /// Parameter exchange
    Pax = 0x1,
    /// Connect
    Connect = 0x4,
    /// Disconnect
    Disc = 0x5,
    /// Connection complete
    Cc = 0x6,
    /// Disconnected mode
    Dm = 0x7,
    /// Information
    I = 0xC,
    /// Receive ready
    Rr = 0xD,
}

impl PduType {
    /// All defined PDU types
    pub const ALL: [PduType; 8] = [
        PduType::Symm,
        PduType::Pax,
        PduType::Connect,
        PduType::Disc,
        PduType::Cc,
        PduType::Dm,
        PduType::I,
        PduType::Rr,
    ];

    /// Get the 4-bit type value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a type from its 4-bit value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x0 => Some(PduType::Symm),
            0x1 => Some(PduType::Pax),
            0x4 => Some(PduType::Connect),
            0x5 => Some(PduType::Disc),
            0x6 => Some(PduType::Cc),
            0x7 => Some(PduType::Dm),
            0xC => Some(PduType::I),
            0xD => Some(PduType::Rr),
            _ => None,
        }
    }

    /// Check if PDUs of this type carry a sequence byte
    pub fn is_sequenced(self) -> bool {
        matches!(self, PduType::I | PduType::Rr)
    }
}

/// Encode the address/type header
///
/// `dsap` and `ssap` are truncated to 6 bits.
pub fn encode_header(dsap: u8, ssap: u8, ptype: PduType) -> [u8; HEADER_LEN] {
    let ptype = ptype.as_u8();
    [
        ((dsap & SAP_MASK) << 2) | (ptype >> 2),
        ((ptype & 0x3) << 6) | (ssap & SAP_MASK),
    ]
}

/// Extract the raw 4-bit PDU type
pub fn decode_type(byte0: u8, byte1: u8) -> u8 {
    ((byte0 & 0x3) << 2) | (byte1 >> 6)
}

/// Extract the destination service access point
pub fn decode_dsap(byte0: u8) -> u8 {
    byte0 >> 2
}

/// Extract the source service access point
pub fn decode_ssap(byte1: u8) -> u8 {
    byte1 & SAP_MASK
}

/// Build a sequence byte from N(S) and N(R)
pub fn sequence_byte(ns: u8, nr: u8) -> u8 {
    ((ns & SEQUENCE_MASK) << 4) | (nr & SEQUENCE_MASK)
}

/// Split a sequence byte into (N(S), N(R))
pub fn split_sequence(byte: u8) -> (u8, u8) {
    (byte >> 4, byte & SEQUENCE_MASK)
}

/// Decoded address/type header of a received frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Header {
    /// Destination service access point
    pub dsap: u8,
    /// Source service access point
    pub ssap: u8,
    /// Raw 4-bit type; may be a type this stack does not know
    pub ptype: u8,
}

impl Header {
    /// Decode the header of a frame
    ///
    /// Returns `None` if the frame is shorter than two bytes.
    pub fn parse(frame: &[u8]) -> Option<Self> {
        if frame.len() < HEADER_LEN {
            return None;
        }
        Some(Self {
            dsap: decode_dsap(frame[0]),
            ssap: decode_ssap(frame[1]),
            ptype: decode_type(frame[0], frame[1]),
        })
    }

    /// Known PDU type, if any
    pub fn pdu_type(&self) -> Option<PduType> {
        PduType::from_u8(self.ptype)
    }

    /// Check the header against a PDU type
    pub fn is(&self, ptype: PduType) -> bool {
        self.ptype == ptype.as_u8()
    }
}

/// Error from TLV encoding or decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TlvError {
    /// A TLV length runs past the end of the data
    Truncated,
    /// Value longer than a TLV can carry
    ValueTooLong,
    /// Output buffer full
    BufferFull,
}

/// One TLV parameter borrowed from a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv<'a> {
    /// Parameter type
    pub kind: u8,
    /// Parameter value
    pub value: &'a [u8],
}

/// Iterator over the TLV parameters of a PAX or CONNECT PDU
///
/// Yields `Err(TlvError::Truncated)` once and stops if a length runs past
/// the end of the data.
pub struct TlvIter<'a> {
    data: &'a [u8],
    failed: bool,
}

impl<'a> TlvIter<'a> {
    /// Iterate over the parameters in `data` (header already stripped)
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            failed: false,
        }
    }
}

impl<'a> Iterator for TlvIter<'a> {
    type Item = Result<Tlv<'a>, TlvError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.data.is_empty() {
            return None;
        }
        if self.data.len() < 2 {
            self.failed = true;
            return Some(Err(TlvError::Truncated));
        }

        let kind = self.data[0];
        let len = self.data[1] as usize;
        let end = 2 + len;
        if self.data.len() < end {
            self.failed = true;
            return Some(Err(TlvError::Truncated));
        }

        let value = &self.data[2..end];
        self.data = &self.data[end..];
        Some(Ok(Tlv { kind, value }))
    }
}

/// Append a TLV parameter to `out`
pub fn push_tlv<const N: usize>(
    out: &mut Vec<u8, N>,
    kind: u8,
    value: &[u8],
) -> Result<(), TlvError> {
    if value.len() > MAX_TLV_VALUE {
        return Err(TlvError::ValueTooLong);
    }
    out.push(kind).map_err(|_| TlvError::BufferFull)?;
    out.push(value.len() as u8).map_err(|_| TlvError::BufferFull)?;
    out.extend_from_slice(value).map_err(|_| TlvError::BufferFull)
}

/// Capacity of the PAX parameter block
pub const PAX_PARAMS_LEN: usize = 7;

/// Build the PAX parameters: version and well-known service list
pub fn pax_params(version: u8, well_known_services: u16) -> [u8; PAX_PARAMS_LEN] {
    let wks = well_known_services.to_be_bytes();
    [param::VERSION, 0x01, version, param::WKS, 0x02, wks[0], wks[1]]
}

/// Version found in a peer's PAX parameters
///
/// Returns `Ok(None)` if the peer did not send a version parameter.
pub fn pax_version(params: &[u8]) -> Result<Option<u8>, TlvError> {
    let mut version = None;
    for tlv in TlvIter::new(params) {
        let tlv = tlv?;
        if tlv.kind == param::VERSION {
            version = Some(*tlv.value.first().ok_or(TlvError::Truncated)?);
        }
    }
    Ok(version)
}
