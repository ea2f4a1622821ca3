//! SNEP message header encoding and validation

/// Length of the common message header
pub const HEADER_LEN: usize = 6;

/// Length of a GET request header (common header + acceptable length)
pub const GET_HEADER_LEN: usize = HEADER_LEN + 4;

/// Request codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Request {
    /// Send remaining fragments
    Continue = 0x00,
    /// Retrieve an object
    Get = 0x01,
    /// Store an object
    Put = 0x02,
    /// Do not send remaining fragments
    Reject = 0x7F,
}

impl Request {
    /// Get the code byte
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a request code from its byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Request::Continue),
            0x01 => Some(Request::Get),
            0x02 => Some(Request::Put),
            0x7F => Some(Request::Reject),
            _ => None,
        }
    }
}

/// Response codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Response {
    /// Continue sending fragments
    Continue = 0x80,
    /// Request succeeded
    Success = 0x81,
    /// Object not found
    NotFound = 0xC0,
    /// Response larger than the acceptable length
    ExcessData = 0xC1,
    /// Malformed request
    BadRequest = 0xC2,
    /// Request code not supported
    NotImplemented = 0xE0,
    /// Protocol version not supported
    UnsupportedVersion = 0xE1,
    /// Do not send remaining fragments
    Reject = 0xFF,
}

impl Response {
    /// Get the code byte
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a response code from its byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x80 => Some(Response::Continue),
            0x81 => Some(Response::Success),
            0xC0 => Some(Response::NotFound),
            0xC1 => Some(Response::ExcessData),
            0xC2 => Some(Response::BadRequest),
            0xE0 => Some(Response::NotImplemented),
            0xE1 => Some(Response::UnsupportedVersion),
            0xFF => Some(Response::Reject),
            _ => None,
        }
    }
}

/// Problems found in a received message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageError {
    /// Fewer bytes than a header
    Short(usize),
    /// Version byte differs from ours
    Version(u8),
    /// Declared length runs past the received bytes
    LengthExceedsReceived {
        /// Length field of the header
        declared: u32,
        /// Bytes received after the header
        received: usize,
    },
}

/// Common message header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MessageHeader {
    /// Protocol version (major in the high nibble)
    pub version: u8,
    /// Request or response code
    pub code: u8,
    /// Length of the information field
    pub length: u32,
}

impl MessageHeader {
    /// Header for a message with `length` bytes of information
    pub fn new(version: u8, code: u8, length: usize) -> Self {
        Self {
            version,
            code,
            length: length as u32,
        }
    }

    /// Encode the header
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let length = self.length.to_be_bytes();
        [
            self.version,
            self.code,
            length[0],
            length[1],
            length[2],
            length[3],
        ]
    }

    /// Decode a header without validating it
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_LEN {
            return None;
        }
        Some(Self {
            version: buf[0],
            code: buf[1],
            length: u32::from_be_bytes([buf[2], buf[3], buf[4], buf[5]]),
        })
    }

    /// Decode and validate a received message
    ///
    /// Checks the version and that the declared length fits in what was
    /// actually received, so the information field can be sliced safely.
    pub fn validate(message: &[u8], version: u8) -> Result<Self, MessageError> {
        let header = Self::parse(message).ok_or(MessageError::Short(message.len()))?;
        if header.version != version {
            return Err(MessageError::Version(header.version));
        }

        let received = message.len() - HEADER_LEN;
        if header.length as usize > received {
            return Err(MessageError::LengthExceedsReceived {
                declared: header.length,
                received,
            });
        }
        Ok(header)
    }

    /// Information field of a validated message
    pub fn information<'m>(&self, message: &'m [u8]) -> &'m [u8] {
        &message[HEADER_LEN..HEADER_LEN + self.length as usize]
    }
}

/// Encode a GET request header
///
/// The length field covers the acceptable-length field plus the request.
pub fn get_request_header(version: u8, request_len: usize, acceptable: u32) -> [u8; GET_HEADER_LEN] {
    let common = MessageHeader::new(version, Request::Get.as_u8(), request_len + 4).encode();
    let acceptable = acceptable.to_be_bytes();
    let mut header = [0u8; GET_HEADER_LEN];
    header[..HEADER_LEN].copy_from_slice(&common);
    header[HEADER_LEN..].copy_from_slice(&acceptable);
    header
}
