//! Protocol configuration
//!
//! Defaults match the LLCP 1.0 / SNEP 1.0 well-known values. With the
//! `serde` feature the configuration can be persisted as postcard binary.

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pdu::{MAX_FRAME_SIZE, SAP_MASK, SEQUENCED_HEADER_LEN};

/// Maximum service name length
pub const MAX_SERVICE_NAME_LEN: usize = 32;

/// LLCP version advertised in PAX (major 1, minor 0)
pub const LLCP_DEFAULT_VERSION: u8 = 0x10;

/// Well-known services advertised in PAX (link management and SNEP)
pub const LLCP_DEFAULT_WKS: u16 = 0x0011;

/// SNEP well-known service access point
pub const LLCP_DEFAULT_DSAP: u8 = 0x04;

/// Local service access point used by the client
pub const LLCP_DEFAULT_SSAP: u8 = 0x20;

/// Default maximum information unit
pub const LLCP_DEFAULT_MIU: u16 = 128;

/// Service name requested in CONNECT
pub const SNEP_SERVICE_NAME: &str = "urn:nfc:sn:snep";

const _: () = assert!(SNEP_SERVICE_NAME.len() <= MAX_SERVICE_NAME_LEN);

/// SNEP version (major 1, minor 0)
pub const SNEP_DEFAULT_VERSION: u8 = 0x10;

/// Length of one initiator+target activation cycle when polling forever
pub const SNEP_DEFAULT_POLL_CYCLE_MS: u16 = 500;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Service access point does not fit in 6 bits
    InvalidSap(u8),
    /// MIU is zero or does not fit in a transport frame
    InvalidMiu(u16),
    /// Service name is empty
    EmptyServiceName,
    /// Poll cycle must be at least 2 ms (split between two activations)
    InvalidPollCycle,
    /// Serialization or deserialization failed
    Serialize,
}

/// LLCP link configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LlcpConfig {
    /// Version sent in PAX; the peer must match it exactly
    pub version: u8,
    /// Well-known service bitmap sent in PAX
    pub well_known_services: u16,
    /// Destination SAP used by the client when connecting
    pub dsap: u8,
    /// Source SAP used by the client when connecting
    pub ssap: u8,
    /// Maximum information field of an I PDU
    pub miu: u16,
    /// Service name carried in CONNECT
    pub service_name: String<MAX_SERVICE_NAME_LEN>,
}

impl Default for LlcpConfig {
    fn default() -> Self {
        // Cannot fail: checked against the capacity at compile time
        let service_name = String::try_from(SNEP_SERVICE_NAME).unwrap_or_default();
        Self {
            version: LLCP_DEFAULT_VERSION,
            well_known_services: LLCP_DEFAULT_WKS,
            dsap: LLCP_DEFAULT_DSAP,
            ssap: LLCP_DEFAULT_SSAP,
            miu: LLCP_DEFAULT_MIU,
            service_name,
        }
    }
}

impl LlcpConfig {
    /// Check the configuration for values the codec cannot represent
    pub fn validate(&self) -> Result<(), ConfigError> {
        for sap in [self.dsap, self.ssap] {
            if sap > SAP_MASK {
                return Err(ConfigError::InvalidSap(sap));
            }
        }
        if self.miu == 0 || self.miu as usize + SEQUENCED_HEADER_LEN > MAX_FRAME_SIZE {
            return Err(ConfigError::InvalidMiu(self.miu));
        }
        if self.service_name.is_empty() {
            return Err(ConfigError::EmptyServiceName);
        }
        Ok(())
    }
}

/// SNEP configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SnepConfig {
    /// Version byte of every message; received messages must match it
    pub version: u8,
    /// Activation cycle used by `poll` when called without a timeout
    pub poll_cycle_ms: u16,
}

impl Default for SnepConfig {
    fn default() -> Self {
        Self {
            version: SNEP_DEFAULT_VERSION,
            poll_cycle_ms: SNEP_DEFAULT_POLL_CYCLE_MS,
        }
    }
}

/// Complete stack configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkConfig {
    /// Link layer settings
    pub llcp: LlcpConfig,
    /// Object exchange settings
    pub snep: SnepConfig,
}

impl LinkConfig {
    /// Check both layers
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.llcp.validate()?;
        if self.snep.poll_cycle_ms < 2 {
            return Err(ConfigError::InvalidPollCycle);
        }
        Ok(())
    }

    /// Serialize into `buf` as postcard binary
    ///
    /// Returns the used part of `buf`.
    #[cfg(feature = "serde")]
    pub fn to_slice<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], ConfigError> {
        postcard::to_slice(self, buf).map_err(|_| ConfigError::Serialize)
    }

    /// Load a postcard-encoded configuration and validate it
    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Serialize)?;
        config.validate()?;
        Ok(config)
    }
}
