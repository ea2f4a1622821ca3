//! Frame transport abstraction
//!
//! A transport exchanges whole frames with the peer device. It is half-duplex
//! and request/response framed: the stack above is responsible for taking
//! turns.

/// Timeout value meaning "wait indefinitely"
pub const NO_TIMEOUT: u16 = 0;

/// Radio role taken during activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Active side, polls for a target
    Initiator,
    /// Passive side, waits to be polled
    Target,
}

impl Role {
    /// The role the peer must be playing
    pub fn peer(self) -> Self {
        match self {
            Role::Initiator => Role::Target,
            Role::Target => Role::Initiator,
        }
    }
}

/// Outcome of a role activation that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Activation {
    /// A peer was found and the link is up
    Activated,
    /// No peer showed up before the timeout
    TimedOut,
}

impl Activation {
    /// Check if the link came up
    pub fn is_activated(self) -> bool {
        matches!(self, Activation::Activated)
    }
}

/// Framed half-duplex link to the peer
///
/// Timeouts are in milliseconds, [`NO_TIMEOUT`] meaning no limit.
pub trait Transport {
    /// Error type for link operations
    type Error;

    /// Activate the front-end as initiator and look for a peer
    fn activate_as_initiator(&mut self, timeout: u16) -> Result<Activation, Self::Error>;

    /// Activate the front-end as target and wait for a peer
    fn activate_as_target(&mut self, timeout: u16) -> Result<Activation, Self::Error>;

    /// Activate in the given role
    fn activate(&mut self, role: Role, timeout: u16) -> Result<Activation, Self::Error> {
        match role {
            Role::Initiator => self.activate_as_initiator(timeout),
            Role::Target => self.activate_as_target(timeout),
        }
    }

    /// Transmit `header` followed by `body` as one frame
    fn write(&mut self, header: &[u8], body: &[u8]) -> Result<(), Self::Error>;

    /// Receive one frame into `buf`
    ///
    /// Returns the number of bytes written to `buf`.
    fn read(&mut self, buf: &mut [u8], timeout: u16) -> Result<usize, Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn activate_as_initiator(&mut self, timeout: u16) -> Result<Activation, Self::Error> {
        (**self).activate_as_initiator(timeout)
    }

    fn activate_as_target(&mut self, timeout: u16) -> Result<Activation, Self::Error> {
        (**self).activate_as_target(timeout)
    }

    fn write(&mut self, header: &[u8], body: &[u8]) -> Result<(), Self::Error> {
        (**self).write(header, body)
    }

    fn read(&mut self, buf: &mut [u8], timeout: u16) -> Result<usize, Self::Error> {
        (**self).read(buf, timeout)
    }
}
