//! NFC-DEP MAC link adaptor
//!
//! An NFC front-end exposes a different command set for each radio role:
//! as initiator it jumps into DEP mode and exchanges data with the target it
//! found, as target it waits to be activated and answers. [`Endpoint`] is the
//! common activate/write/read capability; [`InitiatorEndpoint`] and
//! [`TargetEndpoint`] implement it on top of the role-specific chip commands.
//!
//! [`MacLink`] turns any chip supporting both roles into a [`Transport`]. The
//! role is chosen at activation and every later write/read goes to the
//! endpoint for that role.

use crate::transport::{Activation, Role, Transport};

/// Chip-level setup shared by both roles
pub trait DepDevice {
    /// Error type for chip commands
    type Error;

    /// Wake the front-end and configure its secure access module
    ///
    /// Called before every activation.
    fn wake(&mut self) -> Result<(), Self::Error>;
}

/// Chip commands available in the initiator role
pub trait DepInitiator: DepDevice {
    /// Look for a target and jump into DEP mode
    fn jump_for_dep(&mut self, timeout: u16) -> Result<Activation, Self::Error>;

    /// Send a frame to the activated target
    fn data_write(&mut self, header: &[u8], body: &[u8]) -> Result<(), Self::Error>;

    /// Fetch the target's answer to the last frame
    fn data_read(&mut self, buf: &mut [u8], timeout: u16) -> Result<usize, Self::Error>;
}

/// Chip commands available in the target role
pub trait DepTarget: DepDevice {
    /// Wait to be activated by an initiator
    fn init_as_target(&mut self, timeout: u16) -> Result<Activation, Self::Error>;

    /// Queue a frame as the answer to the initiator
    fn set_data(&mut self, header: &[u8], body: &[u8]) -> Result<(), Self::Error>;

    /// Receive the next frame from the initiator
    fn get_data(&mut self, buf: &mut [u8], timeout: u16) -> Result<usize, Self::Error>;
}

/// Activate/write/read capability of one radio role
pub trait Endpoint {
    /// Error type for endpoint operations
    type Error;

    /// Bring the link up in this role
    fn activate(&mut self, timeout: u16) -> Result<Activation, Self::Error>;

    /// Transmit one frame
    fn write(&mut self, header: &[u8], body: &[u8]) -> Result<(), Self::Error>;

    /// Receive one frame
    fn read(&mut self, buf: &mut [u8], timeout: u16) -> Result<usize, Self::Error>;
}

/// Initiator side of a chip
pub struct InitiatorEndpoint<'a, D>(pub &'a mut D);

impl<D: DepInitiator> Endpoint for InitiatorEndpoint<'_, D> {
    type Error = D::Error;

    fn activate(&mut self, timeout: u16) -> Result<Activation, Self::Error> {
        self.0.wake()?;
        self.0.jump_for_dep(timeout)
    }

    fn write(&mut self, header: &[u8], body: &[u8]) -> Result<(), Self::Error> {
        self.0.data_write(header, body)
    }

    fn read(&mut self, buf: &mut [u8], timeout: u16) -> Result<usize, Self::Error> {
        self.0.data_read(buf, timeout)
    }
}

/// Target side of a chip
pub struct TargetEndpoint<'a, D>(pub &'a mut D);

impl<D: DepTarget> Endpoint for TargetEndpoint<'_, D> {
    type Error = D::Error;

    fn activate(&mut self, timeout: u16) -> Result<Activation, Self::Error> {
        self.0.wake()?;
        self.0.init_as_target(timeout)
    }

    fn write(&mut self, header: &[u8], body: &[u8]) -> Result<(), Self::Error> {
        self.0.set_data(header, body)
    }

    fn read(&mut self, buf: &mut [u8], timeout: u16) -> Result<usize, Self::Error> {
        self.0.get_data(buf, timeout)
    }
}

/// Transport over a chip that can act in either role
pub struct MacLink<D> {
    device: D,
    role: Role,
}

impl<D> MacLink<D>
where
    D: DepInitiator + DepTarget,
{
    /// Create a link; the role defaults to target until activation
    pub fn new(device: D) -> Self {
        Self {
            device,
            role: Role::Target,
        }
    }

    /// Role selected by the last activation
    pub fn role(&self) -> Role {
        self.role
    }

    /// Borrow the underlying chip
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Consume the link and return the chip
    pub fn release(self) -> D {
        self.device
    }
}

impl<D> Transport for MacLink<D>
where
    D: DepInitiator + DepTarget,
{
    type Error = D::Error;

    fn activate_as_initiator(&mut self, timeout: u16) -> Result<Activation, Self::Error> {
        self.role = Role::Initiator;
        InitiatorEndpoint(&mut self.device).activate(timeout)
    }

    fn activate_as_target(&mut self, timeout: u16) -> Result<Activation, Self::Error> {
        self.role = Role::Target;
        TargetEndpoint(&mut self.device).activate(timeout)
    }

    fn write(&mut self, header: &[u8], body: &[u8]) -> Result<(), Self::Error> {
        match self.role {
            Role::Initiator => InitiatorEndpoint(&mut self.device).write(header, body),
            Role::Target => TargetEndpoint(&mut self.device).write(header, body),
        }
    }

    fn read(&mut self, buf: &mut [u8], timeout: u16) -> Result<usize, Self::Error> {
        match self.role {
            Role::Initiator => InitiatorEndpoint(&mut self.device).read(buf, timeout),
            Role::Target => TargetEndpoint(&mut self.device).read(buf, timeout),
        }
    }
}
