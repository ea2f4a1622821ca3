//! Role-specific parameter exchange
//!
//! Right after radio activation both sides trade PAX PDUs. The initiator
//! speaks first; the target answers.

use nfclink_hal::{Role, Transport};

use super::connection::Connection;
use super::error::LlcpError;

/// Ordering of the PAX exchange for one radio role
pub(crate) trait Handshake {
    /// Radio role to activate in
    const ROLE: Role;

    /// Trade PAX PDUs with the peer
    fn exchange<T: Transport>(conn: &mut Connection<T>) -> Result<(), LlcpError<T::Error>>;
}

/// Send our PAX, then check the peer's
pub(crate) struct InitiatorHandshake;

impl Handshake for InitiatorHandshake {
    const ROLE: Role = Role::Initiator;

    fn exchange<T: Transport>(conn: &mut Connection<T>) -> Result<(), LlcpError<T::Error>> {
        conn.send_pax()?;
        conn.receive_pax()
    }
}

/// Check the peer's PAX, then answer with ours
pub(crate) struct TargetHandshake;

impl Handshake for TargetHandshake {
    const ROLE: Role = Role::Target;

    fn exchange<T: Transport>(conn: &mut Connection<T>) -> Result<(), LlcpError<T::Error>> {
        conn.receive_pax()?;
        conn.send_pax()
    }
}
