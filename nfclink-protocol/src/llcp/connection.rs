//! LLCP connection state machine

use heapless::Vec;
use nfclink_hal::{Activation, Role, Transport};

use super::error::LlcpError;
use super::handshake::{Handshake, InitiatorHandshake, TargetHandshake};
use crate::config::{LlcpConfig, MAX_SERVICE_NAME_LEN};
use crate::pdu::{
    self, encode_header, param, sequence_byte, split_sequence, Header, PduType, HEADER_LEN,
    MAX_FRAME_SIZE, SEQUENCED_HEADER_LEN, SEQUENCE_MASK, SYMM_PDU,
};

/// Capacity of the outbound header buffer (sequenced header + caller header)
pub const HEADER_BUF_SIZE: usize = 16;

/// Capacity of the CONNECT parameter block (one service name TLV)
const CONNECT_PARAMS_LEN: usize = 2 + MAX_SERVICE_NAME_LEN;

/// Lifecycle of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// No link
    Idle,
    /// Radio link up and PAX exchanged
    Activated,
    /// Logical connection established
    Connected,
}

/// Which side set up the logical connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Sent CONNECT
    Client,
    /// Answered CONNECT
    Server,
}

/// Which side may transmit next on the half-duplex link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Turn {
    Local,
    Remote,
}

/// Frame I/O with turn tracking and SYMM handling
struct Link<T> {
    transport: T,
    turn: Turn,
    timeout: u16,
}

impl<T: Transport> Link<T> {
    fn send(&mut self, header: &[u8], body: &[u8]) -> Result<(), LlcpError<T::Error>> {
        self.transport.write(header, body)?;
        self.turn = Turn::Remote;
        Ok(())
    }

    fn send_symm(&mut self) -> Result<(), LlcpError<T::Error>> {
        trace!("llcp: -> SYMM");
        self.send(&SYMM_PDU, &[])
    }

    /// Receive one frame of at least two bytes
    fn receive(&mut self, buf: &mut [u8]) -> Result<(usize, Header), LlcpError<T::Error>> {
        let len = self.transport.read(buf, self.timeout)?.min(buf.len());
        self.turn = Turn::Local;
        let header = Header::parse(&buf[..len]).ok_or(LlcpError::ShortFrame(len))?;
        trace!("llcp: <- type {=u8} ({=usize} bytes)", header.ptype, len);
        Ok((len, header))
    }

    /// Receive until `expected` arrives, answering SYMM along the way
    fn await_pdu(
        &mut self,
        buf: &mut [u8],
        expected: PduType,
    ) -> Result<(usize, Header), LlcpError<T::Error>> {
        loop {
            let (len, header) = self.receive(buf)?;
            if header.is(expected) {
                return Ok((len, header));
            }
            if header.is(PduType::Symm) {
                self.send_symm()?;
                continue;
            }
            warn!(
                "llcp: expected type {=u8}, got {=u8}",
                expected.as_u8(),
                header.ptype
            );
            return Err(LlcpError::UnexpectedPdu {
                expected,
                received: header.ptype,
            });
        }
    }

    /// Make sure we may transmit: drain the peer's SYMM if it holds the turn
    fn take_turn(&mut self, buf: &mut [u8]) -> Result<(), LlcpError<T::Error>> {
        if self.turn == Turn::Remote {
            self.await_pdu(buf, PduType::Symm)?;
        }
        Ok(())
    }

    /// Hand the turn to the peer with a SYMM if we hold it
    fn yield_turn(&mut self) -> Result<(), LlcpError<T::Error>> {
        if self.turn == Turn::Local {
            self.send_symm()?;
        }
        Ok(())
    }
}

/// One LLCP logical link
///
/// Owns the transport, the addressing and sequence state, and fixed-size
/// working buffers. All operations block on the transport.
pub struct Connection<T> {
    link: Link<T>,
    config: LlcpConfig,
    state: LinkState,
    role: Option<Role>,
    mode: Mode,
    dsap: u8,
    ssap: u8,
    ns: u8,
    nr: u8,
    header: Vec<u8, HEADER_BUF_SIZE>,
    rx: [u8; MAX_FRAME_SIZE],
}

impl<T: Transport> Connection<T> {
    /// Create an idle connection with the default configuration
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, LlcpConfig::default())
    }

    /// Create an idle connection
    pub fn with_config(transport: T, config: LlcpConfig) -> Self {
        let (dsap, ssap) = (config.dsap, config.ssap);
        Self {
            link: Link {
                transport,
                turn: Turn::Local,
                timeout: 0,
            },
            config,
            state: LinkState::Idle,
            role: None,
            mode: Mode::Client,
            dsap,
            ssap,
            ns: 0,
            nr: 0,
            header: Vec::new(),
            rx: [0; MAX_FRAME_SIZE],
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Check if a logical connection is up
    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Radio role of the current activation
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Client or server side of the current connection
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Send sequence number N(S)
    pub fn ns(&self) -> u8 {
        self.ns
    }

    /// Receive sequence number N(R)
    pub fn nr(&self) -> u8 {
        self.nr
    }

    /// Destination SAP of outgoing PDUs
    pub fn dsap(&self) -> u8 {
        self.dsap
    }

    /// Source SAP of outgoing PDUs
    pub fn ssap(&self) -> u8 {
        self.ssap
    }

    /// Link configuration
    pub fn config(&self) -> &LlcpConfig {
        &self.config
    }

    /// Set the transport timeout used by `write` and `read`
    pub fn set_timeout(&mut self, timeout: u16) {
        self.link.timeout = timeout;
    }

    /// Borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.link.transport
    }

    /// Consume the connection and return the transport
    pub fn release(self) -> T {
        self.link.transport
    }

    /// Drop all link state and return to `Idle`
    pub fn reset(&mut self) {
        self.state = LinkState::Idle;
        self.role = None;
        self.dsap = self.config.dsap;
        self.ssap = self.config.ssap;
        self.ns = 0;
        self.nr = 0;
    }

    /// Activate the radio link and exchange PAX parameters
    ///
    /// A radio timeout is not an error: it returns `Ok(Activation::TimedOut)`
    /// and leaves the connection idle.
    pub fn activate(
        &mut self,
        timeout: u16,
        role: Role,
    ) -> Result<Activation, LlcpError<T::Error>> {
        self.reset();
        self.link.timeout = timeout;
        match role {
            Role::Initiator => self.activate_with::<InitiatorHandshake>(timeout),
            Role::Target => self.activate_with::<TargetHandshake>(timeout),
        }
    }

    fn activate_with<H: Handshake>(
        &mut self,
        timeout: u16,
    ) -> Result<Activation, LlcpError<T::Error>> {
        let outcome = self.link.transport.activate(H::ROLE, timeout)?;
        if !outcome.is_activated() {
            debug!("llcp: activation timed out");
            return Ok(outcome);
        }

        self.role = Some(H::ROLE);
        if let Err(e) = H::exchange(self) {
            self.reset();
            return Err(e);
        }

        self.state = LinkState::Activated;
        info!("llcp: link activated");
        Ok(Activation::Activated)
    }

    pub(crate) fn send_pax(&mut self) -> Result<(), LlcpError<T::Error>> {
        let header = encode_header(0, 0, PduType::Pax);
        let params = pdu::pax_params(self.config.version, self.config.well_known_services);
        trace!("llcp: -> PAX");
        self.link.send(&header, &params)
    }

    pub(crate) fn receive_pax(&mut self) -> Result<(), LlcpError<T::Error>> {
        let (len, header) = self.link.receive(&mut self.rx)?;
        if !header.is(PduType::Pax) {
            warn!("llcp: expected PAX, got {=u8}", header.ptype);
            return Err(LlcpError::UnexpectedPdu {
                expected: PduType::Pax,
                received: header.ptype,
            });
        }

        let remote = pdu::pax_version(&self.rx[HEADER_LEN..len])
            .map_err(|_| LlcpError::MalformedParameters)?;
        let local = self.config.version;
        match remote {
            Some(remote) if remote != local => {
                warn!("llcp: version mismatch {=u8} != {=u8}", remote, local);
                Err(LlcpError::VersionMismatch { local, remote })
            }
            _ => Ok(()),
        }
    }

    /// Run `op`, dropping the connection if it fails
    fn guarded<R>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<R, LlcpError<T::Error>>,
    ) -> Result<R, LlcpError<T::Error>> {
        let result = op(self);
        if result.is_err() {
            self.reset();
        }
        result
    }

    fn require(&self, state: LinkState) -> Result<(), LlcpError<T::Error>> {
        if self.state == state {
            return Ok(());
        }
        Err(match state {
            LinkState::Connected => LlcpError::NotConnected,
            _ => LlcpError::NotActivated,
        })
    }

    fn send_control(&mut self, ptype: PduType) -> Result<(), LlcpError<T::Error>> {
        let header = encode_header(self.dsap, self.ssap, ptype);
        trace!("llcp: -> type {=u8}", ptype.as_u8());
        self.link.send(&header, &[])
    }

    /// Connect to the peer's service (client side)
    ///
    /// Sends CONNECT with the configured service name and waits for CC.
    pub fn connect(&mut self, timeout: u16) -> Result<(), LlcpError<T::Error>> {
        self.require(LinkState::Activated)?;
        self.link.timeout = timeout;
        self.mode = Mode::Client;
        self.dsap = self.config.dsap;
        self.ssap = self.config.ssap;
        self.ns = 0;
        self.nr = 0;

        self.guarded(|conn| {
            let mut params = Vec::<u8, CONNECT_PARAMS_LEN>::new();
            pdu::push_tlv(&mut params, param::SN, conn.config.service_name.as_bytes())
                .map_err(|_| LlcpError::HeaderOverflow)?;

            conn.link.take_turn(&mut conn.rx)?;
            let header = encode_header(conn.dsap, conn.ssap, PduType::Connect);
            trace!("llcp: -> CONNECT");
            conn.link.send(&header, &params)?;
            conn.link.await_pdu(&mut conn.rx, PduType::Cc)?;

            conn.state = LinkState::Connected;
            info!("llcp: connected as client");
            Ok(())
        })
    }

    /// Wait for the peer to connect (server side)
    ///
    /// Learns the peer's addresses from CONNECT and answers with CC.
    pub fn wait_for_connection(&mut self, timeout: u16) -> Result<(), LlcpError<T::Error>> {
        self.require(LinkState::Activated)?;
        self.link.timeout = timeout;
        self.mode = Mode::Server;
        self.ns = 0;
        self.nr = 0;

        self.guarded(|conn| {
            conn.link.yield_turn()?;
            let (_, header) = conn.link.await_pdu(&mut conn.rx, PduType::Connect)?;
            conn.ssap = header.dsap;
            conn.dsap = header.ssap;
            conn.send_control(PduType::Cc)?;

            conn.state = LinkState::Connected;
            info!("llcp: connected as server");
            Ok(())
        })
    }

    /// Send one I PDU carrying `header` followed by `body`
    ///
    /// Returns once the peer acknowledged it with RR.
    pub fn write(&mut self, header: &[u8], body: &[u8]) -> Result<(), LlcpError<T::Error>> {
        self.require(LinkState::Connected)?;

        let info_len = header.len() + body.len();
        if info_len > self.config.miu as usize {
            return Err(LlcpError::ExceedsMiu);
        }
        if SEQUENCED_HEADER_LEN + info_len > MAX_FRAME_SIZE {
            return Err(LlcpError::FrameTooLarge);
        }

        let address = encode_header(self.dsap, self.ssap, PduType::I);
        let sequence = sequence_byte(self.ns, self.nr);
        self.header.clear();
        self.header
            .extend_from_slice(&address)
            .map_err(|_| LlcpError::HeaderOverflow)?;
        self.header
            .push(sequence)
            .map_err(|_| LlcpError::HeaderOverflow)?;
        self.header
            .extend_from_slice(header)
            .map_err(|_| LlcpError::HeaderOverflow)?;

        self.guarded(|conn| {
            conn.link.take_turn(&mut conn.rx)?;
            trace!("llcp: -> I ns={=u8} nr={=u8}", conn.ns, conn.nr);
            conn.link.send(&conn.header, body)?;
            conn.link.await_pdu(&mut conn.rx, PduType::Rr)?;
            conn.ns = (conn.ns + 1) & SEQUENCE_MASK;
            Ok(())
        })
    }

    /// Receive one I PDU into `buf`
    ///
    /// The 3-byte header is stripped; the payload starts at `buf[0]`.
    /// Returns the payload length after acknowledging it with RR.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, LlcpError<T::Error>> {
        self.require(LinkState::Connected)?;

        self.guarded(|conn| {
            conn.link.yield_turn()?;
            let (len, header) = conn.link.await_pdu(buf, PduType::I)?;
            if len < SEQUENCED_HEADER_LEN {
                return Err(LlcpError::ShortFrame(len));
            }

            conn.ssap = header.dsap;
            conn.dsap = header.ssap;

            // N(R) acknowledges the peer's N(S)
            let (peer_ns, _) = split_sequence(buf[2]);
            let address = encode_header(conn.dsap, conn.ssap, PduType::Rr);
            let rr = [address[0], address[1], sequence_byte(0, peer_ns + 1)];
            trace!("llcp: -> RR nr={=u8}", rr[2]);
            conn.link.send(&rr, &[])?;

            buf.copy_within(SEQUENCED_HEADER_LEN..len, 0);
            conn.nr = (conn.nr + 1) & SEQUENCE_MASK;
            Ok(len - SEQUENCED_HEADER_LEN)
        })
    }

    /// Tear the connection down: send DISC and wait for DM
    pub fn disconnect(&mut self, timeout: u16) -> Result<(), LlcpError<T::Error>> {
        self.require(LinkState::Connected)?;
        self.link.timeout = timeout;

        let result = self.guarded(|conn| {
            conn.link.take_turn(&mut conn.rx)?;
            conn.send_control(PduType::Disc)?;
            conn.link.await_pdu(&mut conn.rx, PduType::Dm)?;
            Ok(())
        });
        self.reset();
        info!("llcp: disconnected");
        result
    }

    /// Wait for the peer to tear the connection down and answer DM
    pub fn wait_for_disconnection(&mut self, timeout: u16) -> Result<(), LlcpError<T::Error>> {
        self.require(LinkState::Connected)?;
        self.link.timeout = timeout;

        let result = self.guarded(|conn| {
            conn.link.yield_turn()?;
            conn.link.await_pdu(&mut conn.rx, PduType::Disc)?;
            conn.send_control(PduType::Dm)
        });
        self.reset();
        info!("llcp: peer disconnected");
        result
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec;

    use super::*;
    use crate::mock::{MockError, Op, ScriptedTransport};

    const DSAP: u8 = 0x04;
    const SSAP: u8 = 0x20;

    fn activated_initiator(
        script: impl FnOnce(&mut ScriptedTransport),
    ) -> Connection<ScriptedTransport> {
        let mut transport = ScriptedTransport::new();
        transport.push_pax(0x10);
        script(&mut transport);
        let mut conn = Connection::new(transport);
        assert_eq!(conn.activate(100, Role::Initiator), Ok(Activation::Activated));
        conn
    }

    fn connected_client(
        script: impl FnOnce(&mut ScriptedTransport),
    ) -> Connection<ScriptedTransport> {
        let mut conn = activated_initiator(|t| {
            t.push_control(SSAP, DSAP, PduType::Cc);
            script(t);
        });
        conn.connect(100).unwrap();
        conn
    }

    #[test]
    fn test_initiator_activation_sends_pax_first() {
        let conn = activated_initiator(|_| {});
        assert_eq!(conn.state(), LinkState::Activated);
        assert_eq!(conn.role(), Some(Role::Initiator));

        let t = conn.release();
        assert_eq!(
            t.ops,
            vec![
                Op::Activate(Role::Initiator, 100),
                Op::Write(vec![0x00, 0x40, 0x01, 0x01, 0x10, 0x03, 0x02, 0x00, 0x11]),
                Op::Read(100),
            ]
        );
    }

    #[test]
    fn test_target_activation_answers_pax() {
        let mut transport = ScriptedTransport::new();
        transport.push_pax(0x10);
        let mut conn = Connection::new(transport);
        assert_eq!(conn.activate(50, Role::Target), Ok(Activation::Activated));

        let t = conn.release();
        assert_eq!(t.ops[0], Op::Activate(Role::Target, 50));
        assert_eq!(t.ops[1], Op::Read(50));
        assert!(matches!(&t.ops[2], Op::Write(frame) if frame[..2] == [0x00, 0x40]));
    }

    #[test]
    fn test_activation_timeout_is_not_an_error() {
        let mut transport = ScriptedTransport::new();
        transport.initiator = Ok(Activation::TimedOut);
        let mut conn = Connection::new(transport);

        assert_eq!(conn.activate(10, Role::Initiator), Ok(Activation::TimedOut));
        assert_eq!(conn.state(), LinkState::Idle);
        assert_eq!(conn.release().ops.len(), 1);
    }

    #[test]
    fn test_activation_radio_failure() {
        let mut transport = ScriptedTransport::new();
        transport.target = Err(MockError::Radio);
        let mut conn = Connection::new(transport);

        assert_eq!(
            conn.activate(10, Role::Target),
            Err(LlcpError::Transport(MockError::Radio))
        );
    }

    #[test]
    fn test_activation_version_mismatch() {
        let mut transport = ScriptedTransport::new();
        transport.push_pax(0x11);
        let mut conn = Connection::new(transport);

        assert_eq!(
            conn.activate(10, Role::Initiator),
            Err(LlcpError::VersionMismatch {
                local: 0x10,
                remote: 0x11
            })
        );
        assert_eq!(conn.state(), LinkState::Idle);
    }

    #[test]
    fn test_activation_malformed_pax() {
        let mut transport = ScriptedTransport::new();
        transport.push(&[0x00, 0x40, 0x01, 0x04, 0x10]);
        let mut conn = Connection::new(transport);

        assert_eq!(
            conn.activate(10, Role::Initiator),
            Err(LlcpError::MalformedParameters)
        );
    }

    #[test]
    fn test_activation_expects_pax() {
        let mut transport = ScriptedTransport::new();
        transport.push_symm();
        let mut conn = Connection::new(transport);

        assert_eq!(
            conn.activate(10, Role::Target),
            Err(LlcpError::UnexpectedPdu {
                expected: PduType::Pax,
                received: 0
            })
        );
    }

    #[test]
    fn test_connect_sends_service_name() {
        let conn = connected_client(|_| {});
        assert_eq!(conn.state(), LinkState::Connected);
        assert_eq!(conn.mode(), Mode::Client);

        let written = conn.release().written();
        let mut expected = vec![0x11, 0x20, 0x06, 15];
        expected.extend_from_slice(b"urn:nfc:sn:snep");
        assert_eq!(written[1], expected);
    }

    #[test]
    fn test_connect_answers_symm() {
        let mut conn = activated_initiator(|t| {
            t.push_symm().push_symm().push_control(SSAP, DSAP, PduType::Cc);
        });
        conn.connect(0).unwrap();

        let written = conn.release().written();
        // PAX, CONNECT, SYMM, SYMM
        assert_eq!(written.len(), 4);
        assert_eq!(written[2], SYMM_PDU.to_vec());
        assert_eq!(written[3], SYMM_PDU.to_vec());
    }

    #[test]
    fn test_connect_rejected_with_dm() {
        let mut conn = activated_initiator(|t| {
            t.push_control(SSAP, DSAP, PduType::Dm).push_symm();
        });

        assert_eq!(
            conn.connect(0),
            Err(LlcpError::UnexpectedPdu {
                expected: PduType::Cc,
                received: PduType::Dm.as_u8()
            })
        );
        assert_eq!(conn.state(), LinkState::Idle);

        // Nothing touched after the offending PDU
        let t = conn.release();
        assert_eq!(t.remaining(), 1);
        assert_eq!(t.ops.last(), Some(&Op::Read(0)));
    }

    #[test]
    fn test_connect_requires_activation() {
        let mut conn = Connection::new(ScriptedTransport::new());
        assert_eq!(conn.connect(0), Err(LlcpError::NotActivated));
        assert!(conn.release().ops.is_empty());
    }

    #[test]
    fn test_wait_for_connection_learns_addresses() {
        let mut transport = ScriptedTransport::new();
        transport
            .push_pax(0x10)
            .push_control(0x04, 0x21, PduType::Connect);
        let mut conn = Connection::new(transport);
        conn.activate(0, Role::Target).unwrap();
        conn.wait_for_connection(0).unwrap();

        assert_eq!(conn.mode(), Mode::Server);
        assert_eq!(conn.dsap(), 0x21);
        assert_eq!(conn.ssap(), 0x04);

        let written = conn.release().written();
        // PAX, CC
        assert_eq!(written.len(), 2);
        assert_eq!(written[1], encode_header(0x21, 0x04, PduType::Cc).to_vec());
    }

    #[test]
    fn test_wait_for_connection_as_initiator_yields_first() {
        let mut conn = activated_initiator(|t| {
            t.push_control(0x04, 0x21, PduType::Connect);
        });
        conn.wait_for_connection(0).unwrap();

        let written = conn.release().written();
        // PAX, SYMM, CC
        assert_eq!(written[1], SYMM_PDU.to_vec());
        assert_eq!(written[2][..2], encode_header(0x21, 0x04, PduType::Cc));
    }

    #[test]
    fn test_write_information_pdu() {
        let mut conn = connected_client(|t| {
            t.push_rr(SSAP, DSAP, 1);
        });
        conn.write(&[0x10, 0x02], &[0xAB]).unwrap();
        assert_eq!(conn.ns(), 1);

        let written = conn.release().written();
        assert_eq!(written[2], vec![0x13, 0x20, 0x00, 0x10, 0x02, 0xAB]);
    }

    #[test]
    fn test_write_answers_symm_before_rr() {
        let mut conn = connected_client(|t| {
            t.push_symm().push_symm().push_symm().push_rr(SSAP, DSAP, 1);
        });
        conn.write(&[], &[1, 2, 3]).unwrap();

        let written = conn.release().written();
        // PAX, CONNECT, I, 3x SYMM
        assert_eq!(written.len(), 6);
        assert!(written[3..].iter().all(|f| f[..] == SYMM_PDU));
    }

    #[test]
    fn test_write_unexpected_pdu_aborts() {
        let mut conn = connected_client(|t| {
            t.push_control(SSAP, DSAP, PduType::Disc).push_rr(SSAP, DSAP, 1);
        });
        assert_eq!(
            conn.write(&[], &[1]),
            Err(LlcpError::UnexpectedPdu {
                expected: PduType::Rr,
                received: PduType::Disc.as_u8()
            })
        );
        assert_eq!(conn.ns(), 0);
        assert_eq!(conn.state(), LinkState::Idle);
        assert_eq!(conn.release().remaining(), 1);
    }

    #[test]
    fn test_write_header_overflow() {
        let mut conn = connected_client(|_| {});
        let header = [0u8; HEADER_BUF_SIZE - 2];
        assert_eq!(conn.write(&header, &[]), Err(LlcpError::HeaderOverflow));
        // Caller error, the connection survives
        assert!(conn.is_connected());
    }

    #[test]
    fn test_write_exceeds_miu() {
        let mut conn = connected_client(|_| {});
        let body = [0u8; 127];
        assert_eq!(conn.write(&[0, 0], &body), Err(LlcpError::ExceedsMiu));
    }

    #[test]
    fn test_write_frame_too_large() {
        let mut config = LlcpConfig::default();
        config.miu = 1000;
        let mut transport = ScriptedTransport::new();
        transport
            .push_pax(0x10)
            .push_control(SSAP, DSAP, PduType::Cc);
        let mut conn = Connection::with_config(transport, config);
        conn.activate(0, Role::Initiator).unwrap();
        conn.connect(0).unwrap();

        let body = [0u8; MAX_FRAME_SIZE - 2];
        assert_eq!(conn.write(&[], &body), Err(LlcpError::FrameTooLarge));
    }

    #[test]
    fn test_write_requires_connection() {
        let mut conn = activated_initiator(|_| {});
        assert_eq!(conn.write(&[], &[1]), Err(LlcpError::NotConnected));
    }

    #[test]
    fn test_write_transport_failure() {
        let mut conn = connected_client(|_| {});
        conn.transport_mut().fail_write = Some(2);
        assert_eq!(
            conn.write(&[], &[1]),
            Err(LlcpError::Transport(MockError::WriteFailed))
        );
        assert_eq!(conn.state(), LinkState::Idle);
    }

    #[test]
    fn test_server_write_drains_symm_first() {
        let mut transport = ScriptedTransport::new();
        transport
            .push_pax(0x10)
            .push_control(DSAP, SSAP, PduType::Connect)
            .push_symm()
            .push_rr(SSAP, DSAP, 1);
        let mut conn = Connection::new(transport);
        conn.activate(0, Role::Target).unwrap();
        conn.wait_for_connection(0).unwrap();
        conn.write(&[], &[7]).unwrap();

        let t = conn.release();
        let written = t.written();
        // PAX, CC, I - no SYMM answer for the drained keep-alive
        assert_eq!(written.len(), 3);
        assert_eq!(written[2], vec![0x83, 0x04, 0x00, 7]);
    }

    #[test]
    fn test_server_write_rejects_non_symm_turn() {
        let mut transport = ScriptedTransport::new();
        transport
            .push_pax(0x10)
            .push_control(DSAP, SSAP, PduType::Connect)
            .push_control(DSAP, SSAP, PduType::Disc);
        let mut conn = Connection::new(transport);
        conn.activate(0, Role::Target).unwrap();
        conn.wait_for_connection(0).unwrap();

        assert!(matches!(
            conn.write(&[], &[7]),
            Err(LlcpError::UnexpectedPdu {
                expected: PduType::Symm,
                ..
            })
        ));
    }

    #[test]
    fn test_read_strips_header_and_acknowledges() {
        let mut conn = connected_client(|t| {
            t.push_symm().push_info(SSAP, DSAP, 4, 0, &[0xDE, 0xAD]);
        });
        let mut buf = [0u8; 16];
        assert_eq!(conn.read(&mut buf), Ok(2));
        assert_eq!(&buf[..2], &[0xDE, 0xAD]);
        assert_eq!(conn.nr(), 1);

        let written = conn.release().written();
        // PAX, CONNECT, SYMM (turn), SYMM (answer), RR
        assert_eq!(written.len(), 5);
        assert_eq!(written[4], vec![0x13, 0x60, 0x05]);
    }

    #[test]
    fn test_read_rr_wraps_sequence() {
        let mut conn = connected_client(|t| {
            t.push_info(SSAP, DSAP, 15, 0, &[1]);
        });
        let mut buf = [0u8; 8];
        conn.read(&mut buf).unwrap();
        let written = conn.release().written();
        assert_eq!(written.last().unwrap()[2], 0x00);
    }

    #[test]
    fn test_read_unexpected_pdu() {
        let mut conn = connected_client(|t| {
            t.push_rr(SSAP, DSAP, 0);
        });
        let mut buf = [0u8; 8];
        assert_eq!(
            conn.read(&mut buf),
            Err(LlcpError::UnexpectedPdu {
                expected: PduType::I,
                received: PduType::Rr.as_u8()
            })
        );
        assert_eq!(conn.nr(), 0);
    }

    #[test]
    fn test_read_short_information_pdu() {
        let mut conn = connected_client(|t| {
            t.push(&encode_header(SSAP, DSAP, PduType::I));
        });
        let mut buf = [0u8; 8];
        assert_eq!(conn.read(&mut buf), Err(LlcpError::ShortFrame(2)));
    }

    #[test]
    fn test_short_frame() {
        let mut conn = connected_client(|t| {
            t.push(&[0x13]);
        });
        let mut buf = [0u8; 8];
        assert_eq!(conn.read(&mut buf), Err(LlcpError::ShortFrame(1)));
    }

    #[test]
    fn test_sequence_counters_wrap() {
        let mut conn = connected_client(|t| {
            for i in 0..17u8 {
                t.push_rr(SSAP, DSAP, (i + 1) & 0x0F);
            }
        });
        for _ in 0..17 {
            conn.write(&[], &[0]).unwrap();
        }
        assert_eq!(conn.ns(), 1);
    }

    #[test]
    fn test_receive_counter_wraps() {
        let mut conn = connected_client(|t| {
            t.push_symm();
            for i in 0..17u8 {
                t.push_info(SSAP, DSAP, i & 0x0F, 0, &[i]);
            }
        });
        let mut buf = [0u8; 8];
        for i in 0..17u8 {
            assert_eq!(conn.read(&mut buf), Ok(1));
            assert_eq!(buf[0], i);
        }
        assert_eq!(conn.nr(), 1);
        assert_eq!(conn.ns(), 0);
    }

    #[test]
    fn test_disconnect_drains_turn_then_waits_for_dm() {
        let mut conn = connected_client(|t| {
            t.push_info(SSAP, DSAP, 0, 0, &[1])
                .push_symm()
                .push_symm()
                .push_control(SSAP, DSAP, PduType::Dm);
        });
        let mut buf = [0u8; 8];
        conn.read(&mut buf).unwrap();
        conn.disconnect(0).unwrap();
        assert_eq!(conn.state(), LinkState::Idle);

        let written = conn.release().written();
        let n = written.len();
        // ..., RR, DISC, SYMM
        assert_eq!(written[n - 2], encode_header(DSAP, SSAP, PduType::Disc).to_vec());
        assert_eq!(written[n - 1], SYMM_PDU.to_vec());
    }

    #[test]
    fn test_disconnect_failure_still_resets() {
        let mut conn = connected_client(|t| {
            t.push_control(SSAP, DSAP, PduType::Cc);
        });
        assert!(conn.disconnect(0).is_err());
        assert_eq!(conn.state(), LinkState::Idle);
    }

    #[test]
    fn test_wait_for_disconnection() {
        let mut transport = ScriptedTransport::new();
        transport
            .push_pax(0x10)
            .push_control(DSAP, SSAP, PduType::Connect)
            .push_symm()
            .push_control(DSAP, SSAP, PduType::Disc);
        let mut conn = Connection::new(transport);
        conn.activate(0, Role::Target).unwrap();
        conn.wait_for_connection(0).unwrap();
        conn.wait_for_disconnection(0).unwrap();
        assert_eq!(conn.state(), LinkState::Idle);

        let written = conn.release().written();
        // PAX, CC, SYMM (answer), DM
        assert_eq!(written.len(), 4);
        assert_eq!(written[3], encode_header(SSAP, DSAP, PduType::Dm).to_vec());
    }
}
