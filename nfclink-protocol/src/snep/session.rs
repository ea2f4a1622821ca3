//! SNEP client and server operations

use nfclink_hal::{Activation, Role, Transport};

use super::error::SnepError;
use super::message::{self, MessageError, MessageHeader, Request, Response};
use crate::config::{LinkConfig, SnepConfig};
use crate::llcp::{Connection, LinkState};
use crate::pdu::MAX_FRAME_SIZE;

/// Outcome of [`Session::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Poll {
    /// Activated as initiator; act as SNEP client
    Client,
    /// Activated as target; act as SNEP server
    Server,
    /// No peer within the timeout
    TimedOut,
}

impl Poll {
    /// Numeric outcome: 1 client, 2 server, 0 timed out
    pub fn code(self) -> u8 {
        match self {
            Poll::Client => 1,
            Poll::Server => 2,
            Poll::TimedOut => 0,
        }
    }
}

/// Request handled by [`Session::serve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Served {
    /// Answered a GET with this many bytes
    Get {
        /// Payload bytes sent back
        sent: usize,
    },
    /// Stored a PUT payload of this many bytes
    Put {
        /// Payload bytes copied into the caller's buffer
        received: usize,
    },
}

/// SNEP endpoint over one LLCP connection
pub struct Session<T> {
    llcp: Connection<T>,
    config: SnepConfig,
    rx: [u8; MAX_FRAME_SIZE],
}

impl<T: Transport> Session<T> {
    /// Create a session with the default configuration
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, LinkConfig::default())
    }

    /// Create a session
    pub fn with_config(transport: T, config: LinkConfig) -> Self {
        Self {
            llcp: Connection::with_config(transport, config.llcp),
            config: config.snep,
            rx: [0; MAX_FRAME_SIZE],
        }
    }

    /// Underlying LLCP connection
    pub fn connection(&self) -> &Connection<T> {
        &self.llcp
    }

    /// Underlying LLCP connection, mutably
    pub fn connection_mut(&mut self) -> &mut Connection<T> {
        &mut self.llcp
    }

    /// SNEP configuration
    pub fn config(&self) -> &SnepConfig {
        &self.config
    }

    /// Consume the session and return the transport
    pub fn release(self) -> T {
        self.llcp.release()
    }

    /// Find a peer, trying initiator then target
    ///
    /// Each attempt gets half of `timeout`. With a timeout of zero the
    /// search repeats forever using the configured poll cycle. The link is
    /// activated but not connected on return.
    pub fn poll(&mut self, timeout: u16) -> Result<Poll, SnepError<T::Error>> {
        let forever = timeout == 0;
        let cycle = if forever {
            self.config.poll_cycle_ms
        } else {
            timeout
        };
        // Zero would mean no timeout to the transport
        let attempt = (cycle / 2).max(1);

        loop {
            if self.llcp.activate(attempt, Role::Initiator)?.is_activated() {
                info!("snep: peer found, acting as client");
                return Ok(Poll::Client);
            }
            if self.llcp.activate(attempt, Role::Target)?.is_activated() {
                info!("snep: peer found, acting as server");
                return Ok(Poll::Server);
            }
            if !forever {
                debug!("snep: poll timed out");
                return Ok(Poll::TimedOut);
            }
        }
    }

    /// Connect to the peer's SNEP service
    pub fn connect(&mut self, timeout: u16) -> Result<(), SnepError<T::Error>> {
        Ok(self.llcp.connect(timeout)?)
    }

    /// Wait for the peer to connect to our SNEP service
    pub fn wait_for_connection(&mut self, timeout: u16) -> Result<(), SnepError<T::Error>> {
        Ok(self.llcp.wait_for_connection(timeout)?)
    }

    /// Wait for the peer to disconnect
    pub fn wait_for_disconnection(&mut self, timeout: u16) -> Result<(), SnepError<T::Error>> {
        Ok(self.llcp.wait_for_disconnection(timeout)?)
    }

    /// Disconnect from the peer
    pub fn disconnect(&mut self, timeout: u16) -> Result<(), SnepError<T::Error>> {
        Ok(self.llcp.disconnect(timeout)?)
    }

    /// Push `payload` to the peer and disconnect
    ///
    /// Activates as target and connects first if no connection is up.
    pub fn write(&mut self, payload: &[u8], timeout: u16) -> Result<(), SnepError<T::Error>> {
        match self.llcp.state() {
            LinkState::Idle => {
                self.activate(Role::Target, timeout)?;
                self.llcp.connect(timeout)?;
            }
            LinkState::Activated => self.llcp.connect(timeout)?,
            LinkState::Connected => self.llcp.set_timeout(timeout),
        }

        self.send_request(Request::Put, payload)?;
        self.receive_response(Response::Success)?;
        info!("snep: put {=usize} bytes", payload.len());
        self.llcp.disconnect(timeout)?;
        Ok(())
    }

    /// Receive one PUT payload into `buf`
    ///
    /// Activates as target and waits for a connection first if none is up.
    /// Answers SUCCESS and returns the payload length.
    pub fn read(&mut self, buf: &mut [u8], timeout: u16) -> Result<usize, SnepError<T::Error>> {
        match self.llcp.state() {
            LinkState::Idle => {
                self.activate(Role::Target, timeout)?;
                self.llcp.wait_for_connection(timeout)?;
            }
            LinkState::Activated => self.llcp.wait_for_connection(timeout)?,
            LinkState::Connected => self.llcp.set_timeout(timeout),
        }

        let (header, len) = self.receive_request()?;
        if header.code != Request::Put.as_u8() {
            return self.refuse(header.code);
        }

        let received = self.accept_put(&header, len, buf)?;
        info!("snep: received {=usize} bytes", received);
        Ok(received)
    }

    /// Request an object from a connected peer
    ///
    /// `request` is sent after the acceptable length `max_len`. The response
    /// payload is copied into `response` and its length returned.
    pub fn get(
        &mut self,
        request: &[u8],
        response: &mut [u8],
        max_len: u32,
        timeout: u16,
    ) -> Result<usize, SnepError<T::Error>> {
        self.llcp.set_timeout(timeout);
        let header = message::get_request_header(self.config.version, request.len(), max_len);
        self.llcp.write(&header, request)?;

        let (header, len) = self.receive_response(Response::Success)?;
        if header.length > max_len {
            return Err(SnepError::ExcessData {
                requested: header.length as usize,
                acceptable: max_len,
            });
        }
        self.store(&header, len, response)
    }

    /// Push `payload` to a connected peer without disconnecting
    pub fn put(&mut self, payload: &[u8], timeout: u16) -> Result<(), SnepError<T::Error>> {
        self.llcp.set_timeout(timeout);
        self.send_request(Request::Put, payload)?;
        self.receive_response(Response::Success)?;
        Ok(())
    }

    /// Answer one request on a connected link
    ///
    /// A GET is answered with `buf[..len]`. A PUT payload is stored in `buf`.
    pub fn serve(
        &mut self,
        buf: &mut [u8],
        len: usize,
        timeout: u16,
    ) -> Result<Served, SnepError<T::Error>> {
        if len > buf.len() {
            return Err(SnepError::BufferTooSmall {
                needed: len,
                available: buf.len(),
            });
        }
        self.llcp.set_timeout(timeout);

        let (header, received) = self.receive_request()?;
        match Request::from_u8(header.code) {
            Some(Request::Get) => {
                let info = header.information(&self.rx[..received]);
                if info.len() < 4 {
                    self.send_response(Response::BadRequest, &[])?;
                    return Err(SnepError::ShortMessage(received));
                }
                let acceptable = u32::from_be_bytes([info[0], info[1], info[2], info[3]]);
                if len > acceptable as usize {
                    warn!("snep: response {=usize} > acceptable {=u32}", len, acceptable);
                    self.send_response(Response::ExcessData, &[])?;
                    return Err(SnepError::ExcessData {
                        requested: len,
                        acceptable,
                    });
                }
                self.send_response(Response::Success, &buf[..len])?;
                Ok(Served::Get { sent: len })
            }
            Some(Request::Put) => {
                let stored = self.accept_put(&header, received, buf)?;
                Ok(Served::Put { received: stored })
            }
            _ => self.refuse(header.code),
        }
    }

    fn activate(&mut self, role: Role, timeout: u16) -> Result<(), SnepError<T::Error>> {
        match self.llcp.activate(timeout, role)? {
            Activation::Activated => Ok(()),
            Activation::TimedOut => Err(SnepError::ActivationTimedOut),
        }
    }

    fn send_request(&mut self, code: Request, payload: &[u8]) -> Result<(), SnepError<T::Error>> {
        let header = MessageHeader::new(self.config.version, code.as_u8(), payload.len());
        Ok(self.llcp.write(&header.encode(), payload)?)
    }

    fn send_response(&mut self, code: Response, payload: &[u8]) -> Result<(), SnepError<T::Error>> {
        let header = MessageHeader::new(self.config.version, code.as_u8(), payload.len());
        Ok(self.llcp.write(&header.encode(), payload)?)
    }

    fn receive_response(
        &mut self,
        expected: Response,
    ) -> Result<(MessageHeader, usize), SnepError<T::Error>> {
        let len = self.llcp.read(&mut self.rx)?;
        let header = MessageHeader::validate(&self.rx[..len], self.config.version)?;
        if header.code != expected.as_u8() {
            warn!("snep: unexpected response {=u8}", header.code);
            return Err(SnepError::UnexpectedResponse(header.code));
        }
        Ok((header, len))
    }

    /// Receive and validate a request
    ///
    /// Some peers prepend four bytes to the message; if the version byte
    /// shows up at offset 4 instead of 0 the message is shifted back.
    fn receive_request(&mut self) -> Result<(MessageHeader, usize), SnepError<T::Error>> {
        let mut len = self.llcp.read(&mut self.rx)?;
        let version = self.config.version;
        if len > 4 && self.rx[0] != version && self.rx[4] == version {
            debug!("snep: skipping 4-byte prefix");
            self.rx.copy_within(4..len, 0);
            len -= 4;
        }

        match MessageHeader::validate(&self.rx[..len], version) {
            Ok(header) => Ok((header, len)),
            Err(MessageError::Version(remote)) => {
                warn!("snep: unsupported version {=u8}", remote);
                self.send_response(Response::UnsupportedVersion, &[])?;
                Err(SnepError::VersionMismatch(remote))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Answer a request this operation does not handle
    fn refuse<R>(&mut self, code: u8) -> Result<R, SnepError<T::Error>> {
        warn!("snep: refusing request {=u8}", code);
        let response = match Request::from_u8(code) {
            Some(_) => Response::NotImplemented,
            None => Response::BadRequest,
        };
        self.send_response(response, &[])?;
        Err(SnepError::UnexpectedRequest(code))
    }

    /// Store a PUT payload and answer it
    ///
    /// A payload that does not fit in `buf` is answered with REJECT.
    fn accept_put(
        &mut self,
        header: &MessageHeader,
        len: usize,
        buf: &mut [u8],
    ) -> Result<usize, SnepError<T::Error>> {
        match self.store(header, len, buf) {
            Ok(stored) => {
                self.send_response(Response::Success, &[])?;
                Ok(stored)
            }
            Err(e) => {
                self.send_response(Response::Reject, &[])?;
                Err(e)
            }
        }
    }

    /// Copy the information field of the message in `rx` into `buf`
    fn store(
        &self,
        header: &MessageHeader,
        len: usize,
        buf: &mut [u8],
    ) -> Result<usize, SnepError<T::Error>> {
        let info = header.information(&self.rx[..len]);
        if info.len() > buf.len() {
            return Err(SnepError::BufferTooSmall {
                needed: info.len(),
                available: buf.len(),
            });
        }
        buf[..info.len()].copy_from_slice(info);
        Ok(info.len())
    }
}
