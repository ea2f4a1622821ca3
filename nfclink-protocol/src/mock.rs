//! Scripted transport for unit tests
//!
//! Replays a queue of inbound frames and records every outbound frame.

extern crate std;

use std::collections::VecDeque;
use std::vec::Vec;

use nfclink_hal::{Activation, Role, Transport};

use crate::pdu::{encode_header, sequence_byte, PduType, SYMM_PDU};

/// Errors injected by the scripted transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    /// Script ran out of inbound frames
    Exhausted,
    /// Radio failure during activation
    Radio,
    /// Write rejected
    WriteFailed,
}

/// One transport operation, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Activate(Role, u16),
    Write(Vec<u8>),
    Read(u16),
}

pub struct ScriptedTransport {
    inbound: VecDeque<Vec<u8>>,
    pub ops: Vec<Op>,
    pub initiator: Result<Activation, MockError>,
    pub target: Result<Activation, MockError>,
    /// Fail the write with this index (0-based)
    pub fail_write: Option<usize>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            inbound: VecDeque::new(),
            ops: Vec::new(),
            initiator: Ok(Activation::Activated),
            target: Ok(Activation::Activated),
            fail_write: None,
        }
    }

    /// Queue a raw inbound frame
    pub fn push(&mut self, frame: &[u8]) -> &mut Self {
        self.inbound.push_back(frame.to_vec());
        self
    }

    pub fn push_symm(&mut self) -> &mut Self {
        self.push(&SYMM_PDU)
    }

    /// Queue an unsequenced control PDU
    pub fn push_control(&mut self, dsap: u8, ssap: u8, ptype: PduType) -> &mut Self {
        self.push(&encode_header(dsap, ssap, ptype))
    }

    /// Queue the peer's PAX with the given version
    pub fn push_pax(&mut self, version: u8) -> &mut Self {
        let mut frame = encode_header(0, 0, PduType::Pax).to_vec();
        frame.extend_from_slice(&[0x01, 0x01, version, 0x03, 0x02, 0x00, 0x11]);
        self.push(&frame)
    }

    /// Queue an I PDU
    pub fn push_info(&mut self, dsap: u8, ssap: u8, ns: u8, nr: u8, payload: &[u8]) -> &mut Self {
        let mut frame = encode_header(dsap, ssap, PduType::I).to_vec();
        frame.push(sequence_byte(ns, nr));
        frame.extend_from_slice(payload);
        self.push(&frame)
    }

    /// Queue an RR PDU
    pub fn push_rr(&mut self, dsap: u8, ssap: u8, nr: u8) -> &mut Self {
        let mut frame = encode_header(dsap, ssap, PduType::Rr).to_vec();
        frame.push(sequence_byte(0, nr));
        self.push(&frame)
    }

    pub fn remaining(&self) -> usize {
        self.inbound.len()
    }

    /// Every frame written, in order
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Write(frame) => Some(frame.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Transport for ScriptedTransport {
    type Error = MockError;

    fn activate_as_initiator(&mut self, timeout: u16) -> Result<Activation, MockError> {
        self.ops.push(Op::Activate(Role::Initiator, timeout));
        self.initiator
    }

    fn activate_as_target(&mut self, timeout: u16) -> Result<Activation, MockError> {
        self.ops.push(Op::Activate(Role::Target, timeout));
        self.target
    }

    fn write(&mut self, header: &[u8], body: &[u8]) -> Result<(), MockError> {
        let index = self.written().len();
        let mut frame = header.to_vec();
        frame.extend_from_slice(body);
        self.ops.push(Op::Write(frame));
        if self.fail_write == Some(index) {
            return Err(MockError::WriteFailed);
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], timeout: u16) -> Result<usize, MockError> {
        self.ops.push(Op::Read(timeout));
        let frame = self.inbound.pop_front().ok_or(MockError::Exhausted)?;
        let len = frame.len().min(buf.len());
        buf[..len].copy_from_slice(&frame[..len]);
        Ok(len)
    }
}
