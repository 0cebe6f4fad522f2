//! Test doubles for both transports.
//!
//! [`SimulatedChain`] is a [`Channel`] that clocks written samples
//! through the real TAP transition table, records every completed
//! instruction/data shift and answers data shifts with queued TDO
//! replies, so the whole bit-bang stack can run without hardware.
//! [`FakeEngine`] records the same operations at the engine interface;
//! comparing the two logs is what pins the cross-backend equivalence.
//!
//! Everything here is single-threaded by design, hence the plain
//! `Rc<RefCell<_>>` handles.

use std::{cell::RefCell, collections::VecDeque, io, rc::Rc};

use crate::bitbang::{Channel, ShiftRegister, signal};
use crate::bits::BitVec;
use crate::error::Result;
use crate::jtag::State;
use crate::transport::JtagEngine;

/// One completed register shift as seen by the device.
#[derive(Clone, Debug)]
pub struct Shift {
    pub register: ShiftRegister,
    pub bits: BitVec,
}

#[derive(Default)]
pub struct ChainState {
    /// Every completed shift, in order.
    pub shifts: Vec<Shift>,
    /// Replies played on TDO, one per data-register shift.
    pub dr_replies: VecDeque<BitVec>,
    /// Fallback reply once the queue is empty.
    pub default_dr_reply: Option<BitVec>,
}

impl ChainState {
    fn next_reply(&mut self) -> BitVec {
        self.dr_replies
            .pop_front()
            .or_else(|| self.default_dr_reply.clone())
            .unwrap_or_default()
    }

    pub fn shifts_of(&self, register: ShiftRegister) -> Vec<&Shift> {
        self.shifts.iter().filter(|s| s.register == register).collect()
    }
}

pub type ChainHandle = Rc<RefCell<ChainState>>;

pub struct SimulatedChain {
    state: ChainHandle,
    tap: State,
    prev_tck: bool,
    shift_in: BitVec,
    reply: BitVec,
    reply_pos: usize,
    echo: VecDeque<u8>,
}

impl SimulatedChain {
    pub fn new() -> (Self, ChainHandle) {
        let state = ChainHandle::default();
        let chain = Self {
            state: state.clone(),
            tap: State::TestLogicReset,
            prev_tck: false,
            shift_in: BitVec::new(),
            reply: BitVec::new(),
            reply_pos: 0,
            echo: VecDeque::new(),
        };
        (chain, state)
    }

    fn rising_edge(&mut self, tms: bool, tdi: bool) {
        let shifting = match self.tap {
            State::ShiftDr => {
                self.reply_pos += 1;
                Some(ShiftRegister::Data)
            }
            State::ShiftIr => Some(ShiftRegister::Instruction),
            _ => None,
        };
        if shifting.is_some() {
            self.shift_in.push(tdi);
        }

        let next = self.tap.step(tms);
        if let (Some(register), State::Exit1Dr | State::Exit1Ir) = (shifting, next) {
            let bits = std::mem::take(&mut self.shift_in);
            self.state.borrow_mut().shifts.push(Shift { register, bits });
        }
        if next == State::CaptureDr {
            self.reply = self.state.borrow_mut().next_reply();
            self.reply_pos = 0;
            self.shift_in = BitVec::new();
        }
        if next == State::CaptureIr {
            self.shift_in = BitVec::new();
        }
        self.tap = next;
    }
}

impl Channel for SimulatedChain {
    fn write(&mut self, samples: &[u8]) -> io::Result<usize> {
        for &sample in samples {
            let tck = sample & signal::TCK != 0;
            let tms = sample & signal::TMS != 0;
            let tdi = sample & signal::TDI != 0;

            let mut out = sample & !signal::TDO;
            if self.tap == State::ShiftDr
                && self.reply_pos < self.reply.len()
                && self.reply.bit(self.reply_pos)
            {
                out |= signal::TDO;
            }

            if tck && !self.prev_tck {
                self.rising_edge(tms, tdi);
            }
            self.prev_tck = tck;
            self.echo.push_back(out);
        }
        Ok(samples.len())
    }

    fn read_exact(&mut self, samples: &mut [u8]) -> io::Result<()> {
        for slot in samples {
            *slot = self.echo.pop_front().ok_or(io::ErrorKind::UnexpectedEof)?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct EngineLog {
    pub url: Option<String>,
    pub ir: Vec<BitVec>,
    pub dr: Vec<BitVec>,
    pub resets: usize,
    pub idles: usize,
    pub closed: bool,
    pub dr_replies: VecDeque<BitVec>,
    pub default_dr_reply: Option<BitVec>,
}

pub type EngineHandle = Rc<RefCell<EngineLog>>;

/// Recording [`JtagEngine`].
pub struct FakeEngine {
    log: EngineHandle,
}

impl FakeEngine {
    pub fn new() -> (Self, EngineHandle) {
        let log = EngineHandle::default();
        (Self { log: log.clone() }, log)
    }
}

impl JtagEngine for FakeEngine {
    fn configure(&mut self, url: &str) -> Result<()> {
        self.log.borrow_mut().url = Some(url.to_owned());
        Ok(())
    }

    fn reset(&mut self, _hardware: bool, _tap: bool) -> Result<()> {
        self.log.borrow_mut().resets += 1;
        Ok(())
    }

    fn write_instruction_register(&mut self, bits: &BitVec) -> Result<()> {
        self.log.borrow_mut().ir.push(bits.clone());
        Ok(())
    }

    fn write_data_register(&mut self, bits: &BitVec) -> Result<BitVec> {
        let mut log = self.log.borrow_mut();
        log.dr.push(bits.clone());
        let reply = log
            .dr_replies
            .pop_front()
            .or_else(|| log.default_dr_reply.clone())
            .unwrap_or_else(|| BitVec::zeros(bits.len()));
        Ok(reply)
    }

    fn change_state(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    fn go_idle(&mut self) -> Result<()> {
        self.log.borrow_mut().idles += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.log.borrow_mut().closed = true;
        Ok(())
    }
}
