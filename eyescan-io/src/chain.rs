use crate::bits::BitVec;
use crate::error::{Error, Result};

/// Instruction opcode that parks a chain device in bypass. Every device
/// on the chain is identical, so one opcode and one register width
/// cover them all.
pub const BYPASS_OPCODE: u8 = 0xff;

/// Instruction register width of each chain device.
pub const IR_BITS: usize = 8;

/// Position of the addressed device on a daisy chain of identical
/// devices: `device` is 1-based, `count` is the chain length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainPosition {
    device: usize,
    count: usize,
}

impl ChainPosition {
    /// A chain of one: no padding anywhere.
    pub const SOLO: Self = Self { device: 1, count: 1 };

    pub fn new(device: usize, count: usize) -> Result<Self> {
        if count == 0 || device == 0 || device > count {
            return Err(Error::InvalidChainPosition { device, count });
        }
        Ok(Self { device, count })
    }

    pub fn device(&self) -> usize {
        self.device
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Bits other devices prepend to a captured reply, seen in natural
    /// orientation.
    pub fn reply_skip(&self) -> usize {
        self.count - self.device
    }

    /// Wrap an instruction opcode for the addressed device: every other
    /// device gets a full BYPASS opcode.
    pub fn ir_frame(&self, opcode: &BitVec) -> BitVec {
        let mut framed = BitVec::new();
        for _ in 0..self.count - self.device {
            framed.push_field(BYPASS_OPCODE as u64, IR_BITS);
        }
        framed.extend(opcode);
        for _ in 0..self.device - 1 {
            framed.push_field(BYPASS_OPCODE as u64, IR_BITS);
        }
        framed
    }

    /// Wrap a wire-order data vector: a bypassed device contributes one
    /// pass-through bit, not a full opcode.
    pub fn dr_frame(&self, bits: &BitVec) -> BitVec {
        let mut framed = BitVec::new();
        framed.push_field(0, self.count - self.device);
        framed.extend(bits);
        framed.push_field(0, self.device - 1);
        framed
    }
}
