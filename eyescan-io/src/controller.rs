use tracing::debug;

use crate::bits::BitVec;
use crate::chain::{self, ChainPosition};
use crate::error::Result;
use crate::transport::ScanTransport;

/// Issues chain-addressed register operations over one scan transport.
///
/// The chain position is fixed for the controller's lifetime; every
/// instruction and data shift is wrapped in the bypass padding the
/// addressed position requires.
pub struct Controller<T> {
    transport: T,
    chain: ChainPosition,
}

impl<T: ScanTransport> Controller<T> {
    pub fn new(transport: T, chain: ChainPosition) -> Self {
        Self { transport, chain }
    }

    pub fn chain(&self) -> ChainPosition {
        self.chain
    }

    /// Shift an opcode into the addressed device's instruction
    /// register, every other device parked in bypass.
    pub fn write_ir(&mut self, opcode: u8) -> Result<()> {
        debug!(opcode = format_args!("{opcode:#04x}"), "instruction");
        let bits = BitVec::from_value(opcode as u64, chain::IR_BITS);
        self.transport.write_instruction_register(&self.chain.ir_frame(&bits))
    }

    /// Shift a wire-order vector through the addressed device's data
    /// register. The reply, when captured, still carries the chain and
    /// shift-parity bits; decoding them off is the reader's job.
    pub fn write_dr(&mut self, bits: &BitVec, capture: bool) -> Result<BitVec> {
        debug!(len = bits.len(), capture, "data");
        self.transport.write_data_register(&self.chain.dr_frame(bits), capture)
    }

    pub fn reset(&mut self) -> Result<()> {
        self.transport.reset_tap()
    }

    pub fn idle(&mut self) -> Result<()> {
        self.transport.go_idle()
    }
}
