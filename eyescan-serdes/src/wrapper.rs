//! Wrapper transaction sequencing over the generic scan controller.

use eyescan_io::{BitVec, Controller, Result, ScanTransport};
use tracing::debug;

use crate::commands::{self, ReceiverBlock, RegisterSpace};

/// Point the wrapper at one register space of one receiver block and
/// leave the chain ready for data shifts: instruction access, select
/// word, a TAP reset pulse, back to data access. Any number of data
/// shifts may follow under the one selection.
pub fn select_space<T: ScanTransport>(
    cont: &mut Controller<T>,
    block: ReceiverBlock,
    space: RegisterSpace,
) -> Result<()> {
    debug!(?block, ?space, "select");
    cont.write_ir(commands::WRAPPER_INSTRUCTION)?;
    let word = commands::select_word(block, space);
    cont.write_dr(&BitVec::from_value(word as u64, commands::SELECT_BITS), false)?;
    cont.reset()?;
    cont.write_ir(commands::WRAPPER_DATA)?;
    cont.idle()
}

/// Shift one natural-orientation register vector into the selected
/// space. The single natural-to-wire reversal happens here, followed by
/// the block's trailing pad.
pub fn shift_vector<T: ScanTransport>(
    cont: &mut Controller<T>,
    block: ReceiverBlock,
    vector: &BitVec,
    capture: bool,
) -> Result<BitVec> {
    let mut wire = vector.reversed();
    wire.push_field(0, block.trailing_pad());
    cont.write_dr(&wire, capture)
}

/// Select a register space and write one vector into it.
pub fn write_register<T: ScanTransport>(
    cont: &mut Controller<T>,
    block: ReceiverBlock,
    space: RegisterSpace,
    vector: &BitVec,
) -> Result<()> {
    select_space(cont, block, space)?;
    shift_vector(cont, block, vector, false)?;
    Ok(())
}
