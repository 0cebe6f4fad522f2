//! Counter extraction from captured diagnostic replies.
//!
//! A captured reply arrives in wire orientation and still carries the
//! bypass bits of the other chain devices plus the block's shift-parity
//! bits. One reversal puts it in natural orientation; after the skips,
//! the four error counters sit at fixed 48-bit strides.

use eyescan_io::{BitVec, ChainPosition, Error, Result};

use crate::commands::ReceiverBlock;
use crate::registers::{self, Diagnostic};

pub const LANE_COUNTERS: usize = registers::LANES;

const COUNTER_BITS: usize = 12;
const LANE_STRIDE: usize = Diagnostic::LANE_BITS;
const FIRST_COUNTER: usize = 2;
/// Bits required past the skips to cover the last counter window.
pub const MIN_REPLY: usize = FIRST_COUNTER + (LANE_COUNTERS - 1) * LANE_STRIDE + COUNTER_BITS;

/// Decode the four per-lane error counters out of a raw captured reply.
pub fn lane_counters(
    reply: &BitVec,
    chain: ChainPosition,
    block: ReceiverBlock,
) -> Result<[u16; LANE_COUNTERS]> {
    let natural = reply.reversed();
    let skip = chain.reply_skip() + block.parity_skip();
    let need = skip + MIN_REPLY;
    if natural.len() < need {
        return Err(Error::ShortReply { got: natural.len(), need });
    }
    let mut counters = [0; LANE_COUNTERS];
    for (lane, counter) in counters.iter_mut().enumerate() {
        let offset = skip + FIRST_COUNTER + lane * LANE_STRIDE;
        *counter = natural.field(offset, COUNTER_BITS) as u16;
    }
    Ok(counters)
}

/// Exact inverse of [`lane_counters`] for a reply of `len` bits: what a
/// well-behaved device puts on the wire when its counters hold
/// `counters`. Instrumentation for the simulated chain and the decoder
/// tests.
pub fn synthesize_reply(
    counters: [u16; LANE_COUNTERS],
    chain: ChainPosition,
    block: ReceiverBlock,
    len: usize,
) -> BitVec {
    let skip = chain.reply_skip() + block.parity_skip();
    assert!(len >= skip + MIN_REPLY, "reply of {len} bits cannot hold the counters");
    let mut natural = BitVec::zeros(len);
    for (lane, counter) in counters.iter().enumerate() {
        let offset = skip + FIRST_COUNTER + lane * LANE_STRIDE;
        for bit in 0..COUNTER_BITS {
            natural.set(offset + bit, counter >> bit & 1 == 1);
        }
    }
    natural.reversed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_come_back_per_lane() {
        for block in ReceiverBlock::ALL {
            let len = Diagnostic::BITS + block.trailing_pad();
            let reply =
                synthesize_reply([0xfff, 0, 0x5a5, 1], ChainPosition::SOLO, block, len);
            let counters = lane_counters(&reply, ChainPosition::SOLO, block).unwrap();
            assert_eq!(counters, [0xfff, 0, 0x5a5, 1], "{block:?}");
        }
    }

    #[test]
    fn chain_offset_is_honored() {
        let chain = ChainPosition::new(2, 4).unwrap();
        let block = ReceiverBlock::R0;
        let len = Diagnostic::BITS + chain.count() - 1;
        let reply = synthesize_reply([7, 8, 9, 10], chain, block, len);
        assert_eq!(lane_counters(&reply, chain, block).unwrap(), [7, 8, 9, 10]);
    }

    #[test]
    fn truncated_reply_is_rejected() {
        let reply = BitVec::zeros(MIN_REPLY - 1);
        assert!(matches!(
            lane_counters(&reply, ChainPosition::SOLO, ReceiverBlock::R1),
            Err(Error::ShortReply { got: 157, need: 158 }),
        ));

        // R0 parity makes the same length insufficient too
        let reply = BitVec::zeros(MIN_REPLY);
        assert!(matches!(
            lane_counters(&reply, ChainPosition::SOLO, ReceiverBlock::R0),
            Err(Error::ShortReply { .. }),
        ));
    }
}
