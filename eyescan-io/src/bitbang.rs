//! Waveform codec for the raw synchronous bit-bang transport.
//!
//! Every JTAG clock is two samples wide; a sample byte carries all five
//! wire signals at once. The channel echoes each written sample with the
//! input pins as they were at that instant, so a shift's reply is read
//! straight out of the TDO plane of the echo.
//!
//! The TMS content of every frame is derived from the TAP transition
//! table in [`crate::jtag`]; only the pacing around the walks (settle
//! pairs, idle clocks, run-out) is fixed here.

use std::io;

use tracing::{debug, instrument};

use crate::bits::BitVec;
use crate::error::{Error, Result};
use crate::jtag::{self, State, TmsPath};
use crate::transport::ScanTransport;
use crate::util::{ShortHex, SpaceHex};

/// Byte-oriented duplex channel in synchronous bit-bang mode.
pub trait Channel {
    fn write(&mut self, samples: &[u8]) -> io::Result<usize>;
    fn read_exact(&mut self, samples: &mut [u8]) -> io::Result<()>;
}

pub mod signal {
    pub const TCK: u8 = 1 << 0;
    pub const TDI: u8 = 1 << 1;
    /// Input plane; written low, carries the device's data in the echo.
    pub const TDO: u8 = 1 << 2;
    pub const TMS: u8 = 1 << 3;
    /// Active low, held released for the whole sweep.
    pub const TRST_N: u8 = 1 << 4;
}

/// Pin mask for channel setup: every signal but TDO is an output.
pub const OUTPUT_PINS: u8 = signal::TCK | signal::TDI | signal::TMS | signal::TRST_N;

// Pacing around the data clocks: unclocked settle pairs up front, a few
// idle clocks before the walk into the shift state, a run-out after the
// walk back, one final low half-cycle.
const SETTLE_PAIRS: usize = 5;
const LEAD_IDLE_CLOCKS: usize = 4;
const TAIL_IDLE_CLOCKS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftRegister {
    Instruction,
    Data,
}

impl ShiftRegister {
    pub const fn shift_state(self) -> State {
        match self {
            ShiftRegister::Instruction => State::ShiftIr,
            ShiftRegister::Data => State::ShiftDr,
        }
    }
}

/// One fully expanded waveform plus the geometry needed to pull the
/// reply back out of the channel echo.
pub struct Frame {
    samples: Vec<u8>,
    reply_start: usize,
    reply_len: usize,
}

impl Frame {
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }
}

#[derive(Default)]
struct FrameBuilder {
    samples: Vec<u8>,
}

impl FrameBuilder {
    /// Two samples with the clock held low.
    fn settle(&mut self) {
        self.samples.push(signal::TRST_N);
        self.samples.push(signal::TRST_N);
    }

    /// One clock: signals held for both half-cycles, TCK low then high.
    fn clock(&mut self, tms: bool, tdi: bool) {
        let mut base = signal::TRST_N;
        if tms {
            base |= signal::TMS;
        }
        if tdi {
            base |= signal::TDI;
        }
        self.samples.push(base);
        self.samples.push(base | signal::TCK);
    }

    fn finish(mut self, reply_start: usize, reply_len: usize) -> Frame {
        // final low half-cycle so the clock never parks high
        self.samples.push(signal::TRST_N);
        Frame { samples: self.samples, reply_start, reply_len }
    }
}

/// Expand one register shift into a full waveform. `bits` is wire
/// orientation, first bit shifted first; the last bit rides the first
/// TMS step of the walk back to idle.
pub fn shift_frame(reg: ShiftRegister, bits: &BitVec) -> Frame {
    assert!(!bits.is_empty());
    let walk_in = jtag::shortest_path(State::RunTestIdle, reg.shift_state());
    let walk_out = jtag::shortest_path(reg.shift_state(), State::RunTestIdle);

    let mut b = FrameBuilder::default();
    for _ in 0..SETTLE_PAIRS {
        b.settle();
    }
    for _ in 0..LEAD_IDLE_CLOCKS {
        b.clock(false, false);
    }
    for tms in walk_in {
        b.clock(tms, false);
    }
    // reply bit k sits in the high half-cycle of data clock k
    let reply_start = b.samples.len() + 1;
    let last = bits.len() - 1;
    for (idx, bit) in bits.iter().enumerate() {
        b.clock(idx == last && walk_out.first(), bit);
    }
    for tms in walk_out.tail() {
        b.clock(tms, false);
    }
    for _ in 0..TAIL_IDLE_CLOCKS {
        b.clock(false, false);
    }
    b.finish(reply_start, bits.len())
}

/// TMS-only housekeeping frame: the given walk plus a short idle run.
pub fn tms_frame(path: TmsPath) -> Frame {
    let mut b = FrameBuilder::default();
    for _ in 0..SETTLE_PAIRS {
        b.settle();
    }
    for tms in path {
        b.clock(tms, false);
    }
    for _ in 0..LEAD_IDLE_CLOCKS {
        b.clock(false, false);
    }
    b.finish(0, 0)
}

/// Pull the shifted-out bits from the channel echo of `frame`.
pub fn extract_reply(frame: &Frame, echo: &[u8]) -> Result<BitVec> {
    let mut reply = BitVec::new();
    for k in 0..frame.reply_len {
        let sample = echo
            .get(frame.reply_start + 2 * k)
            .ok_or(Error::ShortReply { got: k, need: frame.reply_len })?;
        reply.push(sample & signal::TDO != 0);
    }
    Ok(reply)
}

/// [`ScanTransport`] over a raw bit-bang channel.
pub struct BitbangTransport<C> {
    channel: C,
}

impl<C: Channel> BitbangTransport<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    fn run(&mut self, frame: &Frame) -> Result<Vec<u8>> {
        let samples = frame.samples();
        debug!(write_len = samples.len(), data = %SpaceHex(samples));
        let written = self.channel.write(samples)?;
        if written != samples.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short waveform write: {written} of {}", samples.len()),
            )
            .into());
        }
        let mut echo = vec![0; samples.len()];
        self.channel.read_exact(&mut echo)?;
        Ok(echo)
    }
}

impl<C: Channel> ScanTransport for BitbangTransport<C> {
    #[instrument(skip_all)]
    fn write_instruction_register(&mut self, bits: &BitVec) -> Result<()> {
        let frame = shift_frame(ShiftRegister::Instruction, bits);
        debug!(bits = %bits, samples = frame.samples().len(), data = %ShortHex(frame.samples()));
        self.run(&frame)?;
        Ok(())
    }

    #[instrument(skip_all)]
    fn write_data_register(&mut self, bits: &BitVec, capture: bool) -> Result<BitVec> {
        let frame = shift_frame(ShiftRegister::Data, bits);
        debug!(len = bits.len(), capture, samples = frame.samples().len());
        let echo = self.run(&frame)?;
        if capture {
            extract_reply(&frame, &echo)
        } else {
            Ok(BitVec::new())
        }
    }

    #[instrument(skip_all)]
    fn reset_tap(&mut self) -> Result<()> {
        self.run(&tms_frame(TmsPath::TO_IDLE))?;
        Ok(())
    }

    #[instrument(skip_all)]
    fn go_idle(&mut self) -> Result<()> {
        self.run(&tms_frame(TmsPath::EMPTY))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference construction: build the five signal planes the way the
    // wrapper's documented waveforms lay them out, one char per sample,
    // and interleave at the end. Kept deliberately independent of the
    // packed builder above.
    fn plane(parts: &[&str]) -> Vec<bool> {
        parts
            .iter()
            .flat_map(|p| p.chars())
            .map(|c| c == '1')
            .collect()
    }

    fn interleave(trst: &[bool], tms: &[bool], tdi: &[bool], tck: &[bool]) -> Vec<u8> {
        assert_eq!(trst.len(), tms.len());
        assert_eq!(trst.len(), tdi.len());
        assert_eq!(trst.len(), tck.len());
        (0..trst.len())
            .map(|i| {
                (trst[i] as u8) << 4
                    | (tms[i] as u8) << 3
                    | (tdi[i] as u8) << 1
                    | tck[i] as u8
            })
            .collect()
    }

    fn doubled(bits: &BitVec) -> String {
        bits.iter()
            .flat_map(|b| {
                let c = if b { '1' } else { '0' };
                [c, c]
            })
            .collect()
    }

    #[test]
    fn data_frame_matches_reference_planes() {
        let bits: BitVec = [true, false, true, true].into_iter().collect();
        let n = bits.len();

        let trst = plane(&[&"1".repeat(2 * n + 49)]);
        let tms = plane(&[
            &"0".repeat(18),
            "1100",
            &"0".repeat(2 * (n - 1)),
            "00111100000000000000000000000",
        ]);
        let tdi = plane(&[&"0".repeat(24), &doubled(&bits), &"0".repeat(25)]);
        let tck = plane(&[&"0".repeat(10), &"01".repeat(7 + n + 12), "0"]);
        let expected = interleave(&trst, &tms, &tdi, &tck);

        let frame = shift_frame(ShiftRegister::Data, &bits);
        assert_eq!(frame.samples(), expected);
        assert_eq!(frame.samples().len(), 2 * n + 49);
    }

    #[test]
    fn instruction_frame_matches_reference_planes() {
        let bits = BitVec::from_value(0x6d, 8);
        let n = bits.len();

        let trst = plane(&[&"1".repeat(2 * n + 51)]);
        let tms = plane(&[
            &"0".repeat(18),
            "11110000",
            &"0".repeat(2 * (n - 1)),
            "111100000000000000000000000",
        ]);
        let tdi = plane(&[&"0".repeat(26), &doubled(&bits), &"0".repeat(25)]);
        let tck = plane(&[&"0".repeat(10), &"01".repeat(8 + n + 12), "0"]);
        let expected = interleave(&trst, &tms, &tdi, &tck);

        let frame = shift_frame(ShiftRegister::Instruction, &bits);
        assert_eq!(frame.samples(), expected);
        assert_eq!(frame.samples().len(), 2 * n + 51);
    }

    #[test]
    fn reply_comes_from_the_tdo_plane() {
        let bits = BitVec::zeros(6);
        let frame = shift_frame(ShiftRegister::Data, &bits);
        let mut echo = frame.samples().to_vec();
        // device drives bits 1 and 4 of its reply
        echo[frame.reply_start + 2] |= signal::TDO;
        echo[frame.reply_start + 8] |= signal::TDO;
        let reply = extract_reply(&frame, &echo).unwrap();
        assert_eq!(reply.to_string(), "010010");
    }

    #[test]
    fn truncated_echo_is_a_protocol_violation() {
        let bits = BitVec::zeros(6);
        let frame = shift_frame(ShiftRegister::Data, &bits);
        let echo = &frame.samples()[..frame.reply_start + 4];
        assert!(matches!(
            extract_reply(&frame, echo),
            Err(Error::ShortReply { .. }),
        ));
    }

    #[test]
    fn tms_frame_walks_the_given_path() {
        let frame = tms_frame(TmsPath::TO_IDLE);
        // settle pairs, six walk clocks, four idle clocks, run-out sample
        assert_eq!(frame.samples().len(), 2 * SETTLE_PAIRS + 2 * (6 + 4) + 1);
        let walk: Vec<bool> = frame.samples()[2 * SETTLE_PAIRS..]
            .chunks(2)
            .take(6)
            .map(|pair| pair[0] & signal::TMS != 0)
            .collect();
        assert_eq!(walk, [true, true, true, true, true, false]);
    }
}
