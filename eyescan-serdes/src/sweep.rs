//! The outer sweep: configure each receiver block, then walk
//! voltage × bit-select × phase and stream the decoded lane counters.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use eyescan_io::{BitVec, Controller, Error, Result, ScanTransport};
use tracing::{debug, info};

use crate::commands::{ReceiverBlock, RegisterSpace};
use crate::readback;
use crate::registers::{Configuration, CoreControl, Diagnostic};
use crate::wrapper;

/// Voltage offsets walked per bit lane, +31 down to -32.
pub const VOLTAGE_STEPS: usize = 64;
/// Phase offsets walked per voltage, +15 down to -16.
pub const PHASE_STEPS: usize = 32;

/// Receiver test pattern driven during the scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TestPattern {
    Off,
    #[default]
    Prbs7,
    Prbs15,
    Prbs23,
    Prbs31,
}

impl TestPattern {
    /// Field code in the core-control test-pattern select.
    pub const fn code(self) -> u8 {
        match self {
            TestPattern::Off => 0,
            TestPattern::Prbs7 => 1,
            TestPattern::Prbs15 => 2,
            TestPattern::Prbs23 => 3,
            TestPattern::Prbs31 => 4,
        }
    }

    /// [`FromStr`] with the crate's configuration error, for argument
    /// parsing.
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str(s).map_err(|_| Error::UnknownTestPattern(s.to_owned()))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SweepConfig {
    /// Bit lanes probed per voltage step.
    pub bit_number: u8,
    pub pattern: TestPattern,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self { bit_number: 1, pattern: TestPattern::default() }
    }
}

impl SweepConfig {
    /// Samples a full two-block sweep emits.
    pub fn expected_samples(&self) -> u64 {
        let per_block = VOLTAGE_STEPS * PHASE_STEPS * readback::LANE_COUNTERS;
        (ReceiverBlock::ALL.len() * per_block) as u64 * self.bit_number as u64
    }
}

/// One decoded eye sample. Immutable once produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweepSample {
    pub lane: u8,
    pub bit_select: u8,
    pub voltage: i8,
    pub phase: i8,
    pub counter: u16,
}

impl fmt::Display for SweepSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.lane, self.bit_select, self.voltage, self.phase, self.counter,
        )
    }
}

fn operating_core(pattern: TestPattern) -> CoreControl {
    CoreControl {
        enpll: true,
        mpy: 20,
        enrx: true,
        buswidth: 2,
        term: 1,
        eq: 1,
        enoc: true,
        cfg_ovr: true,
        testpatt: pattern.code(),
        ..CoreControl::default()
    }
}

/// Unlock-and-program sequence for one block: baseline configuration,
/// write enables for the core and char spaces, then the operating core
/// inputs.
fn configure_block<T: ScanTransport>(
    cont: &mut Controller<T>,
    block: ReceiverBlock,
    pattern: TestPattern,
) -> Result<()> {
    let baseline = Configuration::default().encode();
    wrapper::write_register(cont, block, RegisterSpace::Configuration, &baseline)?;
    let unlock = Configuration::unlock_core_char().encode();
    wrapper::write_register(cont, block, RegisterSpace::Configuration, &unlock)?;
    let core = operating_core(pattern).encode();
    wrapper::write_register(cont, block, RegisterSpace::CoreInputs, &core)?;
    Ok(())
}

fn probe<T: ScanTransport>(
    cont: &mut Controller<T>,
    block: ReceiverBlock,
    phase: i8,
    bit_select: u8,
    voltage: i8,
) -> Result<BitVec> {
    let vector = Diagnostic::probe(phase, bit_select, voltage).encode();
    wrapper::shift_vector(cont, block, &vector, true)
}

/// Sweep one receiver block, streaming samples into `out`. Returns the
/// number of samples emitted.
pub fn run_block<T: ScanTransport, W: Write>(
    cont: &mut Controller<T>,
    block: ReceiverBlock,
    config: &SweepConfig,
    out: &mut W,
) -> Result<u64> {
    info!(?block, pattern = %config.pattern, "configuring receiver block");
    configure_block(cont, block, config.pattern)?;

    let mut emitted = 0;
    for voltage in (-32..=31i8).rev() {
        debug!(voltage, "voltage step");
        for bit_select in 0..config.bit_number {
            wrapper::select_space(cont, block, RegisterSpace::Readback)?;
            // shadow-register pipeline fill: the first capture at a new
            // probe point returns the previous point's counters
            probe(cont, block, 0, bit_select, voltage)?;
            for phase in (-16..=15i8).rev() {
                let reply = probe(cont, block, phase, bit_select, voltage)?;
                let counters = readback::lane_counters(&reply, cont.chain(), block)?;
                for (lane, counter) in counters.iter().enumerate() {
                    let sample = SweepSample {
                        lane: block.lane_base() + lane as u8,
                        bit_select,
                        voltage,
                        phase,
                        counter: *counter,
                    };
                    writeln!(out, "{sample}")?;
                    emitted += 1;
                }
                out.flush()?;
            }
        }
    }
    Ok(emitted)
}

/// Full sweep across both receiver blocks.
pub fn run<T: ScanTransport, W: Write>(
    cont: &mut Controller<T>,
    config: &SweepConfig,
    out: &mut W,
) -> Result<u64> {
    let mut total = 0;
    for block in ReceiverBlock::ALL {
        total += run_block(cont, block, config, out)?;
    }
    info!(total, "sweep complete");
    Ok(total)
}
