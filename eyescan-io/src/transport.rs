use crate::bits::BitVec;
use crate::error::Result;

/// One logical scan transport.
///
/// Both realizations — the raw bit-bang waveform and an external JTAG
/// engine — must put bit-identical register content on the chain for
/// the same sequence of calls; everything above this trait is
/// transport-agnostic.
pub trait ScanTransport {
    fn write_instruction_register(&mut self, bits: &BitVec) -> Result<()>;

    /// Shift `bits` through the data register. Returns the captured
    /// reply when `capture` is set, an empty vector otherwise.
    fn write_data_register(&mut self, bits: &BitVec, capture: bool) -> Result<BitVec>;

    /// Drive the TAP through its reset path back to idle.
    fn reset_tap(&mut self) -> Result<()>;

    fn go_idle(&mut self) -> Result<()>;
}

/// Externally supplied JTAG state-machine engine.
///
/// The embedder owns connection setup and teardown semantics; this
/// crate only sequences calls against it.
pub trait JtagEngine {
    fn configure(&mut self, url: &str) -> Result<()>;
    fn reset(&mut self, hardware: bool, tap: bool) -> Result<()>;
    fn write_instruction_register(&mut self, bits: &BitVec) -> Result<()>;
    fn write_data_register(&mut self, bits: &BitVec) -> Result<BitVec>;
    fn change_state(&mut self, name: &str) -> Result<()>;
    fn go_idle(&mut self) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

/// [`ScanTransport`] over a [`JtagEngine`]. Closes the engine when
/// dropped so the connection is released on every exit path.
pub struct EngineTransport<E: JtagEngine> {
    engine: E,
}

impl<E: JtagEngine> EngineTransport<E> {
    pub fn new(mut engine: E, url: &str) -> Result<Self> {
        engine.configure(url)?;
        engine.reset(false, true)?;
        Ok(Self { engine })
    }
}

impl<E: JtagEngine> ScanTransport for EngineTransport<E> {
    fn write_instruction_register(&mut self, bits: &BitVec) -> Result<()> {
        self.engine.write_instruction_register(bits)
    }

    fn write_data_register(&mut self, bits: &BitVec, capture: bool) -> Result<BitVec> {
        let reply = self.engine.write_data_register(bits)?;
        Ok(if capture { reply } else { BitVec::new() })
    }

    fn reset_tap(&mut self) -> Result<()> {
        self.engine.reset(false, true)
    }

    fn go_idle(&mut self) -> Result<()> {
        self.engine.go_idle()
    }
}

impl<E: JtagEngine> Drop for EngineTransport<E> {
    fn drop(&mut self) {
        let _ = self.engine.close();
    }
}
