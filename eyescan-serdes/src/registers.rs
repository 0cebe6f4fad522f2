//! Wrapper register layouts.
//!
//! Every vector is fixed-length regardless of field values: two leading
//! guard bits, the payload, one trailing guard bit. The per-lane block
//! is replicated once per physical receiver lane and all four copies
//! carry the same values. Field values wider than their declared width
//! are reduced modulo 2^width rather than rejected — the register
//! protocol has always worked that way; the signed sweep coordinates
//! wrap through the explicit two's-complement conversions in
//! [`Diagnostic::encode`] instead of leaning on it.

use bitflags::bitflags;
use eyescan_io::BitVec;

/// Physical receiver lanes per block, and in-register copies of the
/// per-lane field block.
pub const LANES: usize = 4;

const GUARD_HEAD: usize = 2;
const GUARD_TAIL: usize = 1;

fn guarded(payload: impl FnOnce(&mut BitVec)) -> BitVec {
    let mut v = BitVec::new();
    v.push_field(0, GUARD_HEAD);
    payload(&mut v);
    v.push_field(0, GUARD_TAIL);
    v
}

bitflags! {
    /// Per-lane write-enable block of the configuration register, one
    /// flag per protected register space.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct WriteEnable: u8 {
        const CORE = 1 << 0;
        const TUNING = 1 << 1;
        const DEBUG = 1 << 2;
        const CHAR = 1 << 3;
        const UNSHADOWED = 1 << 4;
    }
}

/// Write-protection options for the other register spaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Configuration {
    pub core_we_head: bool,
    pub lanes: WriteEnable,
    pub core_we_tail: bool,
    pub tuning_we_tail: bool,
    pub debug_we_tail: bool,
}

impl Configuration {
    pub const BITS: usize = 27;

    /// Enables required before the core and char spaces accept writes.
    pub fn unlock_core_char() -> Self {
        Self {
            core_we_head: true,
            lanes: WriteEnable::CORE | WriteEnable::CHAR,
            core_we_tail: true,
            ..Self::default()
        }
    }

    pub fn encode(&self) -> BitVec {
        let v = guarded(|v| {
            v.push(self.core_we_head);
            for _ in 0..LANES {
                v.push(self.lanes.contains(WriteEnable::CORE));
                v.push(self.lanes.contains(WriteEnable::TUNING));
                v.push(self.lanes.contains(WriteEnable::DEBUG));
                v.push(self.lanes.contains(WriteEnable::CHAR));
                v.push(self.lanes.contains(WriteEnable::UNSHADOWED));
            }
            v.push(self.core_we_tail);
            v.push(self.tuning_we_tail);
            v.push(self.debug_we_tail);
        });
        debug_assert_eq!(v.len(), Self::BITS);
        v
    }
}

/// Core-side control and status fields. The same fields are reachable
/// from the core's dedicated ports, which is why `cfg_ovr` must be set
/// for the scanned values to win.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoreControl {
    // global header
    pub enpll: bool,
    pub mpy: u8,
    pub vrange: bool,
    pub endivclk: bool,
    pub lb: u8,
    // per-lane block
    pub enrx: bool,
    pub sleeprx: bool,
    pub buswidth: u8,
    pub rate: u8,
    pub invpair: bool,
    pub term: u8,
    pub align: u8,
    pub los: u8,
    pub cdr: u8,
    pub eq: u8,
    pub eqhld: bool,
    pub enoc: bool,
    pub loopback: u8,
    pub bsinrxp: bool,
    pub bsinrxn: bool,
    pub testpatt: u8,
    pub testfail: bool,
    pub losdtct_rl: bool,
    pub bsrxp: bool,
    pub bsrxn: bool,
    pub ocip: bool,
    pub eqover: bool,
    pub equnder: bool,
    pub losdtct_st: bool,
    pub sync: bool,
    // global trailer
    pub clkbyp: u8,
    pub sleeppll: bool,
    pub lock: bool,
    pub bsinitclk: bool,
    pub enbstx: bool,
    pub enbsrx: bool,
    pub enbspt: bool,
    pub nearlock: bool,
    pub unlock: bool,
    pub cfg_ovr: bool,
}

impl CoreControl {
    pub const BITS: usize = 197;

    pub fn encode(&self) -> BitVec {
        let v = guarded(|v| {
            v.push(self.enpll);
            v.push_field(self.mpy as u64, 8);
            v.push(self.vrange);
            v.push(self.endivclk);
            v.push_field(self.lb as u64, 2);
            for _ in 0..LANES {
                v.push(self.enrx);
                v.push(self.sleeprx);
                v.push_field(self.buswidth as u64, 3);
                v.push_field(self.rate as u64, 2);
                v.push(self.invpair);
                v.push_field(self.term as u64, 3);
                v.push_field(self.align as u64, 2);
                v.push_field(self.los as u64, 3);
                v.push_field(self.cdr as u64, 3);
                v.push_field(self.eq as u64, 3);
                v.push(self.eqhld);
                v.push(self.enoc);
                v.push_field(self.loopback as u64, 2);
                v.push(self.bsinrxp);
                v.push(self.bsinrxn);
                v.push(false); // reserved
                v.push_field(self.testpatt as u64, 3);
                v.push(self.testfail);
                v.push(self.losdtct_rl);
                v.push(self.bsrxp);
                v.push(self.bsrxn);
                v.push(self.ocip);
                v.push(self.eqover);
                v.push(self.equnder);
                v.push(self.losdtct_st);
                v.push(self.sync);
                v.push(false); // lane pad
            }
            v.push_field(self.clkbyp as u64, 2);
            v.push(self.sleeppll);
            v.push(false); // reserved
            v.push(self.lock);
            v.push(self.bsinitclk);
            v.push(self.enbstx);
            v.push(self.enbsrx);
            v.push(self.enbspt);
            v.push(false); // reserved
            v.push(self.nearlock);
            v.push(self.unlock);
            v.push(self.cfg_ovr);
        });
        debug_assert_eq!(v.len(), Self::BITS);
        v
    }
}

/// Eye-scan ("char") register. The sweep writes the three probe-point
/// fields; `ecount` is the only field that ever comes back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Diagnostic {
    pub testfail: bool,
    pub ecount: u16,
    pub esword: u8,
    pub es: u8,
    pub phase_offset: i8,
    pub bit_select: u8,
    pub voltage_offset: i8,
    pub voltage_offset_override: bool,
    pub scan_len: u8,
    pub scan_run: bool,
    pub scan_done: bool,
}

impl Diagnostic {
    pub const BITS: usize = 195;
    pub const LANE_BITS: usize = 48;

    /// Probe point for one eye sample. The signed offsets go out as
    /// 7-/6-bit two's complement, which is what lets the sweep walk
    /// from +31 down to -32 with a plain decrement.
    pub fn probe(phase_offset: i8, bit_select: u8, voltage_offset: i8) -> Self {
        Self { phase_offset, bit_select, voltage_offset, ..Self::default() }
    }

    pub fn encode(&self) -> BitVec {
        let v = guarded(|v| {
            for _ in 0..LANES {
                v.push(self.testfail);
                v.push_field(self.ecount as u64, 12);
                v.push_field(self.esword as u64, 8);
                v.push_field(self.es as u64, 4);
                v.push_field(self.phase_offset as u8 as u64, 7);
                v.push_field(self.bit_select as u64, 5);
                v.push_field(self.voltage_offset as u8 as u64, 6);
                v.push(self.voltage_offset_override);
                v.push_field(self.scan_len as u64, 2);
                v.push(self.scan_run);
                v.push(self.scan_done);
            }
        });
        debug_assert_eq!(v.len(), Self::BITS);
        v
    }
}
