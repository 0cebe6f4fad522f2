pub mod bitbang;
pub mod bits;
pub mod chain;
mod controller;
mod error;
pub mod fake;
pub mod ftdi;
pub mod jtag;
pub mod transport;
mod util;

pub use crate::{
    bits::BitVec,
    chain::ChainPosition,
    controller::Controller,
    error::{Error, Result},
    transport::{EngineTransport, JtagEngine, ScanTransport},
    util::{ShortHex, SpaceHex},
};
