pub mod commands;
pub mod readback;
pub mod registers;
pub mod sweep;
pub mod wrapper;

pub use crate::{
    commands::{ReceiverBlock, RegisterSpace},
    sweep::{SweepConfig, SweepSample, TestPattern},
};
