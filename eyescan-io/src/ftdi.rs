//! libftdi channel for the synchronous bit-bang transport.

use std::io::{self, Read, Write};

use tracing::debug;

use crate::bitbang::{Channel, OUTPUT_PINS};
use crate::error::Result;

pub struct Device {
    dev: ftdi::Device,
}

impl Device {
    /// Open the interface at `vid:pid` and put it into synchronous
    /// bit-bang mode with the scan signals driven as outputs.
    pub fn open(vid: u16, pid: u16, baud: u32) -> Result<Self> {
        let mut dev = ftdi::find_by_vid_pid(vid, pid)
            .open()
            .map_err(io::Error::other)?;
        dev.usb_reset().map_err(io::Error::other)?;
        dev.usb_purge_buffers().map_err(io::Error::other)?;
        dev.set_baud_rate(baud).map_err(io::Error::other)?;
        dev.set_bitmode(OUTPUT_PINS, ftdi::BitMode::SyncBB)
            .map_err(io::Error::other)?;
        debug!(vid = format_args!("{vid:04x}"), pid = format_args!("{pid:04x}"), baud, "opened");
        Ok(Self { dev })
    }
}

impl Channel for Device {
    fn write(&mut self, samples: &[u8]) -> io::Result<usize> {
        self.dev.write_all(samples)?;
        Ok(samples.len())
    }

    fn read_exact(&mut self, samples: &mut [u8]) -> io::Result<()> {
        Read::read_exact(&mut self.dev, samples)
    }
}
