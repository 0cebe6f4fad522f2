use std::{
    fs::File,
    io::{self, Write},
    path::PathBuf,
};

use clap::Parser;
use color_eyre::Result;
use eyescan_io::{ChainPosition, Controller, bitbang::BitbangTransport, ftdi};
use eyescan_serdes::{SweepConfig, TestPattern, sweep};

use crate::cli_helpers::UsbAddr;

mod cli_helpers;

/// Eye-diagram sweep over the receiver wrapper scan chain.
#[derive(clap::Parser)]
struct Args {
    #[arg(long, default_value_t = UsbAddr { vid: 0x0403, pid: 0x6010 })]
    usb: UsbAddr,

    /// Baud rate of the synchronous bit-bang clock
    #[arg(long, default_value_t = 115_200)]
    baud: u32,

    /// Devices on the scan chain
    #[arg(long, default_value_t = 1)]
    chain_count: usize,

    /// 1-based position of the target device on the chain
    #[arg(long, default_value_t = 1)]
    chain_position: usize,

    /// Bit lanes to probe per voltage step
    #[arg(long, default_value_t = 1)]
    bits: u8,

    /// Receiver test pattern driven during the scan
    #[arg(long, default_value = "prbs7", value_parser = TestPattern::parse)]
    pattern: TestPattern,

    /// Output file for the sample stream; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    no_progress_bar: bool,
}

fn main() -> Result<()> {
    init_logging()?;
    let args = Args::parse();

    let chain = ChainPosition::new(args.chain_position, args.chain_count)?;
    let config = SweepConfig { bit_number: args.bits, pattern: args.pattern };

    let channel = ftdi::Device::open(args.usb.vid, args.usb.pid, args.baud)?;
    let mut cont = Controller::new(BitbangTransport::new(channel), chain);

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    };

    if args.no_progress_bar {
        let mut sink = sink;
        sweep::run(&mut cont, &config, &mut sink)?;
    } else {
        let pb = progress_bar(config.expected_samples());
        let mut sink = SampleProgress { inner: sink, bar: pb.clone() };
        sweep::run(&mut cont, &config, &mut sink)?;
        pb.finish();
    }
    Ok(())
}

fn progress_bar(samples: u64) -> indicatif::ProgressBar {
    let template =
        "{spinner:.green} {elapsed:>3}/{duration:>3} {bar} {pos}/{len} samples ({per_sec})";
    let style = indicatif::ProgressStyle::with_template(template).unwrap();
    let pb = indicatif::ProgressBar::new(samples)
        .with_finish(indicatif::ProgressFinish::Abandon)
        .with_style(style);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Ticks the bar once per emitted sample line.
struct SampleProgress<W> {
    inner: W,
    bar: indicatif::ProgressBar,
}

impl<W: Write> Write for SampleProgress<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        let lines = buf[..written].iter().filter(|&&b| b == b'\n').count();
        self.bar.inc(lines as u64);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn init_logging() -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .with(tracing_error::ErrorLayer::default())
        .init();
    color_eyre::install()?;
    Ok(())
}
