use clap::Parser;
use std::path::PathBuf;
use tracing::{Level, info, warn};

use tt_vga::host::logging::{setup_logging_file, setup_logging_stdio};
use tt_vga::host::monitor::Monitor;
use tt_vga::host::screen::headless::{self, RunOptions};
use tt_vga::machine::generic::pipeline::PipelineDelay;
use tt_vga::machine::tiny_vga::System;
use tt_vga::machine::tiny_vga::output::OutputLayout;
use tt_vga::machine::tiny_vga::pattern::TestPattern;
use tt_vga::machine::tiny_vga::video::{PIXEL_CLOCK_HZ, Revision, VgaConfig};

/// VGA 640x480@60Hz sync generator model
/// Drives the design headless, checks the sync timing seen on its output
/// port and optionally saves the captured picture.
#[derive(Parser)]
#[command(name = "tt-vga")]
#[command(about = "Cycle-accurate VGA 640x480@60Hz sync generator model")]
struct Args {
    /// Hardware revision: current (vsync bit 3, 2-tick delay) or legacy
    /// (vsync bit 4, 1-tick delay)
    #[arg(long, default_value = "current")]
    revision: Revision,

    /// Output bit layout, overriding the revision: pmod, vsync-bit4 or
    /// hsync=7,vsync=3,r0=4,r1=0,g0=5,g1=1,b0=6,b1=2
    #[arg(long)]
    layout: Option<OutputLayout>,

    /// Output pipeline delay in ticks, overriding the revision
    #[arg(long)]
    delay: Option<PipelineDelay>,

    /// Frames to run after the warmup frame (at least 1, so a whole frame
    /// is measured)
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    frames: u32,

    /// Ticks to hold reset before releasing it
    #[arg(long, default_value_t = 10)]
    reset_cycles: u32,

    /// Input port value, parsed as hex (buttons are active-low)
    #[arg(long, value_parser = parse_hex_byte, default_value = "ff")]
    buttons: u8,

    /// Write the last captured frame as a binary PPM
    #[arg(long, value_name = "PPM")]
    dump: Option<PathBuf>,

    /// Log to a file instead of stdout
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_hex_byte(s: &str) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    Ok(u8::from_str_radix(s, 16)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let level = if args.verbose {
        Level::TRACE
    } else {
        Level::INFO
    };
    match &args.log_file {
        Some(path) => setup_logging_file(level, path)?,
        None => setup_logging_stdio(level),
    }

    let mut config = VgaConfig::from(args.revision);
    if let Some(layout) = args.layout {
        config.layout = layout;
    }
    if let Some(delay) = args.delay {
        config.delay = delay;
    }
    info!("Revision: {} ({})", args.revision, Revision::discrepancy());
    if config.layout != args.revision.layout() || config.delay != args.revision.delay() {
        warn!(
            "Overriding {} revision: layout {}, delay {}",
            args.revision, config.layout, config.delay
        );
    }

    let mut system = System::new(&config, TestPattern::new(config.timing));
    let mut monitor = Monitor::new(config.timing, config.layout);
    let options = RunOptions {
        reset_cycles: args.reset_cycles,
        frames: args.frames,
        ui_in: args.buttons,
        ..RunOptions::default()
    };

    let report = headless::run(&mut system, &mut monitor, &options);
    let m = report.measurements;
    info!(
        "Ran {} ticks in {:?} ({:.1}x real time at {} MHz)",
        report.ticks,
        report.elapsed,
        report.ticks_per_second() / PIXEL_CLOCK_HZ as f64,
        PIXEL_CLOCK_HZ / 1_000_000
    );
    info!(
        "hsync: {:?} ticks every {:?}; vsync: {:?} lines every {:?} lines",
        m.hsync_width,
        m.line_length,
        m.vsync_lines(),
        m.frame_lines()
    );

    if let Some(path) = &args.dump {
        monitor.framebuffer().save_ppm(path)?;
        info!("Frame written to {:?}", path);
    }

    if !report.locked {
        warn!(
            "Not enough frames to judge timing: saw {} vsync pulses",
            report.frames_seen
        );
        std::process::exit(1);
    }
    if !m.conforms(&config.timing) {
        warn!("{} sync pulses or periods were out of spec", m.violations);
        warn!("Output does not match 640x480@60Hz timing");
        std::process::exit(1);
    }
    info!("Output matches 640x480@60Hz timing");
    Ok(())
}
