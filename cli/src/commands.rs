pub mod capture;
pub mod interface;
pub mod ping;
pub mod scan;

use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use netdeck_common::config::DEFAULT_PREFIX;
use netdeck_common::network::stepper::AddressStepper;
use netdeck_core::process::{ProcessState, ProcessSupervisor};
use tracing::{debug, warn};

use crate::terminal::output::LineBuffer;
use crate::terminal::print;

/// How often supervised processes and the host registry are polled.
pub const TICK: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "netdeck")]
#[command(about = "An operator console for network diagnostics.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Hide headers (-q), or everything but results (-qq)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub quiet: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ping an address, or a run of consecutive addresses
    #[command(alias = "p")]
    Ping {
        address: AddressStepper,
        /// Echo requests per address
        #[arg(short = 'c', long, default_value_t = 4)]
        count: u32,
        /// Number of consecutive addresses to ping, starting at ADDRESS
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=256))]
        hosts: u16,
    },
    /// Capture traffic with tcpdump until it exits or Ctrl-C
    #[command(alias = "c")]
    Capture {
        #[arg(short, long)]
        interface: Option<String>,
        /// Extra arguments handed to tcpdump
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Discover the hosts of the local subnet with ARP
    #[command(alias = "s")]
    Scan {
        #[arg(short, long)]
        interface: Option<String>,
        /// Width of the swept subnet
        #[arg(short, long, default_value_t = DEFAULT_PREFIX)]
        prefix: u8,
        /// Seconds to listen for replies
        #[arg(short, long, default_value_t = 5)]
        duration: u64,
    },
    /// Show the interface a scan would use
    #[command(alias = "i")]
    Interface { name: Option<String> },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// How a supervised run came to an end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEnd {
    Finished(ProcessState),
    Interrupted(ProcessState),
}

/// Starts `program` and prints its output on every tick until it ends or
/// Ctrl-C is pressed, in which case it is stopped.
pub async fn run_supervised(program: &str, args: &[String]) -> anyhow::Result<RunEnd> {
    let mut supervisor = ProcessSupervisor::new();
    let pid = supervisor
        .start(program, args)
        .with_context(|| format!("could not run {program}"))?
        .pid();
    debug!(pid, "{program} started");

    let mut lines = LineBuffer::new();
    let mut ticker = tokio::time::interval(TICK);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let end = loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(outcome) = supervisor.poll() else {
                    break RunEnd::Finished(ProcessState::Spawning);
                };
                for line in lines.push(&outcome.chunk) {
                    print::print(&line);
                }
                if outcome.state.is_terminal() {
                    break RunEnd::Finished(outcome.state);
                }
            }
            _ = &mut ctrl_c => {
                let state = supervisor
                    .stop()
                    .with_context(|| format!("could not stop {program}"))?
                    .unwrap_or(ProcessState::Spawning);
                break RunEnd::Interrupted(state);
            }
        }
    };

    if let Some(rest) = lines.finish() {
        print::print(&rest);
    }
    if let RunEnd::Finished(ProcessState::Failed(reason)) = &end {
        warn!("{program} failed: {reason}");
    }
    Ok(end)
}
