use netdeck_common::config::Config;
use netdeck_common::network::stepper::AddressStepper;
use netdeck_core::process::ProcessState;

use super::{RunEnd, run_supervised};
use crate::terminal::print;

const LAST_OCTET: usize = 3;

/// Pings `hosts` consecutive addresses starting at `start`, one after another.
///
/// The last octet wraps like the address picker does, so a run that starts
/// at `.250` continues with `.0`.
pub async fn ping(start: AddressStepper, count: u32, hosts: u16, cfg: &Config) -> anyhow::Result<()> {
    let mut address = start;
    let mut replied = 0usize;

    for _ in 0..hosts {
        print::header(&format!("ping {}", address.padded()), cfg.quiet);

        let args = ping_args(&address, count);
        match run_supervised("ping", &args).await? {
            RunEnd::Finished(ProcessState::Exited(Some(0))) => replied += 1,
            RunEnd::Finished(state) => print::print_status(format!("{address}: {}", describe(&state))),
            RunEnd::Interrupted(_) => {
                print::print_status("Interrupted");
                break;
            }
        }

        address.increment(LAST_OCTET)?;
    }

    if cfg.quiet < 2 {
        print::print_status(format!("{replied} of {hosts} address(es) answered"));
    }
    print::end_of_program(cfg.quiet);
    Ok(())
}

fn ping_args(address: &AddressStepper, count: u32) -> Vec<String> {
    vec!["-c".to_string(), count.to_string(), address.to_string()]
}

fn describe(state: &ProcessState) -> String {
    match state {
        ProcessState::Exited(Some(code)) => format!("ping exited with status {code}"),
        ProcessState::Exited(None) => "ping was terminated by a signal".to_string(),
        ProcessState::Failed(reason) => format!("ping failed: {reason}"),
        ProcessState::Spawning | ProcessState::Running => "ping did not finish".to_string(),
    }
}
