use netdeck_common::config::Config;

use super::{RunEnd, run_supervised};
use crate::terminal::print;

/// Numeric addresses, no timestamps, line buffered.
const BASE_ARGS: &[&str] = &["-ntl"];

pub async fn capture(interface: Option<String>, extra: Vec<String>, cfg: &Config) -> anyhow::Result<()> {
    let args = tcpdump_args(interface.as_deref(), extra);
    print::header("capturing traffic", cfg.quiet);
    if cfg.quiet == 0 {
        print::print_status(format!("tcpdump {}", args.join(" ")));
        print::print_status("Press Ctrl-C to stop");
    }

    match run_supervised("tcpdump", &args).await? {
        RunEnd::Finished(state) => print::print_status(format!("tcpdump ended: {state:?}")),
        RunEnd::Interrupted(_) => print::print_status("Capture stopped"),
    }
    print::end_of_program(cfg.quiet);
    Ok(())
}

fn tcpdump_args(interface: Option<&str>, extra: Vec<String>) -> Vec<String> {
    let mut args: Vec<String> = BASE_ARGS.iter().map(|arg| arg.to_string()).collect();
    if let Some(name) = interface {
        args.push("-i".to_string());
        args.push(name.to_string());
    }
    args.extend(extra);
    args
}
