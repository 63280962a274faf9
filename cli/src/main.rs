mod commands;
mod terminal;

use std::time::Duration;

use commands::{CommandLine, Commands, capture, interface, ping, scan};
use netdeck_common::config::{Config, ScanConfig};
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init(commands.verbose);

    let mut cfg = Config {
        quiet: commands.quiet,
        scan: ScanConfig::default(),
    };

    match commands.command {
        Commands::Ping {
            address,
            count,
            hosts,
        } => ping::ping(address, count, hosts, &cfg).await,
        Commands::Capture { interface, args } => capture::capture(interface, args, &cfg).await,
        Commands::Scan {
            interface,
            prefix,
            duration,
        } => {
            let mut scan_cfg = ScanConfig::default().with_prefix(prefix)?;
            if let Some(name) = interface {
                scan_cfg = scan_cfg.with_interface(name);
            }
            cfg.scan = scan_cfg;
            scan::scan(Duration::from_secs(duration), &cfg).await
        }
        Commands::Interface { name } => interface::interface(name, &cfg),
    }
}
