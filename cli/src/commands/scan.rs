use std::time::Duration;

use anyhow::Context;
use netdeck_common::config::Config;
use netdeck_core::scanner::SubnetScanner;
use tracing::warn;

use super::TICK;
use crate::terminal::{network_fmt, print, spinner};

pub async fn scan(duration: Duration, cfg: &Config) -> anyhow::Result<()> {
    let mut scanner = SubnetScanner::new(cfg.scan.clone());
    print::header("starting scanner", cfg.quiet);

    let report = scanner.start().context("could not start the scan")?;
    if let Some(report) = &report {
        if cfg.quiet == 0 {
            print::print_status(format!(
                "Sent {} ARP request(s) from {} on {}",
                report.probed, report.local, report.interface
            ));
        }
        if report.failed > 0 {
            warn!("{} request(s) could not be sent", report.failed);
        }
    }

    let registry = scanner.registry();
    let mut shown = 0usize;
    let mut ticker = tokio::time::interval(TICK);
    let deadline = tokio::time::sleep(duration);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(deadline, ctrl_c);

    spinner::start("Waiting for replies...");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let fresh = registry.page(shown, registry.len());
                shown += fresh.len();
                if cfg.quiet == 0 {
                    for host in &fresh {
                        print::print_status(network_fmt::host_line(host));
                    }
                }
                spinner::report_discovery_progress(shown);
                if !scanner.is_running() {
                    warn!("Listener ended before the scan finished");
                    break;
                }
            }
            _ = &mut deadline => break,
            _ = &mut ctrl_c => break,
        }
    }
    scanner.stop();
    spinner::finish();

    let hosts = scanner.snapshot();
    print::header("discovered hosts", cfg.quiet);
    if cfg.quiet < 2 {
        for host in &hosts {
            network_fmt::print_host(host);
        }
    }
    let interface = report.map(|report| report.interface).unwrap_or_default();
    print::print_status(format!("{} host(s) answered on {}", hosts.len(), interface));
    print::end_of_program(cfg.quiet);
    Ok(())
}
