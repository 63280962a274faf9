use anyhow::Context;
use netdeck_common::config::Config;
use netdeck_common::network::interface;

use crate::terminal::{network_fmt, print};

pub fn interface(name: Option<String>, cfg: &Config) -> anyhow::Result<()> {
    print::header("interface", cfg.quiet);
    let (intf, endpoint) =
        interface::resolve(name.as_deref()).context("could not pick an interface")?;
    network_fmt::print_interface(&intf, &endpoint, 0);
    print::end_of_program(cfg.quiet);
    Ok(())
}
