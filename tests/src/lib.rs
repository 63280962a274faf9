//! Cross-crate scenarios: supervised processes and simulated subnet sweeps.

mod discovery;
#[cfg(unix)]
mod process;
mod utils;
