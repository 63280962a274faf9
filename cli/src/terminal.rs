pub mod colors;
pub mod logging;
pub mod network_fmt;
pub mod output;
pub mod print;
pub mod spinner;
