//! CLI domain: parse, route and output only.

mod output;
mod parse;
mod route;

pub use output::{format_probe_results, format_settings, map_error};
pub use parse::{Cli, Commands};
pub use route::{load_config, RunContext};
