//! Defaults read from the environment.
//!
//! | Variable                          | Default       | Description                                     |
//! | --------------------------------- | ------------- | ----------------------------------------------- |
//! | `CALLGRAPH_PROFILE_OUT`           | `profile.out` | Path of the report written at exit.             |
//! | `CALLGRAPH_PROFILE_OMIT_RECURSIVE`| `1`           | Skip recursive activations instead of marking.  |
//! | `CALLGRAPH_PROFILE_ORDER`         | `name`        | Sibling order: `name` or `first-call`.          |
//! | `CALLGRAPH_PROFILE_EXIT_REPORT`   | `1`           | Write the report when the main thread exits.    |
use crate::registry::Order;

use lazy_static::lazy_static;
use std::path::PathBuf;

pub const DEFAULT_REPORT_PATH: &str = "profile.out";

#[derive(Debug, Clone)]
pub struct Config {
    pub report_path: PathBuf,
    pub omit_recursive_calls: bool,
    pub order: Order,
    pub exit_report: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            omit_recursive_calls: true,
            order: Order::ByName,
            exit_report: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut res = Self::default();
        if let Some(path) = lookup("CALLGRAPH_PROFILE_OUT") {
            res.report_path = PathBuf::from(path);
        }
        if let Some(omit) = lookup("CALLGRAPH_PROFILE_OMIT_RECURSIVE") {
            res.omit_recursive_calls =
                parse_flag("CALLGRAPH_PROFILE_OMIT_RECURSIVE", &omit, res.omit_recursive_calls);
        }
        if let Some(order) = lookup("CALLGRAPH_PROFILE_ORDER") {
            match order.trim() {
                "name" => res.order = Order::ByName,
                "first-call" => res.order = Order::FirstCall,
                _ => {
                    warn!(
                        "Invalid CALLGRAPH_PROFILE_ORDER {:?}, expected `name` or `first-call`",
                        order
                    );
                }
            }
        }
        if let Some(exit) = lookup("CALLGRAPH_PROFILE_EXIT_REPORT") {
            res.exit_report = parse_flag("CALLGRAPH_PROFILE_EXIT_REPORT", &exit, res.exit_report);
        }
        res
    }
}

fn parse_flag(key: &str, value: &str, default: bool) -> bool {
    match value.trim() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!("Invalid {} {:?}, using {}", key, value, default);
            default
        }
    }
}

lazy_static! {
    pub static ref CONFIG: Config = Config::from_env();
}
