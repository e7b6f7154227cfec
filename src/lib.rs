pub mod casedef;
pub mod config;
pub mod io;
pub mod progress;
pub mod runner;
pub mod sweep;
pub mod toolchain;
pub mod units;
pub mod utils;
