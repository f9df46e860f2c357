pub mod config;
pub mod logging;

pub mod device;
pub mod fetch;
pub mod report;
pub mod results;
pub mod retry;
pub mod target;
pub mod transport;
