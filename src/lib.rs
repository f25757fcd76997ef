pub mod backup;
pub mod config;
pub mod enrich;
pub mod fetch;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod process;
