// Library surface for the `deer` binary and for headless/integration tests.
pub mod app_dirs;
pub mod charting;
pub mod clock;
pub mod config;
pub mod draft;
pub mod runtime;
pub mod service;
pub mod session;
pub mod stats;
pub mod store;
pub mod timer;
pub mod track;
pub mod util;
