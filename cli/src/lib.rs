pub mod cmd;
pub mod config;
pub mod reporter;
pub mod util;
