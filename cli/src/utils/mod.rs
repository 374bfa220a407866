pub mod connection;
pub mod logging;
pub mod prompt;
