pub mod clock;
pub mod config;
pub mod content;
pub mod platform;
pub mod protocol;
pub mod schedule;
pub mod state;
