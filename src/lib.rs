pub mod aggregate;
pub mod cli;
pub mod config;
pub mod events;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod window;
