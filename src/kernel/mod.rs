pub mod command;
pub mod config;
pub mod event;
pub mod id;
pub mod reactor;
pub mod sampler;
pub mod scopes;
pub mod telemetry;
pub mod time;
pub mod trace;
