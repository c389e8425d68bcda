pub mod kernel;
pub mod monitor;
pub mod outputs;

pub use kernel::command::Command;
pub use kernel::config::RumConfig;
pub use kernel::reactor::Reactor;
pub use kernel::scopes::Dependencies;
pub use monitor::RumMonitor;
