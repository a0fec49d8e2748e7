pub mod config;
pub mod context;
pub mod daemon;

pub use config::Config;
pub use context::AgentContext;
