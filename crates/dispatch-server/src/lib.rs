pub mod config;
pub mod directory;
pub mod dispatch;
pub mod gateway;
pub mod server;

pub use config::DispatchServerConfig;
pub use server::run_server;
