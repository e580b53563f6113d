pub mod manager;
pub mod service_handle;
pub mod cli;

pub use manager::{Gateway, RunningGateway};
pub use service_handle::ServiceHandle;
pub use cli::run_cli;
