pub use tokio;
pub use tokio::time::sleep;

pub mod state;
pub mod task;
