pub mod control;
pub mod error;
pub mod orchestrator;
pub mod runtime;
pub mod script;
pub mod waiter;

pub use control::*;
pub use error::*;
pub use orchestrator::*;
pub use runtime::*;
pub use waiter::*;
