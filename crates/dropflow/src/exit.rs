//! Process exit codes. Bad arguments exit with 2 from clap.

use dropflow_config::ConfigError;
use dropflow_lifecycle::LifecycleError;

pub const FAILURE: u8 = 1;
pub const CONFIG: u8 = 3;
pub const MISSING_PRECONDITION: u8 = 4;
pub const TIMED_OUT: u8 = 5;
pub const CANCELLED: u8 = 6;

pub fn code_for(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if cause.downcast_ref::<ConfigError>().is_some() {
            return CONFIG;
        }
        if let Some(e) = cause.downcast_ref::<LifecycleError>() {
            return lifecycle_code(e);
        }
    }
    FAILURE
}

fn lifecycle_code(err: &LifecycleError) -> u8 {
    match err {
        e if e.is_missing_precondition() => MISSING_PRECONDITION,
        LifecycleError::TimedOut { .. } => TIMED_OUT,
        LifecycleError::Cancelled { .. } => CANCELLED,
        _ => FAILURE,
    }
}
