mod builtins;
mod cancel;
mod executor;
mod process;

pub use builtins::{Builtin, BuiltinSet};
pub use cancel::CancelToken;
pub use executor::{ExecError, ExecStatus, Executor};
pub use process::{ChildProc, STATUS_CANCELLED, run_pipeline, spawn};
