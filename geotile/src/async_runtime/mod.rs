use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use crate::error::GeotileError;

/// Handle of the runtime the current thread runs in.
pub fn current() -> Result<Handle, GeotileError> {
    Handle::try_current().map_err(|err| GeotileError::Runtime(err.to_string()))
}

/// Spawns the future on the runtime and returns the handle to cancel it.
pub fn spawn<T>(runtime: &Handle, future: T) -> AbortHandle
where
    T: Future + Send + 'static,
    T::Output: Send + 'static,
{
    runtime.spawn(future).abort_handle()
}

/// Runs CPU heavy work off the async worker threads.
pub async fn spawn_blocking<F, R>(f: F) -> Result<R, GeotileError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await?)
}
