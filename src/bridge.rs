//! Sync-over-async: block the calling thread until a future completes.
//!
//! # Deadlock hazard
//!
//! Blocking is only safe when some *other* thread can drive the awaited
//! work. Inside a current-thread runtime that is never the case and [`wait`]
//! refuses with [`Fault::WouldDeadlock`]. Inside a multi-thread runtime whose
//! workers are all blocked the same way, the wait still hangs; callers
//! inherit that risk.
//!
//! # Cancellation
//!
//! The token interrupts the *wait*, not the work. A spawned task keeps
//! running after [`wait_task`] returns `Fault::Cancelled`.

use std::future::Future;

use tokio::runtime::{Builder, Handle, RuntimeFlavor};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::Fault;

/// Block until `future` completes or `cancel` fires.
///
/// Outside any runtime a private current-thread runtime drives the future.
/// Inside a multi-thread runtime the worker is handed off with
/// `block_in_place` first.
///
/// Cancellation is reported as `Err(Fault::Cancelled)` and is not treated as
/// a failure of the future itself. A panic inside the future unwinds out of
/// this call unchanged.
pub fn wait<F>(future: F, cancel: &CancellationToken) -> Result<F::Output, Fault>
where
    F: Future,
{
    let guarded = async {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("blocking wait cancelled");
                Err(Fault::Cancelled)
            }
            output = future => Ok(output),
        }
    };

    match Handle::try_current() {
        Ok(handle) => match handle.runtime_flavor() {
            RuntimeFlavor::CurrentThread => {
                tracing::warn!("refusing to block inside a current-thread runtime");
                Err(Fault::WouldDeadlock)
            }
            _ => tokio::task::block_in_place(|| handle.block_on(guarded)),
        },
        Err(_) => {
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(Fault::Runtime)?;
            runtime.block_on(guarded)
        }
    }
}

/// Block until a spawned task finishes or `cancel` fires.
///
/// A task that panicked is unwrapped: its original panic payload is resumed
/// on the calling thread, never a generic "task failed" error. A task that
/// was aborted reports `Fault::Cancelled`.
pub fn wait_task<T>(task: JoinHandle<T>, cancel: &CancellationToken) -> Result<T, Fault> {
    match wait(task, cancel)? {
        Ok(value) => Ok(value),
        Err(join) if join.is_panic() => std::panic::resume_unwind(join.into_panic()),
        Err(_) => Err(Fault::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn completes_outside_a_runtime() {
        let cancel = CancellationToken::new();
        let value = wait(async { 21 * 2 }, &cancel).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn cancelled_token_interrupts_the_wait() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = wait(std::future::pending::<()>(), &cancel);
        assert!(matches!(result, Err(Fault::Cancelled)));
    }

    #[tokio::test]
    async fn refuses_inside_current_thread_runtime() {
        let cancel = CancellationToken::new();
        let result = wait(async { 1 }, &cancel);
        assert!(matches!(result, Err(Fault::WouldDeadlock)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn blocks_in_place_inside_multi_thread_runtime() {
        let cancel = CancellationToken::new();
        let value = wait(
            async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                "done"
            },
            &cancel,
        )
        .unwrap();
        assert_eq!(value, "done");
    }

    #[test]
    fn panicking_task_resumes_original_payload() {
        let runtime = Builder::new_multi_thread().worker_threads(1).build().unwrap();
        let task = runtime.spawn(async {
            if true {
                panic!("task blew up");
            }
        });
        let cancel = CancellationToken::new();

        let payload = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| wait_task(task, &cancel)))
            .unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"task blew up"));
    }

    #[test]
    fn aborted_task_reports_cancelled() {
        let runtime = Builder::new_multi_thread().worker_threads(1).enable_all().build().unwrap();
        let task = runtime.spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        task.abort();
        let cancel = CancellationToken::new();

        assert!(matches!(wait_task(task, &cancel), Err(Fault::Cancelled)));
    }
}
