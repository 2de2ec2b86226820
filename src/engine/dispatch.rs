//! Permit-guarded execution of engine invocations.
//!
//! `execute` is shared by the blocking path and by background tasks, so both
//! modes acquire the same permit and run the same closure.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::coordinator::Coordinator;
use crate::error::{EngineError, SpellError, SpellResult};
use crate::operation::{Access, Operation};

type ReadFn<E, T> = Box<dyn FnOnce(&E) -> Result<T, EngineError> + Send>;
type WriteFn<E, T> = Box<dyn FnOnce(&mut E) -> Result<T, EngineError> + Send>;

/// One engine call together with the permit it needs.
///
/// The closure receives the engine, never the coordinator, so it cannot ask
/// for a second permit.
pub enum Invocation<E, T> {
    /// Runs under a shared permit.
    Read(ReadFn<E, T>),
    /// Runs under an exclusive permit.
    Write(WriteFn<E, T>),
}

impl<E, T> Invocation<E, T> {
    /// Wraps an infallible read.
    pub fn read<F>(f: F) -> Self
    where
        F: FnOnce(&E) -> T + Send + 'static,
    {
        Self::Read(Box::new(move |engine| Ok(f(engine))))
    }

    /// Wraps a fallible write.
    pub fn write<F>(f: F) -> Self
    where
        F: FnOnce(&mut E) -> Result<T, EngineError> + Send + 'static,
    {
        Self::Write(Box::new(f))
    }

    /// Converts the success value, keeping the permit kind.
    pub fn map<U, F>(self, f: F) -> Invocation<E, U>
    where
        E: 'static,
        T: 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match self {
            Self::Read(g) => Invocation::Read(Box::new(move |engine: &E| g(engine).map(f))),
            Self::Write(g) => Invocation::Write(Box::new(move |engine: &mut E| g(engine).map(f))),
        }
    }

    /// Permission this invocation acquires.
    #[must_use]
    pub const fn access(&self) -> Access {
        match self {
            Self::Read(_) => Access::Read,
            Self::Write(_) => Access::Write,
        }
    }
}

/// Acquires the permit, runs the invocation, and releases the permit before
/// returning. The permit is a scoped guard, so failures and panics inside the
/// closure release it too.
pub fn execute<E, T>(coordinator: &Coordinator<E>, invocation: Invocation<E, T>) -> SpellResult<T> {
    let value = match invocation {
        Invocation::Read(f) => {
            let permit = coordinator.read()?;
            f(&*permit)?
        }
        Invocation::Write(f) => {
            let mut permit = coordinator.write()?;
            f(&mut *permit)?
        }
    };
    Ok(value)
}

/// A deferred engine call bound to its completion channel.
pub(crate) struct BackgroundTask<E, T> {
    id: u64,
    operation: Operation,
    coordinator: Arc<Coordinator<E>>,
    invocation: Invocation<E, T>,
    reply: oneshot::Sender<SpellResult<T>>,
}

impl<E, T> BackgroundTask<E, T> {
    pub(crate) fn new(
        id: u64,
        operation: Operation,
        coordinator: Arc<Coordinator<E>>,
        invocation: Invocation<E, T>,
        reply: oneshot::Sender<SpellResult<T>>,
    ) -> Self {
        Self {
            id,
            operation,
            coordinator,
            invocation,
            reply,
        }
    }

    /// Runs on a worker thread. A panicking engine call is reported to the
    /// caller as `TaskPanicked`; the permit has been released by then.
    pub(crate) fn run(self) {
        let Self {
            id,
            operation,
            coordinator,
            invocation,
            reply,
        } = self;

        tracing::trace!(task = id, %operation, access = ?invocation.access(), "task started");
        let result = panic::catch_unwind(AssertUnwindSafe(|| execute(&coordinator, invocation)))
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                tracing::warn!(task = id, %operation, %message, "engine call panicked");
                Err(SpellError::TaskPanicked { operation, message })
            });
        tracing::trace!(task = id, %operation, ok = result.is_ok(), "task finished");

        // The caller may have dropped its handle; the result is discarded then.
        let _ = reply.send(result);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::memory::WordList;
    use crate::engine::Engine;

    fn coordinator() -> Arc<Coordinator<WordList>> {
        Arc::new(Coordinator::new(WordList::from_words(["color"])))
    }

    #[test]
    fn execute_read_and_write() {
        let coordinator = coordinator();
        let spelled = execute(&coordinator, Invocation::read(|e: &WordList| e.spell("colour")));
        assert!(!spelled.unwrap());

        execute(&coordinator, Invocation::write(|e: &mut WordList| e.add("colour"))).unwrap();

        let spelled = execute(&coordinator, Invocation::read(|e: &WordList| e.spell("colour")));
        assert!(spelled.unwrap());
    }

    #[test]
    fn map_keeps_access() {
        let coordinator = coordinator();
        let invocation = Invocation::read(|e: &WordList| e.len()).map(|n| n * 10);
        assert_eq!(invocation.access(), Access::Read);
        assert_eq!(execute(&coordinator, invocation).unwrap(), 10);

        let invocation = Invocation::write(|e: &mut WordList| e.add("dolor")).map(|()| "added");
        assert_eq!(invocation.access(), Access::Write);
        assert_eq!(execute(&coordinator, invocation).unwrap(), "added");
    }

    #[test]
    fn engine_error_releases_permit() {
        let coordinator = coordinator();
        let err = execute(&coordinator, Invocation::write(|e: &mut WordList| e.add(""))).unwrap_err();
        assert!(err.is_engine());
        assert!(coordinator.write().is_ok());
    }

    #[test]
    fn task_delivers_result() {
        let coordinator = coordinator();
        let (tx, mut rx) = oneshot::channel();
        let task = BackgroundTask::new(
            1,
            Operation::Spell,
            Arc::clone(&coordinator),
            Invocation::read(|e: &WordList| e.spell("color")),
            tx,
        );
        task.run();
        assert!(rx.try_recv().unwrap().unwrap());
    }

    #[test]
    fn task_reports_panic() {
        let coordinator = coordinator();
        let (tx, mut rx) = oneshot::channel::<SpellResult<()>>();
        let task = BackgroundTask::new(
            7,
            Operation::Add,
            Arc::clone(&coordinator),
            Invocation::write(|_: &mut WordList| panic!("corrupt entry")),
            tx,
        );
        task.run();

        let err = rx.try_recv().unwrap().unwrap_err();
        let SpellError::TaskPanicked { operation, message } = err else {
            panic!("expected TaskPanicked, got {err:?}");
        };
        assert_eq!(operation, Operation::Add);
        assert_eq!(message, "corrupt entry");
        assert!(coordinator.read().is_ok());
    }
}
