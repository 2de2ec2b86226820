//! Read/write exclusion around a single engine instance.
//!
//! The coordinator owns the engine for its whole life and hands out scoped
//! permits. A `ReadPermit` derefs to `&E` and may coexist with other read
//! permits; a `WritePermit` derefs to `&mut E` and excludes everything else.
//! Dropping a permit releases it, including during unwinding.
//!
//! Fairness is task-fair (`parking_lot::RwLock`): once a writer is queued,
//! readers that arrive after it wait behind it, so a steady stream of reads
//! cannot starve a write.
//!
//! A thread may hold at most one permit per coordinator. A second request
//! from the same thread fails with `SpellError::Reentrant` instead of
//! deadlocking behind its own permit.

use std::cell::RefCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use crate::engine::Engine;
use crate::error::{SpellError, SpellResult};

/// Lifecycle of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Accepting operations.
    Ready,
    /// Closing: no new operations, queued tasks still see the engine.
    Draining,
    /// Engine released.
    Closed,
}

impl Lifecycle {
    const fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Ready,
            1 => Self::Draining,
            _ => Self::Closed,
        }
    }

    const fn as_u8(self) -> u8 {
        match self {
            Self::Ready => 0,
            Self::Draining => 1,
            Self::Closed => 2,
        }
    }
}

thread_local! {
    // Addresses of coordinators the current thread holds a permit on.
    static HELD: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

struct Held(usize);

impl Held {
    fn enter(id: usize) -> SpellResult<Self> {
        HELD.with(|held| {
            let mut held = held.borrow_mut();
            if held.contains(&id) {
                return Err(SpellError::Reentrant);
            }
            held.push(id);
            Ok(Self(id))
        })
    }
}

impl Drop for Held {
    fn drop(&mut self) {
        // try_with: the thread-local may already be gone during thread teardown.
        let _ = HELD.try_with(|held| {
            let mut held = held.borrow_mut();
            if let Some(pos) = held.iter().rposition(|&id| id == self.0) {
                held.swap_remove(pos);
            }
        });
    }
}

/// Shared access to the engine.
pub struct ReadPermit<'a, E> {
    guard: MappedRwLockReadGuard<'a, E>,
    _held: Held,
}

impl<E> Deref for ReadPermit<'_, E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.guard
    }
}

/// Exclusive access to the engine.
pub struct WritePermit<'a, E> {
    guard: MappedRwLockWriteGuard<'a, E>,
    _held: Held,
}

impl<E> Deref for WritePermit<'_, E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.guard
    }
}

impl<E> DerefMut for WritePermit<'_, E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.guard
    }
}

/// Guards one engine instance with a fair reader/writer lock.
pub struct Coordinator<E> {
    engine: RwLock<Option<E>>,
    word_characters: Option<String>,
    state: AtomicU8,
}

impl<E: Engine> Coordinator<E> {
    /// Wraps `engine`. The word-character set is captured here and served
    /// without locking afterwards.
    #[must_use]
    pub fn new(engine: E) -> Self {
        let word_characters = engine
            .word_characters()
            .filter(|chars| !chars.is_empty())
            .map(str::to_owned);
        Self {
            engine: RwLock::new(Some(engine)),
            word_characters,
            state: AtomicU8::new(Lifecycle::Ready.as_u8()),
        }
    }

    /// Characters the engine considers part of a word, if any.
    #[must_use]
    pub fn word_characters(&self) -> Option<&str> {
        self.word_characters.as_deref()
    }
}

impl<E> Coordinator<E> {
    fn id(&self) -> usize {
        (self as *const Self) as usize
    }

    /// Acquires shared access, blocking while a writer holds or awaits the
    /// lock.
    pub fn read(&self) -> SpellResult<ReadPermit<'_, E>> {
        let held = Held::enter(self.id())?;
        let guard = RwLockReadGuard::try_map(self.engine.read(), Option::as_ref)
            .map_err(|_| SpellError::Closed)?;
        Ok(ReadPermit { guard, _held: held })
    }

    /// Acquires exclusive access, blocking until every other permit is
    /// released.
    pub fn write(&self) -> SpellResult<WritePermit<'_, E>> {
        let held = Held::enter(self.id())?;
        let guard = RwLockWriteGuard::try_map(self.engine.write(), Option::as_mut)
            .map_err(|_| SpellError::Closed)?;
        Ok(WritePermit { guard, _held: held })
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns true while new operations are accepted.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.lifecycle() == Lifecycle::Ready
    }

    /// Moves `Ready → Draining`. Returns false if closing already started.
    pub(crate) fn begin_close(&self) -> bool {
        self.state
            .compare_exchange(
                Lifecycle::Ready.as_u8(),
                Lifecycle::Draining.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Takes the engine out under exclusive access and marks the coordinator
    /// closed. The caller must not hold a permit.
    pub(crate) fn release_engine(&self) -> Option<E> {
        let mut guard = self.engine.write();
        self.state.store(Lifecycle::Closed.as_u8(), Ordering::Release);
        guard.take()
    }
}

impl<E> fmt::Debug for Coordinator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("lifecycle", &self.lifecycle())
            .field("word_characters", &self.word_characters)
            .finish_non_exhaustive()
    }
}
