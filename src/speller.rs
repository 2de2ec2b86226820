//! Operation facade.
//!
//! `Speller` exposes every engine operation twice: a blocking form that runs
//! on the caller's thread and a deferred form that returns a `TaskHandle`.
//! Both forms build the same `Invocation` and run it through
//! `dispatch::execute`, so they return identical results for identical
//! engine state.
//!
//! Precondition and argument failures are reported synchronously in both
//! modes. Engine failures in deferred mode arrive through the handle.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::config::{DictionaryPaths, SpellerConfig};
use crate::coordinator::{Coordinator, Lifecycle};
use crate::dictionary::Dictionary;
use crate::engine::dispatch::{self, BackgroundTask, Invocation};
use crate::engine::runtime::{TaskHandle, WorkerPool};
use crate::engine::Engine;
use crate::error::{SpellError, SpellResult};
use crate::operation::{Mode, Operation, Outcome, Request};

/// Result of `Speller::invoke`: the outcome itself in blocking mode, or a
/// handle to it in deferred mode.
#[derive(Debug)]
pub enum Completion {
    /// Blocking call finished.
    Ready(Outcome),
    /// Deferred call submitted.
    Pending(TaskHandle<Outcome>),
}

impl Completion {
    /// Waits for the outcome, blocking the current thread if pending.
    ///
    /// # Panics
    ///
    /// Panics if called on a pending completion from within an asynchronous
    /// execution context. Await the completion there instead.
    pub fn wait(self) -> SpellResult<Outcome> {
        match self {
            Self::Ready(outcome) => Ok(outcome),
            Self::Pending(handle) => handle.join(),
        }
    }
}

fn spell_call<E: Engine>(word: String) -> Invocation<E, bool> {
    Invocation::read(move |engine: &E| engine.spell(&word))
}

fn suggest_call<E: Engine>(word: String) -> Invocation<E, Option<Vec<String>>> {
    // Check and lookup run under one permit, so no write can land between them.
    Invocation::read(move |engine: &E| {
        if engine.spell(&word) {
            None
        } else {
            Some(engine.suggest(&word))
        }
    })
}

fn analyze_call<E: Engine>(word: String) -> Invocation<E, Vec<String>> {
    Invocation::read(move |engine: &E| engine.analyze(&word))
}

fn stem_call<E: Engine>(word: String) -> Invocation<E, Vec<String>> {
    Invocation::read(move |engine: &E| engine.stem(&word))
}

fn generate_call<E: Engine>(word: String, example: String) -> Invocation<E, Vec<String>> {
    Invocation::read(move |engine: &E| engine.generate(&word, &example))
}

fn add_call<E: Engine>(word: String) -> Invocation<E, ()> {
    Invocation::write(move |engine: &mut E| engine.add(&word))
}

fn add_with_affix_call<E: Engine>(word: String, example: String) -> Invocation<E, ()> {
    Invocation::write(move |engine: &mut E| engine.add_with_affix(&word, &example))
}

fn remove_call<E: Engine>(word: String) -> Invocation<E, ()> {
    Invocation::write(move |engine: &mut E| engine.remove(&word))
}

fn add_dictionary_call<E: Engine>(path: &Path) -> Invocation<E, ()> {
    let path = path.to_path_buf();
    Invocation::write(move |engine: &mut E| engine.add_dictionary(&path))
}

/// Engine-backed invocation for `request`; `None` for the unguarded
/// word-characters query.
fn request_call<E: Engine>(request: Request) -> Option<Invocation<E, Outcome>> {
    let invocation = match request {
        Request::Spell { word } => spell_call(word).map(Outcome::Correct),
        Request::Suggest { word } => suggest_call(word).map(Outcome::Suggestions),
        Request::Analyze { word } => analyze_call(word).map(Outcome::Words),
        Request::Stem { word } => stem_call(word).map(Outcome::Words),
        Request::Generate { word, example } => generate_call(word, example).map(Outcome::Words),
        Request::GetWordCharacters => return None,
        Request::Add { word } => add_call(word).map(|()| Outcome::Done),
        Request::AddWithAffix { word, example } => {
            add_with_affix_call(word, example).map(|()| Outcome::Done)
        }
        Request::Remove { word } => remove_call(word).map(|()| Outcome::Done),
        Request::AddDictionary { path } => add_dictionary_call(&path).map(|()| Outcome::Done),
    };
    Some(invocation)
}

/// Thread-safe spell checker over one engine instance.
///
/// Reads run in parallel; writes run alone. Dropping the speller closes it:
/// already-queued deferred operations finish first.
pub struct Speller<E: Engine = Dictionary> {
    coordinator: Arc<Coordinator<E>>,
    scheduler: Mutex<Option<WorkerPool>>,
    next_id: AtomicU64,
}

impl Speller<Dictionary> {
    /// Loads the dictionary at `aff`/`dic` with the environment-derived
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns `SpellError::Init` if either file cannot be loaded.
    pub fn new(aff: impl AsRef<Path>, dic: impl AsRef<Path>) -> SpellResult<Self> {
        Self::from_paths(&DictionaryPaths::new(aff, dic))
    }

    /// Loads the dictionary named by `paths`.
    ///
    /// # Errors
    ///
    /// Returns `SpellError::Init` if either file cannot be loaded.
    pub fn from_paths(paths: &DictionaryPaths) -> SpellResult<Self> {
        Self::with_config(paths, &SpellerConfig::from_env())
    }

    /// Loads the dictionary named by `paths` with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `SpellError::Init` if either file cannot be loaded, or
    /// `SpellError::Spawn` if the worker pool cannot start.
    pub fn with_config(paths: &DictionaryPaths, config: &SpellerConfig) -> SpellResult<Self> {
        let dictionary = Dictionary::open(paths)?;
        Self::from_engine(dictionary, config)
    }

    /// Constructs from loosely typed arguments: `[{ "aff": .., "dic": .. }]`
    /// or `["path.aff", "path.dic"]`.
    ///
    /// # Errors
    ///
    /// Returns `SpellError::Argument` for a malformed argument list, then
    /// anything `from_paths` returns.
    pub fn from_args(args: &[Value]) -> SpellResult<Self> {
        let paths = DictionaryPaths::from_args(args)?;
        Self::from_paths(&paths)
    }
}

impl<E: Engine> Speller<E> {
    /// Wraps an already constructed engine.
    ///
    /// # Errors
    ///
    /// Returns `SpellError::Spawn` if the worker pool cannot start.
    pub fn from_engine(engine: E, config: &SpellerConfig) -> SpellResult<Self> {
        let pool = WorkerPool::start(&config.thread_name, config.workers, config.queue_capacity)?;
        tracing::debug!(
            workers = pool.worker_count(),
            queue_capacity = config.queue_capacity,
            "speller ready"
        );
        Ok(Self {
            coordinator: Arc::new(Coordinator::new(engine)),
            scheduler: Mutex::new(Some(pool)),
            next_id: AtomicU64::new(1),
        })
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.coordinator.lifecycle()
    }

    /// Deferred operations queued or running.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.lock().as_ref().map_or(0, WorkerPool::in_flight)
    }

    fn ensure_ready(&self) -> SpellResult<()> {
        if self.coordinator.is_ready() {
            Ok(())
        } else {
            Err(SpellError::Closed)
        }
    }

    fn run<T>(&self, invocation: Invocation<E, T>) -> SpellResult<T> {
        self.ensure_ready()?;
        dispatch::execute(&self.coordinator, invocation)
    }

    fn defer<T: Send + 'static>(
        &self,
        operation: Operation,
        invocation: Invocation<E, T>,
    ) -> SpellResult<TaskHandle<T>> {
        self.ensure_ready()?;
        let scheduler = self.scheduler.lock();
        // Closing flips the state under this lock; recheck once we hold it.
        let pool = match scheduler.as_ref() {
            Some(pool) if self.coordinator.is_ready() => pool,
            _ => return Err(SpellError::Closed),
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply, rx) = oneshot::channel();
        let task = BackgroundTask::new(id, operation, Arc::clone(&self.coordinator), invocation, reply);
        pool.try_submit(Box::new(move || task.run()))?;
        tracing::trace!(task = id, %operation, "task queued");
        Ok(TaskHandle::new(id, operation, rx))
    }

    /// Returns true if `word` is spelled correctly.
    pub fn spell(&self, word: &str) -> SpellResult<bool> {
        self.run(spell_call(word.to_owned()))
    }

    /// Deferred `spell`.
    pub fn spell_async(&self, word: &str) -> SpellResult<TaskHandle<bool>> {
        self.defer(Operation::Spell, spell_call(word.to_owned()))
    }

    /// Suggestions for `word`, or `None` if it is spelled correctly.
    pub fn suggest(&self, word: &str) -> SpellResult<Option<Vec<String>>> {
        self.run(suggest_call(word.to_owned()))
    }

    /// Deferred `suggest`.
    pub fn suggest_async(&self, word: &str) -> SpellResult<TaskHandle<Option<Vec<String>>>> {
        self.defer(Operation::Suggest, suggest_call(word.to_owned()))
    }

    /// Morphological analyses of `word`.
    pub fn analyze(&self, word: &str) -> SpellResult<Vec<String>> {
        self.run(analyze_call(word.to_owned()))
    }

    /// Deferred `analyze`.
    pub fn analyze_async(&self, word: &str) -> SpellResult<TaskHandle<Vec<String>>> {
        self.defer(Operation::Analyze, analyze_call(word.to_owned()))
    }

    /// Stems of `word`.
    pub fn stem(&self, word: &str) -> SpellResult<Vec<String>> {
        self.run(stem_call(word.to_owned()))
    }

    /// Deferred `stem`.
    pub fn stem_async(&self, word: &str) -> SpellResult<TaskHandle<Vec<String>>> {
        self.defer(Operation::Stem, stem_call(word.to_owned()))
    }

    /// Forms of `word` following the morphology of `example`.
    pub fn generate(&self, word: &str, example: &str) -> SpellResult<Vec<String>> {
        self.run(generate_call(word.to_owned(), example.to_owned()))
    }

    /// Deferred `generate`.
    pub fn generate_async(&self, word: &str, example: &str) -> SpellResult<TaskHandle<Vec<String>>> {
        self.defer(
            Operation::Generate,
            generate_call(word.to_owned(), example.to_owned()),
        )
    }

    /// Characters the dictionary treats as part of words, if any.
    ///
    /// Served from a snapshot taken at construction; never waits for a
    /// permit.
    pub fn word_characters(&self) -> SpellResult<Option<String>> {
        self.ensure_ready()?;
        Ok(self.coordinator.word_characters().map(str::to_owned))
    }

    /// Deferred `word_characters`; the handle is already resolved.
    pub fn word_characters_async(&self) -> SpellResult<TaskHandle<Option<String>>> {
        let value = self.word_characters()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(TaskHandle::ready(id, Operation::GetWordCharacters, Ok(value)))
    }

    /// Adds `word` to the runtime dictionary.
    pub fn add(&self, word: &str) -> SpellResult<()> {
        self.run(add_call(word.to_owned()))
    }

    /// Deferred `add`.
    pub fn add_async(&self, word: &str) -> SpellResult<TaskHandle<()>> {
        self.defer(Operation::Add, add_call(word.to_owned()))
    }

    /// Adds `word` inflected like `example`.
    pub fn add_with_affix(&self, word: &str, example: &str) -> SpellResult<()> {
        self.run(add_with_affix_call(word.to_owned(), example.to_owned()))
    }

    /// Deferred `add_with_affix`.
    pub fn add_with_affix_async(&self, word: &str, example: &str) -> SpellResult<TaskHandle<()>> {
        self.defer(
            Operation::AddWithAffix,
            add_with_affix_call(word.to_owned(), example.to_owned()),
        )
    }

    /// Removes `word` from the runtime dictionary.
    pub fn remove(&self, word: &str) -> SpellResult<()> {
        self.run(remove_call(word.to_owned()))
    }

    /// Deferred `remove`.
    pub fn remove_async(&self, word: &str) -> SpellResult<TaskHandle<()>> {
        self.defer(Operation::Remove, remove_call(word.to_owned()))
    }

    /// Loads an additional dictionary file.
    pub fn add_dictionary(&self, path: impl AsRef<Path>) -> SpellResult<()> {
        self.run(add_dictionary_call(path.as_ref()))
    }

    /// Deferred `add_dictionary`.
    pub fn add_dictionary_async(&self, path: impl AsRef<Path>) -> SpellResult<TaskHandle<()>> {
        self.defer(Operation::AddDictionary, add_dictionary_call(path.as_ref()))
    }

    /// Runs a validated request on the calling thread.
    pub fn call(&self, request: Request) -> SpellResult<Outcome> {
        match request_call(request) {
            Some(invocation) => self.run(invocation),
            None => self.word_characters().map(Outcome::Text),
        }
    }

    /// Submits a validated request to the worker pool.
    pub fn submit(&self, request: Request) -> SpellResult<TaskHandle<Outcome>> {
        let operation = request.operation();
        match request_call(request) {
            Some(invocation) => self.defer(operation, invocation),
            None => {
                let value = self.word_characters()?;
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                Ok(TaskHandle::ready(id, operation, Ok(Outcome::Text(value))))
            }
        }
    }

    /// Dynamic entry point: resolves `name`, validates `args` and runs the
    /// request in `mode`.
    ///
    /// Argument errors are returned before the engine is touched, in both
    /// modes.
    pub fn invoke(&self, name: &str, args: &[Value], mode: Mode) -> SpellResult<Completion> {
        let operation: Operation = name.parse()?;
        let request = Request::parse(operation, args)?;
        match mode {
            Mode::Blocking => self.call(request).map(Completion::Ready),
            Mode::Deferred => self.submit(request).map(Completion::Pending),
        }
    }

    /// Stops accepting operations, lets queued tasks finish, then releases
    /// the engine. Idempotent: every caller returns only once the speller is
    /// closed.
    ///
    /// Must not be called from inside a deferred task's engine call.
    pub fn close(&self) {
        // Held for the whole teardown; concurrent callers wait here.
        let mut scheduler = self.scheduler.lock();
        if !self.coordinator.begin_close() {
            return;
        }
        tracing::debug!("speller draining");

        if let Some(pool) = scheduler.take() {
            pool.shutdown();
        }
        drop(self.coordinator.release_engine());
        tracing::debug!("speller closed");
    }
}

impl<E: Engine> Drop for Speller<E> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<E: Engine> std::fmt::Debug for Speller<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Speller")
            .field("coordinator", &self.coordinator)
            .field("pending_tasks", &self.pending_tasks())
            .finish_non_exhaustive()
    }
}
