//! Background search runner.
//!
//! At most one search is outstanding at a time. `start` moves the worker
//! from `Idle` to `Running` and spawns the scan on its own thread; the
//! completion comes back over a channel and the worker returns to `Idle`
//! only when the interactive thread receives it through `poll` or `wait`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use sheetfind_engine::filter::SearchError;
use sheetfind_engine::settings::SearchSettings;
use sheetfind_io::search::{search_file, SearchOutcome};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("search already in progress")]
pub struct ConcurrencyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
}

/// Message sent back by a finished search.
#[derive(Debug)]
pub struct SearchCompletion {
    pub settings: SearchSettings,
    pub phrase: String,
    pub outcome: SearchOutcome,
}

pub struct SearchWorker {
    state: WorkerState,
    receiver: Option<Receiver<SearchCompletion>>,
}

impl Default for SearchWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchWorker {
    pub fn new() -> Self {
        Self {
            state: WorkerState::Idle,
            receiver: None,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == WorkerState::Running
    }

    /// Search `path` in the background.
    pub fn start(
        &mut self,
        path: PathBuf,
        settings: SearchSettings,
        phrase: String,
    ) -> Result<(), ConcurrencyError> {
        self.start_with(settings, phrase, move |settings, phrase| {
            search_file(&path, settings, phrase)
        })
    }

    /// Run `job` as the outstanding search. A job that panics still
    /// completes, with an empty outcome carrying the panic message.
    pub fn start_with<F>(
        &mut self,
        settings: SearchSettings,
        phrase: String,
        job: F,
    ) -> Result<(), ConcurrencyError>
    where
        F: FnOnce(&SearchSettings, &str) -> SearchOutcome + Send + 'static,
    {
        if self.state == WorkerState::Running {
            return Err(ConcurrencyError);
        }

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(|| job(&settings, &phrase))) {
                Ok(outcome) => outcome,
                Err(payload) => {
                    let reason = panic_message(payload.as_ref());
                    log::error!("search {:?} panicked: {}", phrase, reason);
                    SearchOutcome {
                        rows: Vec::new(),
                        error: Some(SearchError::Source(format!("search thread panicked: {}", reason))),
                    }
                }
            };
            // Receiver gone means the session ended; nobody wants the rows
            let _ = tx.send(SearchCompletion {
                settings,
                phrase,
                outcome,
            });
        });

        self.state = WorkerState::Running;
        self.receiver = Some(rx);
        log::debug!("search started");
        Ok(())
    }

    /// Take the completion if it has arrived, without blocking.
    pub fn poll(&mut self) -> Option<SearchCompletion> {
        let result = self.receiver.as_ref()?.try_recv();
        match result {
            Ok(completion) => {
                self.finish();
                Some(completion)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::error!("search thread exited without reporting");
                self.finish();
                None
            }
        }
    }

    /// Block until the outstanding search completes. Returns `None` when
    /// nothing is running.
    pub fn wait(&mut self) -> Option<SearchCompletion> {
        let result = self.receiver.as_ref()?.recv();
        self.finish();
        match result {
            Ok(completion) => Some(completion),
            Err(_) => {
                log::error!("search thread exited without reporting");
                None
            }
        }
    }

    fn finish(&mut self) {
        self.receiver = None;
        self.state = WorkerState::Idle;
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
