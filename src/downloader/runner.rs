// Background runner: one worker thread per session, events over a channel

use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use tokio::sync::mpsc::UnboundedReceiver;

use super::messages;
use super::models::{DownloadRequest, DownloadResult, SessionEvent};
use super::naming::DEFAULT_PLAYLIST_TITLE;
use super::orchestrator::DownloadOrchestrator;
use super::traits::ProgressEmitter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "outcome", rename_all = "snake_case")]
pub enum RunnerState {
    Idle,
    Running,
    Terminal(Outcome),
}

/// A started session: its event stream and the worker thread
pub struct SessionHandle {
    pub events: UnboundedReceiver<SessionEvent>,
    worker: JoinHandle<DownloadResult>,
}

impl SessionHandle {
    /// Block until the worker is done
    pub fn join(self) -> Option<DownloadResult> {
        self.worker.join().ok()
    }

    pub fn into_parts(self) -> (UnboundedReceiver<SessionEvent>, JoinHandle<DownloadResult>) {
        (self.events, self.worker)
    }
}

/// Runs at most one session at a time off the caller's thread
pub struct BackgroundRunner {
    orchestrator: Arc<DownloadOrchestrator>,
    state: Arc<Mutex<RunnerState>>,
}

impl BackgroundRunner {
    pub fn new(orchestrator: DownloadOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            state: Arc::new(Mutex::new(RunnerState::Idle)),
        }
    }

    pub fn state(&self) -> RunnerState {
        *lock(&self.state)
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunnerState::Running
    }

    /// Start a session. Returns `None` while another one is still running.
    pub fn start(&self, request: DownloadRequest) -> Option<SessionHandle> {
        {
            let mut state = lock(&self.state);
            if *state == RunnerState::Running {
                tracing::debug!(url = %request.url, "start ignored: a download is already running");
                return None;
            }
            *state = RunnerState::Running;
        }

        let (emitter, events) = ProgressEmitter::channel();
        let orchestrator = Arc::clone(&self.orchestrator);
        let guard = TerminalGuard {
            state: Arc::clone(&self.state),
            emitter: emitter.clone(),
            output_dir: request.output_dir.clone(),
            settled: false,
        };

        let spawned = std::thread::Builder::new()
            .name("download-worker".to_string())
            .spawn(move || run_session(&orchestrator, request, &emitter, guard));

        match spawned {
            Ok(worker) => Some(SessionHandle { events, worker }),
            Err(e) => {
                // The guard moved into the failed closure and already reset the state.
                tracing::error!(error = %e, "failed to spawn download worker");
                None
            }
        }
    }
}

fn run_session(
    orchestrator: &DownloadOrchestrator,
    request: DownloadRequest,
    emitter: &ProgressEmitter,
    mut guard: TerminalGuard,
) -> DownloadResult {
    let result = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt.block_on(orchestrator.run(&request, emitter)),
        Err(e) => {
            tracing::error!(error = %e, "failed to build worker runtime");
            emitter.status(messages::error(&e));
            emitter.status(messages::session_failed());
            failed_result(request.output_dir.clone())
        }
    };

    guard.settle(if result.succeeded {
        Outcome::Success
    } else {
        Outcome::Failure
    });
    emitter.finished(result.clone());
    result
}

fn failed_result(output_dir: PathBuf) -> DownloadResult {
    DownloadResult {
        succeeded: false,
        output_dir,
        playlist_title: DEFAULT_PLAYLIST_TITLE.to_string(),
        total_items: 1,
    }
}

/// Moves the runner out of `Running` and closes the event stream with a
/// result even if the worker panics
struct TerminalGuard {
    state: Arc<Mutex<RunnerState>>,
    emitter: ProgressEmitter,
    output_dir: PathBuf,
    settled: bool,
}

impl TerminalGuard {
    fn settle(&mut self, outcome: Outcome) {
        *lock(&self.state) = RunnerState::Terminal(outcome);
        self.settled = true;
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if !self.settled {
            *lock(&self.state) = RunnerState::Terminal(Outcome::Failure);
            self.emitter.status(messages::session_failed());
            self.emitter
                .finished(failed_result(std::mem::take(&mut self.output_dir)));
        }
    }
}

fn lock(state: &Mutex<RunnerState>) -> MutexGuard<'_, RunnerState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
