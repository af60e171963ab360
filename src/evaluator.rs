//! Bounded-concurrency evaluation and ranking of candidate sets
//!
//! A fixed number of workers drain a shared queue of candidates, so at most
//! `concurrency_limit` evaluations run at any time. Each candidate moves
//! `Pending -> Running -> Completed | Failed`; a failure (error or panic)
//! only drops that candidate's result. Results are ranked once everything
//! has finished.

use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub const DEFAULT_CONCURRENCY: usize = 64;

/// A result that can be ranked
pub trait Scored {
    /// Metric results are ranked by, descending
    fn score(&self) -> f64;
    /// Stable key breaking ties between equal scores
    fn identity(&self) -> String;
    fn set_percent_of_max(&mut self, percent: f64);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Live counters of a running evaluation, safe to poll from other tasks
#[derive(Debug, Default)]
pub struct Progress {
    current: AtomicUsize,
    total: AtomicUsize,
    running: AtomicUsize,
    peak_running: AtomicUsize,
}

impl Progress {
    /// Candidates that finished, successfully or not
    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Candidates currently being evaluated
    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously running candidates seen
    pub fn peak_running(&self) -> usize {
        self.peak_running.load(Ordering::SeqCst)
    }

    fn start(&self, total: usize) {
        self.current.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
        self.running.store(0, Ordering::SeqCst);
        self.peak_running.store(0, Ordering::SeqCst);
    }

    fn enter(&self) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_running.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}

/// Stops scheduling new candidates once set. Candidates already running
/// are allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct EvaluateOptions {
    pub concurrency_limit: usize,
    /// Keep results computed before a cancellation instead of discarding them
    pub keep_partial: bool,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY,
            keep_partial: false,
        }
    }
}

#[derive(Debug)]
pub struct EvaluationReport<R> {
    /// Ranked results of completed candidates
    pub results: Vec<R>,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: bool,
    /// Final state of each candidate, in input order
    pub states: Vec<CandidateState>,
}

pub struct Evaluator {
    options: EvaluateOptions,
    progress: Arc<Progress>,
    cancel: CancelFlag,
}

struct Shared<C> {
    queue: Mutex<VecDeque<(usize, C)>>,
    states: Mutex<Vec<CandidateState>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Evaluator {
    pub fn new(options: EvaluateOptions) -> Self {
        Self {
            options,
            progress: Arc::new(Progress::default()),
            cancel: CancelFlag::default(),
        }
    }

    pub fn progress(&self) -> Arc<Progress> {
        Arc::clone(&self.progress)
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Evaluate every candidate with `evaluate_one` and rank the results.
    pub async fn evaluate<C, R, E, F, Fut>(
        &self,
        candidates: Vec<C>,
        evaluate_one: F,
    ) -> EvaluationReport<R>
    where
        C: Send + 'static,
        R: Scored + Send + 'static,
        E: Display + Send + 'static,
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let total = candidates.len();
        self.progress.start(total);

        let shared = Arc::new(Shared {
            queue: Mutex::new(candidates.into_iter().enumerate().collect()),
            states: Mutex::new(vec![CandidateState::Pending; total]),
        });
        let evaluate_one = Arc::new(evaluate_one);
        let workers = self.options.concurrency_limit.max(1).min(total);
        info!(total, workers, "evaluating candidates");

        let mut set = JoinSet::new();
        for worker in 0..workers {
            let shared = Arc::clone(&shared);
            let evaluate_one = Arc::clone(&evaluate_one);
            let progress = Arc::clone(&self.progress);
            let cancel = self.cancel.clone();

            set.spawn(async move {
                let mut completed: Vec<(usize, R)> = Vec::new();
                loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let next = lock(&shared.queue).pop_front();
                    let Some((index, candidate)) = next else {
                        break;
                    };

                    lock(&shared.states)[index] = CandidateState::Running;
                    progress.enter();

                    // own task so a panicking candidate can't take the worker down
                    let outcome = tokio::spawn(evaluate_one(candidate)).await;

                    let state = match outcome {
                        Ok(Ok(result)) => {
                            completed.push((index, result));
                            CandidateState::Completed
                        }
                        Ok(Err(e)) => {
                            warn!(worker, index, error = %e, "candidate failed");
                            CandidateState::Failed
                        }
                        Err(e) => {
                            warn!(worker, index, error = %e, "candidate panicked");
                            CandidateState::Failed
                        }
                    };
                    lock(&shared.states)[index] = state;
                    progress.leave();
                    debug!(worker, index, done = progress.current(), total, "candidate finished");
                }
                completed
            });
        }

        let mut gathered: Vec<(usize, R)> = Vec::with_capacity(total);
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(mut part) => gathered.append(&mut part),
                Err(e) => warn!(error = %e, "evaluation worker aborted"),
            }
        }

        let states = lock(&shared.states).clone();
        let succeeded = states.iter().filter(|s| **s == CandidateState::Completed).count();
        let failed = states.iter().filter(|s| **s == CandidateState::Failed).count();
        let cancelled = self.cancel.is_cancelled();

        if cancelled && !self.options.keep_partial {
            gathered.clear();
        }

        // input order first, so equal keys rank the same way on every run
        gathered.sort_by_key(|(index, _)| *index);
        let results = rank(gathered.into_iter().map(|(_, r)| r).collect());

        info!(attempted = succeeded + failed, succeeded, failed, cancelled, "evaluation finished");

        EvaluationReport {
            results,
            attempted: succeeded + failed,
            succeeded,
            failed,
            cancelled,
            states,
        }
    }
}

/// Sort results by score, descending, ties by identity, and annotate each
/// with its share of the best score. When the best score isn't positive
/// every share is 0. NaN scores rank last with a share of 0.
pub fn rank<R: Scored>(mut results: Vec<R>) -> Vec<R> {
    let max = results
        .iter()
        .map(Scored::score)
        .filter(|s| !s.is_nan())
        .fold(f64::NEG_INFINITY, f64::max);

    for r in &mut results {
        let score = r.score();
        let percent = if max > 0.0 && !score.is_nan() { score / max } else { 0.0 };
        r.set_percent_of_max(percent);
    }

    results.sort_by(|a, b| {
        let (sa, sb) = (a.score(), b.score());
        let by_score = match (sa.is_nan(), sb.is_nan()) {
            (false, false) => sb.total_cmp(&sa),
            (a_nan, b_nan) => a_nan.cmp(&b_nan),
        };
        by_score.then_with(|| a.identity().cmp(&b.identity()))
    });
    results
}
