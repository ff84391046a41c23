//! Worker pool for rule invocations.
//!
//! Jobs go to worker threads over a `crossbeam-channel` queue. Workers report
//! back on an event channel when they start and finish a job, which lets the
//! scanning thread spot an invocation that outlives the time bound. Such a
//! worker is abandoned (threads cannot be killed), its job is recorded as
//! timed out, and a replacement worker takes over the rest of the queue.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::context::{BlockAddress, Context};
use crate::finding::Finding;
use crate::rule::RuleSpec;

/// One (block, rule) invocation.
#[derive(Debug, Clone)]
pub(crate) struct Job {
    pub id: usize,
    pub block: BlockAddress,
    pub rule: Arc<RuleSpec>,
}

/// What became of one invocation.
#[derive(Debug)]
pub(crate) enum Outcome {
    Completed(Vec<Finding>),
    Panicked(String),
    TimedOut(Duration),
}

enum Event {
    Started {
        worker: usize,
        job: usize,
        at: Instant,
    },
    Finished {
        worker: usize,
        job: usize,
        elapsed: Duration,
        outcome: Outcome,
    },
}

/// Bookkeeping on the scanning thread.
struct Collector {
    outcomes: Vec<Option<Outcome>>,
    remaining: usize,
    /// worker -> (job, start instant) for invocations without a result yet
    running: HashMap<usize, (usize, Instant)>,
    timeout: Duration,
}

impl Collector {
    fn new(jobs: usize, timeout: Duration) -> Self {
        Self {
            outcomes: (0..jobs).map(|_| None).collect(),
            remaining: jobs,
            running: HashMap::new(),
            timeout,
        }
    }

    /// Store the first outcome for `job`; later ones are ignored.
    fn record(&mut self, job: usize, outcome: Outcome) -> bool {
        match self.outcomes.get_mut(job) {
            Some(slot) if slot.is_none() => {
                *slot = Some(outcome);
                self.remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Started { worker, job, at } => {
                self.running.insert(worker, (job, at));
            }
            Event::Finished {
                worker,
                job,
                elapsed,
                outcome,
            } => {
                if self.running.get(&worker).is_some_and(|&(j, _)| j == job) {
                    self.running.remove(&worker);
                }
                // The worker's own clock decides, not when the event was read
                let outcome = if elapsed > self.timeout {
                    Outcome::TimedOut(self.timeout)
                } else {
                    outcome
                };
                self.record(job, outcome);
            }
        }
    }

    /// Workers whose current invocation was still unfinished at `now` and
    /// has run longer than the timeout.
    fn overdue(&self, now: Instant) -> Vec<(usize, usize)> {
        self.running
            .iter()
            .filter(|(_, (_, at))| now.saturating_duration_since(*at) > self.timeout)
            .map(|(&worker, &(job, _))| (worker, job))
            .collect()
    }
}

/// Run every job and return outcomes indexed by job id.
pub(crate) fn run(
    jobs: &[Job],
    context: &Arc<Context>,
    workers: usize,
    timeout: Duration,
) -> Vec<Outcome> {
    if jobs.is_empty() {
        return Vec::new();
    }

    let (job_tx, job_rx) = crossbeam_channel::unbounded::<Job>();
    let (event_tx, event_rx) = crossbeam_channel::unbounded::<Event>();
    for job in jobs {
        // Receiver is alive, send cannot fail
        let _ = job_tx.send(job.clone());
    }
    drop(job_tx);

    let mut next_worker = workers.clamp(1, jobs.len());
    let live = (0..next_worker)
        .filter(|&id| spawn_worker(id, &job_rx, &event_tx, context))
        .count();

    if live == 0 {
        tracing::warn!("Could not start any worker thread, evaluating rules inline");
        return jobs.iter().map(|job| invoke(job, context)).collect();
    }

    let mut collector = Collector::new(jobs.len(), timeout);
    let poll = (timeout / 4).clamp(Duration::from_millis(5), Duration::from_millis(100));

    while collector.remaining > 0 {
        let first = match event_rx.recv_timeout(poll) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            // The pool keeps its own sender, so this never happens
            Err(RecvTimeoutError::Disconnected) => break,
        };

        // Anything finished before `now` is already queued, so after the
        // drain every entry left in `running` was genuinely still running.
        let now = Instant::now();
        for event in first.into_iter().chain(event_rx.try_iter()) {
            collector.handle(event);
        }

        for (worker, job) in collector.overdue(now) {
            collector.running.remove(&worker);
            if collector.record(job, Outcome::TimedOut(timeout)) {
                tracing::warn!(
                    rule = %jobs[job].rule.code,
                    worker,
                    "Rule invocation exceeded {:?}, abandoning worker",
                    timeout
                );
            }
            if collector.remaining == 0 {
                continue;
            }
            if !spawn_worker(next_worker, &job_rx, &event_tx, context) {
                // Drain what is still queued on this thread
                for job in job_rx.try_iter() {
                    let outcome = invoke(&job, context);
                    collector.record(job.id, outcome);
                }
            }
            next_worker += 1;
        }
    }

    collector
        .outcomes
        .into_iter()
        .map(|outcome| {
            outcome.unwrap_or_else(|| Outcome::Panicked("worker pool stopped early".to_string()))
        })
        .collect()
}

fn spawn_worker(
    id: usize,
    jobs: &Receiver<Job>,
    events: &Sender<Event>,
    context: &Arc<Context>,
) -> bool {
    let jobs = jobs.clone();
    let events = events.clone();
    let context = Arc::clone(context);

    let spawned = thread::Builder::new()
        .name(format!("tfguard-worker-{}", id))
        .spawn(move || {
            for job in jobs.iter() {
                let at = Instant::now();
                let started = Event::Started {
                    worker: id,
                    job: job.id,
                    at,
                };
                if events.send(started).is_err() {
                    break;
                }
                let outcome = invoke(&job, &context);
                let finished = Event::Finished {
                    worker: id,
                    job: job.id,
                    elapsed: at.elapsed(),
                    outcome,
                };
                if events.send(finished).is_err() {
                    break;
                }
            }
        });

    match spawned {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Failed to spawn worker {}: {}", id, e);
            false
        }
    }
}

/// Invoke one check function, containing any panic it raises.
pub(crate) fn invoke(job: &Job, context: &Context) -> Outcome {
    let Some(block) = context.block_at(&job.block) else {
        return Outcome::Panicked(format!("no block at {:?}", job.block));
    };
    let Some(check) = job.rule.check.as_ref() else {
        return Outcome::Completed(Vec::new());
    };

    match panic::catch_unwind(AssertUnwindSafe(|| check(&job.rule, block, context))) {
        Ok(findings) => Outcome::Completed(findings),
        Err(payload) => Outcome::Panicked(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
