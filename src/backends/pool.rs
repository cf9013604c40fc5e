//! Worker pool
//!
//! One producer thread feeds candidate paths into a bounded queue, a fixed
//! number of workers rewrite them, and a supervisor thread joins everyone
//! before the event channel closes. The caller drains events until the
//! channel is exhausted, then collects the walk outcome from the supervisor.

use crossbeam_channel::{bounded, Receiver};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

use crate::backends::scan::ScanError;
use crate::core::cancel::CancelToken;
use crate::core::model::ProcessingResult;

/// Default worker count
pub const DEFAULT_WORKERS: usize = 30;

/// Messages delivered to the single consumer
#[derive(Debug)]
pub enum PoolEvent {
    /// A candidate was handed to the queue
    Dispatched(PathBuf),
    /// A worker finished a candidate
    Finished(ProcessingResult),
}

pub struct WorkerPool {
    workers: usize,
    cancel: CancelToken,
}

impl WorkerPool {
    pub fn new(workers: usize, cancel: CancelToken) -> Self {
        Self {
            workers: workers.max(1),
            cancel,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Start producer, workers and supervisor.
    ///
    /// `job` runs once per candidate on a worker thread. A walk error stops
    /// the producer; already queued candidates are still processed.
    pub fn run<I, F>(&self, candidates: I, job: F) -> PoolHandle
    where
        I: IntoIterator<Item = Result<PathBuf, ScanError>>,
        I::IntoIter: Send + 'static,
        F: Fn(&Path) -> ProcessingResult + Send + Sync + 'static,
    {
        let (jobs_tx, jobs_rx) = bounded::<PathBuf>(self.workers);
        let (events_tx, events_rx) = bounded::<PoolEvent>(self.workers * 2);
        let job = Arc::new(job);

        let workers: Vec<JoinHandle<()>> = (0..self.workers)
            .map(|_| {
                let jobs_rx = jobs_rx.clone();
                let events_tx = events_tx.clone();
                let cancel = self.cancel.clone();
                let job = Arc::clone(&job);

                thread::spawn(move || {
                    while !cancel.is_cancelled() {
                        let Ok(path) = jobs_rx.recv() else {
                            break;
                        };
                        let result = (*job)(&path);
                        if events_tx.send(PoolEvent::Finished(result)).is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        drop(jobs_rx);

        let producer = {
            let events_tx = events_tx.clone();
            let cancel = self.cancel.clone();
            let candidates = candidates.into_iter();

            thread::spawn(move || -> Result<(), ScanError> {
                for candidate in candidates {
                    if cancel.is_cancelled() {
                        return Err(ScanError::Cancelled);
                    }
                    let path = candidate?;
                    // Sends fail once every worker has exited, e.g. after a cancel
                    // while the queue was full.
                    let sent = events_tx.send(PoolEvent::Dispatched(path.clone())).is_ok()
                        && jobs_tx.send(path).is_ok();
                    if !sent {
                        if cancel.is_cancelled() {
                            return Err(ScanError::Cancelled);
                        }
                        break;
                    }
                }
                Ok(())
                // Dropping `jobs_tx` closes the queue and lets workers drain.
            })
        };

        let supervisor = thread::spawn(move || -> Result<(), ScanError> {
            let walk = producer.join().unwrap_or_else(|_| {
                error!("producer thread panicked");
                Ok(())
            });
            for (index, worker) in workers.into_iter().enumerate() {
                if worker.join().is_err() {
                    error!(worker = index, "worker thread panicked");
                }
            }
            debug!("all workers finished");
            drop(events_tx);
            walk
        });

        PoolHandle {
            events: events_rx,
            supervisor,
        }
    }
}

/// Consumer side of a running pool
pub struct PoolHandle {
    events: Receiver<PoolEvent>,
    supervisor: JoinHandle<Result<(), ScanError>>,
}

impl PoolHandle {
    /// Events in arrival order; ends once every worker has exited
    pub fn events(&self) -> crossbeam_channel::Iter<'_, PoolEvent> {
        self.events.iter()
    }

    /// Wait for the supervisor and return the walk outcome
    pub fn finish(self) -> Result<(), ScanError> {
        drop(self.events);
        self.supervisor.join().unwrap_or_else(|_| {
            error!("supervisor thread panicked");
            Ok(())
        })
    }
}
