//! One pipeline stage: a worker pool draining an input queue.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::worker::Worker;

use super::Job;

/// A pool of identical workers between two queues.
///
/// Each worker blocks on the input queue with a bounded timeout so it can
/// observe deactivation. A successfully processed picture gets its
/// history entry and derived sidecar recorded, then moves to the output
/// queue; a failed picture is logged and dropped, counted so the pipeline
/// can still account for every submitted job.
pub(super) struct Stage {
    worker: Arc<dyn Worker>,
    pool_size: usize,
    handles: Vec<JoinHandle<()>>,
}

pub(super) struct StageContext {
    pub input: Receiver<Job>,
    pub output: Sender<Job>,
    pub active: Arc<AtomicBool>,
    pub dropped: Arc<AtomicU64>,
    pub repo_root: PathBuf,
    pub poll: Duration,
}

impl Stage {
    pub fn new(worker: Arc<dyn Worker>, pool_size: usize) -> Self {
        Self {
            worker,
            pool_size,
            handles: Vec::new(),
        }
    }

    pub fn start(&mut self, ctx: &StageContext) {
        for seat in 0..self.pool_size {
            let worker = Arc::clone(&self.worker);
            let input = ctx.input.clone();
            let output = ctx.output.clone();
            let active = Arc::clone(&ctx.active);
            let dropped = Arc::clone(&ctx.dropped);
            let repo_root = ctx.repo_root.clone();
            let poll = ctx.poll;

            let name = format!("{}-{}", worker.name(), seat);
            let handle = thread::Builder::new()
                .name(name)
                .spawn(move || {
                    run_worker(&*worker, &input, &output, &active, &dropped, &repo_root, poll)
                })
                .expect("spawn stage worker thread");
            self.handles.push(handle);
        }
    }

    /// Wait for all workers of this stage to exit. Callers deactivate the
    /// shared flag first; workers notice within one poll interval.
    pub fn join(&mut self) {
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn run_worker(
    worker: &dyn Worker,
    input: &Receiver<Job>,
    output: &Sender<Job>,
    active: &AtomicBool,
    dropped: &AtomicU64,
    repo_root: &Path,
    poll: Duration,
) {
    loop {
        match input.recv_timeout(poll) {
            Ok(mut job) => {
                match worker.process(&mut job.picture, repo_root) {
                    Ok(sidecar) => {
                        job.picture.record_step(worker.name());
                        if let Some(sidecar) = sidecar {
                            job.picture.add_sidecar(sidecar);
                        }
                        if output.send(job).is_err() {
                            // Downstream gone, nothing left to feed.
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            worker = worker.name(),
                            job = job.number,
                            file = job.picture.filename(),
                            error = %e,
                            "processing failed, picture dropped"
                        );
                        dropped.fetch_add(1, Ordering::SeqCst);
                    }
                }
                // Deactivation while draining means abandon queued work.
                if !active.load(Ordering::SeqCst) {
                    return;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !active.load(Ordering::SeqCst) {
                    return;
                }
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}
