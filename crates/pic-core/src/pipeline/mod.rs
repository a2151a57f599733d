//! The concurrent processing pipeline.
//!
//! A recipe with S stages becomes S worker pools connected by S+1
//! unbounded queues; pictures move by value from queue to queue, so a
//! picture is owned by exactly one worker (or one queue) at any time.
//! Submitted jobs are conserved: every picture put in eventually shows up
//! on the output queue or is dropped by a failing stage, never both.

mod stage;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::config::RepoConfig;
use crate::picture::Picture;
use crate::recipe::Recipe;

use self::stage::{Stage, StageContext};

/// How often the drain loop re-checks progress and the interrupt flag.
const DRAIN_POLL: Duration = Duration::from_millis(25);

/// A numbered unit of pipeline work.
pub(crate) struct Job {
    pub number: u64,
    pub picture: Picture,
}

pub struct Pipeline {
    stages: Vec<Stage>,
    contexts: Vec<StageContext>,
    input: Sender<Job>,
    output: Receiver<Job>,
    active: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    submitted: AtomicU64,
}

impl Pipeline {
    /// Build a pipeline for `recipe` over the repo rooted at `repo_root`.
    /// Worker pool sizes and the queue poll interval come from `config`.
    pub fn new(recipe: &Recipe, config: &RepoConfig, repo_root: PathBuf) -> Self {
        let active = Arc::new(AtomicBool::new(true));
        let dropped = Arc::new(AtomicU64::new(0));
        let poll = Duration::from_millis(config.pipeline.poll_ms.max(1));

        // S+1 queues: queue i feeds stage i, the last queue is the output.
        let mut senders = Vec::with_capacity(recipe.len() + 1);
        let mut receivers = Vec::with_capacity(recipe.len() + 1);
        for _ in 0..=recipe.len() {
            let (tx, rx) = unbounded();
            senders.push(tx);
            receivers.push(rx);
        }
        let input = senders[0].clone();
        let output = receivers[recipe.len()].clone();

        let mut stages = Vec::with_capacity(recipe.len());
        let mut contexts = Vec::with_capacity(recipe.len());
        for (i, kind) in recipe.kinds().iter().enumerate() {
            stages.push(Stage::new(
                kind.build(config),
                config.worker_count(kind.name()),
            ));
            contexts.push(StageContext {
                input: receivers[i].clone(),
                output: senders[i + 1].clone(),
                active: Arc::clone(&active),
                dropped: Arc::clone(&dropped),
                repo_root: repo_root.clone(),
                poll,
            });
        }

        Self {
            stages,
            contexts,
            input,
            output,
            active,
            dropped,
            submitted: AtomicU64::new(0),
        }
    }

    /// Spawn all stage worker pools.
    pub fn start(&mut self) {
        for (stage, ctx) in self.stages.iter_mut().zip(&self.contexts) {
            stage.start(ctx);
        }
        tracing::debug!(stages = self.stages.len(), "pipeline started");
    }

    /// Submit one picture and return its monotonic job number. With an
    /// empty recipe the picture lands on the output queue unchanged.
    pub fn put(&self, picture: Picture) -> u64 {
        let number = self.submitted.fetch_add(1, Ordering::SeqCst) + 1;
        // The receiving end outlives self, so this cannot fail.
        let _ = self.input.send(Job { number, picture });
        number
    }

    /// (submitted, completed) job counts; completed includes drops.
    pub fn progress(&self) -> (u64, u64) {
        let done = self.dropped.load(Ordering::SeqCst) + self.output.len() as u64;
        (self.submitted.load(Ordering::SeqCst), done)
    }

    /// Depth of every queue, stage inputs first, output last.
    pub fn queue_depths(&self) -> Vec<usize> {
        let mut depths: Vec<usize> = self.contexts.iter().map(|c| c.input.len()).collect();
        depths.push(self.output.len());
        depths
    }

    /// Block until every submitted picture has been processed or dropped,
    /// or until `interrupt` is raised. Then stop the stages and return
    /// whatever reached the output queue, in arrival order.
    pub fn finish(mut self, interrupt: &AtomicBool) -> Vec<Picture> {
        loop {
            let (submitted, done) = self.progress();
            if done >= submitted {
                break;
            }
            if interrupt.load(Ordering::SeqCst) {
                tracing::warn!(submitted, done, "interrupted, abandoning queued work");
                break;
            }
            thread::sleep(DRAIN_POLL);
        }

        self.active.store(false, Ordering::SeqCst);
        for stage in &mut self.stages {
            stage.join();
        }
        self.output.try_iter().map(|job| job.picture).collect()
    }
}
