//! Fan-out / fan-in over the worker pool.
//!
//! Every barrier phase moves each worker into its own pool task together
//! with a [`Command`], and the task hands the worker back over a channel
//! with its [`Reply`].  The coordinator owns the workers again only once
//! every reply is in, so no worker is ever touched by two threads at once
//! and no locking is needed.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use rayon::ThreadPool;

use ls_core::{SimEvent, SimTime};
use ls_network::Scenario;
use ls_worker::{SubRoundOutput, Worker, WorkerResult};

use crate::{SimError, SimResult};

/// What a worker is asked to do in one barrier phase.
#[derive(Debug)]
pub(crate) enum Command {
    Init,
    Process { till: SimTime },
    Accept(Vec<SimEvent>),
}

#[derive(Debug)]
pub(crate) enum Reply {
    Ready,
    Processed(SubRoundOutput),
    Accepted,
}

/// Where in the run a phase happens; only used to label timeouts.
#[derive(Copy, Clone, Debug)]
pub(crate) struct PhaseLabel {
    pub epoch:     u64,
    pub sub_round: u32,
}

type Outcome = Result<WorkerResult<Reply>, Box<dyn Any + Send>>;

pub(crate) struct Barrier {
    pool:    ThreadPool,
    timeout: Option<Duration>,
}

impl Barrier {
    pub fn new(pool: ThreadPool, timeout: Option<Duration>) -> Self {
        Self { pool, timeout }
    }

    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `commands[i]` on `workers[i]` in parallel and wait for all of
    /// them.
    ///
    /// On success returns the workers (in their original order) and one
    /// reply per worker.  Every reply is collected before any failure is
    /// reported; if several workers fail, the one with the lowest index
    /// wins.  On error the workers are not returned.
    pub fn dispatch(
        &self,
        workers:  Vec<Worker>,
        commands: Vec<Command>,
        scenario: &Arc<Scenario>,
        label:    PhaseLabel,
    ) -> SimResult<(Vec<Worker>, Vec<Reply>)> {
        debug_assert_eq!(workers.len(), commands.len());
        let n = workers.len();
        let (tx, rx) = crossbeam_channel::bounded::<(usize, Worker, Outcome)>(n);

        for (index, (mut worker, command)) in workers.into_iter().zip(commands).enumerate() {
            let tx = tx.clone();
            let scenario = Arc::clone(scenario);
            self.pool.spawn(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| execute(&mut worker, &scenario, command)));
                // The receiver is gone only after a timeout; nothing to report to.
                let _ = tx.send((index, worker, outcome));
            });
        }
        drop(tx);

        let started = Instant::now();
        let deadline = self.timeout.map(|t| started + t);
        let mut slots: Vec<Option<(Worker, Outcome)>> = (0..n).map(|_| None).collect();
        for _ in 0..n {
            let (index, worker, outcome) = match deadline {
                Some(deadline) => rx.recv_deadline(deadline).map_err(|e| match e {
                    RecvTimeoutError::Timeout => SimError::BarrierTimeout {
                        epoch:     label.epoch,
                        sub_round: label.sub_round,
                        waited:    started.elapsed(),
                    },
                    RecvTimeoutError::Disconnected => SimError::Disconnected,
                })?,
                None => rx.recv().map_err(|_| SimError::Disconnected)?,
            };
            slots[index] = Some((worker, outcome));
        }

        let mut workers = Vec::with_capacity(n);
        let mut replies = Vec::with_capacity(n);
        for slot in slots {
            let (worker, outcome) = slot.ok_or(SimError::Disconnected)?;
            match outcome {
                Ok(Ok(reply)) => replies.push(reply),
                Ok(Err(source)) => return Err(SimError::Worker { worker: worker.id(), source }),
                Err(payload) => {
                    return Err(SimError::WorkerPanicked {
                        worker:  worker.id(),
                        message: panic_message(payload.as_ref()),
                    });
                }
            }
            workers.push(worker);
        }
        Ok((workers, replies))
    }
}

fn execute(worker: &mut Worker, scenario: &Scenario, command: Command) -> WorkerResult<Reply> {
    match command {
        Command::Init => {
            worker.init();
            Ok(Reply::Ready)
        }
        Command::Process { till } => worker.process_queued_events(scenario, till).map(Reply::Processed),
        Command::Accept(events) => worker.accept_events(scenario, events).map(|()| Reply::Accepted),
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
