mod events;

pub use events::{CallbackSink, JobEvent, JobEventSink};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{error, info};

use crate::background::{
    output_name, BackgroundRemoval, OutputAccumulator, TemporalMedian, TemporalMedianConfig,
};
use crate::error::{Result, VistaError};
use crate::frame::{FrameStack, Pixel};

/// Lifecycle of a job. Every state except `Running` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        self != Self::Running
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Completed,
            2 => Self::Cancelled,
            3 => Self::Failed,
            _ => Self::Running,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Running => 0,
            Self::Completed => 1,
            Self::Cancelled => 2,
            Self::Failed => 3,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Completed => write!(f, "Completed"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Cooperative cancellation flag shared between a job and its host.
///
/// Cloning yields another handle to the same flag. Cancelling is idempotent
/// and has no effect once the job has reached a terminal state.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Clone, Debug)]
struct SharedStatus(Arc<AtomicU8>);

impl SharedStatus {
    fn running() -> Self {
        Self(Arc::new(AtomicU8::new(JobStatus::Running.as_u8())))
    }

    fn get(&self) -> JobStatus {
        JobStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move from `Running` to `terminal`. Returns false if already terminal.
    fn finish(&self, terminal: JobStatus) -> bool {
        self.0
            .compare_exchange(
                JobStatus::Running.as_u8(),
                terminal.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

/// Host-side handle to a job running on its own worker thread.
///
/// Dropping the handle detaches the worker; it still runs to a terminal
/// state and emits its final event.
#[derive(Debug)]
pub struct JobHandle {
    cancel: CancelToken,
    status: SharedStatus,
    worker: Option<JoinHandle<()>>,
}

impl JobHandle {
    /// Request cancellation. Takes effect at the next frame boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn status(&self) -> JobStatus {
        self.status.get()
    }

    pub fn is_finished(&self) -> bool {
        self.status().is_terminal()
    }

    /// Block until the worker exits and return the final status.
    pub fn wait(self) -> JobStatus {
        let status = self.status.clone();
        self.join().unwrap_or_else(|_| {
            status.finish(JobStatus::Failed);
            status.get()
        })
    }

    /// Block until the worker exits. Errors if the worker thread itself
    /// unwound instead of returning.
    pub fn join(mut self) -> Result<JobStatus> {
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|payload| VistaError::Processing(panic_message(payload.as_ref())))?;
        }
        Ok(self.status.get())
    }
}

enum Outcome<T> {
    Completed(FrameStack<T>),
    Cancelled,
}

/// Validate `config` and start a temporal median job over `stack`.
///
/// Returns as soon as the worker thread is running. An invalid configuration
/// is reported here and no worker is started.
pub fn start_temporal_median<T, S>(
    stack: Arc<FrameStack<T>>,
    config: TemporalMedianConfig,
    sink: S,
) -> Result<JobHandle>
where
    T: Pixel,
    S: JobEventSink<T>,
{
    let algorithm = TemporalMedian::new(Arc::clone(&stack), config)?;
    spawn_job(stack, Box::new(algorithm), sink)
}

/// Run `algorithm` over `stack` on a dedicated worker thread.
pub fn spawn_job<T, S>(
    stack: Arc<FrameStack<T>>,
    algorithm: Box<dyn BackgroundRemoval<T>>,
    sink: S,
) -> Result<JobHandle>
where
    T: Pixel,
    S: JobEventSink<T>,
{
    spawn_job_with_cancel(stack, algorithm, sink, CancelToken::new())
}

/// Like [`spawn_job`], but observes a cancellation token the host created
/// beforehand.
pub fn spawn_job_with_cancel<T, S>(
    stack: Arc<FrameStack<T>>,
    algorithm: Box<dyn BackgroundRemoval<T>>,
    sink: S,
    cancel: CancelToken,
) -> Result<JobHandle>
where
    T: Pixel,
    S: JobEventSink<T>,
{
    if algorithm.total_frames() != stack.len() {
        return Err(VistaError::Validation(format!(
            "{} expects {} frames but the stack has {}",
            algorithm.name(),
            algorithm.total_frames(),
            stack.len()
        )));
    }

    let status = SharedStatus::running();

    let worker = {
        let cancel = cancel.clone();
        let status = status.clone();
        std::thread::Builder::new()
            .name("vista-job".into())
            .spawn(move || run_job(stack, algorithm, sink, cancel, status))?
    };

    Ok(JobHandle {
        cancel,
        status,
        worker: Some(worker),
    })
}

fn run_job<T: Pixel, S: JobEventSink<T>>(
    stack: Arc<FrameStack<T>>,
    mut algorithm: Box<dyn BackgroundRemoval<T>>,
    sink: S,
    cancel: CancelToken,
    status: SharedStatus,
) {
    info!(
        source = %stack,
        algorithm = algorithm.name(),
        "Job started"
    );

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        drive(&stack, algorithm.as_mut(), &sink, &cancel)
    }));

    match outcome {
        Ok(Ok(Outcome::Completed(output))) => {
            info!(output = %output, "Job completed");
            status.finish(JobStatus::Completed);
            deliver_terminal(&sink, JobEvent::Completed(output));
        }
        Ok(Ok(Outcome::Cancelled)) => {
            info!(source = stack.name(), "Job cancelled");
            status.finish(JobStatus::Cancelled);
            deliver_terminal(&sink, JobEvent::Cancelled);
        }
        Ok(Err(e)) => fail(&sink, &status, format!("Error processing imagery: {e}")),
        Err(payload) => fail(
            &sink,
            &status,
            format!("Error processing imagery: {}", panic_message(payload.as_ref())),
        ),
    }
}

fn drive<T: Pixel, S: JobEventSink<T>>(
    stack: &FrameStack<T>,
    algorithm: &mut dyn BackgroundRemoval<T>,
    sink: &S,
    cancel: &CancelToken,
) -> Result<Outcome<T>> {
    let total = algorithm.total_frames();
    let mut output = OutputAccumulator::new(stack);

    for done in 1..=total {
        if cancel.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }
        let (index, frame) = algorithm.step()?;
        output.insert(index, &frame)?;
        sink.send(JobEvent::Progress {
            frame_index: done,
            total,
        });
    }

    if cancel.is_cancelled() {
        return Ok(Outcome::Cancelled);
    }

    let name = output_name(stack, algorithm.name());
    let result = output.finish(stack, name, algorithm.description())?;
    Ok(Outcome::Completed(result))
}

fn fail<T, S: JobEventSink<T>>(sink: &S, status: &SharedStatus, message: String) {
    error!("{message}");
    status.finish(JobStatus::Failed);
    deliver_terminal(sink, JobEvent::Failed { message });
}

/// Send the final event. A panicking sink is logged and the worker still
/// exits normally; the status is already terminal at this point.
fn deliver_terminal<T, S: JobEventSink<T>>(sink: &S, event: JobEvent<T>) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| sink.send(event))) {
        error!(
            "Event sink panicked on terminal event: {}",
            panic_message(payload.as_ref())
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
