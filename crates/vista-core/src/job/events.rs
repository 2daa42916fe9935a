use std::sync::mpsc;

use crate::frame::FrameStack;

/// Notifications emitted by a running job, in order.
///
/// A job emits zero or more `Progress` events followed by exactly one of
/// `Completed`, `Cancelled` or `Failed`.
#[derive(Debug)]
#[allow(clippy::large_enum_variant)]
pub enum JobEvent<T = f32> {
    /// `frame_index` frames out of `total` are done (1-based).
    Progress { frame_index: usize, total: usize },
    Completed(FrameStack<T>),
    Cancelled,
    Failed { message: String },
}

impl<T> JobEvent<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

/// Destination for job notifications.
///
/// Called on the job's worker thread. Implementations that need delivery on
/// another thread forward the event there (a channel, an event loop proxy).
pub trait JobEventSink<T>: Send + 'static {
    fn send(&self, event: JobEvent<T>);
}

impl<T: Send + 'static> JobEventSink<T> for mpsc::Sender<JobEvent<T>> {
    fn send(&self, event: JobEvent<T>) {
        // A dropped receiver means the host stopped listening.
        let _ = mpsc::Sender::send(self, event);
    }
}

/// Adapts a closure into a [`JobEventSink`].
pub struct CallbackSink<F>(pub F);

impl<T, F> JobEventSink<T> for CallbackSink<F>
where
    F: Fn(JobEvent<T>) + Send + 'static,
{
    fn send(&self, event: JobEvent<T>) {
        (self.0)(event);
    }
}
