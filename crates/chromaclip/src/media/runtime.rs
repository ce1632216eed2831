//! The dedicated execution context for decoder work.
//!
//! Decoder creation (and anything else that must happen off the render
//! thread, serialized) is marshalled onto a single owned worker thread. The
//! runtime is constructed explicitly by the host and passed into the
//! components that need it; there is no process-wide lazily-created
//! dispatcher.

use crossbeam_channel::{Sender, unbounded};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// An owned worker thread consuming posted tasks in order.
///
/// Dropping the runtime closes the queue, lets already-posted tasks finish,
/// and joins the thread.
pub struct MediaRuntime {
    tasks: Option<Sender<Task>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl MediaRuntime {
    pub fn new() -> std::io::Result<Self> {
        let (tasks, queue) = unbounded::<Task>();
        let thread = std::thread::Builder::new()
            .name("clip-media".into())
            .spawn(move || {
                while let Ok(task) = queue.recv() {
                    task();
                }
                log::debug!("media runtime stopped");
            })?;

        Ok(Self {
            tasks: Some(tasks),
            thread: Some(thread),
        })
    }

    /// Queue a task for execution on the media thread. Tasks run one at a
    /// time in post order.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        if let Some(tasks) = &self.tasks {
            if tasks.send(Box::new(task)).is_err() {
                log::warn!("media runtime is gone; task dropped");
            }
        }
    }
}

impl Drop for MediaRuntime {
    fn drop(&mut self) {
        self.tasks.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
