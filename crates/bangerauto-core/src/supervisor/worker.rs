use std::io;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// How a bounded join ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Thread finished and was joined.
    Joined,
    /// Thread finished by panicking.
    Panicked,
    /// Thread outlived both timeouts and was detached.
    Abandoned,
}

/// A named thread whose lifetime is owned by a supervisor.
#[derive(Debug)]
pub struct Worker<T> {
    name: String,
    handle: JoinHandle<T>,
}

impl<T: Send + 'static> Worker<T> {
    pub fn spawn<F>(name: impl Into<String>, f: F) -> io::Result<Self>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let name = name.into();
        let handle = thread::Builder::new().name(name.clone()).spawn(f)?;
        debug!("Spawned worker thread '{}'", name);
        Ok(Self { name, handle })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Join, waiting at most `quit` and then `terminate` before giving up.
    ///
    /// The caller must have asked the thread to stop already. A thread still
    /// running after both windows is detached; there is no way to kill it.
    pub fn join_within(self, quit: Duration, terminate: Duration) -> (JoinOutcome, Option<T>) {
        if !wait_finished(&self.handle, quit) {
            warn!(
                "Worker '{}' did not stop within {:?}, waiting {:?} more",
                self.name, quit, terminate
            );
            if !wait_finished(&self.handle, terminate) {
                error!(
                    "Worker '{}' still running after {:?}; abandoning thread",
                    self.name,
                    quit + terminate
                );
                return (JoinOutcome::Abandoned, None);
            }
        }

        match self.handle.join() {
            Ok(value) => (JoinOutcome::Joined, Some(value)),
            Err(_) => {
                error!("Worker '{}' panicked", self.name);
                (JoinOutcome::Panicked, None)
            }
        }
    }
}

fn wait_finished<T>(handle: &JoinHandle<T>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(JOIN_POLL_INTERVAL);
    }
    true
}
