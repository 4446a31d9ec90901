//! A plain FIFO thread pool with cancellable work items.
//!
//! Used by [`render`]'s `RenderSystem` to host the single background render
//! thread: no priority levels are needed there since `RenderQueue` already
//! orders work itself, so the single-priority pool is the right fit rather
//! than pulling in [`crate::priority`] for a pool that only ever runs with
//! `num_threads = 1`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, Weak};
use std::thread::JoinHandle;

use crate::common::Monitor;
use crate::handle::{self, Handle, QueueControl, QueueEntry};

/// A basic thread pool with a fixed number of threads and cancellable
/// tasks, FIFO within the single queue.
pub struct Executor {
    inner: Arc<Inner>,
    threads: Vec<JoinHandle<()>>,
}

struct Inner {
    queue: Mutex<VecDeque<QueueEntry>>,
    signal: Condvar,
    running: AtomicBool,
    next_id: AtomicU64,
}

impl Executor {
    pub fn new(num_threads: u32) -> Self {
        let inner = Arc::new(Inner {
            queue: Mutex::new(VecDeque::new()),
            signal: Condvar::new(),
            running: AtomicBool::new(true),
            next_id: AtomicU64::new(0),
        });

        let threads = (0..num_threads)
            .map(|_| {
                let inner = inner.clone();
                std::thread::spawn(move || inner.process())
            })
            .collect();

        Executor { inner, threads }
    }

    pub fn submit<F, R>(&self, closure: F) -> Handle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit_with((), closure)
    }

    pub fn submit_with<F, R, M>(&self, monitor: M, closure: F) -> Handle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
        M: Monitor + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let control: Weak<dyn QueueControl> = Arc::downgrade(&self.inner);
        let (entry, handle) = handle::package(id, 0, monitor, closure, control);

        let mut queue = self.inner.queue.lock().unwrap();
        queue.push_back(entry);
        self.inner.signal.notify_one();
        drop(queue);

        handle
    }

    /// Tells all worker threads to stop once their current task finishes
    /// and joins them. Pending tasks are dropped without running.
    pub fn shutdown(&mut self) {
        self.inner.running.store(false, Ordering::SeqCst);
        self.inner.signal.notify_all();

        for t in std::mem::take(&mut self.threads) {
            let _ = t.join();
        }
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.inner.running.store(false, Ordering::SeqCst);
        self.inner.signal.notify_all();
    }
}

impl Inner {
    fn pop(&self) -> Option<QueueEntry> {
        let mut queue = self.queue.lock().unwrap();
        loop {
            if let Some(entry) = queue.pop_front() {
                return Some(entry);
            }
            if !self.running.load(Ordering::SeqCst) {
                return None;
            }
            queue = self.signal.wait(queue).unwrap();
        }
    }

    fn process(&self) {
        while let Some(entry) = self.pop() {
            (entry.run)();
        }
    }
}

impl QueueControl for Inner {
    fn try_remove(&self, id: u64, _priority: u8) -> bool {
        let mut queue = self.queue.lock().unwrap();
        let before = queue.len();
        queue.retain(|e| e.id != id);
        queue.len() != before
    }

    fn move_priority(&self, _id: u64, _old: u8, _new: u8) {
        // A single-level queue has nothing to move between.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn runs_submitted_tasks() {
        let mut exec = Executor::new(2);

        let a = exec.submit(move || {
            thread::sleep(Duration::from_millis(20));
            123
        });
        let b = exec.submit(move || 456);

        assert_eq!(a.join(), 123);
        assert_eq!(b.join(), 456);

        exec.shutdown();
    }

    #[test]
    fn cancel_before_execution_prevents_run() {
        let mut exec = Executor::new(0); // no worker threads drain the queue

        let ran = Arc::new(AtomicBool::new(false));
        let ran2 = ran.clone();
        let handle = exec.submit(move || {
            ran2.store(true, Ordering::SeqCst);
        });

        assert!(handle.cancel().is_ok());
        assert!(!ran.load(Ordering::SeqCst));

        exec.shutdown();
    }

    #[test]
    fn drop_handle_cancels_pending_task() {
        let mut exec = Executor::new(0);

        let ran = Arc::new(AtomicBool::new(false));
        let ran2 = ran.clone();
        let handle = exec.submit(move || ran2.store(true, Ordering::SeqCst)).cancel_on_drop();
        drop(handle);

        assert!(!ran.load(Ordering::SeqCst));
        exec.shutdown();
    }
}
