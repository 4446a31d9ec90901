//! A thread-pool executor with task priorities: higher-numbered levels are
//! always drained before lower ones, and [`Handle::set_priority`] can
//! promote a still-pending task into a different level.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, Weak};
use std::thread::JoinHandle;

use crate::common::Monitor;
use crate::handle::{self, Handle, QueueControl, QueueEntry};

/// A thread pool with a fixed number of threads and `num_priority` distinct
/// priority levels; level `num_priority - 1` always drains first.
pub struct Executor {
    inner: Arc<Inner>,
    threads: Vec<JoinHandle<()>>,
}

struct Inner {
    queues: Mutex<Vec<VecDeque<QueueEntry>>>,
    signal: Condvar,
    running: AtomicBool,
    next_id: AtomicU64,
}

impl Executor {
    pub fn new(num_priority: u8, num_threads: u32) -> Self {
        let queues = (0..num_priority).map(|_| VecDeque::new()).collect();

        let inner = Arc::new(Inner {
            queues: Mutex::new(queues),
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

    pub fn submit<F, R>(&self, priority: u8, closure: F) -> Handle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit_with((), priority, closure)
    }

    pub fn submit_with<F, R, M>(&self, monitor: M, priority: u8, closure: F) -> Handle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
        M: Monitor + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let control: Weak<dyn QueueControl> = Arc::downgrade(&self.inner);
        let (entry, handle) = handle::package(id, priority, monitor, closure, control);

        let mut queues = self.inner.queues.lock().unwrap();
        let level = (priority as usize).min(queues.len() - 1);
        queues[level].push_back(entry);
        self.inner.signal.notify_one();
        drop(queues);

        handle
    }

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
        let mut queues = self.queues.lock().unwrap();
        loop {
            for queue in queues.iter_mut().rev() {
                if let Some(entry) = queue.pop_front() {
                    return Some(entry);
                }
            }
            if !self.running.load(Ordering::SeqCst) {
                return None;
            }
            queues = self.signal.wait(queues).unwrap();
        }
    }

    fn process(&self) {
        while let Some(entry) = self.pop() {
            (entry.run)();
        }
    }
}

impl QueueControl for Inner {
    fn try_remove(&self, id: u64, priority: u8) -> bool {
        let mut queues = self.queues.lock().unwrap();
        let level = (priority as usize).min(queues.len() - 1);
        let before = queues[level].len();
        queues[level].retain(|e| e.id != id);
        queues[level].len() != before
    }

    fn move_priority(&self, id: u64, old: u8, new: u8) {
        let mut queues = self.queues.lock().unwrap();
        let old_level = (old as usize).min(queues.len() - 1);
        let new_level = (new as usize).min(queues.len() - 1);
        if old_level == new_level {
            return;
        }

        if let Some(pos) = queues[old_level].iter().position(|e| e.id == id) {
            let entry = queues[old_level].remove(pos).unwrap();
            queues[new_level].push_back(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn runs_tasks_across_priorities() {
        let mut exec = Executor::new(3, 2);

        let a = exec.submit(0, move || {
            thread::sleep(Duration::from_millis(30));
            123
        });
        let b = exec.submit(1, move || 456);
        let c = exec.submit(2, move || 789);

        assert_eq!(a.join(), 123);
        assert_eq!(b.join(), 456);
        assert_eq!(c.join(), 789);

        exec.shutdown();
    }

    #[test]
    fn higher_priority_runs_before_lower_when_contended() {
        // A single worker thread, blocked on a first task, lets us submit
        // the rest before any of them can start.
        let mut exec = Executor::new(3, 1);

        let gate = Arc::new((StdMutex::new(false), Condvar::new()));
        let gate2 = gate.clone();
        let blocker = exec.submit(2, move || {
            let (lock, cvar) = &*gate2;
            let mut ready = lock.lock().unwrap();
            while !*ready {
                ready = cvar.wait(ready).unwrap();
            }
        });

        let order = Arc::new(StdMutex::new(Vec::new()));

        let o = order.clone();
        let low = exec.submit(0, move || o.lock().unwrap().push("low"));
        let o = order.clone();
        let high = exec.submit(2, move || o.lock().unwrap().push("high"));

        let (lock, cvar) = &*gate;
        *lock.lock().unwrap() = true;
        cvar.notify_all();

        blocker.join();
        high.join();
        low.join();

        assert_eq!(*order.lock().unwrap(), vec!["high", "low"]);
        exec.shutdown();
    }

    #[test]
    fn set_priority_promotes_a_pending_task() {
        // No worker threads: nothing drains the queue, so we can inspect
        // ordering purely through the queue structure via try_remove.
        let mut exec = Executor::new(3, 0);

        let low = exec.submit(0, || ());
        low.set_priority(2);
        assert_eq!(low.priority(), 2);

        // After promotion, canceling at priority 2 should find it (it was
        // moved out of level 0's queue).
        assert!(low.cancel().is_ok());

        exec.shutdown();
    }
}
