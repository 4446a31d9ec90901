//! The bounded request queue feeding the single `RenderWorker` thread.
//!
//! Grounded on the original render cache's request list: a small
//! fixed-capacity list of pending requests plus one "current" request being
//! serviced, with newer requests preempting older ones for the same tile and
//! the whole list capped so a burst of scrolling cannot grow it unbounded.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::cache::BitmapCache;
use crate::key::{CacheKey, DocId, RenderRequest, Tile};

/// Maximum number of pending (not yet started) requests. Once full, the
/// oldest pending request is dropped to make room for a new one.
pub const MAX_REQUESTS: usize = 8;

/// Lightweight record of the request currently being serviced by the
/// worker thread, kept separately from the full [`RenderRequest`] since the
/// request itself (and its completion callback) moves to the worker.
struct InFlight {
    key: CacheKey,
    abort: std::sync::Arc<AtomicBool>,
}

struct State {
    pending: VecDeque<RenderRequest>,
    current: Option<InFlight>,
}

pub struct RenderQueue {
    state: Mutex<State>,
    signal: Condvar,
    running: AtomicBool,
}

impl RenderQueue {
    pub fn new() -> Self {
        RenderQueue {
            state: Mutex::new(State {
                pending: VecDeque::new(),
                current: None,
            }),
            signal: Condvar::new(),
            running: AtomicBool::new(true),
        }
    }

    /// Enqueues `req`, applying the dedup/promote/abort rules against both
    /// the in-flight request and the pending list, and against `cache` so a
    /// request for an already-fresh tile is dropped outright.
    pub fn enqueue(&self, cache: &BitmapCache, req: RenderRequest) {
        let mut st = self.state.lock().unwrap();

        if let Some(cur) = &st.current {
            if cur.key.loc() == req.key.loc() {
                if cur.key == req.key {
                    tracing::trace!(page = req.key.page, "request already in flight, dropping duplicate");
                    return;
                }
                tracing::debug!(page = cur.key.page, "aborting stale in-flight render");
                cur.abort.store(true, Ordering::SeqCst);
            }
        }

        if let Some(pos) = st.pending.iter().position(|p| p.key.loc() == req.key.loc()) {
            if st.pending[pos].key == req.key {
                let existing = st.pending.remove(pos).unwrap();
                st.pending.push_back(existing);
            } else {
                st.pending.remove(pos);
                st.pending.push_back(req);
            }
            self.signal.notify_one();
            return;
        }

        if cache.contains_fresh(req.key) {
            tracing::trace!(page = req.key.page, "tile already cached and fresh, dropping request");
            return;
        }

        if st.pending.len() >= MAX_REQUESTS {
            let dropped = st.pending.pop_front();
            if let Some(d) = dropped {
                tracing::debug!(page = d.key.page, "render queue full, dropping oldest pending request");
            }
        }

        st.pending.push_back(req);
        self.signal.notify_one();
    }

    /// Enqueues `req` at low priority: unlike [`Self::enqueue`], it never
    /// preempts the in-flight request, never promotes an existing pending
    /// duplicate, and is dropped outright rather than evicting an older
    /// request when the queue is full. Used for predictive requests (e.g.
    /// the second-column tile alongside a freshly split one) that should
    /// never starve an explicit, visible request of its turn.
    pub fn enqueue_low_priority(&self, cache: &BitmapCache, req: RenderRequest) {
        let mut st = self.state.lock().unwrap();

        if let Some(cur) = &st.current {
            if cur.key == req.key {
                return;
            }
        }

        if st.pending.iter().any(|p| p.key.loc() == req.key.loc()) {
            return;
        }

        if cache.contains_fresh(req.key) {
            return;
        }

        if st.pending.len() >= MAX_REQUESTS {
            tracing::trace!(page = req.key.page, "render queue full, dropping low-priority request");
            return;
        }

        st.pending.push_front(req);
        self.signal.notify_one();
    }

    /// Blocks until a request is available or the queue is shut down.
    /// Marks the popped request as the current in-flight one.
    pub fn wait_pop(&self) -> Option<RenderRequest> {
        let mut st = self.state.lock().unwrap();
        loop {
            if let Some(req) = st.pending.pop_back() {
                st.current = Some(InFlight {
                    key: req.key,
                    abort: req.abort.clone(),
                });
                return Some(req);
            }
            if !self.running.load(Ordering::SeqCst) {
                return None;
            }
            st = self.signal.wait(st).unwrap();
        }
    }

    /// Called by the worker once it is done with the current request,
    /// whatever the outcome.
    pub fn release_current(&self) {
        let mut st = self.state.lock().unwrap();
        st.current = None;
        self.signal.notify_all();
    }

    /// Drops every pending request for `doc` (optionally further narrowed
    /// to `page`/`tile`) without touching an in-flight request.
    pub fn clear_for_doc(&self, doc: DocId, page: Option<u32>, tile: Option<Tile>) {
        let mut st = self.state.lock().unwrap();
        st.pending.retain(|r| {
            if r.key.doc != doc {
                return true;
            }
            if let Some(p) = page {
                if r.key.page != p {
                    return true;
                }
            }
            if let Some(t) = tile {
                if r.key.tile != t {
                    return true;
                }
            }
            false
        });
    }

    /// Drops every pending request for `doc` and blocks until any in-flight
    /// request for `doc` has also finished, so a caller can safely drop or
    /// close the document afterward.
    pub fn cancel_for_doc(&self, doc: DocId) {
        {
            let mut st = self.state.lock().unwrap();
            st.pending.retain(|r| r.key.doc != doc);
            if let Some(cur) = &st.current {
                if cur.key.doc == doc {
                    cur.abort.store(true, Ordering::SeqCst);
                }
            }
        }

        loop {
            let st = self.state.lock().unwrap();
            match &st.current {
                Some(cur) if cur.key.doc == doc => {
                    drop(st);
                    std::thread::sleep(Duration::from_millis(1));
                }
                _ => break,
            }
        }
    }

    /// Classifies the render status of a tile that is missing from the
    /// cache, for a painter deciding between a "loading" and a "failed"
    /// placeholder.
    pub fn render_delay(&self, loc: (DocId, u32, Tile)) -> RenderDelay {
        let st = self.state.lock().unwrap();
        if let Some(cur) = &st.current {
            if cur.key.loc() == loc {
                return RenderDelay::InProgress;
            }
        }
        if st.pending.iter().any(|p| p.key.loc() == loc) {
            return RenderDelay::Pending;
        }
        RenderDelay::NotRequested
    }

    /// Age of the oldest pending request, used to decide whether predictive
    /// rendering is falling behind.
    pub fn oldest_pending_age(&self) -> Option<Duration> {
        let st = self.state.lock().unwrap();
        st.pending.front().map(|r| r.timestamp.elapsed())
    }

    pub fn len_pending(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }

    /// Signals `wait_pop` to return `None` so the worker thread can exit.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.signal.notify_all();
    }
}

impl Default for RenderQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderDelay {
    NotRequested,
    Pending,
    InProgress,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::BitmapCache;
    use geometry::Rect;

    fn key(doc: DocId, page: u32) -> CacheKey {
        CacheKey::new(doc, page, 0, 100.0, Tile::WHOLE)
    }

    fn req(doc: DocId, page: u32) -> RenderRequest {
        RenderRequest::new(key(doc, page), Rect::new(0.0, 0.0, 10.0, 10.0), 10, 10)
    }

    #[test]
    fn enqueue_then_pop_returns_the_request() {
        let cache = BitmapCache::new(256);
        let queue = RenderQueue::new();
        queue.enqueue(&cache, req(1, 1));
        let popped = queue.wait_pop().unwrap();
        assert_eq!(popped.key, key(1, 1));
    }

    #[test]
    fn full_queue_drops_oldest_pending() {
        let cache = BitmapCache::new(256);
        let queue = RenderQueue::new();
        for page in 0..(MAX_REQUESTS as u32 + 2) {
            queue.enqueue(&cache, req(1, page + 100));
        }
        assert_eq!(queue.len_pending(), MAX_REQUESTS);
    }

    #[test]
    fn exact_duplicate_of_pending_request_is_promoted_not_duplicated() {
        let cache = BitmapCache::new(256);
        let queue = RenderQueue::new();
        queue.enqueue(&cache, req(1, 1));
        queue.enqueue(&cache, req(1, 2));
        queue.enqueue(&cache, req(1, 1));
        assert_eq!(queue.len_pending(), 2);
    }

    #[test]
    fn shutdown_unblocks_wait_pop() {
        let queue = std::sync::Arc::new(RenderQueue::new());
        let q2 = queue.clone();
        let t = std::thread::spawn(move || q2.wait_pop());
        std::thread::sleep(Duration::from_millis(20));
        queue.shutdown();
        assert!(t.join().unwrap().is_none());
    }

    #[test]
    fn low_priority_request_pops_after_a_normal_one() {
        let cache = BitmapCache::new(256);
        let queue = RenderQueue::new();
        queue.enqueue_low_priority(&cache, req(1, 1));
        queue.enqueue(&cache, req(1, 2));

        assert_eq!(queue.wait_pop().unwrap().key, key(1, 2));
        queue.release_current();
        assert_eq!(queue.wait_pop().unwrap().key, key(1, 1));
    }

    #[test]
    fn clear_for_doc_drops_only_that_documents_pending_requests() {
        let cache = BitmapCache::new(256);
        let queue = RenderQueue::new();
        queue.enqueue(&cache, req(1, 1));
        queue.enqueue(&cache, req(2, 1));
        queue.clear_for_doc(1, None, None);
        assert_eq!(queue.len_pending(), 1);
    }
}
