//! `RenderSystem`: the ambient object a host constructs once and shares
//! across every open `DisplayModel`, owning the bitmap cache, the request
//! queue, and the single background render thread.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use engine::EngineIface;
use executor::Handle;

use crate::cache::{BitmapCache, VisibilityOracle};
use crate::key::{CacheKey, DocId, RenderRequest, Tile};
use crate::queue::{RenderDelay, RenderQueue};
use crate::worker::{EngineRegistry, RenderWorker, RepaintFn, ShutdownDocs};

pub struct RenderSystem {
    queue: Arc<RenderQueue>,
    cache: Arc<BitmapCache>,
    engines: Arc<EngineRegistry>,
    shutdown_docs: Arc<ShutdownDocs>,
    invert_colors: Arc<AtomicBool>,
    next_doc_id: AtomicU64,
    pool: Mutex<executor::exec::Executor>,
    worker_handle: Mutex<Option<Handle<()>>>,
    shut_down: AtomicBool,
}

impl RenderSystem {
    /// `repaint` is called (on the render worker thread) every time a tile
    /// finishes rendering, so the host can schedule a UI repaint for that
    /// document. It must not block.
    pub fn new(repaint: Arc<RepaintFn>) -> Arc<Self> {
        Self::with_capacity(crate::cache::MAX_ENTRIES, repaint)
    }

    pub fn with_capacity(cache_capacity: usize, repaint: Arc<RepaintFn>) -> Arc<Self> {
        let span = tracing::info_span!("render_system_startup", cache_capacity = cache_capacity as u64);
        let _enter = span.enter();

        let queue = Arc::new(RenderQueue::new());
        let cache = Arc::new(BitmapCache::new(cache_capacity));
        let engines: Arc<EngineRegistry> = Arc::new(Mutex::new(HashMap::new()));
        let shutdown_docs: Arc<ShutdownDocs> = Arc::new(Mutex::new(HashSet::new()));
        let invert_colors = Arc::new(AtomicBool::new(false));

        let pool = executor::exec::Executor::new(1);
        let worker_handle = pool.submit({
            let queue = queue.clone();
            let cache = cache.clone();
            let engines = engines.clone();
            let shutdown_docs = shutdown_docs.clone();
            let invert_colors = invert_colors.clone();
            move || RenderWorker::run_loop(queue, cache, engines, shutdown_docs, invert_colors, repaint)
        });

        tracing::debug!("render system started");

        Arc::new(RenderSystem {
            queue,
            cache,
            engines,
            shutdown_docs,
            invert_colors,
            next_doc_id: AtomicU64::new(1),
            pool: Mutex::new(pool),
            worker_handle: Mutex::new(Some(worker_handle)),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Registers a freshly opened document, returning the `DocId` every
    /// subsequent call (enqueue, cache lookups, close) is keyed on.
    pub fn open_document(&self, engine: Arc<dyn EngineIface>, oracle: Arc<dyn VisibilityOracle>) -> DocId {
        let doc = self.next_doc_id.fetch_add(1, Ordering::SeqCst);
        self.engines.lock().unwrap().insert(doc, engine);
        self.cache.register_doc(doc, oracle);
        doc
    }

    /// Drops `doc`'s cached tiles and pending requests, blocking until any
    /// in-flight render for it has been aborted and drained. Safe to call
    /// even while the worker is mid-render for this document.
    pub fn close_document(&self, doc: DocId) {
        self.shutdown_docs.lock().unwrap().insert(doc);
        self.queue.cancel_for_doc(doc);
        self.cache.free_page(doc, None, None);
        self.cache.unregister_doc(doc);
        self.engines.lock().unwrap().remove(&doc);
        self.shutdown_docs.lock().unwrap().remove(&doc);
    }

    /// Re-keys a reloaded document's cached tiles from `old` to `new`
    /// instead of discarding them outright, so the first repaint after a
    /// reload is not a blank page.
    pub fn keep_document_cache(&self, old: DocId, new: DocId) {
        self.cache.keep_for_doc(old, new);
    }

    pub fn enqueue(&self, req: RenderRequest) {
        self.queue.enqueue(&self.cache, req);
    }

    /// See [`RenderQueue::enqueue_low_priority`].
    pub fn enqueue_low_priority(&self, req: RenderRequest) {
        self.queue.enqueue_low_priority(&self.cache, req);
    }

    pub fn find_bitmap(&self, key: CacheKey, fuzzy_zoom: bool) -> Option<crate::cache::CacheHandle> {
        self.cache.find(key, fuzzy_zoom)
    }

    pub fn render_delay(&self, doc: DocId, page: u32, tile: Tile) -> RenderDelay {
        self.queue.render_delay((doc, page, tile))
    }

    pub fn set_invert_colors(&self, invert: bool) {
        self.invert_colors.store(invert, Ordering::SeqCst);
    }

    pub fn invert_colors(&self) -> bool {
        self.invert_colors.load(Ordering::SeqCst)
    }

    pub fn cache(&self) -> &BitmapCache {
        &self.cache
    }

    /// Stops the background thread and releases the executor. Idempotent;
    /// safe to call more than once (e.g. explicitly and again via `Drop`).
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        let span = tracing::info_span!("render_system_shutdown");
        let _enter = span.enter();

        tracing::debug!("shutting down render system");
        self.queue.shutdown();
        if let Some(handle) = self.worker_handle.lock().unwrap().take() {
            handle.join();
        }
        self.pool.lock().unwrap().shutdown();
    }
}

impl Drop for RenderSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::FakeEngine;
    use geometry::{Rect, Size};

    fn no_repaint() -> Arc<RepaintFn> {
        Arc::new(|_doc: DocId| {})
    }

    #[test]
    fn render_request_lands_in_cache() {
        let system = RenderSystem::with_capacity(16, no_repaint());
        let engine: Arc<dyn EngineIface> = Arc::new(FakeEngine::new(3, Size::new(100.0, 100.0)));
        let doc = system.open_document(engine, crate::cache::always_visible());

        let key = CacheKey::new(doc, 1, 0, 100.0, Tile::WHOLE);
        let req = RenderRequest::new(key, Rect::new(0.0, 0.0, 100.0, 100.0), 100, 100);
        system.enqueue(req);

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
        while system.find_bitmap(key, false).is_none() {
            assert!(std::time::Instant::now() < deadline, "render did not complete in time");
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        system.shutdown();
    }

    #[test]
    fn close_document_drops_its_cached_tiles() {
        let system = RenderSystem::with_capacity(16, no_repaint());
        let engine: Arc<dyn EngineIface> = Arc::new(FakeEngine::new(1, Size::new(50.0, 50.0)));
        let doc = system.open_document(engine, crate::cache::always_visible());

        let key = CacheKey::new(doc, 1, 0, 100.0, Tile::WHOLE);
        system.enqueue(RenderRequest::new(key, Rect::new(0.0, 0.0, 50.0, 50.0), 50, 50));

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
        while system.find_bitmap(key, false).is_none() {
            assert!(std::time::Instant::now() < deadline);
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        system.close_document(doc);
        assert!(system.find_bitmap(key, false).is_none());
        system.shutdown();
    }
}
