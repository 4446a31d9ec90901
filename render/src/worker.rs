//! The single background thread that actually calls into the engine.
//!
//! Grounded on the original render cache's dedicated render thread: one
//! loop, one request at a time, polling an abort flag the engine checks at
//! its own granularity rather than being forcibly interrupted.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use engine::EngineIface;

use crate::cache::BitmapCache;
use crate::key::DocId;
use crate::queue::RenderQueue;

/// How far beyond the viewport (in tile units) a page may be and still be
/// worth rendering; requests for pages further away than this are skipped
/// once popped, rather than wasting the worker thread on scroll-past pages.
const VISIBILITY_MARGIN: i32 = 2;

pub(crate) type EngineRegistry = Mutex<HashMap<DocId, Arc<dyn EngineIface>>>;
pub(crate) type ShutdownDocs = Mutex<HashSet<DocId>>;
pub(crate) type RepaintFn = dyn Fn(DocId) + Send + Sync;

pub struct RenderWorker;

impl RenderWorker {
    /// Runs until `queue.wait_pop` returns `None` (i.e. the queue has been
    /// shut down). Intended to be the sole closure submitted to the
    /// `executor::exec::Executor` that hosts this thread.
    pub fn run_loop(
        queue: Arc<RenderQueue>,
        cache: Arc<BitmapCache>,
        engines: Arc<EngineRegistry>,
        shutdown_docs: Arc<ShutdownDocs>,
        invert_colors: Arc<AtomicBool>,
        repaint: Arc<RepaintFn>,
    ) {
        while let Some(req) = queue.wait_pop() {
            let doc = req.key.doc;
            let span = tracing::info_span!("render_attempt", doc, page = req.key.page, tile.res = req.key.tile.res);
            let _enter = span.enter();

            if shutdown_docs.lock().unwrap().contains(&doc) {
                tracing::trace!(doc, "skipping render for a document pending shutdown");
                queue.release_current();
                continue;
            }

            if req.on_complete.is_none() && !cache.page_near_visible(doc, req.key.page, VISIBILITY_MARGIN) {
                tracing::trace!(doc, page = req.key.page, "page scrolled out of view, skipping render");
                queue.release_current();
                continue;
            }

            let engine = engines.lock().unwrap().get(&doc).cloned();
            let engine = match engine {
                Some(e) => e,
                None => {
                    tracing::debug!(doc, "render request for an unregistered document, dropping");
                    queue.release_current();
                    continue;
                }
            };

            let params = engine::RenderParams {
                page: req.key.page,
                zoom_real: req.key.zoom_milli as f64 / 1000.0,
                rotation: req.key.rotation,
                rect: req.rect,
                target_width: req.target_width,
                target_height: req.target_height,
            };

            let abort = req.abort.clone();
            let result = engine.render_bitmap(params, &|| abort.load(Ordering::SeqCst));

            match result {
                Ok(mut bitmap) => {
                    if req.abort.load(Ordering::SeqCst) {
                        tracing::trace!(doc, page = req.key.page, "render finished but request was aborted, discarding");
                        if let Some(cb) = &req.on_complete {
                            cb(None);
                        }
                    } else {
                        if invert_colors.load(Ordering::SeqCst) {
                            bitmap.invert_colors();
                        }
                        let handle = cache.add(req.key, bitmap);
                        repaint(doc);
                        if let Some(cb) = &req.on_complete {
                            cb(Some(handle.into_arc()));
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(doc, page = req.key.page, error = %err, "engine failed to render tile");
                    if let Some(cb) = &req.on_complete {
                        cb(None);
                    }
                }
            }

            cache.free_not_visible(VISIBILITY_MARGIN * 2);
            queue.release_current();
        }
    }
}
