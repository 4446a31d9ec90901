//! The bounded bitmap cache the painter reads from and the render worker
//! writes into.
//!
//! Grounded on the original render cache's tile list plus the teacher's
//! `TileCache`/`FallbackManager` mark-and-sweep idiom: entries are plain
//! `Vec` slots scanned linearly rather than hashed, since the cache is
//! capped small enough (a few hundred tiles) that a scan is cheaper than the
//! bookkeeping a hash index would need for fuzzy-zoom lookups and
//! visibility-driven eviction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use engine::Bitmap;

use crate::key::{CacheKey, DocId, Tile};

/// Maximum number of cached bitmaps across all open documents.
pub const MAX_ENTRIES: usize = 256;

/// Tells the cache which pages are currently near-visible, so eviction can
/// prefer to reclaim tiles the user cannot see. Implemented by `display`'s
/// `DisplayModel` and registered per document with [`BitmapCache::register_doc`].
pub trait VisibilityOracle: Send + Sync {
    /// Whether `page` is on screen, or within `margin` tiles' worth of
    /// scrolling from the current viewport.
    fn is_near_visible(&self, page: u32, margin: i32) -> bool;
}

struct AlwaysVisible;
impl VisibilityOracle for AlwaysVisible {
    fn is_near_visible(&self, _page: u32, _margin: i32) -> bool {
        true
    }
}

struct CacheEntry {
    key: CacheKey,
    bitmap: Arc<Bitmap>,
    rendered_at: Instant,
}

/// A refcounted handle to a cached bitmap. The cache's own index entry holds
/// one `Arc` clone; when eviction unlinks an entry while a painter still
/// holds a handle from an earlier `find`, the bitmap stays alive until that
/// handle (and every other outstanding clone) is dropped.
#[derive(Clone)]
pub struct CacheHandle {
    bitmap: Arc<Bitmap>,
}

impl CacheHandle {
    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    pub fn into_arc(self) -> Arc<Bitmap> {
        self.bitmap
    }
}

struct State {
    entries: Vec<CacheEntry>,
    visibility: HashMap<DocId, Arc<dyn VisibilityOracle>>,
}

pub struct BitmapCache {
    state: Mutex<State>,
    capacity: usize,
}

impl BitmapCache {
    pub fn new(capacity: usize) -> Self {
        BitmapCache {
            state: Mutex::new(State {
                entries: Vec::new(),
                visibility: HashMap::new(),
            }),
            capacity,
        }
    }

    pub fn register_doc(&self, doc: DocId, oracle: Arc<dyn VisibilityOracle>) {
        self.state.lock().unwrap().visibility.insert(doc, oracle);
    }

    pub fn unregister_doc(&self, doc: DocId) {
        self.state.lock().unwrap().visibility.remove(&doc);
    }

    /// Whether `page` is near-visible for `doc`, per its registered
    /// [`VisibilityOracle`]. Documents with no oracle registered are always
    /// considered visible, so a host that has not wired one up yet never
    /// has its render requests silently skipped.
    pub fn page_near_visible(&self, doc: DocId, page: u32, margin: i32) -> bool {
        match self.state.lock().unwrap().visibility.get(&doc) {
            Some(oracle) => oracle.is_near_visible(page, margin),
            None => true,
        }
    }

    /// Exact lookup; with `fuzzy_zoom` set, falls back to the closest-zoom
    /// entry for the same document/page/rotation regardless of how far its
    /// zoom is from `key`'s, so a painter always has *something* to stretch
    /// onto the screen while the correct-zoom render is pending. A same-tile
    /// (same resolution level) match is preferred over one at a different
    /// resolution.
    pub fn find(&self, key: CacheKey, fuzzy_zoom: bool) -> Option<CacheHandle> {
        let st = self.state.lock().unwrap();
        if let Some(e) = st.entries.iter().find(|e| e.key == key) {
            return Some(CacheHandle { bitmap: e.bitmap.clone() });
        }

        if !fuzzy_zoom {
            return None;
        }

        let same_tile = st
            .entries
            .iter()
            .filter(|e| e.key.doc == key.doc && e.key.page == key.page && e.key.rotation == key.rotation && e.key.tile == key.tile)
            .min_by_key(|e| (e.key.zoom_milli - key.zoom_milli).abs());

        if let Some(e) = same_tile {
            return Some(CacheHandle { bitmap: e.bitmap.clone() });
        }

        st.entries
            .iter()
            .filter(|e| e.key.doc == key.doc && e.key.page == key.page && e.key.rotation == key.rotation)
            .min_by_key(|e| (e.key.zoom_milli - key.zoom_milli).abs())
            .map(|e| CacheHandle { bitmap: e.bitmap.clone() })
    }

    pub fn contains_fresh(&self, key: CacheKey) -> bool {
        self.state.lock().unwrap().entries.iter().any(|e| e.key == key)
    }

    /// Inserts a freshly rendered bitmap, evicting if the cache is full.
    /// Eviction prefers, in order: an entry belonging to the same document
    /// that is no longer near-visible, then any entry (any document) that is
    /// no longer near-visible, then the oldest entry overall.
    pub fn add(&self, key: CacheKey, bitmap: Bitmap) -> CacheHandle {
        let mut st = self.state.lock().unwrap();

        st.entries.retain(|e| e.key != key);

        if st.entries.len() >= self.capacity {
            match Self::pick_eviction_victim(&st, key.doc) {
                Some((idx, reason)) => {
                    let evicted = &st.entries[idx];
                    tracing::debug!(
                        doc = evicted.key.doc,
                        page = evicted.key.page,
                        reason,
                        "evicting cache entry to make room"
                    );
                    st.entries.remove(idx);
                }
                None => {
                    if !st.entries.is_empty() {
                        let evicted = &st.entries[0];
                        tracing::debug!(
                            doc = evicted.key.doc,
                            page = evicted.key.page,
                            reason = "fallback",
                            "evicting cache entry to make room"
                        );
                        st.entries.remove(0);
                    }
                }
            }
        }

        let bitmap = Arc::new(bitmap);
        st.entries.push(CacheEntry {
            key,
            bitmap: bitmap.clone(),
            rendered_at: Instant::now(),
        });

        CacheHandle { bitmap }
    }

    /// Returns the index to evict plus a short reason tag for logging.
    fn pick_eviction_victim(st: &State, preferred_doc: DocId) -> Option<(usize, &'static str)> {
        let is_visible = |doc: DocId, page: u32| -> bool {
            match st.visibility.get(&doc) {
                Some(oracle) => oracle.is_near_visible(page, 0),
                None => true,
            }
        };

        if let Some(idx) = st
            .entries
            .iter()
            .position(|e| e.key.doc == preferred_doc && !is_visible(e.key.doc, e.key.page))
        {
            return Some((idx, "invisible_same_doc"));
        }

        if let Some(idx) = st.entries.iter().position(|e| !is_visible(e.key.doc, e.key.page)) {
            return Some((idx, "invisible_other_doc"));
        }

        st.entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.rendered_at)
            .map(|(idx, _)| (idx, "oldest"))
    }

    /// Drops cached tiles for `doc`, optionally narrowed to one `page` and,
    /// within that page, to one `tile`.
    pub fn free_page(&self, doc: DocId, page: Option<u32>, tile: Option<Tile>) {
        let mut st = self.state.lock().unwrap();
        st.entries.retain(|e| {
            if e.key.doc != doc {
                return true;
            }
            if let Some(p) = page {
                if e.key.page != p {
                    return true;
                }
            }
            if let Some(t) = tile {
                if e.key.tile != t {
                    return true;
                }
            }
            false
        });
    }

    /// Drops every cached tile, across all documents, that is not within
    /// `margin` tiles of the current viewport for its document.
    pub fn free_not_visible(&self, margin: i32) {
        let mut st = self.state.lock().unwrap();
        let visibility = std::mem::take(&mut st.visibility);
        let before = st.entries.len();
        st.entries.retain(|e| match visibility.get(&e.key.doc) {
            Some(oracle) => oracle.is_near_visible(e.key.page, margin),
            None => true,
        });
        let dropped = before - st.entries.len();
        if dropped > 0 {
            tracing::trace!(dropped, "evicted cache entries scrolled out of view");
        }
        st.visibility = visibility;
    }

    /// Re-keys every cached entry for `old` to belong to `new`, used when a
    /// document is reloaded in place (e.g. after an external file change)
    /// and the previous bitmaps remain valid stand-ins.
    pub fn keep_for_doc(&self, old: DocId, new: DocId) {
        let mut st = self.state.lock().unwrap();
        for e in st.entries.iter_mut() {
            if e.key.doc == old {
                e.key.doc = new;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Placeholder oracle for tests and for documents a host has not wired a
/// real visibility source for yet; every page is always considered visible,
/// so eviction falls back to pure least-recently-rendered order.
pub fn always_visible() -> Arc<dyn VisibilityOracle> {
    Arc::new(AlwaysVisible)
}

/// Picks a tile resolution level so that no single tile exceeds
/// `max_tile_size` device pixels on either axis: `res` doubles the tile grid
/// per axis until the largest tile fits, then backs off by one level when
/// `prefer_larger_tiles` is set (image-only pages render faster as one
/// larger tile than as many small ones).
pub fn choose_tile_resolution(page_w_px: f64, page_h_px: f64, max_tile_size: u32, prefer_larger_tiles: bool) -> u16 {
    let limit = max_tile_size.max(1) as f64;
    let factor = (page_w_px / limit).max(page_h_px / limit).max(1.0);
    let mut res = factor.log2().ceil().max(0.0) as u16;
    if prefer_larger_tiles && res > 0 {
        res -= 1;
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(doc: DocId, page: u32, zoom: f64) -> CacheKey {
        CacheKey::new(doc, page, 0, zoom, Tile::WHOLE)
    }

    #[test]
    fn exact_match_is_found() {
        let cache = BitmapCache::new(4);
        let k = key(1, 1, 100.0);
        cache.add(k, Bitmap::blank(4, 4, [0, 0, 0, 255]));
        assert!(cache.find(k, false).is_some());
    }

    #[test]
    fn fuzzy_zoom_finds_a_nearby_entry() {
        let cache = BitmapCache::new(4);
        cache.add(key(1, 1, 100.0), Bitmap::blank(4, 4, [0, 0, 0, 255]));
        let near = key(1, 1, 102.0);
        assert!(cache.find(near, true).is_some());
        assert!(cache.find(near, false).is_none());
    }

    #[test]
    fn fuzzy_zoom_matches_regardless_of_distance() {
        let cache = BitmapCache::new(4);
        cache.add(key(1, 1, 100.0), Bitmap::blank(4, 4, [0, 0, 0, 255]));
        let far = key(1, 1, 200.0);
        assert!(cache.find(far, true).is_some());
    }

    #[test]
    fn fuzzy_zoom_prefers_same_tile_resolution() {
        let cache = BitmapCache::new(4);
        let whole = CacheKey::new(1, 1, 0, 100.0, Tile::WHOLE);
        let split = CacheKey::new(1, 1, 0, 90.0, Tile { res: 1, col: 0, row: 0 });
        cache.add(whole, Bitmap::blank(4, 4, [1, 1, 1, 255]));
        cache.add(split, Bitmap::blank(4, 4, [2, 2, 2, 255]));

        let want = CacheKey::new(1, 1, 0, 95.0, Tile { res: 1, col: 0, row: 0 });
        let found = cache.find(want, true).unwrap();
        assert_eq!(found.bitmap().pixels[0], 2);
    }

    #[test]
    fn eviction_prefers_invisible_entries_of_the_same_document() {
        struct NeverVisible;
        impl VisibilityOracle for NeverVisible {
            fn is_near_visible(&self, page: u32, _margin: i32) -> bool {
                page != 1
            }
        }

        let cache = BitmapCache::new(1);
        cache.register_doc(1, Arc::new(NeverVisible));
        cache.add(key(1, 1, 100.0), Bitmap::blank(1, 1, [0, 0, 0, 255]));
        cache.add(key(1, 2, 100.0), Bitmap::blank(1, 1, [1, 1, 1, 255]));

        assert_eq!(cache.len(), 1);
        assert!(cache.find(key(1, 1, 100.0), false).is_none());
        assert!(cache.find(key(1, 2, 100.0), false).is_some());
    }

    #[test]
    fn free_page_drops_only_matching_entries() {
        let cache = BitmapCache::new(4);
        cache.add(key(1, 1, 100.0), Bitmap::blank(1, 1, [0, 0, 0, 255]));
        cache.add(key(1, 2, 100.0), Bitmap::blank(1, 1, [0, 0, 0, 255]));
        cache.free_page(1, Some(1), None);
        assert_eq!(cache.len(), 1);
        assert!(cache.find(key(1, 2, 100.0), false).is_some());
    }

    #[test]
    fn free_page_narrowed_to_a_tile_keeps_the_page_s_other_tiles() {
        let cache = BitmapCache::new(4);
        let a = CacheKey::new(1, 1, 0, 100.0, Tile { res: 1, col: 0, row: 0 });
        let b = CacheKey::new(1, 1, 0, 100.0, Tile { res: 1, col: 1, row: 0 });
        cache.add(a, Bitmap::blank(1, 1, [0, 0, 0, 255]));
        cache.add(b, Bitmap::blank(1, 1, [0, 0, 0, 255]));

        cache.free_page(1, Some(1), Some(Tile { res: 1, col: 0, row: 0 }));

        assert!(cache.find(a, false).is_none());
        assert!(cache.find(b, false).is_some());
    }

    #[test]
    fn handle_keeps_bitmap_alive_after_eviction() {
        let cache = BitmapCache::new(1);
        let handle = cache.add(key(1, 1, 100.0), Bitmap::blank(2, 2, [9, 9, 9, 255]));
        cache.add(key(1, 2, 100.0), Bitmap::blank(2, 2, [8, 8, 8, 255]));
        assert_eq!(cache.len(), 1);
        assert_eq!(handle.bitmap().pixels[0], 9);
    }

    #[test]
    fn tile_resolution_increases_with_page_size() {
        assert_eq!(choose_tile_resolution(500.0, 500.0, 2048, false), 0);
        assert!(choose_tile_resolution(5000.0, 5000.0, 2048, false) >= 2);
    }
}
