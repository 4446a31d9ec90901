//! Compositing visible pages and their tiles onto a [`Surface`], per §4.7.
//!
//! Grounded on `RenderCache.cc`'s `PaintTile`/`PaintTiles`/`Paint` (the
//! exact-then-fuzzy-then-placeholder tile resolution order, and enqueuing a
//! render request for whatever is missing) and the teacher's
//! `Canvas::render` (`app/src/core/mod.rs`) for the page-shadow/background/
//! tile-clip compositing order, generalized away from `gtk::Snapshot`.

use engine::EngineIface;
use geometry::Rect;
use render::{CacheKey, RenderRequest, RenderSystem, Tile};
use tracing::trace;

use crate::overlay::Overlay;
use crate::surface::Surface;

const BACKGROUND: [u8; 4] = [82, 86, 89, 255];
const PAGE_BACKGROUND: [u8; 4] = [255, 255, 255, 255];

/// Paints every visible page of `model` onto `surface`, enqueuing render
/// requests for any tile not already cached, then draws `overlays` on top.
pub fn paint<E: EngineIface>(model: &display::DisplayModel<E>, render: &RenderSystem, overlays: &[Overlay], surface: &mut dyn Surface) {
    let viewport = Rect::new(0.0, 0.0, model.viewport().w, model.viewport().h);
    surface.fill_rect(viewport, BACKGROUND);

    for &page in model.shown_pages() {
        if model.page_visibility(page) <= 0.0 {
            continue;
        }

        let Some(page_rect) = model.page_rect(page) else {
            continue;
        };

        let screen_rect = page_rect.translated(-model.area_offset().x, -model.area_offset().y);
        if screen_rect.intersect(&viewport).is_none() {
            continue;
        }

        surface.draw_shadow(screen_rect);
        surface.fill_rect(screen_rect, PAGE_BACKGROUND);

        paint_page_tiles(model, render, page, screen_rect, viewport, surface);
    }

    for overlay in overlays {
        surface.fill_rect(overlay.rect, overlay.kind.rgba());
    }
}

fn paint_page_tiles<E: EngineIface>(
    model: &display::DisplayModel<E>,
    render: &RenderSystem,
    page: u32,
    screen_rect: Rect,
    viewport: Rect,
    surface: &mut dyn Surface,
) {
    let doc = model.doc_id();
    let res = model.page_tile_resolution(page);
    let grid = 1u32 << res;
    let tile_w = screen_rect.w / grid as f64;
    let tile_h = screen_rect.h / grid as f64;

    for row in 0..grid {
        for col in 0..grid {
            let tile_rect = Rect::new(screen_rect.x + col as f64 * tile_w, screen_rect.y + row as f64 * tile_h, tile_w, tile_h);

            if tile_rect.intersect(&viewport).is_none() {
                continue;
            }

            let tile = Tile {
                res,
                col: col as u16,
                row: row as u16,
            };
            let key = CacheKey::new(doc, page, model.rotation(), model.zoom_real(), tile);

            if let Some(handle) = render.find_bitmap(key, false) {
                surface.draw_bitmap(tile_rect, handle.bitmap());
                continue;
            }

            match render.find_bitmap(key, true) {
                Some(handle) => surface.draw_bitmap(tile_rect, handle.bitmap()),
                None => surface.draw_placeholder(tile_rect),
            }

            trace!(doc, page, res, col, row, "requesting missing tile");

            let local_rect = Rect::new(col as f64 * tile_w, row as f64 * tile_h, tile_w, tile_h);
            let req = RenderRequest::new(key, local_rect, tile_w.round() as u32, tile_h.round() as u32);
            render.enqueue(req);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use display::DisplayModel;
    use engine::{Bitmap, EngineIface, FakeEngine};
    use geometry::Size;
    use render::{CacheKey, DocId, RangeVisibility, Tile};

    use super::*;

    struct RecordingSurface {
        fills: usize,
        bitmaps: usize,
        placeholders: usize,
        shadows: usize,
    }

    impl Surface for RecordingSurface {
        fn fill_rect(&mut self, _rect: Rect, _rgba: [u8; 4]) {
            self.fills += 1;
        }
        fn draw_bitmap(&mut self, _dest: Rect, _bitmap: &Bitmap) {
            self.bitmaps += 1;
        }
        fn draw_shadow(&mut self, _page_rect: Rect) {
            self.shadows += 1;
        }
        fn draw_placeholder(&mut self, _rect: Rect) {
            self.placeholders += 1;
        }
    }

    fn no_repaint() -> Arc<dyn Fn(DocId) + Send + Sync> {
        Arc::new(|_| {})
    }

    fn empty_surface() -> RecordingSurface {
        RecordingSurface {
            fills: 0,
            bitmaps: 0,
            placeholders: 0,
            shadows: 0,
        }
    }

    #[test]
    fn missing_tile_paints_placeholder_and_enqueues_request() {
        let system = RenderSystem::with_capacity(16, no_repaint());
        let engine = Arc::new(FakeEngine::new(1, Size::new(100.0, 100.0)));
        let engine_dyn: Arc<dyn EngineIface> = engine.clone();
        let doc = system.open_document(engine_dyn, render::always_visible());
        let model = DisplayModel::new(engine, doc, None, Arc::new(RangeVisibility::new()), Size::new(200.0, 200.0));

        let mut surface = empty_surface();
        paint(&model, &system, &[], &mut surface);

        assert_eq!(surface.placeholders, 1);
        assert_eq!(surface.shadows, 1);

        system.shutdown();
    }

    #[test]
    fn cached_tile_is_drawn_without_placeholder() {
        let system = RenderSystem::with_capacity(16, no_repaint());
        let engine = Arc::new(FakeEngine::new(1, Size::new(100.0, 100.0)));
        let engine_dyn: Arc<dyn EngineIface> = engine.clone();
        let doc = system.open_document(engine_dyn, render::always_visible());
        let model = DisplayModel::new(engine, doc, None, Arc::new(RangeVisibility::new()), Size::new(200.0, 200.0));

        let tile = Tile {
            res: model.page_tile_resolution(1),
            col: 0,
            row: 0,
        };
        let key = CacheKey::new(doc, 1, model.rotation(), model.zoom_real(), tile);
        system.cache().add(key, Bitmap::blank(10, 10, [1, 2, 3, 255]));

        let mut surface = empty_surface();
        paint(&model, &system, &[], &mut surface);

        assert_eq!(surface.bitmaps, 1);
        assert_eq!(surface.placeholders, 0);

        system.shutdown();
    }

    #[test]
    fn overlays_are_painted_after_page_content() {
        let system = RenderSystem::with_capacity(16, no_repaint());
        let engine = Arc::new(FakeEngine::new(1, Size::new(100.0, 100.0)));
        let engine_dyn: Arc<dyn EngineIface> = engine.clone();
        let doc = system.open_document(engine_dyn, render::always_visible());
        let model = DisplayModel::new(engine, doc, None, Arc::new(RangeVisibility::new()), Size::new(200.0, 200.0));

        let overlays = [Overlay {
            kind: crate::overlay::OverlayKind::SearchHit,
            rect: Rect::new(10.0, 10.0, 20.0, 20.0),
        }];

        let mut surface = empty_surface();
        let fills_before = surface.fills;
        paint(&model, &system, &overlays, &mut surface);

        assert!(surface.fills > fills_before + 1);

        system.shutdown();
    }
}
