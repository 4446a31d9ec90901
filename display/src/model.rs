//! `DisplayModel`: layout, visibility, navigation, and coordinate conversion
//! for one open document. Single-threaded; only the UI thread is meant to
//! call its mutating methods. The render worker thread never touches it
//! directly, only the [`render::RangeVisibility`] snapshot it publishes.

use std::collections::HashMap;
use std::sync::Arc;

use engine::{Dest, EngineIface, Link, LinkKind, TocNode};
use geometry::{normalize_rotation, round_to_device, Point, Rect, Size};
use prefs::{keys, DisplayMode};
use render::{CacheKey, RangeVisibility, RenderRequest, RenderSystem, Tile};
use tracing::{debug, trace};

use crate::error::DisplayError;
use crate::layout::{self, LayoutParams};
use crate::scroll::{NavHistory, ScrollState};

const BORDER_DEFAULT: f64 = 4.0;
const BETWEEN_DEFAULT: f64 = 4.0;
const BORDER_PRESENTATION: f64 = 0.0;
const BETWEEN_PRESENTATION: f64 = 4.0;

/// No platform DPI query exists in this headless core; a host that needs
/// one composes it on top of `zoom_virtual` before calling `zoom_to`.
const DPI_FACTOR: f64 = 1.0;

const SEARCH_HIT_PAD: f64 = 5.0;
const MAX_TILE_SIZE: u32 = 2048;

#[derive(Debug, Clone, Copy)]
struct PresentationSaved {
    mode: DisplayMode,
    zoom_virtual: f64,
}

/// What activating a [`Link`] resolves to; the host dispatches
/// `OpenUri`/`OpenDocument`, `Navigated` means the model already jumped.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkAction {
    OpenUri(String),
    OpenDocument(String),
    Navigated,
    Ignored,
}

pub struct DisplayModel<E: EngineIface> {
    engine: Arc<E>,
    doc: render::DocId,
    render: Option<Arc<RenderSystem>>,
    visibility: Arc<RangeVisibility>,

    mode: DisplayMode,
    zoom_virtual: f64,
    zoom_real: f64,
    rotation: i32,

    viewport: Size,
    area_offset: Point,
    canvas: Size,
    page_canvas_rect: HashMap<u32, Rect>,
    shown: Vec<u32>,
    start_page: u32,
    presentation: Option<PresentationSaved>,

    nav_history: NavHistory,
    links: Vec<Link>,
    toc_state: Vec<i32>,
}

impl<E: EngineIface> DisplayModel<E> {
    pub fn new(engine: Arc<E>, doc: render::DocId, render: Option<Arc<RenderSystem>>, visibility: Arc<RangeVisibility>, viewport: Size) -> Self {
        let mut model = DisplayModel {
            engine,
            doc,
            render,
            visibility,
            mode: DisplayMode::Automatic,
            zoom_virtual: keys::ZOOM_FIT_PAGE,
            zoom_real: 100.0,
            rotation: 0,
            viewport,
            area_offset: Point::default(),
            canvas: Size::default(),
            page_canvas_rect: HashMap::new(),
            shown: Vec::new(),
            start_page: 1,
            presentation: None,
            nav_history: NavHistory::new(),
            links: Vec::new(),
            toc_state: Vec::new(),
        };
        model.relayout();
        model
    }

    // -- basic accessors -----------------------------------------------

    pub fn page_count(&self) -> u32 {
        self.engine.page_count()
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn zoom_virtual(&self) -> f64 {
        self.zoom_virtual
    }

    pub fn zoom_real(&self) -> f64 {
        self.zoom_real
    }

    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    pub fn area_offset(&self) -> Point {
        self.area_offset
    }

    pub fn shown_pages(&self) -> &[u32] {
        &self.shown
    }

    pub fn page_rect(&self, page: u32) -> Option<Rect> {
        self.page_canvas_rect.get(&page).copied()
    }

    pub fn doc_id(&self) -> render::DocId {
        self.doc
    }

    /// The tile-grid resolution level a painter should request for `page` at
    /// the current zoom, per the same heuristic `request_visible_tiles` uses.
    pub fn page_tile_resolution(&self, page: u32) -> u16 {
        let size = self.page_rect(page).map(|r| (r.w, r.h)).unwrap_or((0.0, 0.0));
        render::choose_tile_resolution(size.0, size.1, MAX_TILE_SIZE, self.prefers_larger_tiles(page))
    }

    fn prefers_larger_tiles(&self, page: u32) -> bool {
        if self.engine.is_image_page(page) || self.zoom_virtual == keys::ZOOM_FIT_PAGE || self.zoom_virtual == keys::ZOOM_FIT_WIDTH {
            return true;
        }
        let device = self.device_size(page, self.zoom_real);
        device.w <= self.viewport.w || device.h <= self.viewport.h
    }

    fn effective_mode(&self) -> DisplayMode {
        match self.mode {
            DisplayMode::Automatic => DisplayMode::SinglePage,
            m => m,
        }
    }

    fn padding(&self) -> (f64, f64) {
        if self.presentation.is_some() {
            (BORDER_PRESENTATION, BETWEEN_PRESENTATION)
        } else {
            (BORDER_DEFAULT, BETWEEN_DEFAULT)
        }
    }

    fn rotated_size(&self, page: u32) -> Size {
        let base = self.engine.page_size(page);
        let total = normalize_rotation(self.rotation + self.engine.page_rotation(page));
        if total == 90 || total == 270 {
            base.swapped()
        } else {
            base
        }
    }

    fn device_size(&self, page: u32, zoom_real: f64) -> Size {
        let size = self.rotated_size(page);
        Size::new(
            round_to_device(size.w * zoom_real / 100.0) as f64,
            round_to_device(size.h * zoom_real / 100.0) as f64,
        )
    }

    fn row_start_page(&self, page: u32, mode: DisplayMode) -> u32 {
        let columns = mode.columns();
        if !mode.is_book_view() {
            if columns <= 1 {
                return page;
            }
            let zero = page.saturating_sub(1);
            zero - (zero % columns) + 1
        } else if page <= 1 {
            1
        } else {
            let zero = page - 2;
            let row = zero / 2;
            2 + row * 2
        }
    }

    fn shown_pages_for_layout(&self) -> Vec<u32> {
        let mode = self.effective_mode();
        if mode.is_continuous() {
            return (1..=self.page_count()).collect();
        }

        let start = self.row_start_page(self.start_page, mode);
        let row_len = if mode.is_book_view() && start == 1 { 1 } else { mode.columns() };

        let mut pages = Vec::new();
        let mut p = start;
        for _ in 0..row_len {
            if p > self.page_count() {
                break;
            }
            pages.push(p);
            p += 1;
        }
        pages
    }

    fn fit_zoom(&self, pages: &[u32], fit_w: bool, fit_h: bool) -> f64 {
        let (border, _) = self.padding();
        let avail_w = (self.viewport.w - 2.0 * border).max(1.0);
        let avail_h = (self.viewport.h - 2.0 * border).max(1.0);

        let z = pages
            .iter()
            .map(|&p| {
                let size = self.rotated_size(p);
                let zx = avail_w / size.w.max(1.0) * 100.0;
                let zy = avail_h / size.h.max(1.0) * 100.0;
                if fit_w && fit_h {
                    zx.min(zy)
                } else if fit_w {
                    zx
                } else {
                    zy
                }
            })
            .fold(f64::INFINITY, f64::min);

        z.clamp(keys::ZOOM_MIN, keys::ZOOM_MAX)
    }

    fn fit_zoom_content(&self, pages: &[u32]) -> f64 {
        let (border, _) = self.padding();
        let avail_w = (self.viewport.w - 2.0 * border).max(1.0);
        let avail_h = (self.viewport.h - 2.0 * border).max(1.0);

        let z = pages
            .iter()
            .map(|&p| {
                let bbox = self.engine.content_bbox(p);
                let zx = avail_w / bbox.w.max(1.0) * 100.0;
                let zy = avail_h / bbox.h.max(1.0) * 100.0;
                zx.min(zy)
            })
            .fold(f64::INFINITY, f64::min);

        z.clamp(keys::ZOOM_MIN, keys::ZOOM_MAX)
    }

    fn resolve_zoom_real(&self, pages: &[u32]) -> f64 {
        if self.zoom_virtual == keys::ZOOM_FIT_PAGE {
            self.fit_zoom(pages, true, true)
        } else if self.zoom_virtual == keys::ZOOM_FIT_WIDTH {
            self.fit_zoom(pages, true, false)
        } else if self.zoom_virtual == keys::ZOOM_FIT_CONTENT {
            self.fit_zoom_content(pages)
        } else {
            (self.zoom_virtual * DPI_FACTOR).clamp(keys::ZOOM_MIN, keys::ZOOM_MAX)
        }
    }

    /// Recomputes layout, zoom, and canvas size. Called after any change to
    /// mode, zoom, rotation, viewport size, or (in non-continuous mode)
    /// current page.
    fn relayout(&mut self) {
        let mode = self.effective_mode();
        let shown = self.shown_pages_for_layout();
        let zoom_real = self.resolve_zoom_real(&shown);
        self.zoom_real = zoom_real;

        let sizes: Vec<Size> = shown.iter().map(|&p| self.device_size(p, zoom_real)).collect();
        let (border, between) = self.padding();
        let params = LayoutParams {
            columns: mode.columns(),
            leading_blank: mode.is_book_view() && shown.first().copied() == Some(1),
            border,
            between_x: between,
            between_y: between,
        };
        let result = layout::compute_layout(&sizes, &params);

        self.canvas = result.canvas;
        self.page_canvas_rect.clear();
        for (i, &p) in shown.iter().enumerate() {
            self.page_canvas_rect.insert(p, result.page_rects[i]);
        }
        self.shown = shown;

        self.clamp_area_offset();
        self.publish_visibility();

        trace!(doc = self.doc, pages = ?self.shown, zoom_real = self.zoom_real, "relayout");
    }

    fn clamp_axis(offset: f64, canvas: f64, viewport: f64) -> f64 {
        if canvas <= viewport {
            (canvas - viewport) / 2.0
        } else {
            offset.max(0.0).min(canvas - viewport)
        }
    }

    fn clamp_area_offset(&mut self) {
        self.area_offset.x = Self::clamp_axis(self.area_offset.x, self.canvas.w, self.viewport.w);
        self.area_offset.y = Self::clamp_axis(self.area_offset.y, self.canvas.h, self.viewport.h);
    }

    fn publish_visibility(&self) {
        if let (Some(&first), Some(&last)) = (self.shown.first(), self.shown.last()) {
            self.visibility.update(first, last);
        }
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.relayout();
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
        self.relayout();
    }

    pub fn enter_presentation(&mut self) {
        if self.presentation.is_some() {
            return;
        }
        self.presentation = Some(PresentationSaved {
            mode: self.mode,
            zoom_virtual: self.zoom_virtual,
        });
        self.mode = DisplayMode::SinglePage;
        self.zoom_virtual = keys::ZOOM_FIT_PAGE;
        self.relayout();
    }

    pub fn exit_presentation(&mut self) {
        if let Some(saved) = self.presentation.take() {
            self.mode = saved.mode;
            self.zoom_virtual = saved.zoom_virtual;
            self.relayout();
        }
    }

    // -- visibility & current page ---------------------------------------

    pub fn page_visibility(&self, page: u32) -> f64 {
        match self.page_canvas_rect.get(&page) {
            Some(rect) => {
                let translated = rect.translated(-self.area_offset.x, -self.area_offset.y);
                let viewport_rect = Rect::new(0.0, 0.0, self.viewport.w, self.viewport.h);
                translated.visibility_within(&viewport_rect)
            }
            None => 0.0,
        }
    }

    pub fn current_page(&self) -> u32 {
        if !self.effective_mode().is_continuous() {
            return self.start_page;
        }

        let mut best: Option<(u32, f64)> = None;
        for &p in &self.shown {
            let v = self.page_visibility(p);
            if best.map_or(true, |(_, bv)| v > bv) {
                best = Some((p, v));
            }
        }

        match best {
            Some((p, v)) if v > 0.0 => p,
            _ => {
                if self.area_offset.y <= 0.0 {
                    1
                } else {
                    self.page_count().max(1)
                }
            }
        }
    }

    // -- navigation --------------------------------------------------------

    pub fn go_to_page(&mut self, page: u32, scroll_y: f64, add_history: bool, scroll_x: f64) -> Result<(), DisplayError> {
        if page == 0 || page > self.page_count() {
            return Err(DisplayError::PageOutOfRange(page));
        }

        debug!(doc = self.doc, page, "go_to_page");

        if add_history {
            let current = self.get_scroll_state();
            self.nav_history.add_nav_point(current, false);
        }

        let mode = self.effective_mode();
        if !mode.is_continuous() {
            self.start_page = self.row_start_page(page, mode);
            self.relayout();
        }

        let rect = self.page_canvas_rect.get(&page).copied().unwrap_or(Rect::ZERO);
        let x = if scroll_x < 0.0 { self.area_offset.x } else { rect.x + scroll_x };
        let y = rect.y + scroll_y.max(0.0);

        self.area_offset = Point::new(x, y);
        self.clamp_area_offset();
        self.publish_visibility();

        Ok(())
    }

    pub fn go_to_next_page(&mut self) -> bool {
        let mode = self.effective_mode();
        let cur = self.current_page();

        if let Some(rect) = self.page_canvas_rect.get(&cur).copied() {
            let page_bottom = rect.y + rect.h;
            let viewport_bottom = self.area_offset.y + self.viewport.h;
            if page_bottom > viewport_bottom + 1.0 {
                let new_y = (self.area_offset.y + self.viewport.h).min((self.canvas.h - self.viewport.h).max(0.0));
                self.area_offset.y = new_y;
                self.clamp_area_offset();
                self.publish_visibility();
                return true;
            }
        }

        let columns = mode.columns().max(1);
        let next_row_start = self.row_start_page(cur, mode) + columns;
        if next_row_start > self.page_count() {
            return false;
        }

        let _ = self.go_to_page(next_row_start, 0.0, false, -1.0);
        true
    }

    pub fn go_to_prev_page(&mut self) -> bool {
        let mode = self.effective_mode();
        let cur = self.current_page();

        if self.area_offset.y > 0.0 {
            if let Some(rect) = self.page_canvas_rect.get(&cur) {
                if self.area_offset.y > rect.y + 1.0 {
                    let new_y = (self.area_offset.y - self.viewport.h).max(0.0);
                    self.area_offset.y = new_y;
                    self.clamp_area_offset();
                    self.publish_visibility();
                    return true;
                }
            }
        }

        let row_start = self.row_start_page(cur, mode);
        if row_start <= 1 {
            return false;
        }

        let prev_row_start = self.row_start_page(row_start - 1, mode);
        let _ = self.go_to_page(prev_row_start, 0.0, false, -1.0);
        true
    }

    pub fn go_to_first_page(&mut self) -> bool {
        if self.current_page() == 1 {
            return false;
        }
        let _ = self.go_to_page(1, 0.0, true, -1.0);
        true
    }

    pub fn go_to_last_page(&mut self) -> bool {
        let last = self.page_count();
        if self.current_page() == last {
            return false;
        }
        let _ = self.go_to_page(last, 0.0, true, -1.0);
        true
    }

    pub fn scroll_y_by(&mut self, dy: f64, change_page: bool) {
        let mode = self.effective_mode();
        let new_y = self.area_offset.y + dy;
        let max_y = (self.canvas.h - self.viewport.h).max(0.0);

        if !mode.is_continuous() && change_page {
            if new_y < 0.0 {
                let remainder = new_y;
                if self.go_to_prev_page() {
                    self.area_offset.y = (self.area_offset.y + remainder).max(0.0);
                    self.clamp_area_offset();
                }
                self.publish_visibility();
                return;
            }
            if new_y > max_y {
                let remainder = new_y - max_y;
                if self.go_to_next_page() {
                    self.area_offset.y = (self.area_offset.y + remainder).min(self.canvas.h);
                    self.clamp_area_offset();
                }
                self.publish_visibility();
                return;
            }
        }

        self.area_offset.y = new_y;
        self.clamp_area_offset();
        self.publish_visibility();
    }

    pub fn scroll_x_by(&mut self, dx: f64) {
        self.area_offset.x += dx;
        self.clamp_area_offset();
    }

    fn user_to_bitmap(&self, page: u32, x: f64, y: f64) -> Point {
        let ctm = self.engine.viewctm(page, self.zoom_real, self.rotation);
        let p = ctm.transform_point(geometry::Point::new(x, y));
        Point::new(round_to_device(p.x) as f64, round_to_device(p.y) as f64)
    }

    fn bitmap_to_user(&self, page: u32, x: f64, y: f64) -> (f64, f64) {
        let ctm = self.engine.viewctm(page, self.zoom_real, self.rotation);
        let inv = ctm.inverse();
        let p = inv.transform_point(geometry::Point::new(x, y));
        (p.x, p.y)
    }

    pub fn zoom_to(&mut self, zoom_virtual: f64) {
        let anchor_screen = Point::new(self.viewport.w / 2.0, self.viewport.h / 2.0);
        let anchor = self.screen_to_user(anchor_screen.x, anchor_screen.y);

        self.zoom_virtual = zoom_virtual;
        self.relayout();

        if let Some((page, ux, uy)) = anchor {
            if let Some(screen) = self.user_to_screen(page, ux, uy) {
                self.area_offset.x += screen.x - anchor_screen.x;
                self.area_offset.y += screen.y - anchor_screen.y;
                self.clamp_area_offset();
            }
        }
        self.publish_visibility();
    }

    pub fn zoom_by(&mut self, factor: f64) {
        let current = if keys::valid_zoom_virtual(self.zoom_virtual) && self.zoom_virtual > 0.0 {
            self.zoom_virtual
        } else {
            self.zoom_real / DPI_FACTOR
        };
        let next = (current * factor).clamp(keys::ZOOM_MIN, keys::ZOOM_MAX);
        self.zoom_to(next);
    }

    pub fn rotate_by(&mut self, delta: i32) {
        self.rotation = normalize_rotation(self.rotation + delta);
        let page = self.current_page();
        self.relayout();
        let _ = self.go_to_page(page, 0.0, false, -1.0);
    }

    // -- scroll state & navigation history ---------------------------------

    pub fn get_scroll_state(&self) -> ScrollState {
        let page = self.current_page();
        let rect = self.page_canvas_rect.get(&page).copied().unwrap_or(Rect::ZERO);
        let flush = (self.area_offset.x - rect.x).abs() < 0.5 && (self.area_offset.y - rect.y).abs() < 0.5;
        if flush {
            return ScrollState::at_margin(page);
        }

        let (ux, uy) = self.bitmap_to_user(page, self.area_offset.x - rect.x, self.area_offset.y - rect.y);
        ScrollState::new(page, ux, uy)
    }

    pub fn set_scroll_state(&mut self, state: ScrollState) -> Result<(), DisplayError> {
        if state.page == 0 || state.page > self.page_count() {
            return Err(DisplayError::PageOutOfRange(state.page));
        }

        let scroll_y = if state.y < 0.0 { 0.0 } else { self.user_to_bitmap(state.page, 0.0, state.y).y };
        let scroll_x = if state.x < 0.0 { -1.0 } else { self.user_to_bitmap(state.page, state.x, 0.0).x };

        self.go_to_page(state.page, scroll_y, false, scroll_x)
    }

    pub fn can_navigate(&self, dir: i32) -> bool {
        self.nav_history.can_navigate(dir)
    }

    pub fn navigate(&mut self, dir: i32) -> Result<(), DisplayError> {
        let current = self.get_scroll_state();
        match self.nav_history.navigate(dir, current) {
            Some(state) => self.set_scroll_state(state),
            None => Ok(()),
        }
    }

    // -- coordinate conversion ----------------------------------------------

    pub fn user_to_screen(&self, page: u32, x: f64, y: f64) -> Option<Point> {
        let rect = self.page_canvas_rect.get(&page)?;
        let bmp = self.user_to_bitmap(page, x, y);
        Some(Point::new(rect.x + bmp.x - self.area_offset.x, rect.y + bmp.y - self.area_offset.y))
    }

    pub fn screen_to_user(&self, x: f64, y: f64) -> Option<(u32, f64, f64)> {
        let target = Point::new(x + self.area_offset.x, y + self.area_offset.y);
        let page = self
            .shown
            .iter()
            .copied()
            .find(|&p| self.page_canvas_rect.get(&p).map_or(false, |r| r.contains_point(target)))?;
        let rect = self.page_canvas_rect.get(&page)?;
        let (ux, uy) = self.bitmap_to_user(page, target.x - rect.x, target.y - rect.y);
        Some((page, ux, uy))
    }

    // -- links & TOC ---------------------------------------------------------

    fn refresh_links(&mut self) {
        let count = self.engine.link_count();
        if count as usize != self.links.len() {
            self.engine.fill_links(&mut self.links);
        }
    }

    pub fn link_at_position(&mut self, x: f64, y: f64) -> Option<Link> {
        self.refresh_links();
        let target = Point::new(x, y);

        self.links
            .iter()
            .find(|l| {
                if !self.shown.contains(&l.page) {
                    return false;
                }
                let a = self.user_to_screen(l.page, l.rect.left(), l.rect.top());
                let b = self.user_to_screen(l.page, l.rect.right(), l.rect.bottom());
                match (a, b) {
                    (Some(a), Some(b)) => {
                        let r = Rect::new(a.x.min(b.x), a.y.min(b.y), (b.x - a.x).abs(), (b.y - a.y).abs());
                        r.contains_point(target)
                    }
                    _ => false,
                }
            })
            .cloned()
    }

    pub fn go_to_link(&mut self, link: &Link) -> Result<LinkAction, DisplayError> {
        match &link.kind {
            LinkKind::Uri(uri) => {
                if uri.starts_with("http://") || uri.starts_with("https://") {
                    Ok(LinkAction::OpenUri(uri.clone()))
                } else {
                    Ok(LinkAction::Ignored)
                }
            }
            LinkKind::GoTo(dest) => {
                self.go_to_dest(dest)?;
                Ok(LinkAction::Navigated)
            }
            LinkKind::Launch(path) => {
                if path.ends_with(".pdf") && !path.contains("..") {
                    Ok(LinkAction::OpenDocument(path.clone()))
                } else {
                    Ok(LinkAction::Ignored)
                }
            }
            LinkKind::Unknown => Ok(LinkAction::Ignored),
        }
    }

    pub fn go_to_dest(&mut self, dest: &Dest) -> Result<(), DisplayError> {
        let resolved = match dest {
            Dest::Named(name) => self.engine.get_named_dest(name).ok_or(DisplayError::PageOutOfRange(0))?,
            other => other.clone(),
        };
        let page = resolved.page().ok_or(DisplayError::PageOutOfRange(0))?;

        match &resolved {
            Dest::Xyz { x: Some(ux), y: Some(uy), .. } => {
                let bmp = self.user_to_bitmap(page, *ux, *uy);
                self.go_to_page(page, bmp.y.max(0.0), true, bmp.x.max(0.0))
            }
            _ => self.go_to_page(page, 0.0, true, -1.0),
        }
    }

    pub fn toc_state(&self) -> &[i32] {
        &self.toc_state
    }

    pub fn set_toc_state(&mut self, state: Vec<i32>) {
        self.toc_state = state;
    }

    pub fn toc_tree(&self) -> Option<TocNode> {
        self.engine.get_toc_tree()
    }

    // -- text & search -------------------------------------------------------

    pub fn get_text_in_region(&self, page: u32, rect: Rect) -> Result<String, DisplayError> {
        let chars = self.engine.page_chars(page)?;
        let mut out = String::new();

        for c in chars.iter().filter(|c| rect.intersect(&c.rect).is_some()) {
            if c.line_start && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push(c.ch);
        }

        Ok(out)
    }

    pub fn extract_all_text(&self) -> Result<String, DisplayError> {
        let mut out = String::new();
        for page in 1..=self.page_count() {
            let text = self.engine.extract_page_text(page, "\n")?;
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str(&text);
        }
        Ok(out)
    }

    pub fn map_result_rect_to_screen(&mut self, page: u32, user_rect: Rect) -> Option<Rect> {
        let corners = [
            (user_rect.left(), user_rect.top()),
            (user_rect.right(), user_rect.top()),
            (user_rect.left(), user_rect.bottom()),
            (user_rect.right(), user_rect.bottom()),
        ];

        let screen_corners: Vec<Point> = corners.iter().filter_map(|&(x, y)| self.user_to_screen(page, x, y)).collect();
        if screen_corners.len() != 4 {
            return None;
        }

        let min_x = screen_corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = screen_corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = screen_corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = screen_corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        let mut rect = Rect::new(min_x, min_y, (max_x - min_x) + SEARCH_HIT_PAD, (max_y - min_y) + SEARCH_HIT_PAD);
        let viewport = Rect::new(0.0, 0.0, self.viewport.w, self.viewport.h);

        let mut dx = 0.0;
        let mut dy = 0.0;

        if rect.left() < viewport.left() {
            let page_rect = self.page_canvas_rect.get(&page).copied().unwrap_or(Rect::ZERO);
            let min_scroll_x = (page_rect.x - self.area_offset.x).min(0.0);
            dx = (rect.left() - viewport.left()).max(min_scroll_x);
        } else if rect.right() > viewport.right() {
            dx = rect.right() - viewport.right();
        }

        if rect.top() < viewport.top() {
            dy = rect.top() - viewport.top();
        } else if rect.bottom() > viewport.bottom() {
            dy = rect.bottom() - viewport.bottom();
        }

        if dx != 0.0 {
            self.scroll_x_by(dx);
        }
        if dy != 0.0 {
            self.scroll_y_by(dy, false);
        }

        rect = rect.translated(-dx, -dy);
        Some(rect)
    }

    // -- rendering -------------------------------------------------------------

    /// Issues render requests for every currently visible page's tiles, plus
    /// a low-priority request for the page just past the last visible one so
    /// scrolling forward usually finds a warm cache entry.
    pub fn request_visible_tiles(&self) {
        let Some(render) = &self.render else {
            return;
        };

        for &page in &self.shown {
            if self.page_visibility(page) > 0.0 {
                self.request_page_tile(render, page);
            }
        }

        if let Some(&last) = self.shown.last() {
            let predict = last + 1;
            if predict <= self.page_count() {
                self.request_page_tile(render, predict);
            }
        }
    }

    fn request_page_tile(&self, render: &Arc<RenderSystem>, page: u32) {
        let size = self.device_size(page, self.zoom_real);
        let res = self.page_tile_resolution(page);
        let tile = Tile { res, col: 0, row: 0 };
        let key = CacheKey::new(self.doc, page, self.rotation, self.zoom_real, tile);

        let grid = tile.grid_size() as f64;
        let tile_w = size.w / grid;
        let tile_h = size.h / grid;

        if render.find_bitmap(key, false).is_none() {
            let rect = Rect::new(0.0, 0.0, tile_w, tile_h);
            render.enqueue(RenderRequest::new(key, rect, rect.w as u32, rect.h as u32));
        }

        // A one-level split is almost always followed by the user panning
        // into the other half, so predict it at low priority alongside the
        // first tile.
        if res == 1 {
            let sibling = Tile { res, col: 1, row: 0 };
            let sibling_key = CacheKey::new(self.doc, page, self.rotation, self.zoom_real, sibling);
            if render.find_bitmap(sibling_key, false).is_none() {
                let rect = Rect::new(tile_w, 0.0, tile_w, tile_h);
                render.enqueue_low_priority(RenderRequest::new(sibling_key, rect, rect.w as u32, rect.h as u32));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::FakeEngine;

    fn model(pages: u32, size: Size) -> DisplayModel<FakeEngine> {
        let engine = Arc::new(FakeEngine::new(pages, size));
        DisplayModel::new(engine, 1, None, Arc::new(RangeVisibility::new()), Size::new(800.0, 600.0))
    }

    #[test]
    fn single_page_mode_shows_only_the_current_page() {
        let m = model(5, Size::new(600.0, 800.0));
        assert_eq!(m.shown_pages(), &[1]);
    }

    #[test]
    fn continuous_mode_shows_every_page() {
        let mut m = model(5, Size::new(600.0, 800.0));
        m.set_mode(DisplayMode::Continuous);
        assert_eq!(m.shown_pages().len(), 5);
    }

    #[test]
    fn go_to_page_out_of_range_errors() {
        let mut m = model(3, Size::new(600.0, 800.0));
        assert_eq!(m.go_to_page(9, 0.0, false, -1.0), Err(DisplayError::PageOutOfRange(9)));
    }

    #[test]
    fn go_to_next_page_advances_current_page() {
        let mut m = model(3, Size::new(600.0, 800.0));
        assert_eq!(m.current_page(), 1);
        assert!(m.go_to_next_page());
        assert_eq!(m.current_page(), 2);
    }

    #[test]
    fn go_to_last_page_lands_on_final_page() {
        let mut m = model(5, Size::new(600.0, 800.0));
        assert!(m.go_to_last_page());
        assert_eq!(m.current_page(), 5);
        assert!(!m.go_to_last_page());
    }

    #[test]
    fn facing_mode_groups_two_pages_per_row() {
        let mut m = model(4, Size::new(400.0, 500.0));
        m.set_mode(DisplayMode::Facing);
        assert_eq!(m.shown_pages(), &[1, 2]);
    }

    #[test]
    fn book_view_places_page_one_alone() {
        let mut m = model(4, Size::new(400.0, 500.0));
        m.set_mode(DisplayMode::BookView);
        assert_eq!(m.shown_pages(), &[1]);
        m.go_to_page(2, 0.0, false, -1.0).unwrap();
        assert_eq!(m.shown_pages(), &[2, 3]);
    }

    #[test]
    fn rotate_by_ninety_swaps_effective_page_dimensions() {
        let mut m = model(1, Size::new(600.0, 800.0));
        let before = m.page_rect(1).unwrap();
        assert!(before.w < before.h, "portrait page should lay out narrower than tall");

        m.rotate_by(90);
        assert_eq!(m.rotation(), 90);

        let after = m.page_rect(1).unwrap();
        assert!(after.w > after.h, "a 90 degree rotation should swap width and height");
    }

    #[test]
    fn zoom_to_fit_width_clamps_within_bounds() {
        let mut m = model(1, Size::new(10000.0, 10000.0));
        m.zoom_to(keys::ZOOM_FIT_WIDTH);
        assert!(m.zoom_real() >= keys::ZOOM_MIN && m.zoom_real() <= keys::ZOOM_MAX);
    }

    #[test]
    fn scroll_state_round_trips_through_set_scroll_state() {
        let mut m = model(1, Size::new(600.0, 800.0));
        m.scroll_y_by(20.0, false);
        let state = m.get_scroll_state();
        m.set_scroll_state(state).unwrap();
        assert_eq!(m.get_scroll_state().page, state.page);
    }

    #[test]
    fn nav_history_allows_back_after_addition() {
        let mut m = model(3, Size::new(600.0, 800.0));
        m.go_to_page(2, 0.0, true, -1.0).unwrap();
        m.go_to_page(3, 0.0, true, -1.0).unwrap();
        assert!(m.can_navigate(-1));
        m.navigate(-1).unwrap();
    }
}
