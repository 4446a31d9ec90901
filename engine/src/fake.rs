use std::collections::HashMap;

use geometry::{Rect, Size};

use crate::{Bitmap, CharInfo, Dest, EngineError, Link, PageNo, RenderParams, TocNode};

/// A small, deterministic in-memory engine used by this workspace's own
/// tests (and usable by a host as a placeholder before a real PDF parser
/// is wired in). Every page is a uniform size/rotation by default; callers
/// can override per page.
#[derive(Debug, Clone)]
pub struct FakeEngine {
    page_count: u32,
    default_size: Size,
    page_sizes: HashMap<PageNo, Size>,
    page_rotations: HashMap<PageNo, i32>,
    image_pages: Vec<PageNo>,
    links: Vec<Link>,
    named_dests: HashMap<String, Dest>,
    toc: Option<TocNode>,
    printing_allowed: bool,
    page_text: HashMap<PageNo, String>,
    page_chars: HashMap<PageNo, Vec<CharInfo>>,
}

impl FakeEngine {
    pub fn new(page_count: u32, default_size: Size) -> Self {
        FakeEngine {
            page_count,
            default_size,
            page_sizes: HashMap::new(),
            page_rotations: HashMap::new(),
            image_pages: Vec::new(),
            links: Vec::new(),
            named_dests: HashMap::new(),
            toc: None,
            printing_allowed: true,
            page_text: HashMap::new(),
            page_chars: HashMap::new(),
        }
    }

    pub fn set_page_size(&mut self, page: PageNo, size: Size) {
        self.page_sizes.insert(page, size);
    }

    pub fn set_page_rotation(&mut self, page: PageNo, rotation: i32) {
        self.page_rotations.insert(page, rotation);
    }

    pub fn mark_image_page(&mut self, page: PageNo) {
        self.image_pages.push(page);
    }

    pub fn add_link(&mut self, link: Link) {
        self.links.push(link);
    }

    pub fn add_named_dest(&mut self, name: impl Into<String>, dest: Dest) {
        self.named_dests.insert(name.into(), dest);
    }

    pub fn set_toc(&mut self, toc: TocNode) {
        self.toc = Some(toc);
    }

    pub fn set_printing_allowed(&mut self, allowed: bool) {
        self.printing_allowed = allowed;
    }

    pub fn set_page_text(&mut self, page: PageNo, text: impl Into<String>, chars: Vec<CharInfo>) {
        self.page_text.insert(page, text.into());
        self.page_chars.insert(page, chars);
    }
}

impl crate::EngineIface for FakeEngine {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn page_size(&self, page: PageNo) -> Size {
        self.page_sizes.get(&page).copied().unwrap_or(self.default_size)
    }

    fn page_rotation(&self, page: PageNo) -> i32 {
        self.page_rotations.get(&page).copied().unwrap_or(0)
    }

    fn content_bbox(&self, page: PageNo) -> Rect {
        let size = self.page_size(page);
        Rect::new(0.0, 0.0, size.w, size.h)
    }

    fn render_bitmap(&self, params: RenderParams, abort: &dyn Fn() -> bool) -> Result<Bitmap, EngineError> {
        if params.page == 0 || params.page > self.page_count {
            return Err(EngineError::PageOutOfRange(params.page));
        }
        if abort() {
            return Err(EngineError::Aborted);
        }

        // Deterministic fill so tests can assert on bitmap contents: a
        // solid color derived from the page number.
        let shade = ((params.page * 37) % 256) as u8;
        let bitmap = Bitmap::blank(params.target_width, params.target_height, [shade, shade, shade, 255]);

        if abort() {
            return Err(EngineError::Aborted);
        }

        Ok(bitmap)
    }

    fn extract_page_text(&self, page: PageNo, line_break: &str) -> Result<String, EngineError> {
        if page == 0 || page > self.page_count {
            return Err(EngineError::TextExtractionFailed);
        }
        Ok(self
            .page_text
            .get(&page)
            .cloned()
            .unwrap_or_default()
            .replace('\n', line_break))
    }

    fn page_chars(&self, page: PageNo) -> Result<Vec<CharInfo>, EngineError> {
        if page == 0 || page > self.page_count {
            return Err(EngineError::TextExtractionFailed);
        }
        Ok(self.page_chars.get(&page).cloned().unwrap_or_default())
    }

    fn link_count(&self) -> u32 {
        self.links.len() as u32
    }

    fn fill_links(&self, buffer: &mut Vec<Link>) {
        buffer.clear();
        buffer.extend(self.links.iter().cloned());
    }

    fn find_page_by_dest(&self, dest: &Dest) -> Option<PageNo> {
        match dest {
            Dest::Xyz { page, .. } => Some(*page),
            Dest::Named(name) => self.named_dests.get(name).and_then(|d| d.page()),
        }
    }

    fn get_named_dest(&self, name: &str) -> Option<Dest> {
        self.named_dests.get(name).cloned()
    }

    fn is_image_page(&self, page: PageNo) -> bool {
        self.image_pages.contains(&page)
    }

    fn get_toc_tree(&self) -> Option<TocNode> {
        self.toc.clone()
    }

    fn printing_allowed(&self) -> bool {
        self.printing_allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineIface;

    #[test]
    fn default_size_applies_when_page_not_overridden() {
        let engine = FakeEngine::new(3, Size::new(612.0, 792.0));
        assert_eq!(engine.page_size(1), Size::new(612.0, 792.0));
    }

    #[test]
    fn render_out_of_range_page_errors() {
        let engine = FakeEngine::new(1, Size::new(100.0, 100.0));
        let params = RenderParams {
            page: 5,
            zoom_real: 100.0,
            rotation: 0,
            rect: Rect::new(0.0, 0.0, 100.0, 100.0),
            target_width: 100,
            target_height: 100,
        };
        assert_eq!(engine.render_bitmap(params, &|| false), Err(EngineError::PageOutOfRange(5)));
    }

    #[test]
    fn abort_flag_short_circuits_render() {
        let engine = FakeEngine::new(1, Size::new(100.0, 100.0));
        let params = RenderParams {
            page: 1,
            zoom_real: 100.0,
            rotation: 0,
            rect: Rect::new(0.0, 0.0, 100.0, 100.0),
            target_width: 10,
            target_height: 10,
        };
        assert_eq!(engine.render_bitmap(params, &|| true), Err(EngineError::Aborted));
    }
}
