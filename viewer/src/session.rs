//! `Session`: the top-level wiring a host constructs once, generic over a
//! single concrete engine type per process (mirroring `DisplayModel<E>`'s
//! own genericity). Owns the shared [`RenderSystem`], the persisted
//! [`prefs::Store`], and one [`DisplayModel`] per currently open document.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use display::DisplayModel;
use engine::EngineIface;
use geometry::Size;
use prefs::{DisplayMode, Store, ViewState};
use render::{DocId, RangeVisibility, RenderSystem, VisibilityOracle};

use crate::error::ViewerError;

/// One open document: its live layout/navigation model plus the identity
/// (`file_path`) under which its view state is persisted across sessions.
pub struct OpenDocument<E: EngineIface> {
    pub model: DisplayModel<E>,
    file_path: String,
}

pub struct Session<E: EngineIface> {
    render: Arc<RenderSystem>,
    store: Store,
    prefs_path: PathBuf,
    documents: HashMap<DocId, OpenDocument<E>>,
}

impl<E: EngineIface> Session<E> {
    /// Loads persisted preferences from `prefs_path` (falling back to
    /// defaults on any read/parse error, matching `Store::load`'s fail-open
    /// startup behavior), sharing `render` across every document this
    /// session opens.
    pub fn new(render: Arc<RenderSystem>, prefs_path: impl Into<PathBuf>) -> Self {
        let prefs_path = prefs_path.into();
        let store = Store::load(&prefs_path);
        Session {
            render,
            store,
            prefs_path,
            documents: HashMap::new(),
        }
    }

    pub fn render_system(&self) -> &Arc<RenderSystem> {
        &self.render
    }

    pub fn global_prefs(&self) -> &prefs::GlobalPrefs {
        &self.store.global
    }

    pub fn global_prefs_mut(&mut self) -> &mut prefs::GlobalPrefs {
        &mut self.store.global
    }

    /// Opens `file_path`, restoring its persisted view state if the file
    /// history has an entry for it, otherwise falling back to the global
    /// display-mode/zoom defaults, exactly as a freshly added history entry
    /// would start out.
    pub fn open_document(&mut self, engine: Arc<E>, file_path: impl Into<String>, viewport: Size) -> DocId {
        let file_path = file_path.into();

        let engine_dyn: Arc<dyn EngineIface> = engine.clone();
        let oracle = Arc::new(RangeVisibility::new());
        let oracle_dyn: Arc<dyn VisibilityOracle> = oracle.clone();
        let doc = self.render.open_document(engine_dyn, oracle_dyn);

        let mut model = DisplayModel::new(engine, doc, Some(self.render.clone()), oracle, viewport);

        match self.store.history.find_by_path(&file_path) {
            Some(state) if !state.use_global_values => apply_view_state(&mut model, state),
            _ => {
                let _ = model.set_mode(self.store.global.default_display_mode);
                let _ = model.zoom_to(self.store.global.default_zoom);
            }
        }

        self.documents.insert(doc, OpenDocument { model, file_path });
        doc
    }

    /// Captures `doc`'s current view state into the file history (moving it
    /// to the head, deduplicating any prior entry for the same path) and
    /// tells the render system to drop its cached tiles.
    pub fn close_document(&mut self, doc: DocId) -> Result<(), ViewerError> {
        let open = self.documents.remove(&doc).ok_or(ViewerError::NoSuchDocument)?;

        if self.store.global.remember_opened_files {
            let state = capture_view_state(&open);
            self.store.history.upsert_head(state);
        }

        self.render.close_document(doc);
        Ok(())
    }

    pub fn document(&self, doc: DocId) -> Option<&DisplayModel<E>> {
        self.documents.get(&doc).map(|d| &d.model)
    }

    pub fn document_mut(&mut self, doc: DocId) -> Option<&mut DisplayModel<E>> {
        self.documents.get_mut(&doc).map(|d| &mut d.model)
    }

    pub fn file_path(&self, doc: DocId) -> Option<&str> {
        self.documents.get(&doc).map(|d| d.file_path.as_str())
    }

    pub fn set_invert_colors(&self, invert: bool) {
        self.render.set_invert_colors(invert);
    }

    pub fn prefs_path(&self) -> &Path {
        &self.prefs_path
    }

    /// Persists every currently open document's view state (as
    /// `close_document` would) plus the global prefs, without actually
    /// closing anything. A host calls this periodically and on exit.
    pub fn save_prefs(&mut self) -> Result<(), ViewerError> {
        if self.store.global.remember_opened_files {
            for open in self.documents.values() {
                let state = capture_view_state(open);
                self.store.history.upsert_head(state);
            }
        }

        self.store.save(&self.prefs_path).map_err(ViewerError::from)
    }
}

fn apply_view_state<E: EngineIface>(model: &mut DisplayModel<E>, state: &ViewState) {
    let _ = model.set_mode(state.display_mode);
    let _ = model.rotate_by(state.rotation - model.rotation());
    let _ = model.zoom_to(state.zoom_virtual);
    let _ = model.set_scroll_state(display::ScrollState::new(
        state.page_no.max(1) as u32,
        state.scroll_x as f64,
        state.scroll_y as f64,
    ));
    model.set_toc_state(state.toc_state.clone());
}

fn capture_view_state<E: EngineIface>(open: &OpenDocument<E>) -> ViewState {
    let model = &open.model;
    let scroll = model.get_scroll_state();

    let mut state = ViewState::new(open.file_path.clone());
    state.display_mode = model.mode();
    state.page_no = scroll.page as i32;
    state.rotation = model.rotation();
    state.scroll_x = scroll.x as i32;
    state.scroll_y = scroll.y as i32;
    state.zoom_virtual = model.zoom_virtual();
    state.toc_state = model.toc_state().to_vec();
    state
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engine::FakeEngine;
    use geometry::Size;
    use prefs::keys;

    use super::*;

    fn no_repaint() -> Arc<dyn Fn(DocId) + Send + Sync> {
        Arc::new(|_| {})
    }

    fn tmp_prefs_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("viewer-session-test-{name}.dat"))
    }

    #[test]
    fn opening_an_unknown_path_falls_back_to_global_defaults() {
        let path = tmp_prefs_path("unknown-path");
        let _ = std::fs::remove_file(&path);

        let render = RenderSystem::with_capacity(16, no_repaint());
        let mut session: Session<FakeEngine> = Session::new(render, &path);
        session.global_prefs_mut().default_display_mode = DisplayMode::Continuous;
        session.global_prefs_mut().default_zoom = keys::ZOOM_FIT_WIDTH;

        let engine = Arc::new(FakeEngine::new(5, Size::new(100.0, 100.0)));
        let doc = session.open_document(engine, "/docs/a.pdf", Size::new(400.0, 400.0));

        let model = session.document(doc).unwrap();
        assert_eq!(model.mode(), DisplayMode::Continuous);
        assert_eq!(model.zoom_virtual(), keys::ZOOM_FIT_WIDTH);

        session.render_system().shutdown();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn closing_then_reopening_restores_the_saved_page() {
        let path = tmp_prefs_path("restore-page");
        let _ = std::fs::remove_file(&path);

        let render = RenderSystem::with_capacity(16, no_repaint());
        let mut session: Session<FakeEngine> = Session::new(render, &path);

        let engine = Arc::new(FakeEngine::new(5, Size::new(100.0, 100.0)));
        let doc = session.open_document(engine.clone(), "/docs/b.pdf", Size::new(400.0, 400.0));
        session.document_mut(doc).unwrap().go_to_page(3, 0.0, false, -1.0).unwrap();
        session.close_document(doc).unwrap();

        let doc2 = session.open_document(engine, "/docs/b.pdf", Size::new(400.0, 400.0));
        let scroll = session.document(doc2).unwrap().get_scroll_state();
        assert_eq!(scroll.page, 3);

        session.render_system().shutdown();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn save_prefs_persists_across_a_fresh_load() {
        let path = tmp_prefs_path("persist-reload");
        let _ = std::fs::remove_file(&path);

        let render = RenderSystem::with_capacity(16, no_repaint());
        let mut session: Session<FakeEngine> = Session::new(render, &path);

        let engine = Arc::new(FakeEngine::new(5, Size::new(100.0, 100.0)));
        let doc = session.open_document(engine, "/docs/c.pdf", Size::new(400.0, 400.0));
        session.document_mut(doc).unwrap().go_to_page(2, 0.0, false, -1.0).unwrap();
        session.save_prefs().unwrap();
        session.render_system().shutdown();

        let render2 = RenderSystem::with_capacity(16, no_repaint());
        let session2: Session<FakeEngine> = Session::new(render2, &path);
        let state = session2.store.history.find_by_path("/docs/c.pdf").unwrap();
        assert_eq!(state.page_no, 2);

        session2.render_system().shutdown();
        let _ = std::fs::remove_file(&path);
    }
}
