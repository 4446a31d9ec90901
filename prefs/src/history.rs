use crate::ViewState;

/// The list of previously opened files, newest first.
///
/// A plain `Vec` stands in for the original's singly linked list; the
/// operations below (`find_by_path`, `remove_by_path`) are the same linear
/// scans the original performs, acceptable at user-list scale.
#[derive(Debug, Clone, Default)]
pub struct FileHistory {
    entries: Vec<ViewState>,
}

impl FileHistory {
    pub fn new() -> Self {
        FileHistory::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewState> {
        self.entries.iter()
    }

    /// Inserts `state` at the head of the list (most recently opened).
    pub fn insert_head(&mut self, state: ViewState) {
        self.entries.insert(0, state);
    }

    /// Appends `state` at the tail, used when deserializing a stored list
    /// in its on-disk (already newest-first) order.
    pub fn append(&mut self, state: ViewState) {
        self.entries.push(state);
    }

    pub fn find_by_path(&self, path: &str) -> Option<&ViewState> {
        self.entries
            .iter()
            .find(|e| e.file_path.eq_ignore_ascii_case(path))
    }

    pub fn remove_by_path(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| !e.file_path.eq_ignore_ascii_case(path));
        self.entries.len() != before
    }

    /// Moves `path` to the head if present, otherwise inserts `state` at
    /// the head. The original list type has no such dedup built in
    /// (`AppPrefs.cc`'s caller is responsible for it); this convenience
    /// lives here instead of inside `FileHistory` itself so the plain
    /// insert/append operations stay a faithful match for the original.
    pub fn upsert_head(&mut self, state: ViewState) {
        self.remove_by_path(&state.file_path);
        self.insert_head(state);
    }
}
