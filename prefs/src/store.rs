use std::path::Path;

use bencode::{Dict, Value};

use crate::global_prefs::GlobalPrefs;
use crate::history::FileHistory;
use crate::keys;
use crate::view_state::ViewState;
use crate::Error;

/// How many recent-file entries are kept when `global_prefs_only` caps the
/// persisted history (mirrors `MAX_RECENT_FILES_IN_MENU`).
pub const MAX_RECENT_FILES_IN_MENU: usize = 10;

/// The full on-disk preferences: global options plus the recent-files list.
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub global: GlobalPrefs,
    pub history: FileHistory,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut top = Dict::new();
        top.insert(keys::GLOBAL_PREFS, Value::Dict(self.global.to_dict()));

        let limit = if self.global.global_prefs_only {
            MAX_RECENT_FILES_IN_MENU
        } else {
            usize::MAX
        };

        let entries = self
            .history
            .iter()
            .take(limit)
            .map(|state| Value::Dict(state.to_dict(self.global.global_prefs_only)))
            .collect();

        top.insert(keys::FILE_HISTORY, Value::List(entries));

        bencode::encode(&Value::Dict(top))
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, Error> {
        let value = bencode::decode(data)?;
        let top = value.as_dict().ok_or(Error::MalformedPrefs)?;

        let global_dict = top.get_dict(keys::GLOBAL_PREFS).ok_or(Error::MalformedPrefs)?;
        let global = GlobalPrefs::from_dict(global_dict);

        let history_list = top.get_list(keys::FILE_HISTORY).ok_or(Error::MalformedPrefs)?;

        let mut history = FileHistory::new();
        for item in history_list {
            let dict = match item.as_dict() {
                Some(d) => d,
                None => continue,
            };
            let state = ViewState::from_dict(dict, false);
            if !state.file_path.is_empty() {
                history.append(state);
            }
        }

        Ok(Store { global, history })
    }

    /// Loads preferences from `path`, falling back to defaults (and an
    /// empty history) on any I/O or parse error, matching the original's
    /// fail-open startup behavior.
    pub fn load(path: impl AsRef<Path>) -> Self {
        match std::fs::read(path) {
            Ok(bytes) => Store::deserialize(&bytes).unwrap_or_default(),
            Err(_) => Store::default(),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        std::fs::write(path, self.serialize()).map_err(Error::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DisplayMode;

    #[test]
    fn round_trip_is_byte_identical() {
        let mut store = Store::new();
        store.global.default_display_mode = DisplayMode::Continuous;

        let mut a = ViewState::new("/a.pdf");
        a.page_no = 3;
        let mut b = ViewState::new("/b.pdf");
        b.page_no = 9;
        store.history.insert_head(a);
        store.history.insert_head(b);

        let first = store.serialize();
        let parsed = Store::deserialize(&first).unwrap();
        let second = parsed.serialize();

        assert_eq!(first, second);
    }

    #[test]
    fn global_prefs_only_caps_history_length() {
        let mut store = Store::new();
        store.global.global_prefs_only = true;

        for i in 0..(MAX_RECENT_FILES_IN_MENU + 5) {
            store.history.insert_head(ViewState::new(format!("/doc{i}.pdf")));
        }

        let bytes = store.serialize();
        let parsed = Store::deserialize(&bytes).unwrap();
        assert_eq!(parsed.history.len(), MAX_RECENT_FILES_IN_MENU);
    }

    #[test]
    fn load_falls_back_to_defaults_on_missing_file() {
        let store = Store::load("/nonexistent/path/to/prefs.dat");
        assert!(store.history.is_empty());
    }
}
