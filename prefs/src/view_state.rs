use bencode::Dict;

use crate::display_mode::DisplayMode;
use crate::keys;

/// Per-document view state: the part of a `RecentFile` entry that survives
/// a session, and also what a `getScrollState`/`setScrollState` round-trip
/// through navigation history persists.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub file_path: String,
    pub decryption_key: Option<String>,
    pub use_global_values: bool,
    pub display_mode: DisplayMode,
    pub page_no: i32,
    pub rotation: i32,
    pub scroll_x: i32,
    pub scroll_y: i32,
    pub zoom_virtual: f64,
    pub window_state: i32,
    pub window_x: i32,
    pub window_y: i32,
    pub window_dx: i32,
    pub window_dy: i32,
    pub show_toc: bool,
    pub toc_dx: i32,
    pub toc_state: Vec<i32>,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            file_path: String::new(),
            decryption_key: None,
            use_global_values: false,
            display_mode: DisplayMode::Automatic,
            page_no: 1,
            rotation: 0,
            scroll_x: 0,
            scroll_y: 0,
            zoom_virtual: keys::ZOOM_FIT_PAGE,
            window_state: 0,
            window_x: 0,
            window_y: 0,
            window_dx: 0,
            window_dy: 0,
            show_toc: false,
            toc_dx: 0,
            toc_state: Vec::new(),
        }
    }
}

impl ViewState {
    pub fn new(file_path: impl Into<String>) -> Self {
        ViewState {
            file_path: file_path.into(),
            ..Default::default()
        }
    }

    /// Mirrors `DisplayState_Serialize`: a `useGlobalValues` entry only ever
    /// carries the file identity, nothing else.
    pub fn to_dict(&self, global_prefs_only: bool) -> Dict {
        let mut dict = Dict::new();
        dict.insert(keys::FILE, self.file_path.as_str());

        if let Some(key) = &self.decryption_key {
            dict.insert(keys::DECRYPTION_KEY, key.as_str());
        }

        if global_prefs_only || self.use_global_values {
            dict.insert(keys::USE_GLOBAL_VALUES, 1i64);
            return dict;
        }

        dict.insert(keys::DISPLAY_MODE, self.display_mode.as_str());
        dict.insert(keys::PAGE_NO, self.page_no as i64);
        dict.insert(keys::ROTATION, self.rotation as i64);
        dict.insert(keys::SCROLL_X, self.scroll_x as i64);
        dict.insert(keys::SCROLL_Y, self.scroll_y as i64);
        dict.insert(keys::WINDOW_STATE, self.window_state as i64);
        dict.insert(keys::WINDOW_X, self.window_x as i64);
        dict.insert(keys::WINDOW_Y, self.window_y as i64);
        dict.insert(keys::WINDOW_DX, self.window_dx as i64);
        dict.insert(keys::WINDOW_DY, self.window_dy as i64);
        dict.insert(keys::SHOW_TOC, self.show_toc as i64);
        dict.insert(keys::TOC_DX, self.toc_dx as i64);
        dict.insert(keys::ZOOM_VIRTUAL, format!("{:.4}", self.zoom_virtual));

        if !self.toc_state.is_empty() {
            let items = self
                .toc_state
                .iter()
                .map(|v| bencode::Value::Int(*v as i64))
                .collect();
            dict.insert(keys::TOC_STATE, bencode::Value::List(items));
        }

        dict
    }

    /// Mirrors `DisplayState_Deserialize`. Missing fields keep their
    /// default value rather than failing the whole entry.
    pub fn from_dict(dict: &Dict, global_prefs_only: bool) -> Self {
        let mut state = ViewState::default();

        if let Some(path) = dict.get_str(keys::FILE) {
            state.file_path = path.to_string();
        }
        if let Some(key) = dict.get_str(keys::DECRYPTION_KEY) {
            state.decryption_key = Some(key.to_string());
        }

        if global_prefs_only {
            state.use_global_values = true;
            return state;
        }

        if let Some(mode) = dict.get_str(keys::DISPLAY_MODE).and_then(DisplayMode::from_str) {
            state.display_mode = mode;
        }
        if let Some(v) = dict.get_int(keys::PAGE_NO) {
            state.page_no = v as i32;
        }
        if let Some(v) = dict.get_int(keys::ROTATION) {
            state.rotation = v as i32;
        }
        if let Some(v) = dict.get_int(keys::SCROLL_X) {
            state.scroll_x = v as i32;
        }
        if let Some(v) = dict.get_int(keys::SCROLL_Y) {
            state.scroll_y = v as i32;
        }
        if let Some(v) = dict.get_int(keys::WINDOW_STATE) {
            state.window_state = v as i32;
        }
        if let Some(v) = dict.get_int(keys::WINDOW_X) {
            state.window_x = v as i32;
        }
        if let Some(v) = dict.get_int(keys::WINDOW_Y) {
            state.window_y = v as i32;
        }
        if let Some(v) = dict.get_int(keys::WINDOW_DX) {
            state.window_dx = v as i32;
        }
        if let Some(v) = dict.get_int(keys::WINDOW_DY) {
            state.window_dy = v as i32;
        }
        if let Some(v) = dict.get_bool(keys::SHOW_TOC) {
            state.show_toc = v;
        }
        if let Some(v) = dict.get_int(keys::TOC_DX) {
            state.toc_dx = v as i32;
        }
        if let Some(v) = dict.get_float_from_str(keys::ZOOM_VIRTUAL) {
            state.zoom_virtual = v;
        }
        if let Some(v) = dict.get_bool(keys::USE_GLOBAL_VALUES) {
            state.use_global_values = v;
        }
        if let Some(items) = dict.get_list(keys::TOC_STATE) {
            state.toc_state = items.iter().filter_map(bencode::Value::as_int).map(|v| v as i32).collect();
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_dict() {
        let mut state = ViewState::new("/home/test.pdf");
        state.page_no = 5;
        state.zoom_virtual = 123.3434;
        state.display_mode = DisplayMode::SinglePage;
        state.toc_state = vec![1, 3, 4];

        let dict = state.to_dict(false);
        let parsed = ViewState::from_dict(&dict, false);

        assert_eq!(parsed.file_path, state.file_path);
        assert_eq!(parsed.page_no, state.page_no);
        assert!((parsed.zoom_virtual - state.zoom_virtual).abs() < 1e-9);
        assert_eq!(parsed.display_mode, state.display_mode);
        assert_eq!(parsed.toc_state, state.toc_state);
    }

    #[test]
    fn global_prefs_only_serializes_just_the_file_identity() {
        let mut state = ViewState::new("/home/test.pdf");
        state.page_no = 42;

        let dict = state.to_dict(true);
        assert!(dict.get_int(keys::PAGE_NO).is_none());
        assert_eq!(dict.get_bool(keys::USE_GLOBAL_VALUES), Some(true));
    }
}
