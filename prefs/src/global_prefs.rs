use bencode::Dict;

use crate::display_mode::DisplayMode;
use crate::keys;

/// Process-wide defaults and options, persisted under the `gp` key.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalPrefs {
    pub show_toolbar: bool,
    pub show_toc: bool,
    pub toc_dx: i32,
    pub pdf_associate_dont_ask_again: bool,
    pub pdf_associate_should_associate: bool,
    pub bg_color: i32,
    pub esc_to_exit: bool,
    pub enable_auto_update: bool,
    pub remember_opened_files: bool,
    pub global_prefs_only: bool,
    pub default_display_mode: DisplayMode,
    pub default_zoom: f64,
    pub window_state: i32,
    pub window_x: i32,
    pub window_y: i32,
    pub window_dx: i32,
    pub window_dy: i32,
    pub inverse_search_command_line: Option<String>,
    pub version_to_skip: Option<String>,
    pub last_update_time: Option<String>,
    pub current_language: Option<String>,
    pub fwdsearch_offset: i32,
    pub fwdsearch_color: i32,
    pub fwdsearch_width: i32,
    pub fwdsearch_permanent: bool,
}

impl Default for GlobalPrefs {
    fn default() -> Self {
        GlobalPrefs {
            show_toolbar: true,
            show_toc: true,
            toc_dx: 0,
            pdf_associate_dont_ask_again: false,
            pdf_associate_should_associate: false,
            bg_color: 0xFFFFFF,
            esc_to_exit: false,
            enable_auto_update: true,
            remember_opened_files: true,
            global_prefs_only: false,
            default_display_mode: DisplayMode::Automatic,
            default_zoom: keys::ZOOM_FIT_PAGE,
            window_state: 1,
            window_x: 0,
            window_y: 0,
            window_dx: 0,
            window_dy: 0,
            inverse_search_command_line: None,
            version_to_skip: None,
            last_update_time: None,
            current_language: None,
            fwdsearch_offset: 0,
            fwdsearch_color: 0,
            fwdsearch_width: 0,
            fwdsearch_permanent: false,
        }
    }
}

impl GlobalPrefs {
    pub fn to_dict(&self) -> Dict {
        let mut dict = Dict::new();
        dict.insert(keys::SHOW_TOOLBAR, self.show_toolbar as i64);
        dict.insert(keys::SHOW_TOC, self.show_toc as i64);
        dict.insert(keys::TOC_DX, self.toc_dx as i64);
        dict.insert(keys::PDF_ASSOCIATE_DONT_ASK, self.pdf_associate_dont_ask_again as i64);
        dict.insert(keys::PDF_ASSOCIATE_ASSOCIATE, self.pdf_associate_should_associate as i64);
        dict.insert(keys::BG_COLOR, self.bg_color as i64);
        dict.insert(keys::ESC_TO_EXIT, self.esc_to_exit as i64);
        dict.insert(keys::ENABLE_AUTO_UPDATE, self.enable_auto_update as i64);
        dict.insert(keys::REMEMBER_OPENED_FILES, self.remember_opened_files as i64);
        dict.insert(keys::GLOBAL_PREFS_ONLY, self.global_prefs_only as i64);
        dict.insert(keys::DISPLAY_MODE, self.default_display_mode.as_str());
        dict.insert(keys::ZOOM_VIRTUAL, format!("{:.4}", self.default_zoom));
        dict.insert(keys::WINDOW_STATE, self.window_state as i64);
        dict.insert(keys::WINDOW_X, self.window_x as i64);
        dict.insert(keys::WINDOW_Y, self.window_y as i64);
        dict.insert(keys::WINDOW_DX, self.window_dx as i64);
        dict.insert(keys::WINDOW_DY, self.window_dy as i64);

        if let Some(v) = &self.inverse_search_command_line {
            dict.insert(keys::INVERSE_SEARCH_COMMANDLINE, v.as_str());
        }
        if let Some(v) = &self.version_to_skip {
            dict.insert(keys::VERSION_TO_SKIP, v.as_str());
        }
        if let Some(v) = &self.last_update_time {
            dict.insert(keys::LAST_UPDATE, v.as_str());
        }
        if let Some(v) = &self.current_language {
            dict.insert(keys::UI_LANGUAGE, v.as_str());
        }

        dict.insert(keys::FWDSEARCH_OFFSET, self.fwdsearch_offset as i64);
        dict.insert(keys::FWDSEARCH_COLOR, self.fwdsearch_color as i64);
        dict.insert(keys::FWDSEARCH_WIDTH, self.fwdsearch_width as i64);
        dict.insert(keys::FWDSEARCH_PERMANENT, self.fwdsearch_permanent as i64);

        dict
    }

    pub fn from_dict(dict: &Dict) -> Self {
        let mut prefs = GlobalPrefs::default();

        if let Some(v) = dict.get_bool(keys::SHOW_TOOLBAR) {
            prefs.show_toolbar = v;
        }
        if let Some(v) = dict.get_bool(keys::SHOW_TOC) {
            prefs.show_toc = v;
        }
        if let Some(v) = dict.get_int(keys::TOC_DX) {
            prefs.toc_dx = v as i32;
        }
        if let Some(v) = dict.get_bool(keys::PDF_ASSOCIATE_DONT_ASK) {
            prefs.pdf_associate_dont_ask_again = v;
        }
        if let Some(v) = dict.get_bool(keys::PDF_ASSOCIATE_ASSOCIATE) {
            prefs.pdf_associate_should_associate = v;
        }
        if let Some(v) = dict.get_bool(keys::ESC_TO_EXIT) {
            prefs.esc_to_exit = v;
        }
        if let Some(v) = dict.get_int(keys::BG_COLOR) {
            prefs.bg_color = v as i32;
        }
        if let Some(v) = dict.get_bool(keys::ENABLE_AUTO_UPDATE) {
            prefs.enable_auto_update = v;
        }
        if let Some(v) = dict.get_bool(keys::REMEMBER_OPENED_FILES) {
            prefs.remember_opened_files = v;
        }
        if let Some(v) = dict.get_bool(keys::GLOBAL_PREFS_ONLY) {
            prefs.global_prefs_only = v;
        }
        if let Some(mode) = dict.get_str(keys::DISPLAY_MODE).and_then(DisplayMode::from_str) {
            prefs.default_display_mode = mode;
        }
        if let Some(v) = dict.get_float_from_str(keys::ZOOM_VIRTUAL) {
            prefs.default_zoom = v;
        }
        if let Some(v) = dict.get_int(keys::WINDOW_STATE) {
            prefs.window_state = v as i32;
        }
        if let Some(v) = dict.get_int(keys::WINDOW_X) {
            prefs.window_x = v as i32;
        }
        if let Some(v) = dict.get_int(keys::WINDOW_Y) {
            prefs.window_y = v as i32;
        }
        if let Some(v) = dict.get_int(keys::WINDOW_DX) {
            prefs.window_dx = v as i32;
        }
        if let Some(v) = dict.get_int(keys::WINDOW_DY) {
            prefs.window_dy = v as i32;
        }

        prefs.inverse_search_command_line = dict.get_str(keys::INVERSE_SEARCH_COMMANDLINE).map(str::to_string);
        prefs.version_to_skip = dict.get_str(keys::VERSION_TO_SKIP).map(str::to_string);
        prefs.last_update_time = dict.get_str(keys::LAST_UPDATE).map(str::to_string);
        prefs.current_language = dict.get_str(keys::UI_LANGUAGE).map(str::to_string);

        if let Some(v) = dict.get_int(keys::FWDSEARCH_OFFSET) {
            prefs.fwdsearch_offset = v as i32;
        }
        if let Some(v) = dict.get_int(keys::FWDSEARCH_COLOR) {
            prefs.fwdsearch_color = v as i32;
        }
        if let Some(v) = dict.get_int(keys::FWDSEARCH_WIDTH) {
            prefs.fwdsearch_width = v as i32;
        }
        if let Some(v) = dict.get_bool(keys::FWDSEARCH_PERMANENT) {
            prefs.fwdsearch_permanent = v;
        }

        prefs
    }
}
