//! Exact ASCII dictionary key and sentinel constants, taken verbatim from
//! the original `DisplayState.h` so that preference files written by either
//! implementation stay interchangeable.

pub const GLOBAL_PREFS: &str = "gp";
pub const FILE_HISTORY: &str = "File History";

pub const FILE: &str = "File";
pub const DECRYPTION_KEY: &str = "Decryption Key";
pub const DISPLAY_MODE: &str = "Display Mode";
pub const PAGE_NO: &str = "Page";
pub const ZOOM_VIRTUAL: &str = "ZoomVirtual";
pub const ROTATION: &str = "Rotation";
pub const SCROLL_X: &str = "Scroll X2";
pub const SCROLL_Y: &str = "Scroll Y2";
pub const WINDOW_STATE: &str = "Window State";
pub const WINDOW_X: &str = "Window X";
pub const WINDOW_Y: &str = "Window Y";
pub const WINDOW_DX: &str = "Window DX";
pub const WINDOW_DY: &str = "Window DY";
pub const SHOW_TOOLBAR: &str = "ShowToolbar";
pub const PDF_ASSOCIATE_DONT_ASK: &str = "PdfAssociateDontAskAgain";
pub const PDF_ASSOCIATE_ASSOCIATE: &str = "PdfAssociateShouldAssociate";
pub const UI_LANGUAGE: &str = "UILanguage";
pub const SHOW_TOC: &str = "ShowToc";
pub const TOC_DX: &str = "Toc DX";
pub const TOC_STATE: &str = "TocToggles";
pub const BG_COLOR: &str = "BgColor";
pub const ESC_TO_EXIT: &str = "EscToExit";
pub const INVERSE_SEARCH_COMMANDLINE: &str = "InverseSearchCommandLine";
pub const VERSION_TO_SKIP: &str = "VersionToSkip";
pub const LAST_UPDATE: &str = "LastUpdate";
pub const ENABLE_AUTO_UPDATE: &str = "EnableAutoUpdate";
pub const REMEMBER_OPENED_FILES: &str = "RememberOpenedFiles";
pub const GLOBAL_PREFS_ONLY: &str = "GlobalPrefsOnly";
pub const USE_GLOBAL_VALUES: &str = "UseGlobalValues";
pub const FWDSEARCH_OFFSET: &str = "ForwardSearch_HighlightOffset";
pub const FWDSEARCH_COLOR: &str = "ForwardSearch_HighlightColor";
pub const FWDSEARCH_WIDTH: &str = "ForwardSearch_HighlightWidth";
pub const FWDSEARCH_PERMANENT: &str = "ForwardSearch_HighlightPermanent";

pub const ZOOM_FIT_PAGE: f64 = -1.0;
pub const ZOOM_FIT_WIDTH: f64 = -2.0;
pub const ZOOM_FIT_CONTENT: f64 = -3.0;
pub const ZOOM_ACTUAL_SIZE: f64 = 100.0;
pub const ZOOM_MIN: f64 = 8.0;
pub const ZOOM_MAX: f64 = 6400.1;
pub const INVALID_ZOOM: f64 = -99.0;

pub const NAV_HISTORY_LEN: usize = 50;

/// Window-state values used verbatim in the persisted dict (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Normal = 1,
    Maximized = 2,
    Fullscreen = 3,
    Minimized = 4,
}

impl WindowState {
    pub fn from_i64(v: i64) -> Option<Self> {
        Some(match v {
            1 => WindowState::Normal,
            2 => WindowState::Maximized,
            3 => WindowState::Fullscreen,
            4 => WindowState::Minimized,
            _ => return None,
        })
    }
}

/// Whether `zoom` is one of the four recognized sentinels or a plausible
/// explicit percentage.
pub fn valid_zoom_virtual(zoom: f64) -> bool {
    if zoom == ZOOM_FIT_PAGE || zoom == ZOOM_FIT_WIDTH || zoom == ZOOM_FIT_CONTENT || zoom == ZOOM_ACTUAL_SIZE {
        return true;
    }
    zoom >= ZOOM_MIN && zoom <= ZOOM_MAX
}
