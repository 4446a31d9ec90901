/// One of the seven layout modes a document can be viewed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Automatic,
    SinglePage,
    Facing,
    BookView,
    Continuous,
    ContinuousFacing,
    ContinuousBookView,
}

impl DisplayMode {
    /// The number of page columns this mode lays out.
    pub fn columns(self) -> u32 {
        match self {
            DisplayMode::Facing
            | DisplayMode::BookView
            | DisplayMode::ContinuousFacing
            | DisplayMode::ContinuousBookView => 2,
            _ => 1,
        }
    }

    /// Whether all pages stay `shown` and scrolling is continuous rather
    /// than a flip between fixed rows.
    pub fn is_continuous(self) -> bool {
        matches!(
            self,
            DisplayMode::Continuous
                | DisplayMode::ContinuousFacing
                | DisplayMode::ContinuousBookView
        )
    }

    /// Whether the first row reserves its first cell empty so page 1 lands
    /// in the second column.
    pub fn is_book_view(self) -> bool {
        matches!(self, DisplayMode::BookView | DisplayMode::ContinuousBookView)
    }

    /// The exact ASCII string persisted to preferences, see §6.
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayMode::Automatic => "automatic",
            DisplayMode::SinglePage => "single page",
            DisplayMode::Facing => "facing",
            DisplayMode::BookView => "book view",
            DisplayMode::Continuous => "continuous",
            DisplayMode::ContinuousFacing => "continuous facing",
            DisplayMode::ContinuousBookView => "continuous book view",
        }
    }

    /// Parses the persisted string form. Returns `None` for anything else,
    /// a miss rather than an error: callers fall back to defaults.
    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "automatic" => DisplayMode::Automatic,
            "single page" => DisplayMode::SinglePage,
            "facing" => DisplayMode::Facing,
            "book view" => DisplayMode::BookView,
            "continuous" => DisplayMode::Continuous,
            "continuous facing" => DisplayMode::ContinuousFacing,
            "continuous book view" => DisplayMode::ContinuousBookView,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_string_form() {
        let modes = [
            DisplayMode::Automatic,
            DisplayMode::SinglePage,
            DisplayMode::Facing,
            DisplayMode::BookView,
            DisplayMode::Continuous,
            DisplayMode::ContinuousFacing,
            DisplayMode::ContinuousBookView,
        ];

        for mode in modes {
            assert_eq!(DisplayMode::from_str(mode.as_str()), Some(mode));
        }
    }

    #[test]
    fn unknown_string_is_a_miss() {
        assert_eq!(DisplayMode::from_str("sideways"), None);
    }

    #[test]
    fn facing_modes_use_two_columns() {
        assert_eq!(DisplayMode::Facing.columns(), 2);
        assert_eq!(DisplayMode::BookView.columns(), 2);
        assert_eq!(DisplayMode::SinglePage.columns(), 1);
        assert_eq!(DisplayMode::Continuous.columns(), 1);
    }
}
