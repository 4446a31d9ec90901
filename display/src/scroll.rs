//! Per-document scroll position and the fixed-capacity navigation ring.

/// A scroll position in user units. `x == -1.0` / `y == -1.0` are sentinels
/// meaning "show whatever margin was previously visible on that axis"
/// rather than an explicit coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollState {
    pub page: u32,
    pub x: f64,
    pub y: f64,
}

impl ScrollState {
    pub const NO_MARGIN: f64 = -1.0;

    pub fn new(page: u32, x: f64, y: f64) -> Self {
        ScrollState { page, x, y }
    }

    pub fn at_margin(page: u32) -> Self {
        ScrollState {
            page,
            x: Self::NO_MARGIN,
            y: Self::NO_MARGIN,
        }
    }
}

/// Maximum number of entries the back/forward ring holds before the oldest
/// is evicted.
pub const NAV_HISTORY_LEN: usize = 50;

/// A fixed-capacity ring of [`ScrollState`] values with a write cursor and a
/// logical end, so that navigating back and then to a new place truncates
/// the abandoned forward branch instead of leaving stale redo entries.
#[derive(Debug, Clone, Default)]
pub struct NavHistory {
    entries: Vec<ScrollState>,
    /// Index of the entry the cursor currently sits at (the "you are here"
    /// marker, not necessarily `entries.len()`).
    ix: usize,
    /// One past the last entry considered part of the history; entries
    /// beyond this (if any remain physically in `entries`) are abandoned
    /// redo states waiting to be overwritten.
    end: usize,
}

impl NavHistory {
    pub fn new() -> Self {
        NavHistory::default()
    }

    pub fn len(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    /// Records `state` as a new history point. Collapses a repeated point at
    /// the same page/location into an overwrite of the current entry rather
    /// than appending a duplicate. Truncates any abandoned forward branch
    /// first when `keep_forward` is false.
    pub fn add_nav_point(&mut self, state: ScrollState, keep_forward: bool) {
        if !keep_forward {
            self.end = self.ix;
        }

        if self.ix > 0 && self.ix <= self.entries.len() {
            if let Some(last) = self.entries.get(self.ix - 1) {
                if last.page == state.page {
                    self.entries[self.ix - 1] = state;
                    if !keep_forward {
                        self.end = self.ix;
                    }
                    return;
                }
            }
        }

        if self.ix == NAV_HISTORY_LEN {
            self.entries.remove(0);
            self.ix -= 1;
        }

        self.entries.truncate(self.ix);
        self.entries.push(state);
        self.ix += 1;
        self.end = self.ix;
    }

    /// Whether stepping `dir` entries away from the cursor (negative = back,
    /// positive = forward) stays within `[0, end)`. A no-op step back to
    /// index 0 once the ring has wrapped (evicted at least one entry) is
    /// forbidden since there is nothing meaningful left at that position.
    pub fn can_navigate(&self, dir: i32) -> bool {
        let target = self.ix as i64 + dir as i64;
        if target < 0 || target > self.end as i64 {
            return false;
        }
        if dir < 0 && target == 0 && self.entries.len() == NAV_HISTORY_LEN {
            return false;
        }
        true
    }

    /// Records the current position (`keep_forward = true`) then moves the
    /// cursor by `dir` entries, returning the `ScrollState` landed on.
    pub fn navigate(&mut self, dir: i32, current: ScrollState) -> Option<ScrollState> {
        if !self.can_navigate(dir) {
            return None;
        }

        self.add_nav_point(current, true);

        let target = (self.ix as i64 + dir as i64) as usize;
        self.ix = target;
        self.entries.get(self.ix.saturating_sub(1)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_point_at_same_page_overwrites_instead_of_appending() {
        let mut history = NavHistory::new();
        history.add_nav_point(ScrollState::new(1, 0.0, 0.0), false);
        history.add_nav_point(ScrollState::new(1, 10.0, 10.0), false);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn same_page_collapse_during_navigate_does_not_shrink_the_forward_branch() {
        let mut history = NavHistory::new();
        history.add_nav_point(ScrollState::new(1, 0.0, 0.0), false);
        history.add_nav_point(ScrollState::new(2, 0.0, 0.0), false);
        history.add_nav_point(ScrollState::new(3, 0.0, 0.0), false);

        // Each step lands on an entry whose page matches the `current` passed
        // in, so `navigate`'s internal `add_nav_point(current, true)` call
        // hits the same-page collapse branch both times.
        history.navigate(-1, ScrollState::new(3, 0.0, 0.0));
        history.navigate(-1, ScrollState::new(2, 0.0, 0.0));

        assert!(history.can_navigate(2));
    }

    #[test]
    fn distinct_pages_append_separate_entries() {
        let mut history = NavHistory::new();
        history.add_nav_point(ScrollState::new(1, 0.0, 0.0), false);
        history.add_nav_point(ScrollState::new(2, 0.0, 0.0), false);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn navigating_back_then_forward_again_truncates_abandoned_branch() {
        let mut history = NavHistory::new();
        history.add_nav_point(ScrollState::new(1, 0.0, 0.0), false);
        history.add_nav_point(ScrollState::new(2, 0.0, 0.0), false);
        history.add_nav_point(ScrollState::new(3, 0.0, 0.0), false);

        history.navigate(-1, ScrollState::new(3, 0.0, 0.0));
        assert_eq!(history.len(), 3);

        history.add_nav_point(ScrollState::new(9, 0.0, 0.0), false);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn eviction_keeps_ring_bounded() {
        let mut history = NavHistory::new();
        for page in 0..(NAV_HISTORY_LEN as u32 + 10) {
            history.add_nav_point(ScrollState::new(page * 2 + 1, 0.0, 0.0), false);
        }
        assert!(history.len() <= NAV_HISTORY_LEN);
    }
}
