use geometry::Rect;

use crate::PageNo;

/// A resolved destination: either an explicit page/position pair (an `XYZ`
/// destination in PDF terms) or a named destination the engine has not yet
/// resolved to a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Dest {
    Xyz {
        page: PageNo,
        x: Option<f64>,
        y: Option<f64>,
        zoom: Option<f64>,
    },
    Named(String),
}

impl Dest {
    pub fn page(&self) -> Option<PageNo> {
        match self {
            Dest::Xyz { page, .. } => Some(*page),
            Dest::Named(_) => None,
        }
    }
}

/// What a [`Link`] does when activated.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkKind {
    /// External URI; the host dispatches it, restricted to `http(s)://`.
    Uri(String),
    /// Internal destination within the same document.
    GoTo(Dest),
    /// Opens a different (relative) PDF file.
    Launch(String),
    /// A link kind the engine does not know how to interpret.
    Unknown,
}

/// A clickable region on a page, materialized lazily by the engine and
/// cached by `DisplayModel::link_at_position`.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub page: PageNo,
    pub rect: Rect,
    pub kind: LinkKind,
}
