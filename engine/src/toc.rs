use crate::Dest;

/// One node of the engine-reported table of contents. The TOC widget
/// itself is an external collaborator; the core only owns the tree data
/// and the collapsed-node indices persisted in `ViewState`.
#[derive(Debug, Clone, PartialEq)]
pub struct TocNode {
    pub title: String,
    pub dest: Option<Dest>,
    pub children: Vec<TocNode>,
}

impl TocNode {
    pub fn leaf(title: impl Into<String>, dest: Dest) -> Self {
        TocNode {
            title: title.into(),
            dest: Some(dest),
            children: Vec::new(),
        }
    }
}
