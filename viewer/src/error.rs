#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("no open document with that id")]
    NoSuchDocument,

    #[error(transparent)]
    Display(#[from] display::DisplayError),

    #[error(transparent)]
    Prefs(#[from] prefs::Error),
}
