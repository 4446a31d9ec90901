#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DisplayError {
    #[error("page {0} is out of range")]
    PageOutOfRange(u32),

    #[error("zoom value is not valid")]
    InvalidZoom,

    #[error(transparent)]
    Engine(#[from] engine::EngineError),
}
