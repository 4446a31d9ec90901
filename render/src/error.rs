#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RenderError {
    #[error("no such document registered with the render system")]
    UnknownDocument,

    #[error(transparent)]
    Engine(#[from] engine::EngineError),
}
