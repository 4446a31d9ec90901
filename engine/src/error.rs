#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EngineError {
    #[error("page {0} is out of range")]
    PageOutOfRange(u32),

    #[error("rendering was aborted")]
    Aborted,

    #[error("engine failed to render the requested tile")]
    RenderFailed,

    #[error("engine failed to extract page text")]
    TextExtractionFailed,
}
