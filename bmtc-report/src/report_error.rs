#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("failed to read feed archive: {0}")]
    FeedReadError(#[from] gtfs_structures::Error),
    #[error("failed serializing layer '{path}': {source}")]
    LayerSerializeError {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed writing summary table '{path}': {source}")]
    SummaryWriteError { path: String, source: csv::Error },
    #[error("i/o failure writing '{path}': {source}")]
    OutputIoError {
        path: String,
        source: std::io::Error,
    },
}
