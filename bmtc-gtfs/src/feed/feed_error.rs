/// failure classes that abort a build. per-unit problems (a malformed trip,
/// a route-direction with no timetable) never surface here; they are
/// counted into stage summaries or diagnostics lists and the pipeline
/// continues past them.
#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("failed reading raw document '{path}': {source}")]
    RawReadError {
        path: String,
        source: std::io::Error,
    },
    #[error("failed parsing raw document '{path}': {source}")]
    RawParseError {
        path: String,
        source: serde_json::Error,
    },
    #[error("route catalog '{0}' contains no routes")]
    EmptyRouteCatalogError(String),
    #[error("{msg}: {source}")]
    ConfigReadError {
        msg: String,
        source: config::ConfigError,
    },
    #[error("failed serializing dataset table '{table}': {source}")]
    TableWriteError { table: String, source: csv::Error },
    #[error("failed assembling feed archive '{path}': {source}")]
    ArchiveError {
        path: String,
        source: zip::result::ZipError,
    },
    #[error("i/o failure writing '{path}': {source}")]
    OutputIoError {
        path: String,
        source: std::io::Error,
    },
    #[error("{0}")]
    OtherError(String),
}
