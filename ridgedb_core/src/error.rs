/// Closed error taxonomy for the engine.
///
/// Client errors leave the connection healthy and are returned as the
/// operation result. Integrity/fatal variants are documented at each
/// call site that can produce them.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("table already exists: {0}")]
    TableExists(String),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("arity mismatch: expected {expected} values, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("row index out of bounds: {0}")]
    RowOutOfBounds(usize),

    #[error("savepoint not found: {0}")]
    SavepointNotFound(String),

    #[error("no active transaction")]
    NoActiveTransaction,

    #[error("transaction already active")]
    TransactionAlreadyActive,

    #[error("expression error: {0}")]
    Expression(String),

    /// An in-memory mutation could not be made durable. Returned only
    /// after the in-memory mutation has already been rolled back
    /// (fail-closed): in-memory and on-disk state never diverge.
    #[error("operation applied but persistence failed: {0}")]
    PersistenceFailed(String),

    /// A buffered transaction failed to commit at the named operation
    /// index. Commit is all-or-nothing, so none of the buffer's
    /// operations remain applied when this fires.
    #[error("transaction failed at operation {index}: {source}")]
    CommitFailed {
        index: usize,
        #[source]
        source: Box<EngineError>,
    },

    #[error("startup failed: {0}")]
    Fatal(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
