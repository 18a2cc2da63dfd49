use thiserror::Error;

/// Kinds of failures reported by graph ingestion and by the solver preconditions.
///
/// Fallible operations return `anyhow::Result`; the underlying kind can be recovered with
/// `err.downcast_ref::<AuctionError>()`.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum AuctionError {
    #[error("columns and values must have the same length (columns: {columns}, values: {values})")]
    LengthMismatch { columns: usize, values: usize },

    #[error("rows must be added in order (current row: {current}, requested row: {requested})")]
    OutOfOrderRow { current: usize, requested: usize },

    #[error("row {row} must have at least one column before the next row starts")]
    EmptyRow { row: usize },

    #[error("row {row} is out of range for {num_rows} rows")]
    RowOutOfRange { row: usize, num_rows: usize },

    #[error("number of arcs is longer than max value of the index type")]
    ArcCountOverflow,

    #[error("invalid arc count (arcs: {arcs}, values: {values})")]
    InvalidArcCount { arcs: usize, values: usize },

    #[error("invalid dimensions (rows: {num_rows}, cols: {num_cols}, rows built: {rows_built})")]
    InvalidDimension {
        num_rows: usize,
        num_cols: usize,
        rows_built: usize,
    },

    #[error("column {column} is out of range for {num_cols} columns")]
    ColumnOutOfRange { column: usize, num_cols: usize },

    #[error("value of arc {index} is not finite")]
    NonFiniteValue { index: usize },

    #[error("epsilon must be finite and positive, got {0}")]
    InvalidEpsilon(f64),
}
