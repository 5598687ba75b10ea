use thiserror::Error;

/// Structural problems found while parsing a boolean query string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("empty query")]
    EmptyQuery,
    /// An `AND` with nothing on one side, e.g. `a AND AND b`.
    #[error("empty conjunct at position {0}")]
    EmptyConjunct(usize),
    #[error("operator '{0}' is missing an operand")]
    DanglingOperator(String),
    #[error("operator '{0}' is not allowed here")]
    MisplacedOperator(String),
    #[error("malformed proximity marker '{0}', expected \\<digits>")]
    MalformedProximity(String),
    #[error("a proximity group needs exactly two terms around one marker, got '{0}'")]
    ProximityArity(String),
    /// All tokens in a group normalized away to nothing (e.g. `&-`).
    #[error("operand '{0}' contains no searchable characters")]
    EmptyOperand(String),
}
