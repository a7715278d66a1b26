use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Not a stable API; intended for internal use and may change without notice.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `origin`.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError without structured detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a configuration error that names the offending rule element.
    pub(crate) fn config(origin: ErrorOrigin, error: ConfigError) -> Self {
        Self {
            class: ErrorClass::Configuration,
            origin,
            message: error.to_string(),
            detail: Some(ErrorDetail::Config(error)),
        }
    }

    /// Construct a rule-origin configuration error.
    pub(crate) fn rule_config(error: ConfigError) -> Self {
        Self::config(ErrorOrigin::Rule, error)
    }

    /// Construct an algorithm-origin configuration error.
    pub(crate) fn algorithm_config(error: ConfigError) -> Self {
        Self::config(ErrorOrigin::Algorithm, error)
    }

    /// Construct an algorithm-origin unsupported error.
    pub(crate) fn algorithm_unsupported(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::Unsupported,
            ErrorOrigin::Algorithm,
            message.into(),
        )
    }

    /// Construct a condition-origin invariant violation.
    pub(crate) fn condition_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Condition,
            message.into(),
        )
    }

    /// Construct a route-origin invariant violation.
    pub(crate) fn route_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Route,
            message.into(),
        )
    }

    /// Construct a merge-origin invariant violation.
    pub(crate) fn merge_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Merge,
            message.into(),
        )
    }

    /// Construct a merge-origin unsupported error.
    pub(crate) fn merge_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Merge, message.into())
    }

    /// Construct a merge-origin not-found error for an out-of-range column.
    pub(crate) fn column_not_found(column_index: usize, column_count: usize) -> Self {
        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Merge,
            format!("column index {column_index} out of range (column count {column_count})"),
        )
    }

    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.class, ErrorClass::Configuration)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Config(ConfigError),
}

///
/// ConfigError
///
/// Rule-set inconsistencies detected while building or applying sharding
/// rules. Always fatal for the statement that hit them.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigError {
    #[error("sharding algorithm '{name}' is not configured")]
    MissingAlgorithm { name: String },

    #[error("sharding algorithm type '{algorithm_type}' is not registered")]
    UnknownAlgorithmType { algorithm_type: String },

    #[error("sharding algorithm '{name}' is a {actual} algorithm but is used by a {expected} strategy")]
    AlgorithmKindMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error(
        "complex sharding algorithm '{name}' expects {expected} sharding columns but the strategy configures {found}"
    )]
    ColumnCountMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("sharding algorithm property '{property}' is invalid: {reason}")]
    InvalidProperty { property: String, reason: String },

    #[error("actual data nodes '{expression}' are malformed: {reason}")]
    InvalidDataNodes { expression: String, reason: String },

    #[error("data source '{data_source}' referenced by '{logic_table}' is not configured")]
    UnknownDataSource {
        logic_table: String,
        data_source: String,
    },

    #[error("logic table '{logic_table}' is configured more than once")]
    DuplicateTable { logic_table: String },

    #[error("binding table group references unknown logic table '{logic_table}'")]
    UnknownBindingTable { logic_table: String },

    #[error("binding tables '{left}' and '{right}' have different shard shapes")]
    BindingShapeMismatch { left: String, right: String },

    #[error("no data source is configured")]
    NoDataSources,

    #[error("no default data source is configured for unsharded table '{logic_table}'")]
    NoDefaultDataSource { logic_table: String },

    #[error("routed target '{target}' is not one of the available targets of '{logic_table}'")]
    TargetNotAvailable { logic_table: String, target: String },

    #[error(
        "insert row {row} into '{logic_table}' routes to {targets} data nodes instead of exactly one"
    )]
    InsertRowTargets {
        logic_table: String,
        row: usize,
        targets: usize,
    },
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Configuration,
    NotFound,
    Internal,
    Unsupported,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Configuration => "configuration",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
            Self::Unsupported => "unsupported",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Rule,
    Algorithm,
    Condition,
    Route,
    Cache,
    Merge,
    Config,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Rule => "rule",
            Self::Algorithm => "algorithm",
            Self::Condition => "condition",
            Self::Route => "route",
            Self::Cache => "cache",
            Self::Merge => "merge",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}
