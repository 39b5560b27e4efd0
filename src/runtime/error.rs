use serde_json::Value;
use std::fmt;

/// Error raised by generated accessors and service calls
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// A closed-set state (e.g. `on`/`off`) holds a value outside the set
    UnexpectedState {
        /// The raw state
        value: String,
    },
    /// A value does not match any variant of a generated enum
    UnknownLiteral {
        value: Value,
    },
    /// A value has the wrong shape for the requested type
    TypeMismatch {
        expected: &'static str,
        value: Value,
    },
    /// Not a valid RGB color
    InvalidColor {
        reason: String,
    },
    /// The entity has no such attribute
    MissingAttribute {
        entity_id: String,
        attribute: String,
    },
    /// The controller rejected a request or could not be reached
    Controller {
        message: String,
    },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::UnexpectedState { value } => {
                write!(f, "Unexpected entity state: {value}")
            }
            RuntimeError::UnknownLiteral { value } => {
                write!(f, "Value {value} is not one of the known options")
            }
            RuntimeError::TypeMismatch { expected, value } => {
                write!(f, "Expected {expected}, got {value}")
            }
            RuntimeError::InvalidColor { reason } => write!(f, "Invalid RGB color: {reason}"),
            RuntimeError::MissingAttribute {
                entity_id,
                attribute,
            } => write!(f, "Attribute {attribute} not found for entity {entity_id}"),
            RuntimeError::Controller { message } => write!(f, "Controller error: {message}"),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<crate::client::ClientError> for RuntimeError {
    fn from(err: crate::client::ClientError) -> Self {
        RuntimeError::Controller {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
