use std::fmt;

use super::pattern::PatternError;

/// Error raised while building a route table.
///
/// Every variant is a defect in the route definitions themselves and should
/// abort service construction. Dispatch-time outcomes (not found, method not
/// allowed) are *not* errors; see [`crate::dispatcher::DispatchFailure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// A path or prefix pattern failed to compile.
    Pattern(PatternError),
    /// A route was registered with an empty method list.
    EmptyMethodSet { path: String },
    /// A schema was declared for a parameter the route's path does not bind.
    UnknownParameter { path: String, name: String },
    /// A declared parameter schema is not a valid JSON schema.
    InvalidSchema {
        path: String,
        name: String,
        message: String,
    },
    /// Two routes in the same router accept the same method on paths of
    /// identical shape; the second could never be reached.
    DuplicateRoute {
        method: String,
        path: String,
        shadowed_by: String,
    },
    /// A child router was built with a different percent-decoding setting
    /// than the router it is mounted into.
    DecodeMismatch {
        prefix: String,
        parent: bool,
        child: bool,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Pattern(err) => write!(f, "{err}"),
            RouteError::EmptyMethodSet { path } => {
                write!(f, "route '{path}' accepts no HTTP methods")
            }
            RouteError::UnknownParameter { path, name } => {
                write!(f, "route '{path}' has no path parameter named '{name}'")
            }
            RouteError::InvalidSchema {
                path,
                name,
                message,
            } => write!(
                f,
                "route '{path}': schema for parameter '{name}' is invalid: {message}"
            ),
            RouteError::DuplicateRoute {
                method,
                path,
                shadowed_by,
            } => write!(
                f,
                "route {method} '{path}' is unreachable: shadowed by earlier route '{shadowed_by}'"
            ),
            RouteError::DecodeMismatch {
                prefix,
                parent,
                child,
            } => write!(
                f,
                "cannot mount at '{prefix}': child decode_percent={child} differs from parent decode_percent={parent}"
            ),
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::Pattern(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PatternError> for RouteError {
    fn from(err: PatternError) -> Self {
        RouteError::Pattern(err)
    }
}
