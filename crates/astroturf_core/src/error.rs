//! Error types for the simulation core.
//!
//! Every error is raised synchronously at the point of violation. Errors
//! raised inside a tick abort that tick.

use astroturf_data::{AgentId, Position};
use thiserror::Error;

/// Main error type for simulation operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Placement outside the bounds of a non-toroidal world
    #[error("Position ({x}, {y}) is outside the {width}x{height} world")]
    OutOfBounds {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },

    /// Id collision at creation
    #[error("Agent {0} is already registered")]
    DuplicateId(AgentId),

    /// Removal or move of an unregistered id
    #[error("Agent {0} not found")]
    AgentNotFound(AgentId),

    /// Rejected parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    #[must_use]
    pub fn out_of_bounds(position: Position, width: f64, height: f64) -> Self {
        Self::OutOfBounds {
            x: position.x,
            y: position.y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

/// Returns early with [`SimError::InvalidParameter`] when the condition fails.
#[macro_export]
macro_rules! ensure_param {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::SimError::invalid_parameter(format!($($arg)+)));
        }
    };
}
