// src/error.rs

use std::fmt;
use thiserror::Error;

// Generates `into_inner`, `Display` and `Error` for enums whose every variant hands back
// the rejected value.
macro_rules! impl_error_for_enum_with_inner {
    (
        $enum_name:ident < $generic_param:ident >,
        $($variant:ident ( $message:expr ) ),+
        $(,)?
    ) => {
        impl<$generic_param> $enum_name<$generic_param> {
            /// Consumes the error, returning the inner value.
            #[inline]
            pub fn into_inner(self) -> $generic_param {
                match self {
                    $( $enum_name::$variant(v) => v, )+
                }
            }
        }

        impl<$generic_param> fmt::Display for $enum_name<$generic_param> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $( $enum_name::$variant(_) => f.write_str($message), )+
                }
            }
        }

        impl<$generic_param: fmt::Debug> std::error::Error for $enum_name<$generic_param> {}
    };
}

/// Error returned by `try_send` when the element could not be buffered.
/// The rejected element is handed back.
#[derive(PartialEq, Eq, Clone)]
pub enum TrySendError<T> {
  /// Every slot is occupied. Unbuffered channels are always full.
  Full(T),
  /// The channel has been closed.
  Closed(T),
}

impl<T> fmt::Debug for TrySendError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TrySendError::Full(_) => write!(f, "TrySendError::Full(..)"),
      TrySendError::Closed(_) => write!(f, "TrySendError::Closed(..)"),
    }
  }
}

impl_error_for_enum_with_inner!(
  TrySendError<T>,
  Full("channel full"),
  Closed("channel closed"),
);

/// Error returned by `try_recv` when no element could be taken from the buffer.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TryRecvError {
  Empty,
  /// The channel is closed and nothing is left in the buffer.
  Closed,
}
impl std::error::Error for TryRecvError {}
impl fmt::Display for TryRecvError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TryRecvError::Empty => write!(f, "channel empty"),
      TryRecvError::Closed => write!(f, "channel closed and drained"),
    }
  }
}

/// Error returned when attempting to close an already closed channel.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CloseError;
impl std::error::Error for CloseError {}
impl fmt::Display for CloseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "channel is already closed")
  }
}

/// Errors raised while building a channel from a layout or configuration.
#[derive(Debug, Error)]
pub enum ChannelError {
  #[error("Failed to parse channel configuration: {0}")]
  ConfigParse(String),

  #[error("Invalid configuration value for '{field}': {message}")]
  InvalidConfigValue { field: String, message: String },

  #[error("Buffer size overflows usize: capacity {capacity} x element size {element_size}")]
  CapacityOverflow { capacity: usize, element_size: usize },
}

impl From<serde_yaml::Error> for ChannelError {
  fn from(err: serde_yaml::Error) -> Self {
    ChannelError::ConfigParse(err.to_string())
  }
}

/// A specialized `Result` type for channel construction.
pub type Result<T, E = ChannelError> = std::result::Result<T, E>;
