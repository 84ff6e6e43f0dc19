// src/config.rs

//! Declarative channel configuration.
//!
//! A `ChannelConfig` describes the fixed shape of a channel: how many elements it
//! buffers and the size/alignment of each element. It can be built in code or
//! loaded from YAML:
//!
//! ```yaml
//! capacity: 16
//! element_size: 8
//! element_align: 8
//! ```

use crate::error::{ChannelError, Result};
use serde::Deserialize;

fn default_element_align() -> usize {
  1
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
  /// Number of buffered slots. `0` makes the channel unbuffered.
  pub capacity: usize,
  pub element_size: usize,
  #[serde(default = "default_element_align")]
  pub element_align: usize,
}

impl ChannelConfig {
  pub fn new(capacity: usize, element_size: usize) -> Self {
    Self {
      capacity,
      element_size,
      element_align: default_element_align(),
    }
  }

  pub fn with_element_align(mut self, element_align: usize) -> Self {
    self.element_align = element_align;
    self
  }

  /// Parses and validates a YAML document.
  pub fn from_yaml_str(source: &str) -> Result<Self> {
    let config: ChannelConfig = serde_yaml::from_str(source)?;
    config.validate()?;
    Ok(config)
  }

  /// Checks the layout constraints and returns the backing buffer size in bytes.
  pub fn validate(&self) -> Result<usize> {
    if self.element_align == 0 || !self.element_align.is_power_of_two() {
      return Err(ChannelError::InvalidConfigValue {
        field: "element_align".to_string(),
        message: format!("{} is not a power of two", self.element_align),
      });
    }
    if self.element_size % self.element_align != 0 {
      return Err(ChannelError::InvalidConfigValue {
        field: "element_size".to_string(),
        message: format!(
          "{} is not a multiple of the alignment {}",
          self.element_size, self.element_align
        ),
      });
    }
    self
      .capacity
      .checked_mul(self.element_size)
      .ok_or(ChannelError::CapacityOverflow {
        capacity: self.capacity,
        element_size: self.element_size,
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn yaml_defaults_alignment() {
    let config = ChannelConfig::from_yaml_str("capacity: 4\nelement_size: 8\n").unwrap();
    assert_eq!(config, ChannelConfig::new(4, 8));
    assert_eq!(config.element_align, 1);
  }

  #[test]
  fn yaml_rejects_unknown_fields() {
    let err = ChannelConfig::from_yaml_str("capacity: 4\nelement_size: 8\nclosed: true\n").unwrap_err();
    assert!(matches!(err, ChannelError::ConfigParse(_)));
  }

  #[test]
  fn alignment_must_be_power_of_two() {
    let err = ChannelConfig::new(4, 12).with_element_align(3).validate().unwrap_err();
    match err {
      ChannelError::InvalidConfigValue { field, .. } => assert_eq!(field, "element_align"),
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn size_must_be_multiple_of_alignment() {
    let err = ChannelConfig::new(4, 6).with_element_align(4).validate().unwrap_err();
    match err {
      ChannelError::InvalidConfigValue { field, .. } => assert_eq!(field, "element_size"),
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn zero_sized_elements_are_valid() {
    assert_eq!(ChannelConfig::new(8, 0).with_element_align(8).validate().unwrap(), 0);
  }

  #[test]
  fn buffer_size_overflow_is_reported() {
    let err = ChannelConfig::new(usize::MAX, 2).validate().unwrap_err();
    assert!(matches!(err, ChannelError::CapacityOverflow { capacity: usize::MAX, element_size: 2 }));
  }
}
