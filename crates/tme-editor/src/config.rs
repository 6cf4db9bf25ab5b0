//! Editor configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use tme_document::yaml::DEFAULT_INDENT;
use tme_integrity::{ReferenceOptions, RiskTrackingPolicy};

/// Editor configuration
///
/// Every field has a default, so a config file only needs the fields it
/// changes:
///
/// ```rust
/// use tme_editor::EditorConfig;
/// use tme_integrity::RiskTrackingPolicy;
///
/// let config = EditorConfig::from_yaml_str("risk_tracking: ignore\nindent: 4\n").unwrap();
/// assert_eq!(config.risk_tracking, RiskTrackingPolicy::Ignore);
/// assert!(config.reintegrate_after_delete);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Indentation width of written text
    pub indent: usize,
    /// Run the serialize/re-parse fence after deletes too
    pub reintegrate_after_delete: bool,
    /// How `risk_tracking` keys follow id changes
    pub risk_tracking: RiskTrackingPolicy,
    /// Rewrite link targets when a technical asset id changes
    pub cascade_link_targets: bool,
    /// Keep a diagnostic trace per operation
    pub record_trace: bool,
    /// Attempts at issuing an unused key or id before giving up
    pub max_key_attempts: usize,
}

impl EditorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    /// Returns [`ConfigError`] on malformed YAML, unknown fields or invalid
    /// values.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] for a zero attempt budget or an
    /// indent outside `2..=8`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=8).contains(&self.indent) {
            return Err(ConfigError::Invalid(format!(
                "indent must be between 2 and 8, got {}",
                self.indent
            )));
        }
        if self.max_key_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_key_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// With indentation width
    #[inline]
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// With reintegration after deletes
    #[inline]
    #[must_use]
    pub fn with_reintegrate_after_delete(mut self, enabled: bool) -> Self {
        self.reintegrate_after_delete = enabled;
        self
    }

    /// With risk tracking policy
    #[inline]
    #[must_use]
    pub fn with_risk_tracking(mut self, policy: RiskTrackingPolicy) -> Self {
        self.risk_tracking = policy;
        self
    }

    /// With link target cascade
    #[inline]
    #[must_use]
    pub fn with_cascade_link_targets(mut self, enabled: bool) -> Self {
        self.cascade_link_targets = enabled;
        self
    }

    /// With trace recording
    #[inline]
    #[must_use]
    pub fn with_record_trace(mut self, enabled: bool) -> Self {
        self.record_trace = enabled;
        self
    }

    /// With key issuing attempt budget
    #[inline]
    #[must_use]
    pub fn with_max_key_attempts(mut self, attempts: usize) -> Self {
        self.max_key_attempts = attempts;
        self
    }

    /// Options for reference passes
    #[must_use]
    pub fn reference_options(&self) -> ReferenceOptions {
        ReferenceOptions::new()
            .with_risk_tracking(self.risk_tracking)
            .with_cascade_link_targets(self.cascade_link_targets)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT,
            reintegrate_after_delete: true,
            risk_tracking: RiskTrackingPolicy::Cascade,
            cascade_link_targets: true,
            record_trace: true,
            max_key_attempts: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.indent, 2);
        assert!(config.reintegrate_after_delete);
        assert_eq!(config.risk_tracking, RiskTrackingPolicy::Cascade);
        assert!(config.cascade_link_targets);
        assert!(config.record_trace);
        assert_eq!(config.max_key_attempts, 64);
    }

    #[test]
    fn builder_overrides() {
        let config = EditorConfig::new()
            .with_indent(4)
            .with_record_trace(false)
            .with_cascade_link_targets(false);
        assert_eq!(config.indent, 4);
        assert!(!config.record_trace);
        assert!(!config.reference_options().cascade_link_targets);
    }

    #[test]
    fn empty_text_is_default() {
        assert_eq!(EditorConfig::from_yaml_str("").unwrap(), EditorConfig::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(matches!(
            EditorConfig::from_yaml_str("indnet: 4\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(matches!(
            EditorConfig::from_yaml_str("indent: 1\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(EditorConfig::from_yaml_str("max_key_attempts: 0\n").is_err());
    }

    #[test]
    fn serializes_back_to_yaml() {
        let config = EditorConfig::new().with_risk_tracking(RiskTrackingPolicy::Ignore);
        let text = serde_yaml::to_string(&config).unwrap();
        assert!(text.contains("risk_tracking: ignore"));
        assert_eq!(EditorConfig::from_yaml_str(&text).unwrap(), config);
    }
}
