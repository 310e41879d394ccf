use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::patterns::PatternKind;
use crate::scanner::{DEFAULT_SCAN_LIMIT, Scanner};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("scan-limit must be greater than zero")]
    ZeroScanLimit,
    #[error("class-prefix {0:?} may only contain ASCII letters, digits, `-` and `_`")]
    InvalidClassPrefix(String),
}

/// Which margin a note is placed in.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginSide {
    Left,
    #[default]
    Right,
}

impl MarginSide {
    pub fn as_str(self) -> &'static str {
        match self {
            MarginSide::Left => "left",
            MarginSide::Right => "right",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("left") {
            Some(MarginSide::Left)
        } else if token.eq_ignore_ascii_case("right") {
            Some(MarginSide::Right)
        } else {
            None
        }
    }
}

/// Settings for a [`Processor`](crate::Processor). Built once by the host
/// and handed to the processor; nothing here is global.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProcessorConfig {
    pub class_prefix: String,
    pub interactive: bool,
    pub marginalia: bool,
    pub extensions: bool,
    pub marginalia_side: MarginSide,
    pub sanitize: bool,
    pub scan_limit: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            class_prefix: String::new(),
            interactive: true,
            marginalia: true,
            extensions: true,
            marginalia_side: MarginSide::default(),
            sanitize: false,
            scan_limit: DEFAULT_SCAN_LIMIT,
        }
    }
}

impl ProcessorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_limit == 0 {
            return Err(ConfigError::ZeroScanLimit);
        }
        let prefix_ok = self
            .class_prefix
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !prefix_ok {
            return Err(ConfigError::InvalidClassPrefix(self.class_prefix.clone()));
        }
        Ok(())
    }

    pub fn enabled(&self, kind: PatternKind) -> bool {
        match kind {
            PatternKind::Marginalia => self.marginalia,
            PatternKind::Interactive => self.interactive,
            PatternKind::Extension => self.extensions,
        }
    }

    pub fn scanner(&self) -> Scanner {
        Scanner::with_limit(self.scan_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, MarginSide, ProcessorConfig};
    use crate::patterns::PatternKind;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ProcessorConfig::from_toml_str("").expect("config");
        assert_eq!(config, ProcessorConfig::default());
        assert_eq!(config.scanner().limit(), 10_000);
    }

    #[test]
    fn toml_overrides_fields() {
        let source = r#"
class-prefix = "tto-"
extensions = false
marginalia-side = "left"
scan-limit = 500
"#;
        let config = ProcessorConfig::from_toml_str(source).expect("config");
        assert_eq!(config.class_prefix, "tto-");
        assert_eq!(config.marginalia_side, MarginSide::Left);
        assert!(!config.enabled(PatternKind::Extension));
        assert!(config.enabled(PatternKind::Marginalia));
        assert_eq!(config.scan_limit, 500);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            ProcessorConfig::from_toml_str("scan-limit = 0"),
            Err(ConfigError::ZeroScanLimit)
        ));
        assert!(matches!(
            ProcessorConfig::from_toml_str("class-prefix = \"a b\""),
            Err(ConfigError::InvalidClassPrefix(_))
        ));
        assert!(matches!(
            ProcessorConfig::from_toml_str("unknown = true"),
            Err(ConfigError::Parse(_))
        ));
    }
}
