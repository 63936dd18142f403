//! Host configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What the host does with a line that is not a valid request envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedLinePolicy {
    /// Stop the loop and return the decode error.
    #[default]
    Fail,
    /// Answer with an `invalid_request: <detail>` error envelope and keep
    /// reading.
    Reply,
}

impl fmt::Display for MalformedLinePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => write!(f, "fail"),
            Self::Reply => write!(f, "reply"),
        }
    }
}

impl FromStr for MalformedLinePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail" => Ok(Self::Fail),
            "reply" => Ok(Self::Reply),
            other => Err(format!(
                "unknown malformed-line policy '{}' (expected 'fail' or 'reply')",
                other
            )),
        }
    }
}

/// Host configuration settings.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Handling of undecodable lines.
    pub malformed_lines: MalformedLinePolicy,
    /// Skip lines containing only whitespace instead of decoding them.
    pub skip_blank_lines: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            malformed_lines: MalformedLinePolicy::Fail,
            skip_blank_lines: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse_and_display() {
        assert_eq!("fail".parse::<MalformedLinePolicy>(), Ok(MalformedLinePolicy::Fail));
        assert_eq!("reply".parse::<MalformedLinePolicy>(), Ok(MalformedLinePolicy::Reply));
        assert!("retry".parse::<MalformedLinePolicy>().is_err());
        assert_eq!(MalformedLinePolicy::Reply.to_string(), "reply");
    }

    #[test]
    fn test_default_config() {
        let config = HostConfig::default();
        assert_eq!(config.malformed_lines, MalformedLinePolicy::Fail);
        assert!(config.skip_blank_lines);
    }
}
