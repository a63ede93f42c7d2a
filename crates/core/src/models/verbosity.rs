use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::FifoError;

/// 处理服务的诊断输出级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verbosity {
    /// 完整输出（包含逐条数据点的调试信息）
    Verbose,
    /// 标准输出
    #[default]
    Info,
    /// 只输出警告和错误
    MetricsOnly,
}

impl Verbosity {
    pub const ALL: [Verbosity; 3] = [Verbosity::Verbose, Verbosity::Info, Verbosity::MetricsOnly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Verbose => "VERBOSE",
            Verbosity::Info => "INFO",
            Verbosity::MetricsOnly => "METRICS_ONLY",
        }
    }

    /// 对应的 `EnvFilter` 指令
    pub fn filter_directive(&self) -> &'static str {
        match self {
            Verbosity::Verbose => "debug",
            Verbosity::Info => "info",
            Verbosity::MetricsOnly => "warn",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verbosity {
    type Err = FifoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VERBOSE" => Ok(Verbosity::Verbose),
            "INFO" => Ok(Verbosity::Info),
            "METRICS_ONLY" => Ok(Verbosity::MetricsOnly),
            other => Err(FifoError::InvalidVerbosity(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_exact_levels() {
        for level in Verbosity::ALL {
            assert_eq!(level.as_str().parse::<Verbosity>().unwrap(), level);
        }
    }

    #[test]
    fn test_parse_rejects_other_values() {
        for raw in ["verbose", "DEBUG", "", "METRICS-ONLY"] {
            assert!(matches!(
                raw.parse::<Verbosity>(),
                Err(FifoError::InvalidVerbosity(_))
            ));
        }
    }

    #[test]
    fn test_filter_directives() {
        assert_eq!(Verbosity::Verbose.filter_directive(), "debug");
        assert_eq!(Verbosity::Info.filter_directive(), "info");
        assert_eq!(Verbosity::MetricsOnly.filter_directive(), "warn");
    }
}
