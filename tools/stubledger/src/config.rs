use crate::errors::LedgerError;
use crate::logging::DEFAULT_MAX_PAYLOAD_BYTES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub reporter: Option<ReporterKind>,
    pub verify_expectations: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReporterKind {
    #[default]
    Panic,
    Collect,
}

impl ReporterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Panic => "panic",
            Self::Collect => "collect",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerConfig {
    pub reporter: ReporterConfig,
    pub logging: LoggingConfig,
    pub tally: TallyConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReporterConfig {
    pub kind: ReporterKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    pub path: Option<PathBuf>,
    pub max_payload_bytes: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TallyConfig {
    /// Report `expect` declarations that never saw a call when tallying.
    pub verify_expectations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialLedgerConfig {
    reporter: Option<PartialReporterConfig>,
    logging: Option<PartialLoggingConfig>,
    tally: Option<PartialTallyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialReporterConfig {
    kind: Option<ReporterKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialLoggingConfig {
    path: Option<PathBuf>,
    max_payload_bytes: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialTallyConfig {
    verify_expectations: Option<bool>,
}

pub fn load_config(overrides: &CliOverrides, process_cwd: &Path) -> Result<LedgerConfig, LedgerError> {
    let mut cfg = LedgerConfig::default();

    if let Some(path) = &overrides.config_path {
        let file_contents =
            std::fs::read_to_string(path).map_err(|e| LedgerError::Io(e.to_string()))?;
        let partial: PartialLedgerConfig = toml::from_str(&file_contents)
            .map_err(|e| LedgerError::ConfigParse(e.to_string()))?;
        merge_partial_config(&mut cfg, partial);
    }

    apply_cli_overrides(&mut cfg, overrides);

    if let Some(path) = &cfg.logging.path {
        cfg.logging.path = Some(absolutize_path(process_cwd, path));
    }
    validate_config(&cfg)?;
    Ok(cfg)
}

pub fn parse_config(text: &str) -> Result<LedgerConfig, LedgerError> {
    let partial: PartialLedgerConfig =
        toml::from_str(text).map_err(|e| LedgerError::ConfigParse(e.to_string()))?;
    let mut cfg = LedgerConfig::default();
    merge_partial_config(&mut cfg, partial);
    validate_config(&cfg)?;
    Ok(cfg)
}

fn merge_partial_config(cfg: &mut LedgerConfig, partial: PartialLedgerConfig) {
    if let Some(reporter) = partial.reporter {
        if let Some(kind) = reporter.kind {
            cfg.reporter.kind = kind;
        }
    }

    if let Some(logging) = partial.logging {
        if let Some(path) = logging.path {
            cfg.logging.path = Some(path);
        }
        if let Some(value) = logging.max_payload_bytes {
            cfg.logging.max_payload_bytes = value;
        }
    }

    if let Some(tally) = partial.tally {
        if let Some(value) = tally.verify_expectations {
            cfg.tally.verify_expectations = value;
        }
    }
}

fn apply_cli_overrides(cfg: &mut LedgerConfig, overrides: &CliOverrides) {
    if let Some(path) = &overrides.log_path {
        cfg.logging.path = Some(path.clone());
    }
    if let Some(kind) = overrides.reporter {
        cfg.reporter.kind = kind;
    }
    if overrides.verify_expectations {
        cfg.tally.verify_expectations = true;
    }
}

fn absolutize_path(base: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        base.join(value)
    }
}

fn validate_config(cfg: &LedgerConfig) -> Result<(), LedgerError> {
    if cfg.logging.max_payload_bytes == 0 {
        return Err(LedgerError::InvalidConfig(
            "logging.max_payload_bytes must be greater than zero".to_string(),
        ));
    }

    if let Some(path) = &cfg.logging.path {
        if path.as_os_str().is_empty() {
            return Err(LedgerError::InvalidConfig(
                "logging.path must not be empty".to_string(),
            ));
        }
    }

    Ok(())
}
