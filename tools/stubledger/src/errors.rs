use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no return value set for function [{function}] at {file}:{line}")]
    UnstubbedCall {
        function: String,
        file: String,
        line: u32,
    },
    #[error("io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("cli error: {0}")]
    Cli(String),
    #[error("script error: {0}")]
    Script(String),
}

impl LedgerError {
    pub fn is_unstubbed_call(&self) -> bool {
        matches!(self, Self::UnstubbedCall { .. })
    }
}
