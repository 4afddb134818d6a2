use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "configuration is incomplete:\n{}\n\nSet the variables in the environment or in a .env file next to the binary",
        .0.iter().map(|p| format!("  - {p}")).collect::<Vec<_>>().join("\n")
    )]
    Invalid(Vec<String>),

    #[error("home directory not found while expanding '{0}'")]
    HomeDirNotFound(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
