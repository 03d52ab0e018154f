//! Error types for the playground harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("{target}/{method} is already intercepted")]
    DuplicateInterception { target: String, method: String },

    #[error("{target}/{method} is not intercepted")]
    UnknownInterception { target: String, method: String },

    #[error("Application is missing expected handles: {}", .0.join(", "))]
    MissingCapabilities(Vec<String>),

    #[error("Element {element} does not support {operation}")]
    UnsupportedElement { element: String, operation: String },

    #[error("No element with data-action=\"{action}\" in {container}")]
    ActionNotFound { container: String, action: String },

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Server failed to start: {0}")]
    ServerStartup(String),

    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright bridge error: {0}")]
    Bridge(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
