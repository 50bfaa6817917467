use thiserror::Error;

/// Main error type for the orchestration service
#[derive(Error, Debug)]
pub enum QuorumError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Registry errors
    #[error("Agent not found: {agent_id}")]
    AgentNotFound { agent_id: String },

    #[error("Agent already registered: {agent_id}")]
    AlreadyRegistered { agent_id: String },

    // Compliance errors
    #[error("Unknown compliance policy: {policy_id}")]
    UnknownPolicy { policy_id: String },

    // Agent lifecycle errors
    #[error("Invalid state transition: from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Trade execution failed: {0}")]
    Execution(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for QuorumError
pub type Result<T> = std::result::Result<T, QuorumError>;
