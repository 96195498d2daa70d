use thiserror::Error;

use bdi_graph::GraphError;
use bdi_planning::PlanningError;

#[derive(Debug, Error)]
pub enum AgentError {
    /// The peer sent something the current coordination state cannot
    /// accept; the two state machines have desynchronized.
    #[error("protocol violation: {message} received while {state}")]
    ProtocolViolation {
        state:   &'static str,
        message: &'static str,
    },

    #[error("control loop reached coordination state {0}")]
    InvalidState(&'static str),

    #[error("agent configuration error: {0}")]
    Config(String),

    #[error("peer channel closed")]
    ChannelClosed,

    #[error("no peer to talk to")]
    NoPeer,

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Planning(#[from] PlanningError),

    #[error("config i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type AgentResult<T> = Result<T, AgentError>;
