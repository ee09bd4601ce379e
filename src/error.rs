//! Error taxonomy.
//!
//! Synchronous lifecycle failures (config, transport, send) are raised to
//! the caller as [`OmegaError`]. Steady-state decode/server errors are
//! never turned into a `Result` — they are handed to the registered
//! [`crate::dispatcher::ResponseHandler`] instead, per the dispatcher's
//! "never abort on a malformed frame" contract.

use thiserror::Error;

/// Top-level error type for all synchronous, caller-facing operations.
#[derive(Error, Debug)]
pub enum OmegaError {
    #[error("invalid gateway configuration: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("zeromq error: {0}")]
    Zmq(#[from] zeromq::ZmqError),

    #[error("cannot send: transport is not running")]
    Send,

    #[error("session error: {0}")]
    Session(String),

    #[error("encode error: {0}")]
    Encode(#[from] Box<bincode::ErrorKind>),
}

pub type Result<T> = std::result::Result<T, OmegaError>;
