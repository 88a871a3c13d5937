// src/core/errors.rs

//! Defines the primary error type for the entire application.

use std::num::{ParseFloatError, ParseIntError};
use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the server.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
#[derive(Error, Debug)]
pub enum RespDbError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Incomplete data in stream")]
    IncompleteData,

    #[error("IO Error: {0}")]
    IoString(String),

    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Syntax error")]
    SyntaxError,

    #[error("Wrong number of arguments for '{0}' command")]
    WrongArgumentCount(String),

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("Value is not an integer or out of range")]
    NotAnInteger,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown subcommand")]
    UnknownSubcommand,

    #[error("Command not allowed in the current state: {0}")]
    InvalidState(String),

    #[error("Replication Error: {0}")]
    ReplicationError(String),

    #[error("Persistence Error: {0}")]
    PersistenceError(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("The ID specified in XADD is equal or smaller than the target stream top item")]
    StreamIdTooSmall,

    #[error("The ID specified in XADD must be greater than 0-0")]
    StreamIdZero,
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
// We wrap it in an Arc to allow for cheap, shared cloning.
impl Clone for RespDbError {
    fn clone(&self) -> Self {
        match self {
            RespDbError::Io(e) => RespDbError::Io(Arc::clone(e)),
            RespDbError::IncompleteData => RespDbError::IncompleteData,
            RespDbError::IoString(s) => RespDbError::IoString(s.clone()),
            RespDbError::UnknownCommand(s) => RespDbError::UnknownCommand(s.clone()),
            RespDbError::ProtocolError(s) => RespDbError::ProtocolError(s.clone()),
            RespDbError::SyntaxError => RespDbError::SyntaxError,
            RespDbError::WrongArgumentCount(s) => RespDbError::WrongArgumentCount(s.clone()),
            RespDbError::WrongType => RespDbError::WrongType,
            RespDbError::NotAnInteger => RespDbError::NotAnInteger,
            RespDbError::InvalidRequest(s) => RespDbError::InvalidRequest(s.clone()),
            RespDbError::UnknownSubcommand => RespDbError::UnknownSubcommand,
            RespDbError::InvalidState(s) => RespDbError::InvalidState(s.clone()),
            RespDbError::ReplicationError(s) => RespDbError::ReplicationError(s.clone()),
            RespDbError::PersistenceError(s) => RespDbError::PersistenceError(s.clone()),
            RespDbError::Internal(s) => RespDbError::Internal(s.clone()),
            RespDbError::StreamIdTooSmall => RespDbError::StreamIdTooSmall,
            RespDbError::StreamIdZero => RespDbError::StreamIdZero,
        }
    }
}

impl PartialEq for RespDbError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RespDbError::Io(e1), RespDbError::Io(e2)) => e1.to_string() == e2.to_string(),
            (RespDbError::IoString(s1), RespDbError::IoString(s2)) => s1 == s2,
            (RespDbError::UnknownCommand(s1), RespDbError::UnknownCommand(s2)) => s1 == s2,
            (RespDbError::ProtocolError(s1), RespDbError::ProtocolError(s2)) => s1 == s2,
            (RespDbError::WrongArgumentCount(s1), RespDbError::WrongArgumentCount(s2)) => {
                s1 == s2
            }
            (RespDbError::InvalidRequest(s1), RespDbError::InvalidRequest(s2)) => s1 == s2,
            (RespDbError::InvalidState(s1), RespDbError::InvalidState(s2)) => s1 == s2,
            (RespDbError::ReplicationError(s1), RespDbError::ReplicationError(s2)) => s1 == s2,
            (RespDbError::PersistenceError(s1), RespDbError::PersistenceError(s2)) => s1 == s2,
            (RespDbError::Internal(s1), RespDbError::Internal(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for RespDbError {
    fn from(e: std::io::Error) -> Self {
        RespDbError::Io(Arc::new(e))
    }
}

impl From<std::str::Utf8Error> for RespDbError {
    fn from(_: std::str::Utf8Error) -> Self {
        RespDbError::WrongType
    }
}

impl From<std::string::FromUtf8Error> for RespDbError {
    fn from(_: std::string::FromUtf8Error) -> Self {
        RespDbError::WrongType
    }
}

impl From<String> for RespDbError {
    fn from(s: String) -> Self {
        RespDbError::IoString(s)
    }
}

impl From<ParseIntError> for RespDbError {
    fn from(_: ParseIntError) -> Self {
        RespDbError::NotAnInteger
    }
}

impl From<ParseFloatError> for RespDbError {
    fn from(_: ParseFloatError) -> Self {
        RespDbError::NotAnInteger
    }
}
