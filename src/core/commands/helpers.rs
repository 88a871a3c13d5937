// src/core/commands/helpers.rs

//! Provides helper functions for parsing command arguments from `RespFrame`s.
//! These helpers reduce boilerplate and ensure consistent error handling across commands.

use crate::core::RespDbError;
use crate::core::protocol::RespFrame;
use bytes::Bytes;
use std::str::FromStr;

/// A helper struct to parse command arguments sequentially.
/// This simplifies parsing optional flags and value pairs.
pub struct ArgParser<'a> {
    args: &'a [RespFrame],
    cursor: usize,
}

impl<'a> ArgParser<'a> {
    /// Creates a new parser over a slice of arguments.
    pub fn new(args: &'a [RespFrame]) -> Self {
        Self { args, cursor: 0 }
    }

    /// Checks if the next argument matches a specific flag (case-insensitively).
    /// If it matches, consumes the argument and returns true.
    pub fn match_flag(&mut self, flag_name: &str) -> bool {
        if let Some(arg_str) = self.peek_str() {
            if arg_str.eq_ignore_ascii_case(flag_name) {
                self.cursor += 1;
                return true;
            }
        }
        false
    }

    /// Checks if the next argument matches an option name.
    /// If it matches, consumes both the option name and its value,
    /// then parses the value into the specified type `T`.
    pub fn match_option<T>(&mut self, opt_name: &str) -> Result<Option<T>, RespDbError>
    where
        T: FromStr,
        <T as FromStr>::Err: std::fmt::Display,
    {
        if let Some(arg_str) = self.peek_str() {
            if arg_str.eq_ignore_ascii_case(opt_name) {
                if self.cursor + 1 >= self.args.len() {
                    return Err(RespDbError::SyntaxError);
                }
                let value_str = extract_string(&self.args[self.cursor + 1])?;

                let parsed_value = value_str.parse::<T>().map_err(|e| {
                    RespDbError::InvalidState(format!("Invalid value for option '{opt_name}': {e}"))
                })?;

                self.cursor += 2; // Consume both the option name and its value
                return Ok(Some(parsed_value));
            }
        }
        Ok(None)
    }

    /// Returns true if every argument has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.args.len()
    }

    /// Returns the remaining arguments that have not been consumed.
    pub fn remaining_args(&self) -> &'a [RespFrame] {
        &self.args[self.cursor..]
    }

    /// Peeks at the next argument as a string without consuming it.
    fn peek_str(&self) -> Option<String> {
        self.args
            .get(self.cursor)
            .and_then(|frame| extract_string(frame).ok().map(|s| s.to_ascii_lowercase()))
    }
}

/// Extracts a `String` from a `RespFrame::BulkString`.
/// Returns a `WrongType` error if the frame is not a BulkString or not valid UTF-8.
pub fn extract_string(frame: &RespFrame) -> Result<String, RespDbError> {
    if let RespFrame::BulkString(bs) = frame {
        String::from_utf8(bs.to_vec()).map_err(|_| RespDbError::WrongType)
    } else {
        Err(RespDbError::WrongType)
    }
}

/// Extracts `Bytes` from a `RespFrame::BulkString`.
/// Returns a `WrongType` error if the frame is not a BulkString.
pub fn extract_bytes(frame: &RespFrame) -> Result<Bytes, RespDbError> {
    match frame {
        RespFrame::BulkString(bs) => Ok(bs.clone()),
        _ => Err(RespDbError::WrongType),
    }
}

/// Validates that the number of arguments matches an exact expected count.
pub fn validate_arg_count(
    args: &[RespFrame],
    expected: usize,
    cmd: &str,
) -> Result<(), RespDbError> {
    if args.len() != expected {
        Err(RespDbError::WrongArgumentCount(cmd.to_string()))
    } else {
        Ok(())
    }
}

/// Validates that the number of arguments is at least `min` for a command.
pub fn validate_min_arg_count(
    args: &[RespFrame],
    min: usize,
    cmd: &str,
) -> Result<(), RespDbError> {
    if args.len() < min {
        Err(RespDbError::WrongArgumentCount(cmd.to_string()))
    } else {
        Ok(())
    }
}
