// src/core/commands/mod.rs

//! Defines every supported command and the `Command` enum that dispatches
//! parsing and execution across them. Unlike the macro-generated dispatch
//! table this build's ancestor used for its full surface, the command set
//! here is small enough to hand-write directly.

use crate::core::RespDbError;
use crate::core::protocol::RespFrame;
use crate::core::state::ServerState;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

pub mod command_trait;
pub mod generic;
pub mod helpers;
pub mod streams;
pub mod string;

use command_trait::{CommandContext, ExecutableCommand, ParseCommand};
use generic::{ConfigGet, Del, Echo, Info, Keys, Ping, Psync, Replconf, TypeInfo, Wait};
use streams::{XAdd, XRange};
use string::{Get, Set};

/// The parsed form of every command this build understands. Parsing and
/// execution are both dispatched by name from [`Command::parse`] and
/// [`Command::execute`]; `name()` recovers the upper-case command name for
/// logging and replication bookkeeping.
#[derive(Debug, Clone)]
pub enum Command {
    Ping(Ping),
    Echo(Echo),
    Get(Get),
    Set(Set),
    Del(Del),
    Keys(Keys),
    Type(TypeInfo),
    ConfigGet(ConfigGet),
    Info(Info),
    Replconf(Replconf),
    Psync(Psync),
    Wait(Wait),
    XAdd(XAdd),
    XRange(XRange),
}

impl Command {
    /// Parses a full command frame (an array of bulk strings, the first of
    /// which is the command name) into a dispatchable `Command`.
    pub fn parse(frame: &RespFrame) -> Result<Self, RespDbError> {
        let items = match frame {
            RespFrame::Array(items) => items,
            _ => return Err(RespDbError::ProtocolError("expected array".to_string())),
        };
        let (name_frame, args) = items
            .split_first()
            .ok_or_else(|| RespDbError::ProtocolError("empty command".to_string()))?;
        let name = helpers::extract_string(name_frame)?.to_ascii_uppercase();

        match name.as_str() {
            "PING" => Ok(Command::Ping(Ping::parse(args)?)),
            "ECHO" => Ok(Command::Echo(Echo::parse(args)?)),
            "GET" => Ok(Command::Get(Get::parse(args)?)),
            "SET" => Ok(Command::Set(Set::parse(args)?)),
            "DEL" => Ok(Command::Del(Del::parse(args)?)),
            "KEYS" => Ok(Command::Keys(Keys::parse(args)?)),
            "TYPE" => Ok(Command::Type(TypeInfo::parse(args)?)),
            "CONFIG" => Ok(Command::ConfigGet(ConfigGet::parse(args)?)),
            "INFO" => Ok(Command::Info(Info::parse(args)?)),
            "REPLCONF" => Ok(Command::Replconf(Replconf::parse(args)?)),
            "PSYNC" => Ok(Command::Psync(Psync::parse(args)?)),
            "WAIT" => Ok(Command::Wait(Wait::parse(args)?)),
            "XADD" => Ok(Command::XAdd(XAdd::parse(args)?)),
            "XRANGE" => Ok(Command::XRange(XRange::parse(args)?)),
            other => Err(RespDbError::UnknownCommand(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping(_) => "PING",
            Command::Echo(_) => "ECHO",
            Command::Get(_) => "GET",
            Command::Set(_) => "SET",
            Command::Del(_) => "DEL",
            Command::Keys(_) => "KEYS",
            Command::Type(_) => "TYPE",
            Command::ConfigGet(_) => "CONFIG",
            Command::Info(_) => "INFO",
            Command::Replconf(_) => "REPLCONF",
            Command::Psync(_) => "PSYNC",
            Command::Wait(_) => "WAIT",
            Command::XAdd(_) => "XADD",
            Command::XRange(_) => "XRANGE",
        }
    }

    pub fn is_write(&self) -> bool {
        match self {
            Command::Set(c) => c.is_write(),
            Command::Del(c) => c.is_write(),
            Command::XAdd(c) => c.is_write(),
            _ => false,
        }
    }
}

/// Executes a parsed command against `state` and, on a primary, enqueues a
/// write command for replica fanout before returning the reply — every write
/// must be queued before its reply is sent. `is_replica_replay` marks a
/// command replayed from an upstream primary so it is never re-propagated.
pub async fn dispatch(
    command: &Command,
    raw_frame: &RespFrame,
    state: &Arc<ServerState>,
    is_replica_replay: bool,
) -> Result<RespFrame, RespDbError> {
    let ctx = CommandContext {
        state,
        is_replica_replay,
    };
    state.stats.increment_total_commands();
    let reply = command.execute(&ctx).await?;
    if command.is_write() && !is_replica_replay {
        if let Some(primary) = state.replication.as_primary() {
            let encoded: Bytes = raw_frame.encode_to_vec()?.into();
            primary.enqueue_write(encoded);
        }
    }
    Ok(reply)
}

#[async_trait]
impl ExecutableCommand for Command {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<RespFrame, RespDbError> {
        match self {
            Command::Ping(c) => c.execute(ctx).await,
            Command::Echo(c) => c.execute(ctx).await,
            Command::Get(c) => c.execute(ctx).await,
            Command::Set(c) => c.execute(ctx).await,
            Command::Del(c) => c.execute(ctx).await,
            Command::Keys(c) => c.execute(ctx).await,
            Command::Type(c) => c.execute(ctx).await,
            Command::ConfigGet(c) => c.execute(ctx).await,
            Command::Info(c) => c.execute(ctx).await,
            Command::Replconf(c) => c.execute(ctx).await,
            Command::Psync(c) => c.execute(ctx).await,
            Command::Wait(c) => c.execute(ctx).await,
            Command::XAdd(c) => c.execute(ctx).await,
            Command::XRange(c) => c.execute(ctx).await,
        }
    }

    fn is_write(&self) -> bool {
        Command::is_write(self)
    }
}
