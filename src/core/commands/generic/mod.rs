// src/core/commands/generic/mod.rs

pub mod config;
pub mod del;
pub mod echo;
pub mod info;
pub mod keys;
pub mod ping;
pub mod psync;
pub mod replconf;
pub mod type_cmd;
pub mod wait;

pub use self::config::ConfigGet;
pub use self::del::Del;
pub use self::echo::Echo;
pub use self::info::Info;
pub use self::keys::Keys;
pub use self::ping::Ping;
pub use self::psync::Psync;
pub use self::replconf::Replconf;
pub use self::type_cmd::TypeInfo;
pub use self::wait::Wait;
