// src/config.rs

//! Command-line configuration: the listen address, an optional RDB snapshot
//! location, and an optional upstream primary to replicate from.

use clap::Parser;

/// A Redis-compatible, single-node, in-memory key-value server speaking RESP.
#[derive(Parser, Debug, Clone)]
#[command(name = "respdb", version, about)]
pub struct Cli {
    /// Address to bind the TCP listener to.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the TCP listener to.
    #[arg(long, default_value_t = 6379)]
    pub port: u16,

    /// Directory an RDB snapshot is loaded from at startup, and reported by
    /// `CONFIG GET dir`.
    #[arg(long)]
    pub dir: Option<String>,

    /// RDB filename within `--dir`, reported by `CONFIG GET dbfilename`.
    #[arg(long)]
    pub dbfilename: Option<String>,

    /// Runs as a replica of `<MASTER_HOST> <MASTER_PORT>`. Absent means primary.
    #[arg(long, num_args = 2, value_names = ["MASTER_HOST", "MASTER_PORT"])]
    pub replicaof: Option<Vec<String>>,

    /// Log level for the default tracing filter (e.g. "info", "debug").
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// The resolved configuration consumed by the rest of the server.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub dir: Option<String>,
    pub dbfilename: Option<String>,
    pub replicaof: Option<(String, u16)>,
    pub log_level: String,
}

impl TryFrom<Cli> for Config {
    type Error = anyhow::Error;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let replicaof = cli.replicaof.map(parse_replicaof).transpose()?;

        Ok(Config {
            host: cli.host,
            port: cli.port,
            dir: cli.dir,
            dbfilename: cli.dbfilename,
            replicaof,
            log_level: cli.log_level,
        })
    }
}

fn parse_replicaof(parts: Vec<String>) -> anyhow::Result<(String, u16)> {
    let [host, port_str] = <[String; 2]>::try_from(parts)
        .map_err(|_| anyhow::anyhow!("--replicaof takes exactly two arguments"))?;
    let port = port_str
        .parse::<u16>()
        .map_err(|_| anyhow::anyhow!("invalid --replicaof port '{port_str}'"))?;
    Ok((host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_replicaof_host_and_port() {
        let cli = Cli::parse_from(["respdb", "--replicaof", "127.0.0.1", "6380"]);
        let config = Config::try_from(cli).unwrap();
        assert_eq!(config.replicaof, Some(("127.0.0.1".to_string(), 6380)));
    }

    #[test]
    fn defaults_host_port_and_role() {
        let cli = Cli::parse_from(["respdb"]);
        let config = Config::try_from(cli).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 6379);
        assert!(config.replicaof.is_none());
    }

    #[test]
    fn rejects_non_numeric_replicaof_port() {
        let cli = Cli::parse_from(["respdb", "--replicaof", "127.0.0.1", "not-a-port"]);
        assert!(Config::try_from(cli).is_err());
    }
}
