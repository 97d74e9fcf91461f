//! Command-line and environment configuration.
//!
//! Every flag can also be set through a `CANDLEWICK_*` environment variable.
//! Paths that are not given resolve under the candlewick home directory:
//!
//! | Source | Home |
//! |--------|------|
//! | `CANDLEWICK_HOME` | as given |
//! | `HOME` | `$HOME/.candlewick` |
//! | neither | `./.candlewick` |

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use candlewick_core::{default_tracked_symbols, Symbol, ValidationError};
use clap::Parser;

/// Candlewick stock data API.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "candlewick",
    author,
    version,
    about = "Serve per-symbol daily stock CSV files over a JSON API"
)]
pub struct Cli {
    /// Socket address to listen on.
    #[arg(long, env = "CANDLEWICK_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Directory holding `<symbol>.csv` files.
    #[arg(long, env = "CANDLEWICK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory for `users.json` and `investigation.json`.
    #[arg(long, env = "CANDLEWICK_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Comma-separated symbols served by the batch endpoints.
    #[arg(long, env = "CANDLEWICK_SYMBOLS", value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Seconds between scheduled refreshes; 0 disables the schedule.
    #[arg(long, env = "CANDLEWICK_REFRESH_INTERVAL_SECS", default_value_t = 3600)]
    pub refresh_interval_secs: u64,

    /// External command that rewrites the CSV files, e.g. `python fetch.py`.
    #[arg(long, env = "CANDLEWICK_REFRESH_COMMAND")]
    pub refresh_command: Option<String>,
}

/// Validated runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    pub state_dir: PathBuf,
    pub tracked: Vec<Symbol>,
    /// `None` disables the scheduled refresh.
    pub refresh_interval: Option<Duration>,
    pub refresh_command: Option<String>,
}

impl ServerConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ValidationError> {
        Self::resolve(cli, resolve_candlewick_home())
    }

    fn resolve(cli: Cli, home: PathBuf) -> Result<Self, ValidationError> {
        let tracked = if cli.symbols.iter().all(|code| code.trim().is_empty()) {
            default_tracked_symbols()
        } else {
            cli.symbols
                .iter()
                .filter(|code| !code.trim().is_empty())
                .map(|code| Symbol::parse(code))
                .collect::<Result<Vec<_>, _>>()?
        };

        let refresh_command = cli
            .refresh_command
            .map(|command| command.trim().to_owned())
            .filter(|command| !command.is_empty());

        Ok(Self {
            bind: cli.bind,
            data_dir: cli.data_dir.unwrap_or_else(|| home.join("stock_data")),
            state_dir: cli.state_dir.unwrap_or_else(|| home.join("state")),
            tracked,
            refresh_interval: (cli.refresh_interval_secs > 0)
                .then(|| Duration::from_secs(cli.refresh_interval_secs)),
            refresh_command,
        })
    }

    pub fn users_path(&self) -> PathBuf {
        self.state_dir.join("users.json")
    }

    pub fn investigation_path(&self) -> PathBuf {
        self.state_dir.join("investigation.json")
    }
}

fn resolve_candlewick_home() -> PathBuf {
    if let Some(path) = env::var_os("CANDLEWICK_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".candlewick");
    }

    PathBuf::from(".candlewick")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("candlewick").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn defaults_resolve_under_home() {
        let config = ServerConfig::resolve(parse(&[]), PathBuf::from("/srv/cw")).expect("config");

        assert_eq!(config.bind, "127.0.0.1:5000".parse().expect("addr"));
        assert_eq!(config.data_dir, PathBuf::from("/srv/cw/stock_data"));
        assert_eq!(config.users_path(), PathBuf::from("/srv/cw/state/users.json"));
        assert_eq!(config.tracked, default_tracked_symbols());
        assert_eq!(config.refresh_interval, Some(Duration::from_secs(3600)));
        assert!(config.refresh_command.is_none());
    }

    #[test]
    fn explicit_symbols_and_disabled_refresh() {
        let cli = parse(&[
            "--symbols",
            "600519, 000001",
            "--refresh-interval-secs",
            "0",
            "--data-dir",
            "/data",
        ]);
        let config = ServerConfig::resolve(cli, PathBuf::from("/unused")).expect("config");

        let codes: Vec<&str> = config.tracked.iter().map(Symbol::as_str).collect();
        assert_eq!(codes, ["600519", "000001"]);
        assert!(config.refresh_interval.is_none());
        assert_eq!(config.data_dir, PathBuf::from("/data"));
    }

    #[test]
    fn rejects_unsafe_symbol() {
        let cli = parse(&["--symbols", "../etc"]);
        assert!(ServerConfig::resolve(cli, PathBuf::from("/h")).is_err());
    }

    #[test]
    fn blank_refresh_command_is_ignored() {
        let cli = parse(&["--refresh-command", "   "]);
        let config = ServerConfig::resolve(cli, PathBuf::from("/h")).expect("config");
        assert!(config.refresh_command.is_none());
    }
}
