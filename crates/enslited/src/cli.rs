//! Command-line surface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "enslited", about = "ENS light resolver daemon", version)]
pub struct Cli {
    /// Data directory (defaults to ENS_DATA_DIR, then the platform default)
    #[arg(long, global = true, value_name = "DIR")]
    pub datadir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the resolver daemon until stopped
    Start,

    /// Ask a running daemon to shut down
    Stop,

    /// Resolve a name through a running daemon
    Resolve {
        /// Name to resolve, e.g. alice.eth
        name: String,

        /// Query DNS records instead of the address hash
        #[arg(long)]
        dns: bool,

        /// With --dns, list every record instead of the primary IPv4
        #[arg(long, requires = "dns")]
        lookup: bool,
    },

    /// Print the version
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_start_with_datadir() {
        let cli = Cli::parse_from(["enslited", "start", "--datadir", "/tmp/ens"]);
        assert!(matches!(cli.command, Command::Start));
        assert_eq!(cli.datadir, Some(PathBuf::from("/tmp/ens")));
    }

    #[test]
    fn test_parse_resolve_flags() {
        let cli = Cli::parse_from(["enslited", "resolve", "alice.eth", "--dns", "--lookup"]);
        match cli.command {
            Command::Resolve { name, dns, lookup } => {
                assert_eq!(name, "alice.eth");
                assert!(dns);
                assert!(lookup);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_lookup_requires_dns() {
        assert!(Cli::try_parse_from(["enslited", "resolve", "alice.eth", "--lookup"]).is_err());
    }
}
