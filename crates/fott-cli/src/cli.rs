use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "fott",
    about = "Open, create and manage encrypted labeling projects",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Work with recent projects.
    #[command(subcommand)]
    Projects(ProjectCommand),
    /// Manage security tokens.
    #[command(subcommand)]
    Token(TokenCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ProjectCommand {
    /// List recent projects.
    List,
    /// Create a project in a local folder and add it to the recent list.
    Create {
        name: String,
        /// Folder the project file is written to.
        #[arg(long)]
        folder: PathBuf,
        /// Security token sealing the connection settings.
        #[arg(long)]
        token: String,
    },
    /// Fetch the latest copy of a recent project and make it current.
    Open {
        /// Project id or name.
        project: String,
    },
    /// Delete a project file and forget it.
    Delete {
        /// Project id or name.
        project: String,
    },
    /// Close the current project.
    Close,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TokenCommand {
    /// Generate a new random token.
    Generate {
        name: String,
        /// Keep the key in the OS keyring instead of the config file.
        #[arg(long)]
        keyring: bool,
    },
    /// List token names.
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_open_subcommand() {
        let cli = Cli::try_parse_from(["fott", "projects", "open", "Invoice"]).expect("parse");
        assert_eq!(
            cli.command,
            Command::Projects(ProjectCommand::Open {
                project: "Invoice".into()
            })
        );
    }

    #[test]
    fn parses_create_with_flags() {
        let cli = Cli::try_parse_from([
            "fott", "projects", "create", "Invoice", "--folder", "/data", "--token", "t1",
        ])
        .expect("parse");
        assert_eq!(
            cli.command,
            Command::Projects(ProjectCommand::Create {
                name: "Invoice".into(),
                folder: PathBuf::from("/data"),
                token: "t1".into(),
            })
        );
    }

    #[test]
    fn parses_token_generate_with_keyring() {
        let cli = Cli::try_parse_from(["fott", "token", "generate", "t1", "--keyring"])
            .expect("parse");
        assert_eq!(
            cli.command,
            Command::Token(TokenCommand::Generate {
                name: "t1".into(),
                keyring: true
            })
        );
    }

    #[test]
    fn accepts_global_config_override() {
        let cli = Cli::try_parse_from(["fott", "config", "init", "--config", "/tmp/fott.toml"])
            .expect("parse");
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/fott.toml")));
        assert_eq!(cli.command, Command::Config(ConfigCommand::Init));
    }

    #[test]
    fn requires_a_subcommand() {
        assert!(Cli::try_parse_from(["fott"]).is_err());
    }
}
