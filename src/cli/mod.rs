//! Command-line interface for the storefront backend.

mod commands;

use clap::{Parser, Subcommand};

use crate::domain::Role;

/// Storefront - e-commerce REST backend
#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server (default)
    #[command(alias = "daemon", alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Create an account with any role
    CreateUser {
        username: String,
        email: String,
        password: String,
        /// buyer, seller or admin
        #[arg(long, default_value = "buyer", value_parser = parse_role)]
        role: Role,
    },

    /// List all accounts
    #[command(alias = "ls")]
    Users,

    /// Show store-wide counters
    Stats,
}

fn parse_role(value: &str) -> Result<Role, String> {
    value.parse()
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["storefront"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn create_user_parses_role() {
        let cli = Cli::try_parse_from([
            "storefront",
            "create-user",
            "root",
            "root@example.com",
            "supersecret",
            "--role",
            "admin",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::CreateUser { username, role, .. }) => {
                assert_eq!(username, "root");
                assert_eq!(role, Role::Admin);
            }
            _ => panic!("expected create-user"),
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        let result = Cli::try_parse_from([
            "storefront",
            "create-user",
            "root",
            "root@example.com",
            "supersecret",
            "--role",
            "owner",
        ]);
        assert!(result.is_err());
    }
}
