//! Account management commands for operators

use anyhow::Context;

use crate::config::Config;
use crate::domain::Role;
use crate::services::Registration;
use crate::state::SharedState;

/// Creates an account with any role, admins included.
pub async fn cmd_create_user(
    config: Config,
    username: String,
    email: String,
    password: String,
    role: Role,
) -> anyhow::Result<()> {
    let shared = SharedState::new(config).await?;

    let registration = Registration {
        username,
        email,
        password,
        role: Some(role),
        fullname: None,
        phone: None,
        address: None,
    };

    let user = shared
        .user_service
        .create_account(registration)
        .await
        .context("Failed to create user")?;

    println!("Created {} account", user.role);
    println!("  ID: {} | Username: {} | Email: {}", user.id, user.username, user.email);

    Ok(())
}

pub async fn cmd_list_users(config: &Config) -> anyhow::Result<()> {
    let shared = SharedState::new(config.clone()).await?;
    let users = shared.store.list_users().await?;

    if users.is_empty() {
        println!("No accounts yet.");
        println!();
        println!("Create one with: storefront create-user <username> <email> <password> --role admin");
        return Ok(());
    }

    println!("Accounts ({} total)", users.len());
    println!("{:-<70}", "");

    for user in users {
        let state = if user.is_active { "active" } else { "disabled" };
        println!("{:>5}  {:<20} {:<30} {:<7} {}", user.id, user.username, user.email, user.role, state);
    }

    Ok(())
}
