//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! # Log in with an email address or phone number
//! EDENSHOP_PASSWORD=secret eden login ana@example.com
//!
//! # Create an account
//! eden register --email ana@example.com --password secret --first-name Ana
//!
//! # Show the signed-in user (re-fetched from the backend with --refresh)
//! eden whoami --refresh
//!
//! eden logout
//! ```

use edenshop_storefront::api::{RegisterRequest, User};

use super::{App, CliError};

/// Log in and print the signed-in user.
///
/// # Errors
///
/// Returns the backend's rejection, e.g. invalid credentials.
pub async fn login(app: &App, identifier: &str, password: &str) -> Result<(), CliError> {
    let user = app.session.login(identifier, password).await?;
    print_user("Logged in as", &user);
    Ok(())
}

/// Register and print the new user.
///
/// # Errors
///
/// Returns a validation error if neither email nor phone is given, or the
/// backend's rejection.
pub async fn register(app: &App, fields: RegisterRequest) -> Result<(), CliError> {
    let user = app.session.register(fields).await?;
    print_user("Registered", &user);
    Ok(())
}

/// Log out. Always succeeds.
#[allow(clippy::print_stdout)]
pub async fn logout(app: &App) {
    app.session.logout().await;
    println!("Logged out");
}

/// Print the current identity, optionally re-fetching it first.
#[allow(clippy::print_stdout)]
pub async fn whoami(app: &App, refresh: bool) {
    if refresh && app.session.is_authenticated().await {
        app.session.refresh_user().await;
    }

    match app.session.snapshot().await.user {
        Some(user) => print_user("Signed in as", &user),
        None => println!("Not signed in"),
    }
}

#[allow(clippy::print_stdout)]
fn print_user(prefix: &str, user: &User) {
    println!("{prefix} {} ({}, {})", user.display_name(), user.id, user.role);
}
