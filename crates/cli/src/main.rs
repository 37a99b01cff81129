//! Eden Shop CLI - storefront session, cart, and catalog from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password from --password or EDENSHOP_PASSWORD)
//! eden login ana@example.com --password secret
//!
//! # Work with the cart (as a guest when not logged in)
//! eden cart add p-123 --quantity 2 --catalog products.json
//! eden cart show
//!
//! # Browse a saved product list
//! eden catalog products.json --search humus --sort price-low
//! ```
//!
//! # Environment Variables
//!
//! - `EDENSHOP_API_URL` - Backend origin (default: `http://localhost:8080`)
//! - `EDENSHOP_STATE_DIR` - Where session and cart state are kept (default: `.edenshop`)
//! - `EDENSHOP_LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `RUST_LOG` - Log filter (default: `edenshop_cli=info,edenshop_storefront=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use edenshop_core::Price;
use edenshop_storefront::api::RegisterRequest;
use edenshop_storefront::catalog::{DEFAULT_PAGE_SIZE, ProductFilter, SortKey};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{App, CliError};

#[derive(Parser)]
#[command(name = "eden")]
#[command(author, version, about = "Eden Shop storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Store(StoreCommand),
    /// Filter and sort a JSON product list
    Catalog {
        /// File holding an array of products
        file: PathBuf,

        /// Match against title or description (case-insensitive)
        #[arg(short, long, default_value = "")]
        search: String,

        /// Exact category name
        #[arg(short, long, default_value = "")]
        category: String,

        #[arg(long, default_value = "0")]
        min_price: Decimal,

        #[arg(long, default_value = "1000")]
        max_price: Decimal,

        /// `name`, `price-low`, `price-high`, or `newest`
        #[arg(long, default_value = "name")]
        sort: SortKey,

        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
    },
}

/// Commands that talk to the backend through the session and cart stores.
#[derive(Subcommand)]
enum StoreCommand {
    /// Log in with an email address or phone number
    Login {
        /// Email address or phone number
        identifier: String,

        #[arg(short, long, env = "EDENSHOP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in as it
    Register {
        #[arg(short, long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(short, long, env = "EDENSHOP_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,
    },
    /// Forget the current session
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Re-fetch the profile from the backend first
        #[arg(long)]
        refresh: bool,
    },
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product from a product list file
    Add {
        product_id: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Product list used to look up price and stock
        #[arg(long, env = "EDENSHOP_CATALOG_FILE")]
        catalog: PathBuf,
    },
    /// Change a line's quantity
    Update { item_id: String, quantity: u32 },
    /// Remove a line
    Remove { item_id: String },
    /// Remove everything
    Clear,
}

/// Send logs to stderr so command output stays clean on stdout.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "edenshop_cli=info,edenshop_storefront=info".into());

    let json = std::env::var("EDENSHOP_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    // Load .env before reading the log format
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Catalog browsing is offline; skip wiring the stores.
        Commands::Catalog {
            file,
            search,
            category,
            min_price,
            max_price,
            sort,
            page,
            page_size,
        } => {
            let filter = ProductFilter {
                search,
                category,
                min_price: Price::new(min_price),
                max_price: Price::new(max_price),
            };
            commands::catalog::list(&file, &filter, sort, page, page_size)
        }
        Commands::Store(command) => {
            let app = App::init().await?;
            run_with_app(&app, command).await
        }
    }
}

async fn run_with_app(app: &App, command: StoreCommand) -> Result<(), CliError> {
    match command {
        StoreCommand::Login {
            identifier,
            password,
        } => commands::auth::login(app, &identifier, &password).await?,
        StoreCommand::Register {
            email,
            phone,
            password,
            first_name,
            last_name,
        } => {
            let fields = RegisterRequest {
                email,
                phone,
                password,
                first_name,
                last_name,
            };
            commands::auth::register(app, fields).await?;
        }
        StoreCommand::Logout => commands::auth::logout(app).await,
        StoreCommand::Whoami { refresh } => commands::auth::whoami(app, refresh).await,
        StoreCommand::Cart { action } => match action {
            CartAction::Show => commands::cart::show(app).await?,
            CartAction::Add {
                product_id,
                quantity,
                catalog,
            } => commands::cart::add(app, &catalog, &product_id, quantity).await?,
            CartAction::Update { item_id, quantity } => {
                commands::cart::update(app, &item_id, quantity).await?;
            }
            CartAction::Remove { item_id } => commands::cart::remove(app, &item_id).await?,
            CartAction::Clear => commands::cart::clear(app).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cart_add() {
        let cli = Cli::try_parse_from([
            "eden", "cart", "add", "p-1", "-q", "3", "--catalog", "products.json",
        ])
        .unwrap();
        let Commands::Store(StoreCommand::Cart {
            action:
                CartAction::Add {
                    product_id,
                    quantity,
                    catalog,
                },
        }) = cli.command
        else {
            panic!("expected cart add");
        };
        assert_eq!(product_id, "p-1");
        assert_eq!(quantity, 3);
        assert_eq!(catalog, PathBuf::from("products.json"));
    }

    #[test]
    fn test_parse_catalog_defaults() {
        let cli = Cli::try_parse_from(["eden", "catalog", "products.json", "--sort", "newest"])
            .unwrap();
        let Commands::Catalog {
            sort,
            min_price,
            max_price,
            page,
            ..
        } = cli.command
        else {
            panic!("expected catalog");
        };
        assert_eq!(sort, SortKey::Newest);
        assert_eq!(min_price, Decimal::ZERO);
        assert_eq!(max_price, Decimal::ONE_THOUSAND);
        assert_eq!(page, 1);
    }

    #[test]
    fn test_store_commands_stay_top_level() {
        let cli = Cli::try_parse_from(["eden", "logout"]).unwrap();
        assert!(matches!(cli.command, Commands::Store(StoreCommand::Logout)));

        let cli = Cli::try_parse_from(["eden", "whoami", "--refresh"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Store(StoreCommand::Whoami { refresh: true })
        ));

        let cli = Cli::try_parse_from(["eden", "catalog", "p.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Catalog { .. }));
    }

    #[test]
    fn test_parse_rejects_unknown_sort() {
        assert!(Cli::try_parse_from(["eden", "catalog", "p.json", "--sort", "cheapest"]).is_err());
    }
}
