//! Souk CLI - Storefront and back office from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! souk products list --category electronics
//! souk products show 3
//!
//! # Manage the persisted cart
//! souk cart add 3 -q 2
//! souk cart update 3 5
//! souk cart show
//!
//! # Place a cash-on-delivery order
//! souk checkout --name "Jane Doe" --email jane@example.com --address "1 Main St"
//!
//! # Back office (password from SOUK_ADMIN_PASSWORD)
//! souk admin login -u admin
//! souk admin dashboard
//! ```
//!
//! # Commands
//!
//! - `products` - Browse the catalog
//! - `cart` - Inspect and change the cart
//! - `checkout` - Submit the cart as an order
//! - `admin` - Back-office session, listings and product management

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use souk_admin::{AdminClient, AdminConfig, AdminError};
use souk_storefront::{ApiClient, CartStore, FileStorage, StorageArea, StorefrontConfig};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "souk")]
#[command(author, version, about = "Souk storefront and back-office CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Inspect and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Submit the cart as a cash-on-delivery order
    Checkout {
        /// Full name for delivery
        #[arg(long)]
        name: String,

        /// Contact email
        #[arg(long)]
        email: String,

        /// Delivery address
        #[arg(long)]
        address: String,
    },
    /// Back-office operations
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products, optionally filtered by category
    List {
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one product
    Show { id: String },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and total
    Show,
    /// Add a product from the catalog
    Add {
        id: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product
    Remove { id: String },
    /// Set a product's quantity (0 or less removes it)
    Update {
        id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Log in with the password from `SOUK_ADMIN_PASSWORD`
    Login {
        /// Admin username (defaults to `SOUK_ADMIN_USERNAME` or `admin`)
        #[arg(short, long)]
        username: Option<String>,
    },
    /// End the admin session
    Logout,
    /// Product, order and user counts
    Dashboard,
    /// List all products
    Products,
    /// List all orders
    Orders,
    /// List all users
    Users,
    /// Create a product
    AddProduct(ProductArgs),
    /// Replace a product's fields
    UpdateProduct {
        id: String,
        #[command(flatten)]
        product: ProductArgs,
    },
    /// Delete a product
    DeleteProduct { id: String },
}

/// Product form fields shared by create and update.
#[derive(clap::Args)]
struct ProductArgs {
    #[arg(long)]
    title: String,

    #[arg(long, default_value = "")]
    description: String,

    #[arg(long)]
    price: Decimal,

    #[arg(long)]
    category: String,

    /// Image file to upload
    #[arg(long)]
    image: Option<PathBuf>,
}

/// Any failure surfaced by a command.
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Storefront(#[from] souk_storefront::error::Error),

    #[error(transparent)]
    Admin(#[from] AdminError),
}

impl CliError {
    fn report(&self) {
        match self {
            Self::Storefront(e) => e.report(),
            Self::Admin(e) => e.report(),
        }
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AdminConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::from(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config.storefront);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "souk_cli=info,souk_storefront=info,souk_admin=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &AdminConfig) -> Result<(), CliError> {
    let storage: Arc<dyn StorageArea> = Arc::new(
        FileStorage::open(config.storefront.data_dir.clone())
            .map_err(souk_storefront::error::Error::from)?,
    );

    match cli.command {
        Commands::Products { action } => {
            let api = api_client(&config.storefront)?;
            match action {
                ProductsAction::List { category } => {
                    commands::products::list(&api, category.as_deref()).await?;
                }
                ProductsAction::Show { id } => commands::products::show(&api, &id).await?,
            }
        }
        Commands::Cart { action } => {
            let cart = CartStore::load(storage);
            let badge = commands::cart::attach_badge(&cart);
            let result = run_cart(action, &cart, &config.storefront).await;
            badge.unsubscribe();
            result?;
        }
        Commands::Checkout {
            name,
            email,
            address,
        } => {
            let api = api_client(&config.storefront)?;
            let cart = CartStore::load(storage);
            commands::checkout::place(cart, api, &name, &email, &address).await?;
        }
        Commands::Admin { action } => {
            let admin = AdminClient::new(&config.storefront, storage)?;
            run_admin(action, &admin, config).await?;
        }
    }
    Ok(())
}

async fn run_cart(
    action: CartAction,
    cart: &CartStore,
    config: &StorefrontConfig,
) -> Result<(), CliError> {
    match action {
        CartAction::Show => commands::cart::show(cart),
        CartAction::Add { id, quantity } => {
            let api = api_client(config)?;
            commands::cart::add(cart, &api, &id, quantity).await?;
        }
        CartAction::Remove { id } => commands::cart::remove(cart, &id)?,
        CartAction::Update { id, quantity } => commands::cart::update(cart, &id, quantity)?,
        CartAction::Clear => commands::cart::clear(cart)?,
    }
    Ok(())
}

async fn run_admin(
    action: AdminAction,
    admin: &AdminClient,
    config: &AdminConfig,
) -> Result<(), CliError> {
    let action = match action {
        AdminAction::Login { username } => {
            let username = username.unwrap_or_else(|| config.username.clone());
            commands::admin::login(admin, &username, config).await?;
            return Ok(());
        }
        AdminAction::Logout => {
            admin.logout().await?;
            return Ok(());
        }
        other => other,
    };

    if !admin.restore_session().await? {
        return Err(AdminError::NotLoggedIn.into());
    }

    match action {
        AdminAction::Dashboard => commands::admin::dashboard(admin).await?,
        AdminAction::Products => commands::admin::products(admin).await?,
        AdminAction::Orders => commands::admin::orders(admin).await?,
        AdminAction::Users => commands::admin::users(admin).await?,
        AdminAction::AddProduct(product) => {
            let form = product.into_form().await?;
            commands::admin::add_product(admin, &form).await?;
        }
        AdminAction::UpdateProduct { id, product } => {
            let form = product.into_form().await?;
            commands::admin::update_product(admin, &id, &form).await?;
        }
        AdminAction::DeleteProduct { id } => commands::admin::delete_product(admin, &id).await?,
        AdminAction::Login { .. } | AdminAction::Logout => {}
    }
    Ok(())
}

fn api_client(config: &StorefrontConfig) -> Result<ApiClient, CliError> {
    ApiClient::new(config).map_err(|e| CliError::Storefront(e.into()))
}

impl ProductArgs {
    async fn into_form(self) -> Result<souk_admin::ProductForm, AdminError> {
        let image = match &self.image {
            Some(path) => Some(souk_admin::ImageUpload::from_path(path).await?),
            None => None,
        };
        Ok(souk_admin::ProductForm {
            title: self.title,
            description: self.description,
            price: self.price,
            category: self.category,
            image,
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_negative_update_quantity_parses() {
        let cli = Cli::try_parse_from(["souk", "cart", "update", "3", "-2"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Cart {
                action: CartAction::Update { quantity: -2, .. }
            })
        ));
    }
}
