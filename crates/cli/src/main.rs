//! Shopfront CLI - cart, wishlist and checkout from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Start a session (password from STOREFRONT_PASSWORD, or piped in)
//! STOREFRONT_PASSWORD=... sf-cli login -e shopper@example.com
//! pass show shop | sf-cli login -e shopper@example.com --password-stdin
//!
//! # Add two of a product to the cart, then review it
//! sf-cli cart add classic-tee -q 2
//! sf-cli cart show
//!
//! # Save a product for later
//! sf-cli wishlist add canvas-tote
//!
//! # Price the cart with a promo code, then place the order
//! sf-cli checkout summary --promo WELCOME10
//! sf-cli checkout place --shipping-address 3
//!
//! # Review and cancel orders
//! sf-cli orders list
//! sf-cli orders cancel 12
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` - Manage the session
//! - `cart` - Show, add, update, remove, clear
//! - `wishlist` - Show, add, remove, clear
//! - `checkout` - Order summary for the current cart, place the order
//! - `orders` - List, show, cancel
//! - `product` - Look up a product by slug

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopfront_core::{AddressId, CartItemId, OrderId, ProductId};
use shopfront_storefront::config::StorefrontConfig;
use shopfront_storefront::state::AppState;

mod commands;

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(author, version, about = "Shopfront storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and load cart and wishlist
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Read the password from stdin instead of STOREFRONT_PASSWORD
        #[arg(long)]
        password_stdin: bool,
    },
    /// End the session
    Logout,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Price the cart and place the order
    Checkout {
        #[command(subcommand)]
        action: CheckoutAction,
    },
    /// Review past orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Look up a product by slug
    Product {
        /// Product slug
        slug: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// List cart lines and the total
    Show,
    /// Add a product by slug
    Add {
        /// Product slug
        slug: String,

        /// Units to add (1-10)
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity
    Update {
        /// Cart line id
        item: CartItemId,

        /// New quantity (1-10)
        quantity: u32,
    },
    /// Remove a line
    Remove {
        /// Cart line id
        item: CartItemId,
    },
    /// Remove every line
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// List saved products
    Show,
    /// Save a product by slug
    Add {
        /// Product slug
        slug: String,
    },
    /// Remove a saved product
    Remove {
        /// Product id
        product: ProductId,
    },
    /// Remove every saved product
    Clear,
}

#[derive(Subcommand)]
enum CheckoutAction {
    /// Show the order summary for the current cart
    Summary {
        /// Promo code to apply
        #[arg(long)]
        promo: Option<String>,
    },
    /// Place an order for the current cart and empty it
    Place {
        /// Saved address to ship to
        #[arg(long)]
        shipping_address: AddressId,

        /// Saved address to bill (defaults to the shipping address)
        #[arg(long)]
        billing_address: Option<AddressId>,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// List past orders, newest first
    List {
        /// Page to show
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        /// Orders per page
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=100))]
        limit: u32,
    },
    /// Show an order with its lines
    Show {
        /// Order id
        order: OrderId,
    },
    /// Cancel an order that has not shipped
    Cancel {
        /// Order id
        order: OrderId,
    },
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

    Some(guard)
}

/// Warnings and errors become Sentry events, info and debug breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopfront_storefront=info,shopfront_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::open(config)?;

    match cli.command {
        Commands::Login {
            email,
            password_stdin,
        } => {
            let password = commands::session::read_password(password_stdin)?;
            commands::session::login(&state, &email, &password).await?;
        }
        Commands::Logout => commands::session::logout(&state),
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state).await?,
            CartAction::Add { slug, quantity } => {
                commands::cart::add(&state, &slug, quantity).await?;
            }
            CartAction::Update { item, quantity } => {
                commands::cart::update(&state, item, quantity).await?;
            }
            CartAction::Remove { item } => commands::cart::remove(&state, item).await?,
            CartAction::Clear => commands::cart::clear(&state).await?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show(&state).await?,
            WishlistAction::Add { slug } => commands::wishlist::add(&state, &slug).await?,
            WishlistAction::Remove { product } => {
                commands::wishlist::remove(&state, product).await?;
            }
            WishlistAction::Clear => commands::wishlist::clear(&state).await?,
        },
        Commands::Checkout { action } => match action {
            CheckoutAction::Summary { promo } => {
                commands::checkout::summary(&state, promo.as_deref()).await?;
            }
            CheckoutAction::Place {
                shipping_address,
                billing_address,
            } => commands::checkout::place(&state, shipping_address, billing_address).await?,
        },
        Commands::Orders { action } => match action {
            OrderAction::List { page, limit } => {
                commands::orders::list(&state, page, limit).await?;
            }
            OrderAction::Show { order } => commands::orders::show(&state, order).await?,
            OrderAction::Cancel { order } => commands::orders::cancel(&state, order).await?,
        },
        Commands::Product { slug } => commands::product::show(&state, &slug).await?,
    }
    Ok(())
}
