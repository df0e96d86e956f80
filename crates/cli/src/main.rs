//! FreshCart CLI - drive the storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in; the session is kept under FRESHCART_STATE_DIR
//! freshcart login -e a@b.com -p 'Aa1@aaaa'
//!
//! # Browse and fill the cart
//! freshcart products search shawl
//! freshcart cart add 6428ebc6dc1175abc65ca0b9 --quantity 2
//!
//! # Place a cash-on-delivery order
//! freshcart checkout --details "12 Tahrir Street" --phone 01012345678 --city Cairo --payment cash
//! ```
//!
//! Failures print a user-facing message and exit with status 1. Logs go to
//! stderr; set `RUST_LOG` to change the level.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use freshcart_core::PaymentMethod;
use freshcart_storefront::config::ClientConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "freshcart")]
#[command(author, version, about = "FreshCart storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and keep the session
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Sign out and wipe the stored session
    Logout,
    /// Create an account
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Password confirmation
        #[arg(long)]
        re_password: String,

        /// Egyptian mobile number (01[0125]XXXXXXXX)
        #[arg(long)]
        phone: String,
    },
    /// Show the signed-in user
    Whoami,
    /// Manage the profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Recover a forgotten password
    Password {
        #[command(subcommand)]
        action: PasswordAction,
    },
    /// Browse products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// List categories
    Categories {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// List the subcategories of a category
    Subcategories { category_id: String },
    /// List brands
    Brands {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
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
    /// Place an order for the current cart
    Checkout {
        /// Street address, at least 10 characters
        #[arg(long)]
        details: String,

        #[arg(long)]
        phone: String,

        #[arg(long)]
        city: String,

        /// `cash` or `card`
        #[arg(long, default_value = "card")]
        payment: PaymentMethod,
    },
    /// Browse past orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Update name, email and phone
    Update {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(long)]
        phone: String,
    },
}

#[derive(Subcommand)]
enum PasswordAction {
    /// Email a reset code
    Forgot {
        #[arg(short, long)]
        email: String,
    },
    /// Check a reset code
    Verify {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        code: String,
    },
    /// Set a new password
    Reset {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        code: String,

        #[arg(long)]
        new_password: String,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List one page of products
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show one product
    Show { id: String },
    /// Search products by title
    Search { query: String },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        id: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity; below 1 is ignored
    Update {
        id: String,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove { id: String },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show the wishlist
    Show,
    /// Save a product
    Add { id: String },
    /// Drop a product
    Remove { id: String },
    /// Save or drop a product
    Toggle { id: String },
    /// Drop every product
    Clear,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List your orders
    List,
    /// Show one order
    Show { id: String },
}

impl Commands {
    /// Whether the command reads the persisted session.
    const fn needs_session(&self) -> bool {
        !matches!(
            self,
            Self::Register { .. }
                | Self::Password { .. }
                | Self::Products { .. }
                | Self::Categories { .. }
                | Self::Subcategories { .. }
                | Self::Brands { .. }
        )
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
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
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "freshcart_storefront=info,freshcart_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => exit_with(&CliError::from(e)),
    };

    // Sentry must be initialised before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, config).await {
        tracing::debug!(error = %e, "Command failed");
        exit_with(&e);
    }
}

#[allow(clippy::print_stderr)]
fn exit_with(error: &CliError) -> ! {
    eprintln!("Error: {}", error.user_message());
    std::process::exit(1);
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), CliError> {
    let storefront = commands::open_storefront(config)?;
    if cli.command.needs_session() {
        storefront.start().await?;
    }

    match cli.command {
        Commands::Login { email, password } => {
            commands::account::login(&storefront, &email, &password).await?;
        }
        Commands::Logout => commands::account::logout(&storefront),
        Commands::Register {
            name,
            email,
            password,
            re_password,
            phone,
        } => {
            let form = freshcart_storefront::forms::RegistrationForm {
                name,
                email,
                password,
                re_password,
                phone,
            };
            commands::account::register(&storefront, &form).await?;
        }
        Commands::Whoami => commands::account::whoami(&storefront).await?,
        Commands::Profile { action } => match action {
            ProfileAction::Update { name, email, phone } => {
                commands::account::update_profile(&storefront, &name, &email, &phone).await?;
            }
        },
        Commands::Password { action } => match action {
            PasswordAction::Forgot { email } => {
                commands::account::forgot_password(&storefront, &email).await?;
            }
            PasswordAction::Verify { email, code } => {
                commands::account::verify_reset_code(&storefront, &email, &code).await?;
            }
            PasswordAction::Reset {
                email,
                code,
                new_password,
            } => {
                commands::account::reset_password(&storefront, &email, &code, &new_password)
                    .await?;
            }
        },
        Commands::Products { action } => match action {
            ProductsAction::List { page } => commands::catalog::products(&storefront, page).await?,
            ProductsAction::Show { id } => commands::catalog::product(&storefront, &id).await?,
            ProductsAction::Search { query } => {
                commands::catalog::search(&storefront, &query).await?;
            }
        },
        Commands::Categories { page } => commands::catalog::categories(&storefront, page).await?,
        Commands::Subcategories { category_id } => {
            commands::catalog::subcategories(&storefront, &category_id).await?;
        }
        Commands::Brands { page } => commands::catalog::brands(&storefront, page).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&storefront),
            CartAction::Add { id, quantity } => {
                commands::cart::add(&storefront, &id, quantity).await?;
            }
            CartAction::Update { id, quantity } => {
                commands::cart::update(&storefront, &id, quantity).await?;
            }
            CartAction::Remove { id } => commands::cart::remove(&storefront, &id).await?,
            CartAction::Clear => commands::cart::clear(&storefront).await?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show(&storefront),
            WishlistAction::Add { id } => commands::wishlist::add(&storefront, &id).await?,
            WishlistAction::Remove { id } => commands::wishlist::remove(&storefront, &id).await?,
            WishlistAction::Toggle { id } => commands::wishlist::toggle(&storefront, &id).await?,
            WishlistAction::Clear => commands::wishlist::clear(&storefront).await?,
        },
        Commands::Checkout {
            details,
            phone,
            city,
            payment,
        } => {
            let form = freshcart_storefront::forms::AddressForm {
                details,
                phone,
                city,
            };
            commands::orders::checkout(&storefront, &form, payment).await?;
        }
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&storefront).await?,
            OrdersAction::Show { id } => commands::orders::show(&storefront, &id).await?,
        },
    }

    storefront.shutdown();
    Ok(())
}
