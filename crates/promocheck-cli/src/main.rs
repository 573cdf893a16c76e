mod validate;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use promocheck_core::{AppConfig, StorefrontCatalog};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "promocheck-cli")]
#[command(about = "Check whether a promo code lowers a storefront cart total")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one validation in a real browser and print the result as JSON
    Validate {
        /// Storefront home URL; only its origin is used to reach the cart
        #[arg(long)]
        store_url: String,
        /// Product page to add to the cart
        #[arg(long)]
        product_url: String,
        /// Promo code to apply
        #[arg(long)]
        code: String,
        /// Storefront profile name (defaults to `PROMOCHECK_DEFAULT_STOREFRONT`)
        #[arg(long)]
        storefront: Option<String>,
    },
    /// List the loaded storefront profiles
    Storefronts,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let config = promocheck_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // stdout carries the JSON result, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let storefronts = load_storefronts(&config)?;

    match cli.command {
        Commands::Validate {
            store_url,
            product_url,
            code,
            storefront,
        } => {
            let args = validate::ValidateArgs {
                store_url,
                product_url,
                code,
                storefront,
            };
            validate::run_validate(&config, storefronts, &args).await
        }
        Commands::Storefronts => {
            print!("{}", storefront_listing(&storefronts));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_storefronts(config: &AppConfig) -> anyhow::Result<StorefrontCatalog> {
    Ok(StorefrontCatalog::load(
        &config.storefronts_path,
        &config.default_storefront,
    )?)
}

/// One line per profile: name, cart path, and a `(default)` marker.
fn storefront_listing(catalog: &StorefrontCatalog) -> String {
    catalog
        .profiles()
        .map(|profile| {
            let marker = if profile.name.eq_ignore_ascii_case(catalog.default_name()) {
                " (default)"
            } else {
                ""
            };
            format!("{}\t{}{marker}\n", profile.name, profile.cart_path)
        })
        .collect()
}
