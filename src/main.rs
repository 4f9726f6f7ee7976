//! Storefront command-line client
//!
//! Browses a storefront catalog API from the terminal: list and search
//! products, inspect one product and add it to the cart.
//!
//! # Configuration
//!
//! Settings come from `storefront.yaml` (or the file named by
//! `STOREFRONT_CONFIG`) and environment variables:
//! - `STOREFRONT_API_URL`: catalog API base URL (default: http://localhost:3000/api)
//! - `STOREFRONT_STORE`: `memory`, `file` or `redis` (default: file)
//! - `CACHE_PATH`: cache directory for the `file` store
//! - `REDIS_URL`: Redis connection string for the `redis` store
//! - `RUST_LOG`: logging level (default: warn)
//! - `LOG_FORMAT`: `text` or `json`
//!
//! # Quick Start
//!
//! ```bash
//! export STOREFRONT_API_URL="https://shop.example.test/api"
//! storefront list --search samsung --sort price-asc
//! storefront show ZmGrkLRPXOTpxsU4jjAcv
//! storefront add ZmGrkLRPXOTpxsU4jjAcv --color 1000 --storage 2000
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::sync::Arc;
use storefront_client::application::{
    spec_rows, AlertQueue, CacheService, CartService, CatalogService, ProductDetailsFlow,
    ProductListFlow, ViewLifecycle,
};
use storefront_client::config::{StorageBackend, StorageConfig, StorefrontConfig};
use storefront_client::domain::{Alert, AlertKind, KeyValueStore, SortMode, SystemClock};
use storefront_client::infrastructure::{CatalogClient, LocalFileStore, MemoryStore, RedisStore};
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[clap(name = "storefront", version, about = "Browse a storefront catalog from the terminal")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List products
    List {
        /// Case-insensitive match against brand and model
        #[clap(long)]
        search: Option<String>,

        /// featured, price-asc, price-desc or brand
        #[clap(long, default_value = "featured")]
        sort: SortMode,

        /// Bypass the local cache
        #[clap(long)]
        refresh: bool,

        /// Output the view model as JSON
        #[clap(long)]
        json: bool,
    },

    /// Show the details of one product
    Show {
        /// Product id
        id: String,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Add a product to the cart
    Add {
        /// Product id
        id: String,

        /// Color option code (defaults to the first option)
        #[clap(long)]
        color: Option<String>,

        /// Storage option code (defaults to the first option)
        #[clap(long)]
        storage: Option<String>,
    },

    /// Show the number of items in the cart
    Cart,
}

/// Wired application services
struct Services {
    catalog: Arc<CatalogService>,
    cart: Arc<CartService>,
    alerts: AlertQueue,
    list_limit: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
    );

    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let cli = Cli::parse();
    let config = StorefrontConfig::from_env()?;
    tracing::info!("Using catalog API at {}", config.api.base_url);

    // Infrastructure
    let client = Arc::new(
        CatalogClient::new(&config.api.base_url, config.api.timeout())
            .context("Failed to initialize catalog API client")?,
    );
    let store = build_store(&config.storage);

    // Application
    let cache = Arc::new(CacheService::with_system_clock(store.clone()));
    let catalog = Arc::new(CatalogService::new(cache, client.clone()));
    let cart = Arc::new(CartService::load(client, store).await);
    let alerts = AlertQueue::with_settings(Arc::new(SystemClock), config.alerts.default_duration_ms);

    let printer_lifecycle = ViewLifecycle::new();
    let printer = spawn_alert_printer(alerts.clone(), printer_lifecycle.clone());

    let services = Services {
        catalog,
        cart,
        alerts,
        list_limit: config.catalog.list_limit,
    };
    let result = run(cli.command, &services).await;

    printer_lifecycle.teardown();
    if let Err(e) = printer.await {
        tracing::warn!("Alert printer stopped unexpectedly: {}", e);
    }
    result
}

fn build_store(config: &StorageConfig) -> Arc<dyn KeyValueStore> {
    tracing::info!("Using {} storage backend", config.backend);
    match config.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::File => Arc::new(LocalFileStore::new(&config.path)),
        StorageBackend::Redis => Arc::new(RedisStore::new(config.redis_url.clone())),
    }
}

async fn run(command: Command, services: &Services) -> anyhow::Result<()> {
    match command {
        Command::List {
            search,
            sort,
            refresh,
            json,
        } => {
            let flow = ProductListFlow::new(
                services.catalog.clone(),
                services.alerts.clone(),
                services.list_limit,
            );
            if refresh {
                flow.refresh().await?;
            } else {
                flow.load().await?;
            }
            if let Some(term) = search {
                flow.set_search_term(term.trim());
            }
            flow.set_sort(sort);

            let state = flow.state();
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                println!(
                    "{} products from {} brands, showing {} of {} matches ({})",
                    state.stats.total,
                    state.stats.brands,
                    state.visible.len(),
                    state.filtered_count,
                    state.sort.label()
                );
                for product in &state.visible {
                    println!(
                        "{:<24} {:<12} {:<28} {}",
                        product.id,
                        product.brand,
                        product.model,
                        product.price.as_deref().map(|p| format!("{} EUR", p)).unwrap_or_default()
                    );
                }
            }
            flow.teardown();
        }

        Command::Show { id, json } => {
            let flow = ProductDetailsFlow::new(
                services.catalog.clone(),
                services.cart.clone(),
                services.alerts.clone(),
            );
            flow.load(&id).await?;
            let state = flow.state();
            let Some(detail) = state.detail.as_ref() else {
                anyhow::bail!("Product {} was not loaded", id);
            };

            if json {
                println!("{}", serde_json::to_string_pretty(detail)?);
            } else {
                println!("{} {}", detail.brand, detail.model);
                if let Some(price) = &detail.price {
                    println!("Price: {} EUR", price);
                }
                for row in spec_rows(detail) {
                    println!("  {:<20} {}", row.label, row.value);
                }
                for (label, options) in [
                    ("Colors", state.color_options()),
                    ("Storage", state.storage_options()),
                ] {
                    let rendered: Vec<String> = options
                        .iter()
                        .map(|o| format!("{} ({})", o.name, o.code))
                        .collect();
                    println!("{}: {}", label, rendered.join(", "));
                }
            }
            flow.teardown();
        }

        Command::Add { id, color, storage } => {
            let flow = ProductDetailsFlow::new(
                services.catalog.clone(),
                services.cart.clone(),
                services.alerts.clone(),
            );
            flow.load(&id).await?;
            if let Some(color) = color {
                flow.select_color(color);
            }
            if let Some(storage) = storage {
                flow.select_storage(storage);
            }
            let response = flow.submit().await?;
            println!("Cart now holds {} items", response.count);
            flow.teardown();
        }

        Command::Cart => {
            println!("{}", services.cart.count());
        }
    }
    Ok(())
}

/// Print every new alert to stderr until `lifecycle` is torn down, then
/// flush whatever arrived in the meantime.
fn spawn_alert_printer(alerts: AlertQueue, lifecycle: ViewLifecycle) -> JoinHandle<()> {
    let mut rx = alerts.subscribe();
    tokio::spawn(async move {
        let mut seen = HashSet::new();
        loop {
            tokio::select! {
                biased;
                _ = lifecycle.torn_down() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = rx.borrow_and_update().clone();
                    print_new_alerts(&snapshot, &mut seen);
                }
            }
        }
        print_new_alerts(&alerts.snapshot(), &mut seen);
    })
}

fn print_new_alerts(alerts: &[Alert], seen: &mut HashSet<String>) {
    for alert in alerts {
        if seen.insert(alert.id.clone()) {
            let tag = match alert.kind {
                AlertKind::Info => "info",
                AlertKind::Success => "ok",
                AlertKind::Error => "error",
            };
            eprintln!("[{}] {}", tag, alert.message);
        }
    }
}
