//! membus walkthrough.
//!
//! Loads a bus config, wires a small order pipeline through an in-process
//! bus and drives every operation once: sync and async publish, sync and
//! async request, and handle disposal.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use clap::Parser;
use membus_core::{BusError, MemoryBus, load_bus_config};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "membus-demo", about = "Drive an in-process message bus end to end")]
struct Cli {
    /// Path to a TOML bus config. Defaults are used when it is missing.
    #[arg(long, env = "MEMBUS_CONFIG", default_value = "membus.toml")]
    config: PathBuf,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long)]
    otel: bool,

    /// Number of orders to place.
    #[arg(long, default_value_t = 3)]
    orders: u32,
}

#[derive(Debug, Clone)]
struct OrderPlaced {
    id: u32,
    amount_cents: u64,
}

#[derive(Debug, Clone)]
struct OrderShipped {
    id: u32,
}

#[derive(Debug)]
struct QuoteRequest {
    sku: String,
    quantity: u32,
}

#[derive(Debug)]
struct Quote {
    total_cents: u64,
}

#[derive(Debug)]
struct StockCheck {
    sku: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    membus_observe::init_tracing("membus-demo", cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing: {e}"))?;

    let config = load_bus_config(&cli.config).await;
    info!(bus = %config.name, "starting demo");
    let bus = Arc::new(MemoryBus::new(config));

    let revenue = Arc::new(AtomicU64::new(0));
    let ledger = Arc::clone(&revenue);
    bus.subscribe(move |order: &OrderPlaced| {
        ledger.fetch_add(order.amount_cents, Ordering::SeqCst);
        Ok(())
    })?;
    let audit = bus.subscribe(|order: &OrderPlaced| {
        info!(order = order.id, "audit saw order");
        Ok(())
    })?;
    bus.subscribe_filtered(
        |order: &OrderPlaced| {
            info!(order = order.id, cents = order.amount_cents, "large order flagged");
            Ok(())
        },
        |order: &OrderPlaced| order.amount_cents >= 10_000,
    )?;

    bus.subscribe_async(|shipped: OrderShipped| async move {
        info!(order = shipped.id, "notifying customer");
        Ok(())
    })?;

    bus.respond(|request: &QuoteRequest| {
        anyhow::ensure!(request.quantity > 0, "quantity must be positive");
        info!(sku = %request.sku, quantity = request.quantity, "quoting");
        Ok(Quote {
            total_cents: 2_500 * u64::from(request.quantity),
        })
    })?;
    bus.respond_async_filtered(
        |check: StockCheck| async move {
            info!(sku = %check.sku, "checking warehouse");
            Ok(true)
        },
        |check: &StockCheck| check.sku.starts_with("SKU-"),
    )?;

    for id in 1..=cli.orders {
        let quote: Quote = bus.request(&QuoteRequest {
            sku: format!("SKU-{id}"),
            quantity: id,
        })?;
        let in_stock: bool = bus
            .request_async(StockCheck {
                sku: format!("SKU-{id}"),
            })
            .await?;
        if !in_stock {
            continue;
        }

        bus.publish(&OrderPlaced {
            id,
            amount_cents: quote.total_cents,
        })?;
        bus.publish_async(OrderShipped { id }).await?;
    }

    audit.dispose();
    bus.publish(&OrderPlaced {
        id: 0,
        amount_cents: 1,
    })?;

    match bus.request::<StockCheck, bool>(&StockCheck {
        sku: "unknown".to_string(),
    }) {
        Err(BusError::NoResponders { .. }) => info!("sync stock checks are not served"),
        other => info!(?other, "unexpected stock check outcome"),
    }

    info!(revenue_cents = revenue.load(Ordering::SeqCst), "demo finished");
    bus.dispose();
    membus_observe::shutdown_tracing();
    Ok(())
}
