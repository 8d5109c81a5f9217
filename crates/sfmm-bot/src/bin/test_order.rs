//! Place a single order and poll it until it closes.
//!
//! Example:
//! `test-order --venue TESTEX --stock FOOBAR --account EXB123456 --price 94.00 --qty 100 --side buy`

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use sfmm_client::client::{DEFAULT_BASE_URL, DEFAULT_GM_URL};
use sfmm_client::{ClientConfig, NewOrder, OrderService, StockfighterClient};
use sfmm_core::{OrderSide, OrderType, Price};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "Place one order and poll until it is no longer open")]
struct Args {
    #[arg(long)]
    venue: String,
    #[arg(long)]
    stock: String,
    #[arg(long)]
    account: String,
    /// Limit price in dollars, e.g. 94.50
    #[arg(long)]
    price: Price,
    #[arg(long)]
    qty: i64,
    /// buy or sell
    #[arg(long)]
    side: OrderSide,
    /// limit, market, fill-or-kill (fok) or immediate-or-cancel (ioc)
    #[arg(long, default_value = "limit")]
    order_type: OrderType,
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
    #[arg(long, default_value = "STOCKFIGHTER_API_KEY")]
    api_key_env: String,
    /// Status poll interval
    #[arg(long, default_value_t = 500)]
    poll_ms: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    sfmm_telemetry::init_logging()?;

    let client = StockfighterClient::new(ClientConfig::from_env(
        args.base_url.as_str(),
        DEFAULT_GM_URL,
        &args.api_key_env,
        Duration::from_secs(10),
    )?)?;

    let order = NewOrder {
        account: args.account,
        venue: args.venue,
        stock: args.stock,
        price: args.price,
        qty: args.qty,
        side: args.side,
        order_type: args.order_type,
    };

    let mut status = client.place_order(&order).await?;
    info!(order_id = %status.id, open = status.open, "Order accepted");

    while status.open {
        tokio::time::sleep(Duration::from_millis(args.poll_ms)).await;
        status = client
            .order_status(&order.venue, &order.stock, status.id)
            .await?;
        info!(
            order_id = %status.id,
            filled = status.total_filled,
            remaining = status.remaining(),
            "Polled order"
        );
    }

    info!(
        order_id = %status.id,
        filled = status.total_filled,
        fills = status.fills.len(),
        avg_price = %average_price(&status.fills),
        "Order closed"
    );
    Ok(())
}

fn average_price(fills: &[sfmm_core::Fill]) -> Price {
    let qty: i64 = fills.iter().map(|f| f.qty).sum();
    if qty == 0 {
        return Price::ZERO;
    }
    let notional: i64 = fills.iter().map(|f| f.price.notional(f.qty)).sum();
    Price(notional / qty)
}
