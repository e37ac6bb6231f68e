// ============================================================================
// Basic Usage Example
// ============================================================================

use lob_engine::prelude::*;
use rust_decimal::Decimal;

fn print_book(engine: &MatchingEngine, levels: usize) {
    let snapshot = engine.snapshot_with_depth(levels);

    println!("\n=== {} ORDER BOOK ===", snapshot.instrument);
    println!("{:>12}  |  {:<12}", "BIDS", "ASKS");
    for i in 0..levels {
        let bid = snapshot
            .bids
            .get(i)
            .map(|(price, qty)| format!("{}@{}", qty, price))
            .unwrap_or_default();
        let ask = snapshot
            .asks
            .get(i)
            .map(|(price, qty)| format!("{}@{}", qty, price))
            .unwrap_or_default();
        if bid.is_empty() && ask.is_empty() {
            break;
        }
        println!("{:>12}  |  {:<12}", bid, ask);
    }

    println!("Orders: {}", engine.total_orders());
    println!("Trades: {}", engine.total_trades());
    println!("Volume: {}", engine.total_volume());
    if let Some(spread) = snapshot.spread {
        println!("Spread: {}", spread);
    }
}

fn main() {
    let engine = MatchingEngine::with_defaults("ACME");

    println!("1. Adding initial limit orders...");
    engine.add_limit_order(Decimal::from(100), 500, Side::Buy);
    let mid_bid = engine.add_limit_order(Decimal::new(995, 1), 300, Side::Buy);
    engine.add_limit_order(Decimal::from(99), 200, Side::Buy);

    engine.add_limit_order(Decimal::from(101), 400, Side::Sell);
    engine.add_limit_order(Decimal::new(1015, 1), 250, Side::Sell);
    engine.add_limit_order(Decimal::from(102), 150, Side::Sell);

    print_book(&engine, 5);

    println!("\n2. Adding crossing limit order (Buy 250 @ 101.25)...");
    engine.add_limit_order(Decimal::new(10125, 2), 250, Side::Buy);
    print_book(&engine, 5);

    println!("\n3. Sending market order (Sell 150)...");
    let trades = engine.add_market_order(150, Side::Sell);
    for trade in &trades {
        println!(
            "  Trade #{}: {} @ {}",
            trade.trade_id, trade.quantity, trade.price
        );
    }
    print_book(&engine, 5);

    println!("\n4. Cancelling order {}...", mid_bid);
    if engine.cancel_order(mid_bid) {
        println!("  cancelled");
    } else {
        println!("  not found");
    }
    print_book(&engine, 5);

    println!("\n5. Market data queries...");
    if let Some(best_bid) = engine.best_bid() {
        println!("  Best bid: {}", best_bid);
    }
    if let Some(best_ask) = engine.best_ask() {
        println!("  Best ask: {}", best_ask);
    }
    if let Some(mid) = engine.mid_price() {
        println!("  Mid: {}", mid);
    }
    for level in 0..3 {
        println!(
            "  Depth L{}: {} bid / {} ask",
            level,
            engine.bid_depth_at_level(level),
            engine.ask_depth_at_level(level)
        );
    }
}
