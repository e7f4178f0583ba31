use log::{error, info, warn};

use solar_ledger::blockchain::timestamp_now;
use solar_ledger::sensor::{SensorSource, SimulatedSensor};
use solar_ledger::{Block, Ledger, LedgerConfig, MiningLimits, SharedLedger};

fn main() {
    env_logger::init();

    let config = LedgerConfig::from_env();
    println!(
        "☀️ Solar ledger demo (difficulty {}, attempt cap {:?})",
        config.difficulty, config.max_mining_attempts
    );

    let ledger = SharedLedger::new(Ledger::from_config(&config));

    let reference = [
        Block::new(1, "20/07/2017", "30609", true, 40.0, 10.0, 100),
        Block::new(2, "21/07/2017", "30609", true, 40.0, 23.0, 150),
        Block::new(3, "23/07/2017", "30609", true, 60.0, 12.0, 250),
    ];
    for block in reference {
        info!("Mining block {}...", block.index);
        if let Err(e) = ledger.add_block(block) {
            error!("block rejected: {e}");
        }
        info!("Is this chain valid? {}", ledger.is_chain_valid());
    }

    // One more producer reporting live readings, mined on a worker thread.
    let reading = SimulatedSensor::new().read();
    let live = Block::new(
        4,
        timestamp_now(),
        "30609",
        true,
        reading.temperature,
        reading.light,
        120,
    );
    let limits = MiningLimits {
        max_attempts: config.max_mining_attempts,
        cancel: None,
    };
    match ledger.submit_block(live, limits).join() {
        Ok(Ok(admission)) => info!("live block admitted as #{}", admission.index),
        Ok(Err(e)) => warn!("live block rejected: {e}"),
        Err(_) => error!("mining worker panicked"),
    }
    info!("Is this chain valid? {}", ledger.is_chain_valid());

    let price = ledger.calculate_price();
    info!("Solar price: {price}");
    let amount = u64::try_from(price).unwrap_or(0);

    for (n, (from, to)) in [(1, 2), (1, 3)].into_iter().enumerate() {
        info!("Balances before transaction #{}:", n + 1);
        ledger.log_balances();
        if let Err(e) = ledger.make_transaction(from, to, amount) {
            warn!("transaction #{} failed: {e}", n + 1);
        }
        info!("Balances after transaction #{}:", n + 1);
        ledger.log_balances();
    }

    match ledger.to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => error!("could not render chain: {e}"),
    }
}
