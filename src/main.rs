//! Privacy Pool Demo
//!
//! Runs one full lifecycle against a fresh pool: shield, scan, private
//! transfer, unshield, then prints the pool statistics.
//!
//! Environment:
//! - `POOL_PARAMS`: JSON params file (defaults to `ulight` enabled)
//! - `POOL_DB_PATH`: RocksDB directory; in-memory store when unset

use std::env;

use anyhow::{Context, Result};
use privacy_pool_ledger::database::KvStore;
use privacy_pool_ledger::privacy::LogEventSink;
use privacy_pool_ledger::{
    build_private_transfer, build_shield, build_unshield, BlockContext, Coin, DBConfig,
    DatabaseManager, MemoryBank, MemoryStore, NoteScanner, PoolParams, PrivacyPool, StealthKeyPair,
};

const AUTHORITY: &str = "light1pg9q5zs2pg9q5zs2pg9q5zs2pg9q5zs2n7qz7p";
const SENDER: &str = "light1qyqszqgpqyqszqgpqyqszqgpqyqszqgpdjnkkj";
const RECIPIENT: &str = "light1zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg37u92fp";

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let params = match env::var("POOL_PARAMS") {
        Ok(path) => PoolParams::from_json_file(&path)
            .with_context(|| format!("failed to load params from {}", path))?,
        Err(_) => PoolParams::enabled_for(&["ulight"]),
    };

    println!("Privacy Pool Demo");
    println!("=================");

    match env::var("POOL_DB_PATH") {
        Ok(path) => {
            println!("Store: RocksDB at {}", path);
            let db = DatabaseManager::open(DBConfig::at(&path))?;
            run(db, params)
        }
        Err(_) => {
            println!("Store: in-memory");
            run(MemoryStore::new(), params)
        }
    }
}

fn run<S: KvStore>(store: S, params: PoolParams) -> Result<()> {
    let denom = params
        .allowed_denoms
        .first()
        .cloned()
        .context("params allow no denominations")?;

    let mut pool = PrivacyPool::new(store, MemoryBank::new("light"), LogEventSink, AUTHORITY)?;
    pool.init_params(params)?;
    pool.bank().fund(SENDER, &Coin::new(&denom, 1_000))?;

    let alice = StealthKeyPair::generate();
    let bob = StealthKeyPair::generate();
    let mut height = 0u64;
    let mut next_ctx = |tag: &str| {
        height += 1;
        BlockContext::from_tx_bytes(height, format!("{}-{}", tag, height).as_bytes())
    };

    println!("\nStep 1: shield 300 {} to alice", denom);
    let shield = build_shield(SENDER, Coin::new(&denom, 300), &alice.public_keys())?;
    let response = pool.shield(&next_ctx("shield"), shield)?;
    println!("  deposit index {}", response.deposit_index);

    println!("\nStep 2: alice scans the pool");
    let alice_scanner = NoteScanner::new(alice);
    let owned: Vec<_> = alice_scanner
        .scan_pool(&pool.queries(), &denom)?
        .into_iter()
        .filter(|d| !d.spent)
        .collect();
    for d in &owned {
        println!("  owns deposit {} worth {}", d.index, d.amount);
    }
    let total: u64 = owned.iter().map(|d| d.amount).sum();

    println!("\nStep 3: alice sends 200 to bob and keeps the change");
    let transfer = build_private_transfer(
        SENDER,
        &denom,
        &owned,
        &[
            (bob.public_keys(), 200),
            (alice_scanner.keys().public_keys(), total - 200),
        ],
    )?;
    let response = pool.private_transfer(&next_ctx("transfer"), transfer)?;
    println!("  new deposits {:?}", response.output_indices);

    println!("\nStep 4: bob unshields to {}", RECIPIENT);
    let bob_owned = NoteScanner::new(bob).scan_pool(&pool.queries(), &denom)?;
    for d in bob_owned.iter().filter(|d| !d.spent) {
        let unshield = build_unshield(RECIPIENT, d)?;
        let response = pool.unshield(&next_ctx("unshield"), unshield)?;
        println!("  withdrew {}", response.amount);
    }

    let stats = pool.queries().stats()?;
    println!("\nPool statistics");
    println!("  phase: {}", stats.phase);
    println!("  deposits: {} total, {} spent, {} active", stats.total_deposits, stats.total_spent, stats.active_deposits);
    println!("  sender balance: {}", pool.bank().balance(SENDER, &denom));
    println!("  recipient balance: {}", pool.bank().balance(RECIPIENT, &denom));
    println!("  transparent supply: {}", pool.bank().supply(&denom));
    Ok(())
}
