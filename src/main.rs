// Scripted driver for the ledger: the demo walks two accounts through a
// funding block, a payment and a payment back; solve-speed times the nonce
// search at a chosen target.

use clap::Parser;
use log::{error, info, LevelFilter};
use std::process;
use std::sync::atomic::AtomicBool;
use std::time::Instant;
use testcoin::core::search_nonce;
use testcoin::{
    Account, BlockHeader, Command, Hash, Node, Opt, Settings, Target, CURRENT_PROTOCOL_VERSION,
};

fn main() {
    // Info by default, RUST_LOG still wins
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();
    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Demo { config, json } => {
            let settings = match config {
                Some(path) => Settings::from_file(path)?,
                None => Settings::default(),
            }
            .apply_env()?;
            run_demo(settings, json)?;
        }
        Command::SolveSpeed { target, iterations } => {
            let settings = Settings::default().apply_env()?;
            solve_speed(target.0, iterations, settings.miner.hash_limit);
        }
    }
    Ok(())
}

fn run_demo(settings: Settings, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let bob = Account::new()?;
    let alice = Account::new()?;

    let mut node = Node::new(settings, bob.get_address())?;
    print_balances(&node, &bob, &alice)?;

    node.start_miner(bob.get_address());
    mine(&node)?;
    print_balances(&node, &bob, &alice)?;

    node.new_readable_peer_transaction(&bob, alice.get_address(), 69.0, 0.5)?;
    mine(&node)?;
    print_balances(&node, &bob, &alice)?;

    node.new_readable_peer_transaction(&alice, bob.get_address(), 6.0, 0.0)?;
    mine(&node)?;
    print_balances(&node, &bob, &alice)?;

    let summary = node.chain_summary()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for block in &summary.blocks {
            println!(
                "Block {} {} ({} transaction(s), nonce {})",
                block.number,
                block.hash,
                block.transactions.len() + 1,
                block.nonce
            );
        }
    }
    Ok(())
}

fn mine(node: &Node) -> Result<(), Box<dyn std::error::Error>> {
    match node.mine_block()? {
        Some(block) => info!("Mined block {}", block.hash()),
        None => return Err("nonce search exhausted its hash limit".into()),
    }
    Ok(())
}

fn print_balances(node: &Node, bob: &Account, alice: &Account) -> testcoin::Result<()> {
    println!(
        "bob: {:.9} coins, alice: {:.9} coins",
        node.get_readable_account_value(&bob.get_address())?,
        node.get_readable_account_value(&alice.get_address())?
    );
    Ok(())
}

fn solve_speed(target: Target, iterations: u32, hash_limit: u64) {
    let cancel = AtomicBool::new(false);
    let mut timings = Vec::with_capacity(iterations as usize);
    let mut unsolved = 0;

    for _ in 0..iterations {
        let header = BlockHeader::new(
            CURRENT_PROTOCOL_VERSION,
            Hash(rand::random()),
            Hash(rand::random()),
            testcoin::current_timestamp(),
            target,
            0,
        );
        let started = Instant::now();
        let solved = search_nonce(&header, rand::random(), hash_limit, 1, &cancel);
        let elapsed = started.elapsed().as_secs_f64();
        match solved {
            Some(_) => timings.push(elapsed),
            None => unsolved += 1,
        }
    }

    if timings.is_empty() {
        println!("No header solved at target {target} within {hash_limit} hashes");
        return;
    }
    let total: f64 = timings.iter().sum();
    let max = timings.iter().copied().fold(f64::MIN, f64::max);
    let min = timings.iter().copied().fold(f64::MAX, f64::min);
    println!(
        "Solved target {} with average time {:.6}s. Maximum {:.6}s, minimum {:.6}s, {} unsolved.",
        target.expand(),
        total / timings.len() as f64,
        max,
        min,
        unsolved
    );
}
