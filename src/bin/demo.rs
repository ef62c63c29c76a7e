// Replays a fixed sequence of transfers against a fresh ledger and prints
// the chain after every mined block.

use log::info;

use pow_ledger::blockchain::{Address, Amount, Ledger, Wallet};

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let owner = Wallet::new();
    info!("Ledger owner address: {}", owner.address());

    let ledger = Ledger::new(owner.address().clone())?;
    ledger.print();

    ledger.add_transaction("A", "B", Amount::from_f64(1.0)?);
    ledger.mine()?;
    ledger.print();

    ledger.add_transaction("C", "D", Amount::from_f64(10.0)?);
    ledger.add_transaction("F", "H", Amount::from_f64(5.7)?);
    ledger.mine()?;
    ledger.print();

    println!("my {}", ledger.calculate_total_amount(owner.address()));
    println!("F {}", ledger.calculate_total_amount(&Address::from("F")));
    println!("D {}", ledger.calculate_total_amount(&Address::from("D")));

    if !ledger.is_valid() {
        anyhow::bail!("ledger failed validation");
    }

    Ok(())
}
