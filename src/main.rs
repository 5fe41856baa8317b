use anyhow::{bail, Result};
use std::env;
use std::path::Path;

use subscan::{
    load_emails_csv, load_emails_json, load_previous_json, InMemoryStore, RawEmail, ScanEngine,
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 || args[1] != "scan" {
        eprintln!("Usage: subscan scan <emails.json|emails.csv> [previous.json]");
        std::process::exit(2);
    }

    run_scan(Path::new(&args[2]), args.get(3).map(Path::new))
}

fn run_scan(batch_path: &Path, previous_path: Option<&Path>) -> Result<()> {
    println!("📬 Subscription Scan");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load the email batch
    println!("\n📂 Loading batch from {}...", batch_path.display());
    let emails = load_batch(batch_path)?;
    println!("✓ Loaded {} emails", emails.len());

    // 2. Seed the store with previously known subscriptions
    let store = match previous_path {
        Some(path) => {
            let records = load_previous_json(path)?;
            println!("✓ Loaded {} stored subscriptions", records.len());
            InMemoryStore::from_records(records)
        }
        None => InMemoryStore::new(),
    };

    // 3. Run the engine
    let engine = ScanEngine::with_defaults();
    let outcome = engine.scan(&emails, &store);

    // 4. Report
    println!("\n🔎 Detected subscriptions:");
    if outcome.subscriptions.is_empty() {
        println!("   (none)");
    }
    for sub in &outcome.subscriptions {
        let price = sub
            .price
            .map(|p| format!("{:.2}/mo", p))
            .unwrap_or_else(|| "?".to_string());
        println!(
            "   {} | {} | {} | email {}",
            sub.provider,
            price,
            sub.frequency.as_str(),
            sub.email_id
        );
    }

    println!("\n📈 Price changes:");
    if outcome.price_changes.is_empty() {
        println!("   (none)");
    }
    for change in &outcome.price_changes {
        println!(
            "   {} | {:.2} → {:.2} ({:+.1}%)",
            change.provider, change.old_price, change.new_price, change.percentage_change
        );
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "✅ Scan complete: {} subscriptions, {} price changes",
        outcome.subscriptions.len(),
        outcome.price_changes.len()
    );

    Ok(())
}

fn load_batch(path: &Path) -> Result<Vec<RawEmail>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_emails_json(path),
        Some("csv") => load_emails_csv(path),
        _ => bail!("Unsupported batch format: {} (use .json or .csv)", path.display()),
    }
}
