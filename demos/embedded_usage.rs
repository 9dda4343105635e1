//! Minimal embedding example for rewrite-core
//!
//! This example demonstrates using rewrite-core as a library in a custom
//! application that owns persistence itself through a custom sink.

use rewrite_core::{ConfigSink, Error, Result, Rule, RuleKind, RuleSnapshot, RuleStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Custom sink that prints every committed snapshot
struct PrintingSink {
    saves: AtomicUsize,
}

impl PrintingSink {
    fn new() -> Self {
        Self {
            saves: AtomicUsize::new(0),
        }
    }

    fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ConfigSink for PrintingSink {
    async fn config_modified(&self, snapshot: &RuleSnapshot) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        println!(
            "[Embedded] Saving generation {} ({} rules)",
            snapshot.generation,
            snapshot.rules.len()
        );
        Ok(())
    }

    async fn load(&self) -> Result<RuleSnapshot> {
        Ok(RuleSnapshot::new(
            0,
            vec![
                Rule::new("router.lan", "192.168.1.1"),
                Rule::new("nas.lan", "192.168.1.10"),
            ],
        ))
    }

    fn sink_name(&self) -> &'static str {
        "embedded"
    }
}

fn describe(rule: &Rule) -> &'static str {
    match rule.kind() {
        RuleKind::A => "A",
        RuleKind::Aaaa => "AAAA",
        RuleKind::Cname => "CNAME",
        RuleKind::PassA => "pass A",
        RuleKind::PassAaaa => "pass AAAA",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Embedded rewrite-core Example ===\n");

    let sink = Arc::new(PrintingSink::new());

    println!("1. Loading store from custom sink...");
    let store = RuleStore::load(sink.clone()).await?;

    println!("2. Adding rules...");
    store.add("ads.example.com", "0.0.0.0").await?;
    store.add("Media.LAN.", "nas.lan").await?;
    store.add("nas.lan", "fd00::10").await?;

    println!("3. Rejecting a duplicate...");
    match store.add("router.lan", "192.168.1.1").await {
        Err(Error::Duplicate { domain, answer }) => {
            println!("   duplicate refused: {} -> {}", domain, answer)
        }
        other => println!("   unexpected: {:?}", other),
    }

    println!("4. Moving the router to a new address in place...");
    store
        .update("router.lan", "192.168.1.1", "router.lan", "192.168.1.254")
        .await?;

    println!("5. Removing the ad block...");
    let removed = store.delete("ads.example.com", "0.0.0.0").await?;
    println!("   removed {} rule(s)", removed);

    println!("\n6. Rules under .lan:");
    for rule in store.list(".lan").await {
        println!("   {:<12} {:<10} {}", rule.domain, describe(&rule), rule.answer);
    }

    println!("\n=== Embedding Successful ===");
    println!("Sink saves: {}", sink.save_count());

    Ok(())
}
