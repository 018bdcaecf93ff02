// ABOUTME: FAQ seeding utility for the mentor chatbot
// ABOUTME: Inserts the built-in startup mentor FAQ entries, optionally clearing existing ones
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Mentor FAQ seeder.
//!
//! Entries are matched by question text, so running the seeder twice does not
//! create duplicates.
//!
//! Usage:
//! ```bash
//! # Seed FAQ entries (uses DATABASE_URL from environment)
//! cargo run --bin seed-mentor-faqs
//!
//! # Remove existing entries first
//! cargo run --bin seed-mentor-faqs -- --clear
//! ```

use anyhow::Result;
use clap::Parser;
use startup_marketplace::constants::defaults::DEFAULT_DATABASE_URL;
use startup_marketplace::database::seed_faqs::seed_mentor_faqs;
use startup_marketplace::database::Database;
use startup_marketplace::logging::{LogFormat, LoggingConfig};
use std::env;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "seed-mentor-faqs",
    about = "Startup marketplace mentor FAQ seeder",
    long_about = "Populate the mentor chatbot with the built-in startup FAQ entries"
)]
struct SeedArgs {
    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,

    /// Delete all existing FAQ entries before seeding
    #[arg(long)]
    clear: bool,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = SeedArgs::parse();

    LoggingConfig {
        level: if args.verbose { "debug" } else { "info" }.to_owned(),
        format: LogFormat::Compact,
        ..LoggingConfig::default()
    }
    .init()?;

    let database_url = args
        .database_url
        .or_else(|| env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());
    info!("Seeding mentor FAQs into {database_url}");

    let database = Database::new(&database_url).await?;
    let chat = database.chat();
    let summary = seed_mentor_faqs(&chat, args.clear).await?;

    if args.clear {
        println!("Cleared {} existing FAQ entries", summary.cleared);
    }
    println!(
        "Created {} FAQ entries ({} already present)",
        summary.created, summary.existing
    );
    println!("\nFAQ categories:");
    for category in chat.faq_category_counts().await? {
        println!("  {}: {} entries", category.display_name, category.count);
    }

    Ok(())
}
