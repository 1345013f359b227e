//! `iqraa journal`: summarize the change journal.

use super::load_config;
use iqraa_memory::ChangeJournal;

pub async fn run(last: usize) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let journal = ChangeJournal::file(config.memory.journal_path());
    let overview = journal.overview(last)?;

    println!("📜 Memory Journal");
    println!("=================");
    println!("  File:   {}", config.memory.journal_path().display());
    println!("  Events: {}", overview.total_events);
    match overview.last_event_at {
        Some(at) => println!("  Last:   {}", at.to_rfc3339()),
        None => println!("  Last:   (no events yet)"),
    }

    if !overview.event_type_counts.is_empty() {
        println!();
        for (event_type, count) in &overview.event_type_counts {
            println!("  {event_type:<22} {count:>5}");
        }
    }

    if !overview.last_events.is_empty() {
        println!();
        println!("  Recent:");
        for entry in &overview.last_events {
            let at = entry
                .timestamp
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".into());
            let note = entry.note.as_deref().unwrap_or("");
            println!(
                "  {at}  {:<22} {:<8} {note}",
                entry.event_type.as_str(),
                entry.actor.as_str()
            );
        }
    }

    Ok(())
}
