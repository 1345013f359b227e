//! `iqraa memory`: inspect and administer the three memory documents.

use iqraa_core::journal::Actor;
use iqraa_core::memory::DocumentKind;
use iqraa_memory::{DocumentMirror, MirrorOutcome};

use super::{load_config, open_store, print_json};

fn parse_doc(doc: &str) -> Result<DocumentKind, Box<dyn std::error::Error>> {
    DocumentKind::parse(doc).ok_or_else(|| {
        format!("Unknown document '{doc}' (expected session, project or concept-graph)").into()
    })
}

pub async fn show(doc: &str) -> Result<(), Box<dyn std::error::Error>> {
    let kind = parse_doc(doc)?;
    let config = load_config()?;
    let store = open_store(&config).await?;

    print_json(&store.snapshot(kind)?)
}

pub async fn sync() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let mut store = open_store(&config).await?;

    println!("🔄 Syncing memory");
    let report = store.sync_all(Actor::Admin).await?;
    print_documents(&report.documents);
    println!("   Synced at: {}", report.synced_at.to_rfc3339());
    Ok(())
}

pub async fn reset(confirm: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !confirm {
        return Err("Refusing to reset memory without --confirm".into());
    }

    let config = load_config()?;
    let mut store = open_store(&config).await?;

    println!("🧹 Resetting memory");
    let documents = store.reset(Actor::Admin).await?;
    print_documents(&documents);
    Ok(())
}

pub async fn mirror(doc: &str) -> Result<(), Box<dyn std::error::Error>> {
    let kind = parse_doc(doc)?;
    let config = load_config()?;
    let store = open_store(&config).await?;

    let outcome = store.mirror_now(kind).await?;
    print_documents(&[DocumentMirror {
        document: kind,
        mirror: outcome,
    }]);
    Ok(())
}

fn print_documents(documents: &[DocumentMirror]) {
    for doc in documents {
        let name = doc.document.storage_name();
        match &doc.mirror {
            MirrorOutcome::Mirrored { receipt } => {
                println!("  ✅ {name:<14} mirrored to {}", receipt.location)
            }
            MirrorOutcome::Failed { reason } => {
                println!("  ⚠️  {name:<14} saved, mirror failed: {reason}")
            }
            MirrorOutcome::Disabled => println!("  ✅ {name:<14} saved (mirror disabled)"),
        }
    }
}
