//! Iqraa CLI, the main entry point.
//!
//! Commands:
//! - `run`       Run the full pipeline on a text
//! - `plan`      Expand a text and produce a task plan
//! - `route`     Show which stages an intent routes to
//! - `stages`    List the stage registry
//! - `personas`  List, show or select personas
//! - `memory`    Inspect, sync, reset or mirror the memory documents
//! - `journal`   Summarize the change journal
//! - `overview`  Show the dashboard overview
//! - `serve`     Start the HTTP gateway
//! - `init`      Create the config file and memory directory

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "iqraa",
    about = "Iqraa: persona-driven cognitive pipeline with journaled memory",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline on a text
    Run {
        /// The text to process
        text: String,

        /// Persona to run under (falls back to the default when unknown)
        #[arg(short, long)]
        persona: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Expand a text and produce a task plan (writes no memory)
    Plan {
        /// The text to plan for
        text: String,

        #[arg(short, long)]
        persona: Option<String>,
    },

    /// Show which stages an intent routes to
    Route {
        /// Free-text intent, e.g. "summarize this report"
        intent: String,
    },

    /// List the stage registry
    Stages {
        /// Report edges declared on one side only
        #[arg(long)]
        check: bool,
    },

    /// Persona management
    Personas {
        #[command(subcommand)]
        action: PersonaAction,
    },

    /// Memory document management
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Summarize the change journal
    Journal {
        /// Number of recent events to show
        #[arg(short, long, default_value_t = iqraa_memory::DEFAULT_LAST_EVENTS)]
        last: usize,
    },

    /// Show the dashboard overview
    Overview,

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create the config file and memory directory
    Init,
}

#[derive(Subcommand)]
enum PersonaAction {
    /// List the built-in personas
    List,
    /// Show the session's current persona
    Current,
    /// Make a persona the session's persona
    Select {
        /// Persona id, e.g. "policy-strategist"
        id: String,
    },
}

#[derive(Subcommand)]
enum MemoryAction {
    /// Print a document (session, project or concept-graph)
    Show { doc: String },
    /// Re-save all documents and mirror them
    Sync,
    /// Overwrite all documents with empty ones
    Reset {
        /// Required; reset cannot be undone
        #[arg(long)]
        confirm: bool,
    },
    /// Push one document to the mirror
    Mirror { doc: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            text,
            persona,
            json,
        } => commands::run::run(&text, persona, json).await?,
        Commands::Plan { text, persona } => commands::run::plan(&text, persona).await?,
        Commands::Route { intent } => commands::registry::route(&intent)?,
        Commands::Stages { check } => commands::registry::stages(check)?,
        Commands::Personas { action } => match action {
            PersonaAction::List => commands::personas::list().await?,
            PersonaAction::Current => commands::personas::current().await?,
            PersonaAction::Select { id } => commands::personas::select(&id).await?,
        },
        Commands::Memory { action } => match action {
            MemoryAction::Show { doc } => commands::memory::show(&doc).await?,
            MemoryAction::Sync => commands::memory::sync().await?,
            MemoryAction::Reset { confirm } => commands::memory::reset(confirm).await?,
            MemoryAction::Mirror { doc } => commands::memory::mirror(&doc).await?,
        },
        Commands::Journal { last } => commands::journal::run(last).await?,
        Commands::Overview => commands::overview::run().await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Init => commands::init::run().await?,
    }

    Ok(())
}
