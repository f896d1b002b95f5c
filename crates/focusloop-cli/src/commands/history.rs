use clap::Subcommand;
use focusloop_core::SessionStore;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List completed sessions, newest first
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
        /// Show at most N records
        #[arg(long)]
        limit: Option<usize>,
    },
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = SessionStore::open()?;

    match action {
        HistoryAction::List { json, limit } => {
            let mut records = store.load_history()?;
            if let Some(limit) = limit {
                records.truncate(limit);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("no sessions recorded");
            } else {
                for record in records {
                    let mark = if record.completed { "done" } else { "stopped" };
                    let label = record.preset_label.as_deref().unwrap_or("-");
                    println!(
                        "{}  {:>6}s  {:<8} {}",
                        record.started_at.format("%Y-%m-%d %H:%M"),
                        record.duration_secs,
                        mark,
                        label,
                    );
                }
            }
        }
    }

    Ok(())
}
