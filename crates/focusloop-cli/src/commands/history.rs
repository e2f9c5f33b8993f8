use clap::Subcommand;
use focusloop_core::Database;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Show completed focus phases for an item, newest first
    Show {
        /// Item name
        item: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete one record
    Delete {
        /// Record ID
        id: i64,
    },
    /// Delete every record for an item
    Clear {
        /// Item name
        item: String,
    },
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        HistoryAction::Show { item, json } => {
            let records = db.records_for(&item)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for r in records {
                    let minutes = (r.ended_at - r.started_at).num_minutes();
                    println!(
                        "{:>4}  {}  {} min",
                        r.id,
                        r.started_at.format("%Y-%m-%d %H:%M"),
                        minutes
                    );
                }
            }
        }
        HistoryAction::Delete { id } => {
            if !db.delete_record(id)? {
                return Err(format!("no record with id {id}").into());
            }
            println!("ok");
        }
        HistoryAction::Clear { item } => {
            let removed = db.delete_records_for(&item)?;
            println!("{removed}");
        }
    }
    Ok(())
}
