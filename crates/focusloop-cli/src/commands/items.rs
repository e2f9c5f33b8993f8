use clap::Subcommand;
use focusloop_core::{Database, ItemCatalog};

#[derive(Subcommand)]
pub enum ItemsAction {
    /// List catalog items (seeds the defaults into an empty catalog)
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an item
    Add {
        /// Item name
        name: String,
    },
    /// Rename an item
    Rename {
        /// Item ID
        id: i64,
        /// New name
        name: String,
    },
    /// Remove an item and its focus history
    Remove {
        /// Item ID
        id: i64,
    },
}

pub fn run(action: ItemsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        ItemsAction::List { json } => {
            db.seed_default_items()?;
            let items = db.list_items()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                for item in items {
                    println!("{:>3}  {}", item.id, item.name);
                }
            }
        }
        ItemsAction::Add { name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err("item name must not be empty".into());
            }
            let id = db.add_item(name)?;
            println!("{id}");
        }
        ItemsAction::Rename { id, name } => {
            if !db.rename_item(id, name.trim())? {
                return Err(format!("no item with id {id}").into());
            }
            println!("ok");
        }
        ItemsAction::Remove { id } => {
            if !db.delete_item(id)? {
                return Err(format!("no item with id {id}").into());
            }
            println!("ok");
        }
    }
    Ok(())
}
