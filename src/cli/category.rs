//! Category CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::display::category::format_category_list;
use crate::error::{BilleteraError, BilleteraResult};
use crate::models::CategoryKind;
use crate::services::{CategoryPatch, CategoryService};
use crate::storage::Storage;

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Create a new category
    Create {
        /// Category name
        name: String,
        /// Kind (income or expense)
        #[arg(short, long, default_value = "expense")]
        kind: String,
        /// Icon shown before the name
        #[arg(short, long)]
        icon: Option<String>,
    },
    /// List categories
    List {
        /// Only one kind (income or expense), recently used first
        #[arg(short, long)]
        kind: Option<String>,
        /// Include archived categories
        #[arg(short, long)]
        all: bool,
    },
    /// Edit a category
    Edit {
        /// Category name or ID
        category: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New icon
        #[arg(short, long)]
        icon: Option<String>,
    },
    /// Archive a category
    Archive {
        /// Category name or ID
        category: String,
    },
    /// Unarchive a category
    Unarchive {
        /// Category name or ID
        category: String,
    },
    /// Delete a category no movement uses
    Delete {
        /// Category name or ID
        category: String,
    },
}

fn parse_kind(input: &str) -> BilleteraResult<CategoryKind> {
    CategoryKind::parse(input).ok_or_else(|| {
        BilleteraError::Validation(format!(
            "Invalid category kind: '{}'. Valid kinds: income, expense",
            input
        ))
    })
}

/// Handle a category command
pub fn handle_category_command(
    storage: &Storage,
    settings: &Settings,
    cmd: CategoryCommands,
) -> BilleteraResult<()> {
    let service = CategoryService::new(storage);

    match cmd {
        CategoryCommands::Create { name, kind, icon } => {
            let kind = parse_kind(&kind)?;
            let category = service.create(&name, kind, icon.as_deref())?;
            println!("Created {} category: {}", kind, category.label());
            println!("  ID: {}", category.id);
        }

        CategoryCommands::List { kind, all } => {
            let categories = match kind {
                Some(kind) if !all => {
                    service.list_for_picker(parse_kind(&kind)?, &settings.recent_categories)?
                }
                Some(kind) => service.list(Some(parse_kind(&kind)?), true)?,
                None => service.list(None, all)?,
            };
            print!("{}", format_category_list(&categories));
        }

        CategoryCommands::Edit {
            category,
            name,
            icon,
        } => {
            let found = service.resolve(&category)?;
            if name.is_none() && icon.is_none() {
                println!("No changes specified. Use --name or --icon.");
                return Ok(());
            }
            let updated = service.update(found.id, CategoryPatch { name, icon })?;
            println!("Updated category: {}", updated.label());
        }

        CategoryCommands::Archive { category } => {
            let found = service.resolve(&category)?;
            let archived = service.set_archived(found.id, true)?;
            println!("Archived category: {}", archived.name);
        }

        CategoryCommands::Unarchive { category } => {
            let found = service.resolve(&category)?;
            let restored = service.set_archived(found.id, false)?;
            println!("Unarchived category: {}", restored.name);
        }

        CategoryCommands::Delete { category } => {
            let found = service.resolve(&category)?;
            let deleted = service.delete(found.id)?;
            println!("Deleted category: {}", deleted.name);
        }
    }

    Ok(())
}
