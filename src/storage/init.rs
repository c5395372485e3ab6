//! First-run setup

use crate::config::paths::BilleteraPaths;
use crate::error::BilleteraError;
use crate::models::{Category, CategoryKind};

use super::file_io::write_json_atomic;

const DEFAULT_EXPENSE_CATEGORIES: &[(&str, &str)] = &[
    ("Supermercado", "🛒"),
    ("Transporte", "🚌"),
    ("Servicios", "💡"),
    ("Salud", "💊"),
    ("Restaurantes", "🍽️"),
    ("Entretenimiento", "🎬"),
    ("Hogar", "🏠"),
    ("Otros gastos", "📦"),
];

const DEFAULT_INCOME_CATEGORIES: &[(&str, &str)] = &[
    ("Sueldo", "💼"),
    ("Freelance", "💻"),
    ("Otros ingresos", "💰"),
];

/// Create the directory layout and seed default categories
///
/// Existing data is never overwritten.
pub fn initialize_storage(paths: &BilleteraPaths) -> Result<(), BilleteraError> {
    paths.ensure_directories()?;

    if !paths.categories_file().exists() {
        write_json_atomic(
            paths.categories_file(),
            &serde_json::json!({ "categories": default_categories() }),
        )?;
    }

    Ok(())
}

pub fn default_categories() -> Vec<Category> {
    let expenses = DEFAULT_EXPENSE_CATEGORIES
        .iter()
        .map(|(name, icon)| Category::with_icon(*name, CategoryKind::Expense, *icon));
    let income = DEFAULT_INCOME_CATEGORIES
        .iter()
        .map(|(name, icon)| Category::with_icon(*name, CategoryKind::Income, *icon));
    expenses.chain(income).collect()
}
