//! Category display formatting

use crate::models::{Category, CategoryKind};

/// Format categories grouped by kind
pub fn format_category_list(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories found.\n\nRun 'billetera init' to create default categories."
            .to_string();
    }

    let mut output = String::new();
    for (i, kind) in [CategoryKind::Income, CategoryKind::Expense].iter().enumerate() {
        let in_kind: Vec<_> = categories.iter().filter(|c| c.kind == *kind).collect();
        if in_kind.is_empty() {
            continue;
        }
        if i > 0 && !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&format!("{}\n", kind));

        for (j, category) in in_kind.iter().enumerate() {
            let prefix = if j == in_kind.len() - 1 { "└── " } else { "├── " };
            let archived = if category.archived { " (archived)" } else { "" };
            output.push_str(&format!(
                "  {}{}  [{}]{}\n",
                prefix,
                category.label(),
                category.id,
                archived
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_by_kind() {
        let categories = vec![
            Category::with_icon("Sueldo", CategoryKind::Income, "💼"),
            Category::new("Comida", CategoryKind::Expense),
            Category::new("Transporte", CategoryKind::Expense),
        ];
        let output = format_category_list(&categories);

        let income_at = output.find("Income").unwrap();
        let expense_at = output.find("Expense").unwrap();
        assert!(income_at < expense_at);
        assert!(output.contains("💼 Sueldo"));
        assert!(output.contains("└── Transporte"));
    }

    #[test]
    fn test_empty() {
        assert!(format_category_list(&[]).contains("billetera init"));
    }
}
