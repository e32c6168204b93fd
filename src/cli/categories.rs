use super::{AppContext, ui};
use crate::CategoryCommand;
use crate::core::records::{Category, NewCategory};
use anyhow::Result;
use comfy_table::Cell;

pub fn categories_table(categories: &[Category]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Name"),
        ui::header_cell("Type"),
        ui::header_cell("Color"),
    ]);
    for category in categories {
        table.add_row(vec![
            Cell::new(&category.id),
            Cell::new(&category.name),
            Cell::new(category.kind),
            Cell::new(category.color.as_deref().unwrap_or("-")),
        ]);
    }
    table.to_string()
}

pub async fn run(ctx: &AppContext, command: Option<CategoryCommand>) -> Result<()> {
    match command.unwrap_or(CategoryCommand::List) {
        CategoryCommand::List => {
            let categories = ctx.api().list_categories().await?;
            if categories.is_empty() {
                println!("No categories yet.");
            } else {
                println!("{}", categories_table(&categories));
            }
        }
        CategoryCommand::Add { name, kind, color } => {
            let category = ctx
                .api()
                .create_category(&NewCategory {
                    name,
                    kind: kind.parse()?,
                    color,
                })
                .await?;
            println!(
                "Created {} category {} ({})",
                category.kind,
                ui::style_text(&category.name, ui::StyleType::TotalLabel),
                category.id
            );
        }
        CategoryCommand::Delete { id } => {
            ctx.api().delete_category(&id).await?;
            println!("Deleted category {id}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::TransactionType;

    #[test]
    fn test_categories_table() {
        let output = categories_table(&[Category {
            id: "3".to_string(),
            name: "Salary".to_string(),
            kind: TransactionType::Income,
            color: Some("#22c55e".to_string()),
            icon: None,
        }]);
        assert!(output.contains("Salary"));
        assert!(output.contains("income"));
        assert!(output.contains("#22c55e"));
    }
}
