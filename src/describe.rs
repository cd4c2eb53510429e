use std::fmt::Write as _;

use clap::ValueEnum;

use crate::schema::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DescribeFormat {
    Table,
    Yaml,
}

const HEADERS: [&str; 5] = ["table", "index", "column", "type", "key"];

/// One line per column: owning table, field index, name, type and key marker.
pub fn schema_rows(schema: &Schema) -> Vec<Vec<String>> {
    schema
        .tables
        .iter()
        .flat_map(|table| {
            table.columns().iter().map(move |column| {
                vec![
                    table.name.clone(),
                    column.index.to_string(),
                    column.name.clone(),
                    column.column_type.to_string(),
                    if column.primary_key { "pk" } else { "" }.to_string(),
                ]
            })
        })
        .collect()
}

pub fn render_schema(schema: &Schema) -> String {
    let headers: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    render_table(&headers, &schema_rows(schema))
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }
    for width in &mut widths {
        *width = (*width).max(3);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(output, "{}", format_row(&separator, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, &width)| format!("{value:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnType};

    #[test]
    fn renders_aligned_columns() {
        let schema = Schema::single_table(
            "parcc_participation_2015",
            vec![
                Column::new(0, "rcdts", ColumnType::String).as_primary_key(),
                Column::new(5, "tested_enrollment_ela", ColumnType::Integer),
            ],
        )
        .unwrap();
        let rendered = render_schema(&schema);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with(&format!("{:<24}  index  column", "table")));
        assert!(lines[1].starts_with(&format!("{}  -----", "-".repeat(24))));
        assert!(lines[2].ends_with("string   pk"));
        assert!(lines[3].ends_with("integer"));
    }
}
