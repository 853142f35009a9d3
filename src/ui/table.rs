use crate::report::ImportReport;
use crate::storage::TableCount;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Table")]
    pub table: String,
    #[tabled(rename = "Loaded")]
    pub loaded: usize,
    #[tabled(rename = "Total rows")]
    pub total: usize,
}

/// Rows added by this import next to each table's total in the destination.
/// Tables that do not exist in the destination are left out.
pub fn rows_table(report: &ImportReport, totals: &[TableCount]) -> String {
    let rows: Vec<TableRow> = totals
        .iter()
        .map(|count| TableRow {
            table: count.table.clone(),
            loaded: report.rows_for(&count.table),
            total: count.rows,
        })
        .collect();

    if rows.is_empty() {
        return String::new();
    }
    Table::new(&rows).with(Style::rounded()).to_string()
}
