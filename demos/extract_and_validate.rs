use bank_statement_extractor::{process_grid, Cell};

fn row(cells: &[&str]) -> Vec<Cell> {
    cells.iter().map(|&text| Cell::from(text)).collect()
}

fn main() {
    // A small HDFC-style export: bank header rows, the column header, the
    // transaction table, then a footer row the extractor has to skip.
    let grid = vec![
        row(&["HDFC BANK LTD", "", "", "", ""]),
        row(&["A/C No: 50100012345678", "", "", "", ""]),
        row(&[
            "Date",
            "Narration",
            "Withdrawal Amt",
            "Deposit Amt",
            "Closing Balance",
        ]),
        row(&["01-01-2024", "NEFT SALARY JAN", "", "75,000.00", "1,00,000.00"]),
        row(&["02-01-2024", "ATM WDL", "10,000.00", "", "90,000.00"]),
        row(&["05-01-2024", "UPI-GROCERIES", "2,450.75", "", "87,549.25"]),
        row(&["12-01-2024", "CHQ CLEARING 884", "15,000.00", "", "72,549.25"]),
        row(&["20-01-2024", "INT CREDIT", "", "1,125.50", "73,674.75"]),
        row(&["STATEMENT SUMMARY", "", "", "", ""]),
    ];

    let processed = process_grid(&grid).expect("statement should extract");
    let statement = &processed.statement;

    println!(
        "Bank:    {}",
        statement.bank_name.as_deref().unwrap_or("unknown")
    );
    println!(
        "Account: {}",
        statement.account_number.as_deref().unwrap_or("unknown")
    );
    if let (Some(from), Some(to)) = (
        statement.statement_period_from,
        statement.statement_period_to,
    ) {
        println!("Period:  {} to {}", from, to);
    }
    println!(
        "Opening balance: {:.2}",
        statement.opening_balance.unwrap_or_default()
    );
    println!(
        "Closing balance: {:.2}",
        statement.closing_balance.unwrap_or_default()
    );
    println!(
        "Credits: {:.2}, Debits: {:.2}, {} transactions",
        statement.total_credits, statement.total_debits, statement.number_of_transactions
    );
    println!(
        "Grid: {} rows, header at row {}, {} skipped",
        processed.metadata.total_rows,
        processed.metadata.header_row,
        processed.metadata.skipped.total()
    );

    println!("\nVerdict: {}", processed.validation.validation_level);
    if processed.validation.issues.is_empty() {
        println!("No issues found");
    }
    for issue in &processed.validation.issues {
        println!(" - [{:?}] {}", issue.severity, issue.message);
    }

    let json = statement.to_json().expect("statement should serialize");
    println!("\nJSON record: {} bytes", json.len());
}
