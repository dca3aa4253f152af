use bank_statement_extractor::*;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

fn main() {
    println!("Cross-statement audit demo\n");
    println!("Two consecutive statements for one account: January hands over");
    println!("13,000.00 but February opens at 12,500.00, and February only");
    println!("starts on the 15th.\n");

    let january = Statement {
        bank_name: Some("HDFC".to_string()),
        account_number: Some("50100012345678".to_string()),
        statement_period_from: NaiveDate::from_ymd_opt(2024, 1, 1),
        statement_period_to: NaiveDate::from_ymd_opt(2024, 1, 31),
        opening_balance: Some(dec!(10000)),
        closing_balance: Some(dec!(13000)),
        total_credits: dec!(5000),
        total_debits: dec!(2000),
        ..Statement::default()
    };

    let february = Statement {
        bank_name: Some("HDFC".to_string()),
        account_number: Some("50100012345678".to_string()),
        statement_period_from: NaiveDate::from_ymd_opt(2024, 2, 15),
        statement_period_to: NaiveDate::from_ymd_opt(2024, 2, 29),
        opening_balance: Some(dec!(12500)),
        closing_balance: Some(dec!(11000)),
        total_debits: dec!(1500),
        ..Statement::default()
    };

    let processor = StatementProcessor::new();
    let audit = processor.validate_statements(&[january, february]);

    println!("Account: {}", audit.statement_id);
    for result in &audit.results {
        println!("\n{} -> {:?}", result.validator_name, result.status);
        for issue in &result.issues {
            println!("  [{:?}] {}", issue.severity, issue.message);
            if let Some(recommendation) = &issue.recommendation {
                println!("      -> {}", recommendation);
            }
        }
    }

    println!(
        "\nOverall: {:?} ({} errors, {} warnings)",
        audit.overall_status, audit.total_errors, audit.total_warnings
    );
}
