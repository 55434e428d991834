//! Basic example: querying an in-memory fact collection
//!
//! This example demonstrates:
//! - Building a MemoryEvaluator with labeled, period-tagged facts
//! - Scalar queries with the default context grouping
//! - An aggregate query grouped by fiscal year
//! - A dimensional query against an axis

use chrono::{NaiveDate, NaiveDateTime};
use factql::{Expr, FactRecord, MemoryEvaluator, OutputFormat, QueryExecutor, QuerySpec};

fn dt(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn main() {
    println!("=== factql report summary example ===\n");

    // 1. Build the fact collection
    let mut facts = MemoryEvaluator::new();
    for (context, value, start, end) in [
        ("FY19", 1200i64, dt(2018, 4, 1), dt(2019, 4, 1)),
        ("FY18", 1000i64, dt(2017, 4, 1), dt(2018, 4, 1)),
    ] {
        facts.insert(FactRecord::new("gaap:Revenue", context, value).with_duration(start, end));
    }
    facts.insert(
        FactRecord::new("gaap:NameOfAuditFirm", "D1", "A & Co")
            .with_dim("gaap:AuditorsAxis", "gaap:Auditor1Member"),
    );
    facts.set_label("gaap:Revenue", "Revenue");
    println!("1. Loaded {} facts", 3);

    let executor = QueryExecutor::new(&facts);

    // 2. Revenue per reporting context
    println!("\n2. Revenue per context:");
    let spec = QuerySpec::new(vec![Expr::concept_value("gaap:Revenue"), Expr::fiscal_year()]);
    let output = executor.query(&spec).expect("query failed");
    for row in output.as_row_dicts().expect("row dicts") {
        println!("   {row:?}");
    }

    // 3. Total revenue per fiscal year
    println!("\n3. Revenue summed by fiscal year:");
    let spec = QuerySpec::new(vec![
        Expr::sum(Expr::concept_value("gaap:Revenue")).expect("valid aggregate"),
        Expr::fiscal_year(),
    ])
    .with_group_by(vec![Expr::fiscal_year()])
    .with_output_format(OutputFormat::RowWise);
    let output = executor.query(&spec).expect("query failed");
    for row in output.as_rows().expect("rows") {
        println!("   {row:?}");
    }

    // 4. Facts on the auditors axis
    println!("\n4. Audit firms:");
    let axes = std::collections::BTreeSet::from([factql::Value::Str(
        "gaap:AuditorsAxis".to_string(),
    )]);
    let spec = QuerySpec::new(vec![Expr::concept_value("gaap:NameOfAuditFirm")])
        .with_where(vec![
            Expr::dim_axes()
                .ge(Expr::literal(factql::Value::Set(axes)))
                .expect("valid filter"),
        ])
        .with_output_format(OutputFormat::RowWise);
    let output = executor.query(&spec).expect("query failed");
    for row in output.as_rows().expect("rows") {
        println!("   {row:?}");
    }

    println!("\n=== done ===");
}
