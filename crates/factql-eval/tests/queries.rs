//! Query Execution Tests
//!
//! End-to-end tests for the query pipeline:
//! - Scalar queries with default and custom primary grouping
//! - Where filtering and the implicit dimension filter
//! - Aggregate queries with secondary grouping and having
//! - Distinct projections
//! - Select-clause surface forms
//! - Header display modes and output formats

use chrono::{NaiveDate, NaiveDateTime};
use factql_ast::Expr;
use factql_eval::{HeaderDisplay, OutputFormat, QueryExecutor, QueryOutput, QuerySpec};
use factql_model::{FactRecord, MemoryEvaluator};
use factql_types::Value;
use indexmap::IndexMap;
use std::collections::BTreeSet;

// ============================================================================
// Test Helpers
// ============================================================================

fn dt(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Two plain revenue facts in two contexts.
fn revenue_facts() -> MemoryEvaluator {
    let mut ev = MemoryEvaluator::new();
    ev.insert(FactRecord::new("gaap:Revenue", "C1", 100i64));
    ev.insert(FactRecord::new("gaap:Revenue", "C2", 200i64));
    ev.set_label("gaap:Revenue", "Revenue");
    ev
}

/// Revenue over two fiscal years, two contexts each.
fn yearly_facts() -> MemoryEvaluator {
    let mut ev = MemoryEvaluator::new();
    for (context, value, start, end) in [
        ("C1", 100i64, dt(2018, 4, 1), dt(2019, 4, 1)),
        ("C2", 200i64, dt(2018, 4, 1), dt(2019, 4, 1)),
        ("C3", 30i64, dt(2017, 4, 1), dt(2018, 4, 1)),
        ("C4", 40i64, dt(2017, 4, 1), dt(2018, 4, 1)),
    ] {
        ev.insert(FactRecord::new("gaap:Revenue", context, value).with_duration(start, end));
    }
    ev.set_label("gaap:Revenue", "Revenue");
    ev
}

/// Two auditors reported on a dimensional axis.
fn auditor_facts() -> MemoryEvaluator {
    let mut ev = MemoryEvaluator::new();
    ev.insert(
        FactRecord::new("gaap:NameOfAuditFirm", "D1", "A & Co")
            .with_dim("gaap:AuditorsAxis", "gaap:Auditor1Member"),
    );
    ev.insert(
        FactRecord::new("gaap:NameOfAuditFirm", "D2", "B LLP")
            .with_dim("gaap:AuditorsAxis", "gaap:Auditor2Member"),
    );
    ev.insert(FactRecord::new("gaap:CompanyName", "C1", "Acme Ltd"));
    ev
}

fn axis_set(axis: &str) -> Value {
    let set: BTreeSet<Value> = [Value::Str(axis.to_string())].into();
    Value::Set(set)
}

fn row_values(output: &QueryOutput, header: &str) -> Vec<Value> {
    output
        .as_row_dicts()
        .unwrap()
        .iter()
        .map(|row| row.get(header).cloned().unwrap_or(Value::Null))
        .collect()
}

// ============================================================================
// Scalar Queries
// ============================================================================

#[test]
fn test_one_row_per_context() {
    let ev = revenue_facts();
    let executor = QueryExecutor::new(&ev);
    let spec = QuerySpec::new(vec![Expr::concept_value("gaap:Revenue")]);
    let output = executor.query(&spec).unwrap();

    let values: BTreeSet<Value> = row_values(&output, "Revenue").into_iter().collect();
    assert_eq!(values, BTreeSet::from([Value::Int(100), Value::Int(200)]));
}

#[test]
fn test_where_filters_fact_sets() {
    let ev = revenue_facts();
    let executor = QueryExecutor::new(&ev);
    let spec = QuerySpec::new(vec![Expr::concept_value("gaap:Revenue")])
        .with_where(vec![
            Expr::concept_value("gaap:Revenue").gt(Expr::literal(150i64)).unwrap(),
        ]);
    let output = executor.query(&spec).unwrap();
    assert_eq!(row_values(&output, "Revenue"), vec![Value::Int(200)]);
}

#[test]
fn test_multi_column_scalar_query() {
    let ev = yearly_facts();
    let executor = QueryExecutor::new(&ev);
    let spec = QuerySpec::new(vec![
        Expr::concept_value("gaap:Revenue"),
        Expr::fiscal_year(),
    ])
    .with_output_format(OutputFormat::RowWise);
    let output = executor.query(&spec).unwrap();
    let rows = output.as_rows().unwrap();
    assert_eq!(rows.len(), 4);
    for row in rows {
        assert_eq!(row.len(), 2);
        assert!(matches!(row[1], Value::Int(2018 | 2019)));
    }
}

#[test]
fn test_fiscal_year_offset_filter() {
    let ev = yearly_facts();
    let executor = QueryExecutor::new(&ev);
    // year(0) resolves to 2019, the most recent fiscal year
    let spec = QuerySpec::new(vec![Expr::concept_value("gaap:Revenue")])
        .with_where(vec![Expr::fiscal_year().eq(Expr::year(0)).unwrap()]);
    let output = executor.query(&spec).unwrap();
    let values: BTreeSet<Value> = row_values(&output, "Revenue").into_iter().collect();
    assert_eq!(values, BTreeSet::from([Value::Int(100), Value::Int(200)]));
}

// ============================================================================
// Dimensional Queries
// ============================================================================

#[test]
fn test_dimension_axis_filter() {
    let ev = auditor_facts();
    let executor = QueryExecutor::new(&ev);
    let spec = QuerySpec::new(vec![Expr::concept_value("gaap:NameOfAuditFirm")])
        .with_where(vec![
            Expr::dim_axes()
                .ge(Expr::literal(axis_set("gaap:AuditorsAxis")))
                .unwrap(),
        ])
        .with_header_display(HeaderDisplay::Name);
    let output = executor.query(&spec).unwrap();
    let names: BTreeSet<Value> =
        row_values(&output, "gaap:NameOfAuditFirm").into_iter().collect();
    assert_eq!(
        names,
        BTreeSet::from([Value::from("A & Co"), Value::from("B LLP")])
    );
}

#[test]
fn test_dimension_member_not_in_filter() {
    let mut ev = MemoryEvaluator::new();
    ev.insert(
        FactRecord::new("gaap:RelatedParty", "R1", "Subsidiary Co")
            .with_dim("gaap:CategoryAxis", "gaap:SubsidiaryMember"),
    );
    ev.insert(
        FactRecord::new("gaap:RelatedParty", "R2", "J. Director")
            .with_dim("gaap:CategoryAxis", "gaap:KeyManagementMember"),
    );
    let executor = QueryExecutor::new(&ev);
    let spec = QuerySpec::new(vec![Expr::concept_value("gaap:RelatedParty")])
        .with_where(vec![
            Expr::dim_member_value("gaap:CategoryAxis")
                .not_in(Expr::literal(Value::List(vec![Value::from(
                    "gaap:KeyManagementMember",
                )])))
                .unwrap(),
        ])
        .with_header_display(HeaderDisplay::Name);
    let output = executor.query(&spec).unwrap();
    assert_eq!(
        row_values(&output, "gaap:RelatedParty"),
        vec![Value::from("Subsidiary Co")]
    );
}

// ============================================================================
// Aggregate Queries
// ============================================================================

#[test]
fn test_sum_over_single_group() {
    let ev = revenue_facts();
    let executor = QueryExecutor::new(&ev);
    let spec = QuerySpec::new(vec![Expr::sum(Expr::concept_value("gaap:Revenue")).unwrap()]);
    let output = executor.query(&spec).unwrap();

    let rows = output.as_row_dicts().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("SUM(Revenue)"), Some(&Value::Int(300)));
}

#[test]
fn test_sum_grouped_by_fiscal_year() {
    let ev = yearly_facts();
    let executor = QueryExecutor::new(&ev);
    let spec = QuerySpec::new(vec![
        Expr::sum(Expr::concept_value("gaap:Revenue")).unwrap(),
        Expr::fiscal_year(),
    ])
    .with_group_by(vec![Expr::fiscal_year()])
    .with_output_format(OutputFormat::RowWise);
    let output = executor.query(&spec).unwrap();

    let rows: BTreeSet<Vec<Value>> = output.as_rows().unwrap().iter().cloned().collect();
    assert_eq!(
        rows,
        BTreeSet::from([
            vec![Value::Int(300), Value::Int(2019)],
            vec![Value::Int(70), Value::Int(2018)],
        ])
    );
}

#[test]
fn test_having_filters_groups() {
    let ev = yearly_facts();
    let executor = QueryExecutor::new(&ev);
    let spec = QuerySpec::new(vec![
        Expr::sum(Expr::concept_value("gaap:Revenue")).unwrap(),
        Expr::fiscal_year(),
    ])
    .with_group_by(vec![Expr::fiscal_year()])
    .with_having(vec![
        Expr::sum(Expr::concept_value("gaap:Revenue"))
            .unwrap()
            .gt(Expr::literal(100i64))
            .unwrap(),
    ])
    .with_output_format(OutputFormat::RowWise);
    let output = executor.query(&spec).unwrap();
    assert_eq!(
        output.as_rows().unwrap(),
        &[vec![Value::Int(300), Value::Int(2019)]]
    );
}

#[test]
fn test_join_and_first_aggregates() {
    let ev = auditor_facts();
    let executor = QueryExecutor::new(&ev);
    let spec = QuerySpec::new(vec![
        Expr::join(Expr::concept_value("gaap:NameOfAuditFirm"), ", ").unwrap(),
    ])
    .with_where(vec![
        Expr::dim_axes()
            .ge(Expr::literal(axis_set("gaap:AuditorsAxis")))
            .unwrap(),
    ])
    .with_output_format(OutputFormat::RowWise);
    let output = executor.query(&spec).unwrap();
    let rows = output.as_rows().unwrap();
    assert_eq!(rows.len(), 1);
    // Join order follows grouping order; both names are present
    let joined = rows[0][0].as_str().unwrap();
    assert!(joined == "A & Co, B LLP" || joined == "B LLP, A & Co");

    let spec = QuerySpec::new(vec![
        Expr::count(Expr::concept_value("gaap:NameOfAuditFirm")).unwrap(),
    ])
    .with_where(vec![
        Expr::dim_axes()
            .ge(Expr::literal(axis_set("gaap:AuditorsAxis")))
            .unwrap(),
    ])
    .with_output_format(OutputFormat::RowWise);
    let output = executor.query(&spec).unwrap();
    assert_eq!(output.as_rows().unwrap(), &[vec![Value::Int(2)]]);
}

#[test]
fn test_context_hash_regrouping_joins_period_types() {
    // The share type is reported for a duration, the amount at an instant;
    // their contexts share entity and end instant, so grouping by the
    // period-type-insensitive hash puts them in one fact set.
    let mut ev = MemoryEvaluator::new();
    ev.insert(
        FactRecord::new("gaap:TypeOfShare", "D1", "Preference Shares")
            .with_entity("E")
            .with_duration(dt(2018, 4, 1), dt(2019, 4, 1)),
    );
    ev.insert(
        FactRecord::new("gaap:ValueOfShares", "I1", 5000i64)
            .with_entity("E")
            .with_instant(dt(2019, 4, 1)),
    );
    ev.insert(
        FactRecord::new("gaap:TypeOfShare", "D2", "Equity Shares")
            .with_entity("E")
            .with_duration(dt(2017, 4, 1), dt(2018, 4, 1)),
    );
    ev.insert(
        FactRecord::new("gaap:ValueOfShares", "I2", 7000i64)
            .with_entity("E")
            .with_instant(dt(2018, 4, 1)),
    );

    let executor = QueryExecutor::new(&ev);
    let spec = QuerySpec::new(vec![Expr::sum(Expr::concept_value("gaap:ValueOfShares")).unwrap()])
        .with_where(vec![
            Expr::concept_value("gaap:TypeOfShare")
                .icontains(Expr::literal("preference"))
                .unwrap(),
        ])
        .with_context_group_by(vec![Expr::context_hash()])
        .with_output_format(OutputFormat::RowWise);
    let output = executor.query(&spec).unwrap();
    assert_eq!(output.as_rows().unwrap(), &[vec![Value::Int(5000)]]);
}

// ============================================================================
// Distinct Projections
// ============================================================================

#[test]
fn test_distinct_removes_duplicates() {
    let mut ev = MemoryEvaluator::new();
    ev.insert(FactRecord::new("gaap:Category", "C1", 1i64));
    ev.insert(FactRecord::new("gaap:Category", "C2", 1i64));
    ev.insert(FactRecord::new("gaap:Category", "C3", 2i64));
    let executor = QueryExecutor::new(&ev);
    let spec = QuerySpec::new(vec![
        Expr::distinct(vec![Expr::concept_value("gaap:Category")]).unwrap(),
    ])
    .with_output_format(OutputFormat::RowWise);
    let output = executor.query(&spec).unwrap();

    let values: BTreeSet<Value> = output
        .as_rows()
        .unwrap()
        .iter()
        .map(|row| row[0].clone())
        .collect();
    assert_eq!(values, BTreeSet::from([Value::Int(1), Value::Int(2)]));
}

// ============================================================================
// Select Forms, Headers and Output Formats
// ============================================================================

#[test]
fn test_select_surface_forms_agree_end_to_end() {
    let ev = revenue_facts();
    let executor = QueryExecutor::new(&ev);

    let mut map = IndexMap::new();
    map.insert("Turnover".to_string(), Expr::concept_value("gaap:Revenue"));
    let from_map = executor.query(&QuerySpec::new(map)).unwrap();

    let from_pairs = executor
        .query(&QuerySpec::new(vec![(
            "Turnover",
            Expr::concept_value("gaap:Revenue"),
        )]))
        .unwrap();

    let from_headers = executor
        .query(
            &QuerySpec::new(vec![Expr::concept_value("gaap:Revenue")])
                .with_headers(["Turnover"]),
        )
        .unwrap();

    assert_eq!(from_map, from_pairs);
    assert_eq!(from_map, from_headers);
}

#[test]
fn test_header_display_modes() {
    let ev = revenue_facts();
    let executor = QueryExecutor::new(&ev);
    let select = vec![Expr::concept_value("gaap:Revenue")];

    let labeled = executor.query(&QuerySpec::new(select.clone())).unwrap();
    assert!(labeled.as_row_dicts().unwrap()[0].contains_key("Revenue"));

    let named = executor
        .query(&QuerySpec::new(select.clone()).with_header_display(HeaderDisplay::Name))
        .unwrap();
    assert!(named.as_row_dicts().unwrap()[0].contains_key("gaap:Revenue"));

    let repr = executor
        .query(&QuerySpec::new(select).with_header_display(HeaderDisplay::Repr))
        .unwrap();
    assert!(
        repr.as_row_dicts().unwrap()[0].contains_key("ConceptValue(gaap:Revenue)")
    );
}

#[test]
fn test_column_wise_formats() {
    let ev = revenue_facts();
    let executor = QueryExecutor::new(&ev);
    let select = vec![Expr::concept_value("gaap:Revenue")];

    let columns = executor
        .query(&QuerySpec::new(select.clone()).with_output_format(OutputFormat::ColumnWise))
        .unwrap();
    let QueryOutput::Columns(columns) = columns else {
        panic!("expected columns");
    };
    assert_eq!(columns.len(), 1);
    assert_eq!(columns[0].len(), 2);

    let dicts = executor
        .query(&QuerySpec::new(select.clone()).with_output_format(OutputFormat::ColumnWiseDicts))
        .unwrap();
    let QueryOutput::ColumnDicts(map) = dicts else {
        panic!("expected column dicts");
    };
    assert_eq!(map.len(), 1);
    assert!(map.contains_key("Revenue"));

    let with_headers = executor
        .query(&QuerySpec::new(select).with_output_format(OutputFormat::ColumnWiseWithHeaders))
        .unwrap();
    let QueryOutput::ColumnsWithHeaders { headers, columns } = with_headers else {
        panic!("expected headers and columns");
    };
    assert_eq!(headers, vec!["Revenue".to_string()]);
    assert_eq!(columns.len(), 1);
}

#[test]
fn test_rows_with_headers_format() {
    let ev = revenue_facts();
    let executor = QueryExecutor::new(&ev);
    let spec = QuerySpec::new(vec![Expr::concept_value("gaap:Revenue")])
        .with_output_format(OutputFormat::RowWiseWithHeaders);
    let output = executor.query(&spec).unwrap();
    let QueryOutput::RowsWithHeaders(rows) = output else {
        panic!("expected header-paired rows");
    };
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, vec!["Revenue".to_string()]);
}

// ============================================================================
// Convenience Lookups
// ============================================================================

#[test]
fn test_get_and_get_all() {
    let ev = yearly_facts();
    // Only one context per year
    let mut single = MemoryEvaluator::new();
    single.insert(
        FactRecord::new("gaap:Revenue", "C1", 100i64)
            .with_duration(dt(2018, 4, 1), dt(2019, 4, 1)),
    );
    single.insert(
        FactRecord::new("gaap:Revenue", "C2", 30i64)
            .with_duration(dt(2017, 4, 1), dt(2018, 4, 1)),
    );
    let executor = QueryExecutor::new(&single);
    assert_eq!(executor.get("gaap:Revenue").unwrap(), Value::Int(100));

    let all = executor.get_all("gaap:Revenue").unwrap();
    let all: BTreeSet<(Value, Value)> = all.into_iter().collect();
    assert_eq!(
        all,
        BTreeSet::from([
            (Value::Int(100), Value::Int(2019)),
            (Value::Int(30), Value::Int(2018)),
        ])
    );

    // Multiple contexts for the current year make `get` ambiguous
    let executor = QueryExecutor::new(&ev);
    assert!(executor.get("gaap:Revenue").is_err());
}
