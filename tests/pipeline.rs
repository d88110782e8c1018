use std::collections::BTreeSet;

use analytiq_flow::analysis::{compute_stat, compute_stat_named, correlate, StatResult, Statistic, Summary};
use analytiq_flow::data::classify::{classify, numeric_columns, ColumnCategory};
use analytiq_flow::data::dates::convert_dates;
use analytiq_flow::data::filter::{filter, ColumnFilter, FilterConfig};
use analytiq_flow::data::loader::{load, Loaded};
use analytiq_flow::data::model::{CellValue, Dataset};
use analytiq_flow::state::AppState;
use analytiq_flow::AnalysisError;
use approx::assert_relative_eq;

const SALES_CSV: &str = "\
order_id,region,units,unit_price,discounted,order_date,notes
1,North,10,2.50,true,2024-01-05,urgent widget order
2,South,4,3.00,false,2024-02-11,bulk gadget order
3,North,7,,false,2024-02-20,late widget order
4,East,12,2.75,true,2024-03-02,repeat gizmo order
5,West,3,4.10,false,2024-03-15,urgent sprocket order
6,North,9,2.60,true,not a date,bulk widget order
7,South,15,2.20,false,2024-04-01,returned flange order
8,East,6,3.30,false,2024-04-09,late gadget order
9,West,11,2.90,true,2024-04-22,repeat widget order
10,North,8,2.40,false,2024-05-03,bulk gizmo order
11,South,5,3.60,true,2024-05-19,urgent doohickey order
";

fn sales() -> Dataset {
    match load(SALES_CSV.as_bytes(), "sales.csv", None).unwrap() {
        Loaded::Dataset(ds) => ds,
        Loaded::NeedsSheet(_) => panic!("csv never asks for a sheet"),
    }
}

fn names(ns: &[&str]) -> Vec<String> {
    ns.iter().map(|s| s.to_string()).collect()
}

#[test]
fn loaded_columns_are_classified() {
    let ds = sales();
    assert_eq!(ds.row_count(), 11);
    let categories = classify(&ds);
    assert_eq!(
        categories,
        vec![
            ("order_id".to_string(), ColumnCategory::Numeric),
            ("region".to_string(), ColumnCategory::Text),
            ("units".to_string(), ColumnCategory::Numeric),
            ("unit_price".to_string(), ColumnCategory::Numeric),
            ("discounted".to_string(), ColumnCategory::Numeric),
            ("order_date".to_string(), ColumnCategory::Text),
            ("notes".to_string(), ColumnCategory::Text),
        ]
    );
    // classifying twice gives the same answer
    assert_eq!(classify(&ds), categories);
    assert_eq!(
        numeric_columns(&ds),
        names(&["order_id", "units", "unit_price", "discounted"])
    );
}

#[test]
fn default_filters_keep_every_row_of_null_free_columns() {
    let ds = sales();
    let config = FilterConfig::with_defaults(&ds, &names(&["region", "units", "notes"])).unwrap();
    let out = filter(&ds, &config).unwrap();
    assert_eq!(out.as_ref(), &ds);
}

#[test]
fn filter_then_describe() {
    let ds = sales();
    let mut config = FilterConfig::with_defaults(&ds, &names(&["region", "notes"])).unwrap();
    *config.get_mut("region").unwrap() =
        ColumnFilter::Membership(BTreeSet::from([CellValue::Text("North".into())]));
    *config.get_mut("notes").unwrap() = ColumnFilter::Contains("widget".into());

    let north_widgets = filter(&ds, &config).unwrap();
    assert_eq!(north_widgets.row_count(), 3);

    let outcome = compute_stat(&north_widgets, "units", Statistic::Summary).unwrap();
    let StatResult::Summary(Summary::Numeric { count, mean, min, max, .. }) = outcome.result else {
        panic!("expected numeric summary");
    };
    assert_eq!(count, 3);
    assert_relative_eq!(mean, 26.0 / 3.0);
    assert_relative_eq!(min, 7.0);
    assert_relative_eq!(max, 10.0);

    // the original is untouched
    assert_eq!(ds.row_count(), 11);
}

#[test]
fn top_regions_and_missing_prices() {
    let ds = sales();
    let out = compute_stat_named(&ds, "region", "Top 5 Common Values").unwrap();
    let StatResult::Frequencies(counts) = out.result else {
        panic!("expected frequencies");
    };
    assert_eq!(counts[0], (CellValue::Text("North".into()), 4));
    assert_eq!(counts.iter().map(|(_, n)| n).sum::<usize>(), 11);

    let mean = compute_stat(&ds, "unit_price", Statistic::Mean).unwrap();
    let StatResult::Scalar(m) = mean.result else {
        panic!("expected scalar");
    };
    assert_relative_eq!(m, 2.935, epsilon = 1e-12);
}

#[test]
fn dates_convert_then_filter_by_range() {
    let ds = convert_dates(&sales(), &names(&["order_date"]));
    assert_eq!(
        classify(&ds)[5],
        ("order_date".to_string(), ColumnCategory::Datetime)
    );
    assert!(ds.column("order_date").unwrap().values[5].is_null());

    let day = |m, d| {
        chrono::NaiveDate::from_ymd_opt(2024, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    };
    let config = FilterConfig {
        enabled: true,
        columns: vec![(
            "order_date".into(),
            ColumnFilter::DateRange {
                start: day(2, 1),
                end: day(3, 31),
            },
        )],
    };
    let q1 = filter(&ds, &config).unwrap();
    assert_eq!(
        q1.column("order_id").unwrap().values,
        vec![CellValue::Integer(2), CellValue::Integer(3), CellValue::Integer(4), CellValue::Integer(5)]
    );

    let summary = compute_stat(&ds, "order_date", Statistic::Summary).unwrap();
    assert!(matches!(
        summary.result,
        StatResult::Summary(Summary::Datetime { count: 10, .. })
    ));
}

#[test]
fn correlation_over_filtered_rows() {
    let ds = sales();
    let m = correlate(&ds, &names(&["units", "unit_price", "order_id"])).unwrap();
    assert_eq!(m.len(), 3);
    for i in 0..3 {
        assert_eq!(m.get(i, i), Some(1.0));
    }
    assert_eq!(m.between("units", "unit_price"), m.between("unit_price", "units"));
    assert!(m.between("units", "unit_price").unwrap() < 0.0);

    assert_eq!(
        correlate(&ds, &names(&["units"])).unwrap_err(),
        AnalysisError::InsufficientColumns(1)
    );
    assert_eq!(
        correlate(&ds, &names(&["units", "region"])).unwrap_err(),
        AnalysisError::NotNumeric("region".into())
    );
}

#[test]
fn session_walkthrough() {
    let mut state = AppState::default();
    state.open_bytes(SALES_CSV.as_bytes().to_vec(), "sales.csv");
    assert!(state.status_message.is_none());

    state.set_filters_enabled(true);
    state.set_filter_columns(&names(&["discounted"]));
    *state.filters.get_mut("discounted").unwrap() =
        ColumnFilter::Membership(BTreeSet::from([CellValue::Bool(true)]));
    assert_eq!(state.filtered().row_count(), 5);

    state.stats.column = Some("units".into());
    state.stats.statistic = Some(Statistic::Median);
    state.run_statistic();
    assert_eq!(
        state.last_stat.as_ref().map(|s| &s.result),
        Some(&StatResult::Scalar(10.0))
    );

    state.open_bytes(b"whatever".to_vec(), "data.txt");
    assert!(state.dataset.as_ref().unwrap().is_empty());
    assert!(state.last_stat.is_none());
    assert!(state.status_message.unwrap().contains("Unsupported file type"));
}
