//! Regolith Feature Table Example
//!
//! Walks a small table of Martian surface features through the operations a
//! table widget performs:
//! - header clicks (primary sort, direction flip, secondary demotion)
//! - selecting rows on screen and reading the records' flags
//! - adding and removing records under an active sort
//!
//! Run with: cargo run -p regolith --example feature_table
//!
//! Pass a TOML file path to override the view configuration, and set
//! `RUST_LOG=regolith=trace` style filtering through the subscriber below.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use regolith::model::{
    BackingCollection, Column, RangeSelection, RecordTable, SelectionModel, SortedView, TypeTag,
    Value,
};
use regolith::ViewConfig;

const NAME: usize = 0;
const KIND: usize = 1;
const ELEVATION: usize = 2;
const IMAGED: usize = 3;

fn print_table(view: &SortedView<RecordTable, SelectionModel>) {
    println!("  sort keys: {:?}", view.sort_keys());
    for display in 0..view.row_count() {
        let Ok(natural) = view.to_natural(display) else {
            continue;
        };
        let table = view.collection();
        println!(
            "  {:>2} [{}] {:<20} {:<10} {:>9} {}",
            display,
            if view.selection().is_selected(display) { "x" } else { " " },
            table.value_at(natural, NAME),
            table.value_at(natural, KIND),
            table.value_at(natural, ELEVATION),
            table.value_at(natural, IMAGED),
        );
    }
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ViewConfig::load(path)?,
        None => ViewConfig::default(),
    };

    let features = Arc::new(RecordTable::new(vec![
        Column::new("name", TypeTag::Text),
        Column::new("kind", TypeTag::Text),
        Column::new("elevation_m", TypeTag::Number),
        Column::new("last_imaged", TypeTag::Temporal),
    ]));
    let imaged = |y, m, d| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).single();
    let records: Vec<Vec<Value>> = vec![
        vec!["Olympus Mons".into(), "volcano".into(), 21_287i64.into(), imaged(2021, 3, 4).into()],
        vec![
            "Hellas Planitia".into(),
            "basin".into(),
            (-7_152i64).into(),
            imaged(2019, 11, 20).into(),
        ],
        vec!["Arsia Mons".into(), "volcano".into(), 17_761i64.into(), Value::Null],
        vec!["Gale".into(), "crater".into(), (-4_451i64).into(), imaged(2023, 6, 1).into()],
        vec!["Jezero".into(), "crater".into(), (-2_600i64).into(), imaged(2024, 1, 15).into()],
        vec![
            "Argyre Planitia".into(),
            "basin".into(),
            (-5_200i64).into(),
            imaged(2018, 8, 9).into(),
        ],
    ];
    for record in records {
        features.push(record);
    }

    let selection = Arc::new(SelectionModel::new());
    let view = SortedView::with_config(features.clone(), selection.clone(), config);
    view.layout_changed().connect(|_| tracing::info!("layout changed"));

    println!("Natural order:");
    print_table(&view);

    view.toggle_sort_order(ELEVATION)?;
    println!("Click 'elevation':");
    print_table(&view);

    view.toggle_sort_order(ELEVATION)?;
    println!("Click 'elevation' again:");
    print_table(&view);

    view.toggle_sort_order(KIND)?;
    println!("Click 'kind' (elevation becomes secondary):");
    print_table(&view);

    selection.add_range(0, 1);
    println!("Select the first two rows:");
    print_table(&view);
    println!("  selected records (natural): {:?}\n", features.selected_rows());

    features.push_with_selection(
        vec![
            "Valles Marineris".into(),
            "canyon".into(),
            (-5_000i64).into(),
            imaged(2022, 2, 2).into(),
        ],
        true,
    );
    println!("Add a selected record:");
    print_table(&view);

    features.remove(0)?;
    println!("Remove 'Olympus Mons':");
    print_table(&view);

    view.toggle_sort_order(IMAGED)?;
    println!("Click 'last imaged':");
    print_table(&view);

    view.clear_sort();
    println!("Clear sort:");
    print_table(&view);

    Ok(())
}
