use std::path::Path;

use udise_core::{read_filters, write_filters, FilterTuple, SelectedLocation};

use crate::{
    args::{FilterArgs, SelectArgs},
    profile::Profile,
};

pub fn select_cmd(profile_path: &Path, args: SelectArgs) -> Result<(), anyhow::Error> {
    let mut profile = Profile::from_path(profile_path)?.unwrap_or_default();

    profile.selection = if args.clear {
        SelectedLocation::default()
    } else {
        apply_selection(
            &profile.selection,
            args.year.clone(),
            args.state.clone(),
            args.district.clone(),
        )
    };
    profile.save(profile_path)?;

    println!("Selection saved: {}", describe(&profile.selection));

    Ok(())
}

/// Edits follow the browse filters: a new year drops state and district,
/// a new state drops the district
pub fn apply_selection(
    current: &SelectedLocation,
    year: Option<String>,
    state: Option<String>,
    district: Option<String>,
) -> SelectedLocation {
    let current = write_filters(&FilterTuple::default().with_location(current));
    let edits = FilterArgs {
        query: Some(current.to_query_string()),
        year,
        state,
        district,
        ..Default::default()
    };

    let filters = read_filters(&edits.to_params());
    SelectedLocation::new(filters.year, filters.state, filters.district)
}

pub fn describe(selection: &SelectedLocation) -> String {
    let part = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    format!(
        "year={} state={} district={}",
        part(&selection.year),
        part(&selection.state),
        part(&selection.district)
    )
}
