use std::sync::Arc;

use udise_core::{
    load_years, read_filters, set_page, write_filters, FilterTuple, QueryController, QueryPhase,
    QuerySnapshot, SchoolsApi,
};

use crate::{
    app_config::AppConfig,
    args::{FilterArgs, SchoolsArgs},
    formatters::SchoolListFormatter,
};

pub async fn schools_cmd(
    api: Arc<dyn SchoolsApi>,
    config: &AppConfig,
    args: SchoolsArgs,
) -> Result<(), anyhow::Error> {
    let filters = browse_filters(&args.filters, args.synced, config);
    let page_limit = if args.all { None } else { Some(args.pages.max(1)) };

    let snapshot = browse(api, config, filters, page_limit).await;

    match snapshot.phase {
        QueryPhase::Idle => {
            println!("Select a state, district, filter or search term to list schools.");
            return Ok(());
        }
        QueryPhase::Error if snapshot.results.records.is_empty() => {
            anyhow::bail!(
                "Failed to load schools: {}",
                snapshot.last_error.unwrap_or_default()
            );
        }
        QueryPhase::Error => {
            eprintln!(
                "Warning: stopped after page {}: {}",
                snapshot.loaded_page,
                snapshot.last_error.as_deref().unwrap_or_default()
            );
        }
        _ => {}
    }

    let next_query = snapshot.results.has_more.then(|| {
        let params = write_filters(&snapshot.filters);
        set_page(&params, snapshot.loaded_page + 1).to_query_string()
    });

    let mut formatter = SchoolListFormatter::new(args.output);
    formatter
        .print_schools(&snapshot, next_query.as_deref())
        .map_err(|e| anyhow::anyhow!("Error while formatting schools: {}", e))?;

    Ok(())
}

/// Filters from the flags, or the saved selection when browsing synced schools
pub fn browse_filters(args: &FilterArgs, synced: bool, config: &AppConfig) -> FilterTuple {
    let filters = read_filters(&args.to_params());
    if synced {
        filters.with_location(&config.selection)
    } else {
        filters
    }
}

/// Load pages the way the list view scrolls: one fetch-more signal per
/// settled page until the limit is reached or nothing more is available
async fn browse(
    api: Arc<dyn SchoolsApi>,
    config: &AppConfig,
    filters: FilterTuple,
    page_limit: Option<u32>,
) -> QuerySnapshot {
    let controller = QueryController::new(api.clone(), config.query_config());
    if filters.year.is_some() {
        controller.set_years(load_years(api.as_ref()).await);
    }

    controller.update(filters);
    let mut snapshot = controller.settled().await;
    let mut loaded = 1;

    while page_limit.map_or(true, |limit| loaded < limit) {
        if controller.request_more().is_none() {
            break;
        }
        snapshot = controller.settled().await;
        if snapshot.phase == QueryPhase::Error {
            break;
        }
        loaded += 1;
    }

    snapshot
}
