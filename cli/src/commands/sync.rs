use std::sync::Arc;

use udise_core::{SchoolsApi, SyncStage, SyncStatus, SyncStore};

use crate::{
    app_config::AppConfig,
    args::SyncArgs,
    commands::select::{apply_selection, describe},
    formatters::print_sync_statuses,
    notifier::TerminalNotifier,
};

pub async fn sync_cmd(
    api: Arc<dyn SchoolsApi>,
    config: &AppConfig,
    args: SyncArgs,
) -> Result<(), anyhow::Error> {
    let selection = apply_selection(
        &config.selection,
        args.year.clone(),
        args.state.clone(),
        args.district.clone(),
    );

    let store = SyncStore::new(api, Arc::new(TerminalNotifier));
    store.set_selections(selection.clone());

    let stage = args.target.stage();
    match stage {
        Some(SyncStage::Gis) => {
            if selection.state.is_none() || selection.district.is_none() {
                anyhow::bail!("Select a state and district first (udise select)");
            }
        }
        _ => {
            if selection.complete().is_none() {
                anyhow::bail!("Select a year, state and district first (udise select)");
            }
        }
    }

    println!("Syncing {}", describe(&selection));

    // Details only run once the directory stage has succeeded in this process
    if stage == Some(SyncStage::Details) && !args.force && !store.is_step1_complete() {
        store.run(SyncStage::Directory).await;
        if !store.is_step1_complete() {
            print_sync_statuses(&store.snapshot())?;
            anyhow::bail!("Directory sync did not succeed; details were not synced");
        }
    }

    match stage {
        Some(stage) => store.run(stage).await,
        None => {
            store.run_all().await;
        }
    }

    let snapshot = store.snapshot();
    print_sync_statuses(&snapshot)?;

    let failed = SyncStage::ALL
        .iter()
        .any(|stage| matches!(snapshot.status(*stage), SyncStatus::Error(_)));
    if failed {
        anyhow::bail!("Sync did not complete");
    }

    Ok(())
}
