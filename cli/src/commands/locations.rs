use std::sync::Arc;

use udise_core::{load_districts, load_states, load_years, LocationSource, SchoolsApi};

use crate::args::LocationsCommand;

pub async fn locations_cmd(
    api: Arc<dyn SchoolsApi>,
    subcommand: LocationsCommand,
) -> Result<(), anyhow::Error> {
    match subcommand {
        LocationsCommand::Years => {
            for year in load_years(api.as_ref()).await {
                println!("{}\t{}", year.id, year.desc);
            }
        }
        LocationsCommand::States { synced, year } => {
            if !synced && year.is_none() {
                anyhow::bail!("Pass --year to list master states, or --synced");
            }
            for state in load_states(api.as_ref(), source(synced), year.as_deref()).await {
                println!("{}\t{}", state.code, state.name);
            }
        }
        LocationsCommand::Districts {
            state,
            synced,
            year,
        } => {
            if !synced && year.is_none() {
                anyhow::bail!("Pass --year to list master districts, or --synced");
            }
            let districts =
                load_districts(api.as_ref(), source(synced), &state, year.as_deref()).await;
            for district in districts {
                println!("{}\t{}", district.code, district.name);
            }
        }
    }

    Ok(())
}

fn source(synced: bool) -> LocationSource {
    if synced {
        LocationSource::Synced
    } else {
        LocationSource::Master
    }
}
