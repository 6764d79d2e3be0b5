use std::sync::Arc;

use udise_core::{FilterTuple, ListSchoolsQuery, SchoolsApi};

use crate::{app_config::AppConfig, args::ReportArgs};

pub async fn report_cmd(
    api: Arc<dyn SchoolsApi>,
    config: &AppConfig,
    args: ReportArgs,
) -> Result<(), anyhow::Error> {
    let filters = FilterTuple {
        search: args.udise_code.clone(),
        ..Default::default()
    };
    let page = api
        .list_schools(&ListSchoolsQuery::from_filters(&filters, config.page_size))
        .await?;

    let Some(school) = page
        .data
        .into_iter()
        .find(|school| school.udise_code == args.udise_code)
    else {
        anyhow::bail!("School {} not found", args.udise_code);
    };

    if !school.can_view_report() {
        anyhow::bail!(
            "School {} has only been directory-synced; run `udise sync details` first",
            args.udise_code
        );
    }

    let url = config.report_url(school.school_id.as_deref().unwrap_or_default());
    if args.no_open {
        println!("{}", url);
    } else {
        println!("Opening report for {} ({})", school.name, url);
        webbrowser::open(&url)?;
    }

    Ok(())
}
