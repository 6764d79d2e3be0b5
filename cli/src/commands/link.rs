use udise_core::{clear_filters, read_filters, set_filter, set_page, FilterParams};

use crate::args::LinkArgs;

pub fn link_cmd(args: LinkArgs) -> Result<(), anyhow::Error> {
    let params = build_link(&args);

    if args.json {
        let filters = read_filters(&params);
        println!("{}", serde_json::to_string_pretty(&filters)?);
    } else {
        println!("{}", params);
    }

    Ok(())
}

fn build_link(args: &LinkArgs) -> FilterParams {
    let mut params = FilterParams::parse(&args.from);

    if args.clear {
        params = clear_filters(&params);
    }

    for (key, value) in &args.set {
        params = set_filter(&params, key, value);
    }

    if let Some(page) = args.page {
        params = set_page(&params, page);
    }

    params
}
