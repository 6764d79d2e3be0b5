use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use udise_core::{
    filters::{
        KEY_CATEGORY, KEY_DISTRICT, KEY_MANAGEMENT, KEY_SEARCH, KEY_STATE, KEY_TYPE, KEY_YEAR,
    },
    set_filter, set_page, ExportFormat, ExportScope, FilterParams, SyncStage,
};

#[derive(Parser, Debug)]
#[command(
    name = "udise",
    version,
    about,
    long_about = "Browse and sync UDISE school directory data"
)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Debug, Args, Serialize)]
pub struct ConfigArgs {
    /// Profile to use instead of the current one
    #[arg(long, short, global = true, env = "UDISE_PROFILE")]
    pub profile: Option<String>,

    /// Base URL of the schools API
    #[arg(long, global = true, env = "UDISE_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token for the schools API
    #[arg(long, global = true, env = "UDISE_TOKEN", hide_env_values = true)]
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum Command {
    /// Prints out current configuration
    Config,
    /// Profile subcommands
    Profile {
        #[clap(subcommand)]
        command: Option<ProfileCommand>,
    },
    /// Saves the selected year/state/district to the profile
    Select(SelectArgs),
    /// Lists schools matching the given filters
    Schools(SchoolsArgs),
    /// Opens the report of a detail-synced school
    Report(ReportArgs),
    /// Runs sync stages for the selected location
    Sync(SyncArgs),
    /// Downloads schools as CSV or JSON
    Export(ExportArgs),
    /// Lists years, states or districts
    #[clap(subcommand)]
    Locations(LocationsCommand),
    /// Builds a browse query string from filter edits
    Link(LinkArgs),
    /// Prints shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum ProfileCommand {
    /// Switch to a profile, creating it if needed
    Use { name: String },
    /// List available profiles
    List,
    /// Show the current profile
    Current,
}

#[derive(Debug, Clone, Default, Args, PartialEq)]
pub struct FilterArgs {
    /// Start from a query string, e.g. "?state=09&district=0901"
    #[arg(long, value_name = "QUERY")]
    pub query: Option<String>,

    #[arg(long)]
    pub year: Option<String>,

    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub district: Option<String>,

    /// School type, "all" for any
    #[arg(long = "type", value_name = "TYPE")]
    pub school_type: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub management: Option<String>,

    /// Free-text search
    #[arg(long, short = 'q')]
    pub search: Option<String>,

    /// Page to start from
    #[arg(long)]
    pub page: Option<u32>,
}

impl FilterArgs {
    /// Apply the flags on top of `--query`, the same way the browse view
    /// applies filter edits. A flag equal to the value already present is
    /// left alone so it does not trigger a cascading reset.
    pub fn to_params(&self) -> FilterParams {
        let mut params = self
            .query
            .as_deref()
            .map(FilterParams::parse)
            .unwrap_or_default();

        for (key, value) in [
            (KEY_YEAR, &self.year),
            (KEY_STATE, &self.state),
            (KEY_DISTRICT, &self.district),
            (KEY_TYPE, &self.school_type),
            (KEY_CATEGORY, &self.category),
            (KEY_MANAGEMENT, &self.management),
            (KEY_SEARCH, &self.search),
        ] {
            if let Some(value) = value {
                if params.get(key) != Some(value.as_str()) {
                    params = set_filter(&params, key, value);
                }
            }
        }

        if let Some(page) = self.page {
            params = set_page(&params, page);
        }

        params
    }
}

#[derive(Debug, Clone, ValueEnum, PartialEq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Plain,
    Json,
}

#[derive(Debug, Args, PartialEq)]
pub struct SchoolsArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Browse the location saved with `udise select`
    #[arg(long)]
    pub synced: bool,

    /// Number of pages to load
    #[arg(long, default_value_t = 1, conflicts_with = "all")]
    pub pages: u32,

    /// Keep loading until no more results
    #[arg(long)]
    pub all: bool,

    /// Output format (pretty, plain, or json)
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,
}

#[derive(Debug, Args, PartialEq)]
pub struct SelectArgs {
    #[arg(long)]
    pub year: Option<String>,

    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub district: Option<String>,

    /// Forget the saved selection
    #[arg(long, conflicts_with_all = ["year", "state", "district"])]
    pub clear: bool,
}

#[derive(Debug, Args, PartialEq)]
pub struct ReportArgs {
    /// UDISE code of the school
    #[arg(value_name = "UDISE_CODE")]
    pub udise_code: String,

    /// Print the report URL instead of opening a browser
    #[arg(long)]
    pub no_open: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum SyncTarget {
    Directory,
    Gis,
    Details,
    All,
}

impl SyncTarget {
    pub fn stage(self) -> Option<SyncStage> {
        match self {
            SyncTarget::Directory => Some(SyncStage::Directory),
            SyncTarget::Gis => Some(SyncStage::Gis),
            SyncTarget::Details => Some(SyncStage::Details),
            SyncTarget::All => None,
        }
    }
}

#[derive(Debug, Args, PartialEq)]
pub struct SyncArgs {
    #[arg(value_enum)]
    pub target: SyncTarget,

    /// Overrides the saved year
    #[arg(long)]
    pub year: Option<String>,

    /// Overrides the saved state
    #[arg(long)]
    pub state: Option<String>,

    /// Overrides the saved district
    #[arg(long)]
    pub district: Option<String>,

    /// With `details`: skip the directory stage that otherwise runs first
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum ScopeArg {
    /// Everything the filters select
    Filters,
    /// The whole district, other filters ignored
    District,
}

impl From<ScopeArg> for ExportScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::Filters => ExportScope::CurrentFilters,
            ScopeArg::District => ExportScope::WholeDistrict,
        }
    }
}

#[derive(Debug, Args, PartialEq)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Export the location saved with `udise select`
    #[arg(long)]
    pub synced: bool,

    #[arg(long, value_enum, default_value_t = ScopeArg::Filters)]
    pub scope: ScopeArg,

    /// csv or json
    #[arg(long, default_value = "csv", value_parser = parse_export_format)]
    pub format: ExportFormat,

    /// Directory to save the file in
    #[arg(long, short, default_value = ".")]
    pub out: String,
}

pub fn parse_export_format(s: &str) -> anyhow::Result<ExportFormat> {
    Ok(s.parse()?)
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum LocationsCommand {
    /// Known academic years
    Years,
    /// States, from the master list or already synced
    States {
        /// Only states that have been synced
        #[arg(long)]
        synced: bool,
        #[arg(long)]
        year: Option<String>,
    },
    /// Districts of a state
    Districts {
        #[arg(long)]
        state: String,
        /// Only districts that have been synced
        #[arg(long)]
        synced: bool,
        #[arg(long)]
        year: Option<String>,
    },
}

#[derive(Debug, Args, PartialEq)]
pub struct LinkArgs {
    /// Query string to start from
    #[arg(long, value_name = "QUERY", default_value = "")]
    pub from: String,

    /// Drop everything except year and state first
    #[arg(long)]
    pub clear: bool,

    /// Filter edits applied in order, e.g. --set state=09
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub set: Vec<(String, String)>,

    /// Jump to a page after the edits
    #[arg(long)]
    pub page: Option<u32>,

    /// Print the resulting filters as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn parse_key_value(s: &str) -> anyhow::Result<(String, String)> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => anyhow::bail!("Expected KEY=VALUE, got '{}'", s),
    }
}
