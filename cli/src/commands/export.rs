use std::path::PathBuf;
use std::sync::Arc;

use udise_core::{DownloadSink, ExportDispatcher, ExportError, SchoolsApi};

use crate::{app_config::AppConfig, args::ExportArgs, commands::schools::browse_filters};

/// Saves downloads into a directory
struct FileSink {
    dir: PathBuf,
}

impl DownloadSink for FileSink {
    fn deliver(&self, file_name: &str, bytes: &[u8]) -> Result<(), ExportError> {
        std::fs::create_dir_all(&self.dir)
            .and_then(|_| std::fs::write(self.dir.join(file_name), bytes))
            .map_err(|e| ExportError::Sink(e.to_string()))
    }
}

pub async fn export_cmd(
    api: Arc<dyn SchoolsApi>,
    config: &AppConfig,
    args: ExportArgs,
) -> Result<(), anyhow::Error> {
    let filters = browse_filters(&args.filters, args.synced, config);
    let sink = FileSink {
        dir: PathBuf::from(&args.out),
    };

    let file_name = ExportDispatcher::new(api)
        .export(&filters, args.scope.into(), args.format, &sink)
        .await?;

    println!("Export saved to {}", sink.dir.join(file_name).display());

    Ok(())
}
