//! One-shot install progress query

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use labpull_client::{PanelApi, PanelClient};
use labpull_common::{JobHandle, JobSnapshot};

use crate::output::{print_item, print_warning, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ProgressArgs {
    /// Install job id
    #[arg(long)]
    pub job_id: String,
}

/// Progress display wrapper for serialization
#[derive(Serialize)]
struct ProgressDisplay {
    status: String,
    phase: String,
    percent: u8,
    message: String,
}

impl TableDisplay for ProgressDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Status", "Phase", "Percent", "Message"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.status.clone(),
            self.phase.clone(),
            format!("{}%", self.percent),
            self.message.clone(),
        ]
    }
}

pub async fn execute(args: ProgressArgs, api: Arc<PanelClient>, format: OutputFormat) -> Result<()> {
    let handle = JobHandle::new(args.job_id);
    let report = api.fetch_progress(&handle).await?;
    let snapshot = JobSnapshot::from_report(&report)?;

    let display = ProgressDisplay {
        status: snapshot.status.to_string(),
        phase: snapshot.progress.phase.to_string(),
        percent: snapshot.progress.percent,
        message: snapshot.progress.message.clone(),
    };
    print_item(&display, format);

    if let Some(choice) = &snapshot.name_choice {
        print_warning(&format!(
            "job is waiting for a directory name (suggested: {})",
            choice.suggested_name
        ));
    }

    Ok(())
}
