//! Interactive install command
//!
//! Submits an install job, follows its progress with a live bar, prompts
//! on naming conflicts, and reports the terminal outcome. The process exit
//! code reflects the job outcome.

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;

use labpull_client::{
    JobEvents, JobOutcome, JobSubmitter, Notifier, PanelClient, PollerConfig, ProgressPoller,
    ResultReporter, ResumeCoordinator,
};
use labpull_common::{
    HostCredentials, ImageKind, InstallRequest, JobStatus, NameChoice, ProgressUpdate,
};

use crate::output::{print_error, print_info, print_success};

#[derive(Args)]
pub struct InstallArgs {
    /// Image kind (qemu, iol, dynamips)
    #[arg(long)]
    pub kind: ImageKind,

    /// Catalog id of the image to install
    #[arg(long)]
    pub id: String,

    /// Target directory name on the host (vendor-version)
    #[arg(long)]
    pub name: Option<String>,

    /// Lab host address
    #[arg(long, env = "LABPULL_HOST")]
    pub host: String,

    /// Lab host username
    #[arg(long, env = "LABPULL_USERNAME")]
    pub username: String,

    /// Lab host password
    #[arg(long, env = "LABPULL_PASSWORD")]
    pub password: String,

    /// Seconds between progress polls
    #[arg(long, default_value = "2")]
    pub poll_interval: u64,

    /// Consecutive failed polls tolerated before giving up (0 = retry forever)
    #[arg(long, default_value = "30")]
    pub max_failed_polls: u32,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

enum FlowEvent {
    NeedsInput(NameChoice),
    Terminal(JobOutcome),
}

/// Bridges poller callbacks onto the command's event loop
struct InstallEvents {
    bar: ProgressBar,
    tx: mpsc::UnboundedSender<FlowEvent>,
}

impl JobEvents for InstallEvents {
    fn on_snapshot(&self, update: &ProgressUpdate) {
        self.bar.set_position(update.percent as u64);
        if update.message.is_empty() {
            self.bar.set_message(update.phase.to_string());
        } else {
            self.bar.set_message(format!("{}: {}", update.phase, update.message));
        }
    }

    fn on_needs_input(&self, choice: &NameChoice) {
        let _ = self.tx.send(FlowEvent::NeedsInput(choice.clone()));
    }

    fn on_terminal(&self, outcome: &JobOutcome) {
        let _ = self.tx.send(FlowEvent::Terminal(outcome.clone()));
    }
}

struct TermNotifier {
    bar: ProgressBar,
}

impl Notifier for TermNotifier {
    fn notify_success(&self, message: &str) {
        print_success(message);
    }

    fn notify_error(&self, message: &str) {
        print_error(message);
    }

    fn clear_progress(&self) {
        self.bar.finish_and_clear();
    }
}

pub async fn execute(args: InstallArgs, api: Arc<PanelClient>) -> Result<()> {
    let request = InstallRequest {
        kind: args.kind,
        catalog_id: args.id.clone(),
        target_name: args.name.clone(),
        credentials: HostCredentials {
            host: args.host.clone(),
            username: args.username.clone(),
            password: args.password.clone(),
        },
    };

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    if !args.yes && !confirm(&request, &mut input).await? {
        print_info("install cancelled");
        return Ok(());
    }

    let submitter = JobSubmitter::new(api.clone());
    let handle = submitter.submit(&request).await?;
    print_info(&format!("install job {handle} started"));

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos:>3}% {msg}")?
            .progress_chars("=> "),
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let events = Arc::new(InstallEvents {
        bar: bar.clone(),
        tx,
    });

    let config = PollerConfig {
        interval: Duration::from_secs(args.poll_interval.max(1)),
        max_consecutive_blips: (args.max_failed_polls > 0).then_some(args.max_failed_polls),
    };
    let subscription = ProgressPoller::new(api.clone(), config).start(handle.clone(), events);
    let coordinator = ResumeCoordinator::new(api.clone(), handle, subscription.clone());
    let reporter = ResultReporter::new(Arc::new(TermNotifier { bar: bar.clone() }));

    let mut failed = false;
    while let Some(event) = rx.recv().await {
        match event {
            FlowEvent::NeedsInput(choice) => {
                if !coordinator.begin(&choice) {
                    continue;
                }
                if !prompt_for_name(&coordinator, &choice, &bar, &mut input).await? {
                    print_info("install abandoned; the remote job is left running");
                    failed = true;
                    break;
                }
            }
            FlowEvent::Terminal(outcome) => {
                failed = !matches!(
                    &outcome,
                    JobOutcome::Finished(snapshot) if snapshot.status == JobStatus::Success
                );
                reporter.report(&outcome);
                break;
            }
        }
    }

    subscription.wait().await;

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

async fn confirm(request: &InstallRequest, input: &mut Lines<BufReader<Stdin>>) -> Result<bool> {
    print!(
        "Install {} image #{} on {}? [y/N] ",
        request.kind, request.catalog_id, request.credentials.host
    );
    std::io::stdout().flush()?;

    let line = input.next_line().await?.unwrap_or_default();
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

/// Collect a directory name from the operator and resolve the suspended
/// job. Returns false if the operator abandoned the install.
async fn prompt_for_name(
    coordinator: &ResumeCoordinator,
    choice: &NameChoice,
    bar: &ProgressBar,
    input: &mut Lines<BufReader<Stdin>>,
) -> Result<bool> {
    bar.set_message("waiting for a directory name".to_string());

    println!();
    println!("{}", "The host needs a directory name for this image.".yellow());
    if !choice.current_name.is_empty() {
        println!("  current name: {}", choice.current_name);
    }
    if !choice.base_dir.is_empty() {
        println!("  destination:  {}", choice.base_dir);
    }
    if !choice.choices.is_empty() {
        println!("  alternatives: {}", choice.choices.join(", "));
    }

    loop {
        if choice.suggested_name.is_empty() {
            print!("Name (vendor-version, 'q' abandons): ");
        } else {
            print!(
                "Name [{}] (empty accepts, 'q' abandons): ",
                choice.suggested_name
            );
        }
        std::io::stdout().flush()?;

        let line = input.next_line().await?.unwrap_or_default();
        let answer = line.trim();

        if answer.eq_ignore_ascii_case("q") {
            coordinator.cancel();
            return Ok(false);
        }

        let name = if answer.is_empty() {
            choice.suggested_name.as_str()
        } else {
            answer
        };

        match coordinator.resolve(name).await {
            Ok(()) => return Ok(true),
            Err(err) => {
                // Recoverable: stay in the prompt and let the operator
                // try a different name.
                print_error(&err.to_string());
            }
        }
    }
}
