use campus_notifier::config::Config;
use campus_notifier::draft::{self, DraftHandle, PipelineSettings};
use campus_notifier::error::{validation_error, Error};
use campus_notifier::events::{timeline, CanonicalEvent, DateRange, FilterAxis, FilterCriteria, Normalizer};
use campus_notifier::store::{load_events, EventStoreWriter, RedisStoreHandle};
use campus_notifier::{shutdown, startup};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "campus_notifier", version, about = "Campus event timeline and drafting tool")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the filtered, sorted event timeline
    Timeline(TimelineArgs),
    /// Draft an event from raw text and optionally publish it
    Draft(DraftArgs),
}

#[derive(Args, Default)]
struct TimelineArgs {
    /// Departments to include (comma-separated)
    #[arg(long, env = "FILTER_DEPARTMENTS", value_delimiter = ',')]
    departments: Vec<String>,
    /// Event types to include (comma-separated)
    #[arg(long = "types", env = "FILTER_TYPES", value_delimiter = ',')]
    event_types: Vec<String>,
    /// Priorities to include (comma-separated)
    #[arg(long, env = "FILTER_PRIORITIES", value_delimiter = ',')]
    priorities: Vec<String>,
    /// First day of the date range (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    from: Option<NaiveDate>,
    /// Last day of the date range (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,
    /// Keep printing the timeline until interrupted
    #[arg(long)]
    watch: bool,
    /// Seconds between refreshes in watch mode
    #[arg(long, default_value_t = 30)]
    interval: u64,
}

#[derive(Args)]
struct DraftArgs {
    #[arg(long)]
    title: String,
    /// Raw event text
    #[arg(long, conflicts_with = "text_file")]
    text: Option<String>,
    /// File holding the raw event text
    #[arg(long)]
    text_file: Option<PathBuf>,
    /// Corrections applied one after another
    #[arg(long)]
    feedback: Vec<String>,
    /// Publish the draft once generated
    #[arg(long, requires = "actor")]
    publish: bool,
    /// Identifier recorded as the publisher
    #[arg(long)]
    actor: Option<String>,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    let cli = Cli::parse();
    info!("Starting campus notifier");

    let config = startup::load_config()?;
    let (store, store_task) = startup::start_store(&config)?;

    let token = CancellationToken::new();
    tokio::spawn(shutdown::handle_signals(token.clone()));

    let result = match cli.command {
        Some(Command::Draft(args)) => run_draft(&config, &store, args, &token).await,
        Some(Command::Timeline(args)) => run_timeline(&config, &store, &args, &token).await,
        None => run_timeline(&config, &store, &TimelineArgs::default(), &token).await,
    };

    if let Err(e) = store.shutdown().await {
        error!("Error shutting down Redis actor: {:?}", e);
    }
    let _ = store_task.await;

    result
}

async fn run_timeline(
    config: &Config,
    store: &RedisStoreHandle,
    args: &TimelineArgs,
    token: &CancellationToken,
) -> miette::Result<()> {
    let criteria = criteria_from(args)?;
    let normalizer = Normalizer::new(config.priorities.clone());

    loop {
        let events = load_events(store, &normalizer).await?;
        print_timeline(&timeline(&events, &criteria), &normalizer);

        if !args.watch {
            return Ok(());
        }

        tokio::select! {
            _ = token.cancelled() => return Ok(()),
            _ = tokio::time::sleep(Duration::from_secs(args.interval.max(1))) => {}
        }
    }
}

fn criteria_from(args: &TimelineArgs) -> miette::Result<FilterCriteria> {
    let mut criteria = FilterCriteria::new();
    let axes = [
        (FilterAxis::Departments, &args.departments),
        (FilterAxis::EventTypes, &args.event_types),
        (FilterAxis::Priorities, &args.priorities),
    ];
    for (axis, values) in axes {
        for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
            if !criteria.axis(axis).contains(value) {
                criteria = criteria.toggle(axis, value);
            }
        }
    }

    if let (Some(from), Some(to)) = (args.from, args.to) {
        let range = DateRange::days(from, to).ok_or_else(|| validation_error("Invalid date range"))?;
        criteria = criteria.with_date_range(Some(range));
    }

    Ok(criteria)
}

fn print_timeline(events: &[CanonicalEvent], normalizer: &Normalizer) {
    if events.is_empty() {
        println!("No events match the current filters");
        return;
    }

    for event in events {
        let marker = if normalizer.priorities().is_elevated(&event.priority) {
            "!"
        } else {
            " "
        };
        let audience = if event.is_for_all_departments() {
            "everyone".to_string()
        } else {
            event.tags.join(", ")
        };
        println!(
            "{} {:<20} {} [{}] @ {} ({})",
            marker, event.start_time, event.title, event.event_type, event.venue, audience
        );
    }
}

async fn run_draft(
    config: &Config,
    store: &RedisStoreHandle,
    args: DraftArgs,
    token: &CancellationToken,
) -> miette::Result<()> {
    let raw_text = match (&args.text, &args.text_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(Error::from)?,
        (None, None) => return Err(validation_error("Provide --text or --text-file").into()),
    };

    let writer: Arc<dyn EventStoreWriter> = Arc::new(store.clone());
    let drafts = DraftHandle::new(
        draft::build_generator(config),
        writer,
        PipelineSettings::from_config(config),
    );

    let result = tokio::select! {
        result = drive_draft(&drafts, &args, &raw_text) => result,
        _ = token.cancelled() => {
            drafts.abandon().await?;
            Ok(())
        }
    };

    drafts.shutdown().await?;
    result
}

async fn drive_draft(drafts: &DraftHandle, args: &DraftArgs, raw_text: &str) -> miette::Result<()> {
    let mut preview = drafts.submit(&args.title, raw_text).await?;
    for feedback in &args.feedback {
        drafts.request_refinement().await?;
        preview = drafts.submit_feedback(feedback).await?;
    }

    if let Some(reason) = &preview.fallback_reason {
        println!("Generation failed ({}), showing a local draft", reason);
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&preview.draft).map_err(Error::from)?
    );

    if let (true, Some(actor)) = (args.publish, &args.actor) {
        let receipt = drafts.publish(actor).await?;
        println!("Published {} as {}", receipt.id, receipt.published_by);
    }

    Ok(())
}
