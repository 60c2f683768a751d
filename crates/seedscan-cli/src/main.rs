use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use seedscan_core::{
    config::validate_config, load_config, parse_url_list, AnalysisSession, CommentFilter,
    CsvExport, ResultView, SessionState, SubmitOutcome,
};
use seedscan_schema::AnalysisInput;

mod render;

#[derive(Parser)]
#[command(name = "seedscan", version, about = "TikTok seeding-comment analysis client")]
struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Prediction API base URL (overrides config)")]
    api_base: Option<String>,

    #[arg(long, help = "Skip the connectivity probe and run against demo data")]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Analyze the comments of a single TikTok video")]
    Url {
        #[arg(help = "Video URL, e.g. https://www.tiktok.com/@user/video/123")]
        url: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    #[command(about = "Analyze a batch of video URLs (newline-separated file, - for stdin)")]
    Urls {
        #[arg(help = "Path to the URL list, or - to read stdin")]
        list: PathBuf,
        #[command(flatten)]
        view: ViewArgs,
    },
    #[command(about = "Analyze comments imported from a JSON or CSV file")]
    File {
        #[arg(help = "Path to the comment file")]
        path: PathBuf,
        #[command(flatten)]
        view: ViewArgs,
    },
    #[command(about = "Check whether the prediction API is reachable")]
    Health,
    #[command(about = "Show aggregate service statistics")]
    Stats,
    #[command(about = "Download the server-rendered CSV of a past analysis")]
    Download {
        #[arg(help = "Analysis id returned with a previous result")]
        analysis_id: String,
        #[arg(long, help = "Output path (default tiktok_analysis_<id>.csv)")]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ViewArgs {
    #[arg(
        long,
        value_enum,
        default_value = "all",
        help = "Which partition of comments to list"
    )]
    filter: FilterArg,

    #[arg(long, default_value_t = 1, help = "Table page to show (20 comments per page)")]
    page: usize,

    #[arg(long, help = "Hide the confidence column")]
    no_confidence: bool,

    #[arg(long, help = "Write the analysis as CSV to this path")]
    export: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Seeding,
    Normal,
}

impl From<FilterArg> for CommentFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => CommentFilter::All,
            FilterArg::Seeding => CommentFilter::Seeding,
            FilterArg::Normal => CommentFilter::Normal,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(base) = cli.api_base {
        config.api_base = base;
        validate_config(&config)?;
    }
    let mut session = AnalysisSession::from_config(&config)?;

    match cli.command {
        Commands::Url { url, view } => {
            let input = AnalysisInput::Url(url.trim().to_string());
            run_analysis(&mut session, cli.offline, input, view).await
        }
        Commands::Urls { list, view } => {
            let raw = read_url_list(&list)?;
            let urls = parse_url_list(&raw);
            run_analysis(&mut session, cli.offline, AnalysisInput::Urls(urls), view).await
        }
        Commands::File { path, view } => {
            run_analysis(&mut session, cli.offline, AnalysisInput::File(path), view).await
        }
        Commands::Health => {
            let online = session.probe_connectivity().await;
            render::print_connection(online, session.api().base_url());
            if !online {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Stats => {
            if cli.offline {
                session.set_online(false);
            } else {
                session.probe_connectivity().await;
            }
            let stats = if session.is_online() {
                session.api().get_stats().await?
            } else {
                session.mock().global_stats()
            };
            render::print_global_stats(&stats, session.is_online());
            Ok(())
        }
        Commands::Download { analysis_id, output } => {
            let bytes = session.api().download_results(&analysis_id).await?;
            let path = output
                .unwrap_or_else(|| PathBuf::from(format!("tiktok_analysis_{analysis_id}.csv")));
            std::fs::write(&path, &bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("saved {}", path.display());
            Ok(())
        }
    }
}

async fn run_analysis(
    session: &mut AnalysisSession,
    offline: bool,
    input: AnalysisInput,
    view_args: ViewArgs,
) -> Result<()> {
    if offline {
        session.set_online(false);
    } else {
        session.probe_connectivity().await;
    }
    if !session.is_online() {
        render::print_demo_notice();
    }

    match session.submit(input).await {
        SubmitOutcome::Rejected(err) => return Err(anyhow!(err)),
        SubmitOutcome::Busy => return Err(anyhow!("an analysis is already in flight")),
        SubmitOutcome::Settled => {}
    }

    match session.state() {
        SessionState::Result(result) => {
            let mut view = ResultView::new(result);
            view.set_filter(view_args.filter.into());
            view.set_page(view_args.page);

            render::print_summary(&view);
            render::print_table(&view, !view_args.no_confidence);

            if let Some(path) = view_args.export {
                let filtered = view.filtered();
                let export = session
                    .export_csv(filtered.iter().copied(), result.analysis_id.as_deref())
                    .await;
                let origin = match &export {
                    CsvExport::Server(_) => "server",
                    CsvExport::Local(_) => "local",
                };
                std::fs::write(&path, export.into_bytes())
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("exported {} CSV to {}", origin, path.display());
            }
            Ok(())
        }
        SessionState::Error(message) => Err(anyhow!("analysis failed: {message}")),
        other => Err(anyhow!("unexpected session state: {other:?}")),
    }
}

fn read_url_list(list: &Path) -> Result<String> {
    if list == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read URL list from stdin")?;
        Ok(raw)
    } else {
        std::fs::read_to_string(list)
            .with_context(|| format!("failed to read URL list: {}", list.display()))
    }
}
