use crate::commands::{
    run_approve, run_create, run_list, run_notify, run_preview, run_publish, run_view,
    ApproveArgs, CreateArgs, PreviewArgs, SlugArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use insight_desk::config::AppConfig;
use insight_desk::error::AppError;
use insight_desk::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "insight-desk",
    about = "Create, review and publish insights drafts from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Save a new draft in pending review and notify the reviewer
    Create(CreateArgs),
    /// List every draft with its status and unresolved placeholder count
    List,
    /// Print a draft's metadata, placeholder report and a content preview
    View(SlugArgs),
    /// Approve a draft once no placeholders remain
    Approve(ApproveArgs),
    /// Snapshot approved and published drafts and rewrite the registry
    Publish,
    /// Send the review notification for an existing draft again
    Notify(SlugArgs),
    /// Write a standalone HTML preview of a draft
    Preview(PreviewArgs),
    /// Start the review HTTP service
    Serve(ServeArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version are not failures
        Err(err) if !err.use_stderr() => {
            err.print()?;
            return Ok(());
        }
        Err(err) => return Err(AppError::Rejected(err.to_string())),
    };

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::Create(args) => run_create(&config, args),
        Command::List => run_list(&config),
        Command::View(args) => run_view(&config, args),
        Command::Approve(args) => run_approve(&config, args),
        Command::Publish => run_publish(&config),
        Command::Notify(args) => run_notify(&config, args),
        Command::Preview(args) => run_preview(&config, args),
        Command::Serve(args) => server::run(config, args),
    }
}
