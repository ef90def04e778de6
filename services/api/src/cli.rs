use crate::demo::{run_demo, DemoArgs};
use crate::infra::{build_service, parse_date};
use crate::render::{render_report, write_report_json};
use crate::server;
use chrono::NaiveDate;
use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use team_pulse::config::AppConfig;
use team_pulse::error::AppError;
use team_pulse::workflows::import::WorkspaceImporter;
use team_pulse::workflows::performance::{Scope, TeamId, UserId};

#[derive(Parser, Debug)]
#[command(
    name = "Team Pulse",
    about = "Score team performance and publish weekly reports from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Generate a weekly report from CSV exports
    Report(ReportArgs),
    /// Score a seeded team and print its weekly report and KPI table
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Task export to serve instead of the seeded demo workspace
    #[arg(long)]
    pub(crate) tasks_csv: Option<PathBuf>,
    /// Goal export paired with --tasks-csv
    #[arg(long, requires = "tasks_csv")]
    pub(crate) goals_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("scope").required(true).args(["team", "user"])))]
pub(crate) struct ReportArgs {
    /// Team to report on
    #[arg(long)]
    pub(crate) team: Option<String>,
    /// Individual to report on
    #[arg(long)]
    pub(crate) user: Option<String>,
    /// Any date inside the reporting week (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) week: NaiveDate,
    /// Task export with assignee, due, completion, and checklist columns
    #[arg(long)]
    pub(crate) tasks_csv: PathBuf,
    /// Goal export used for KRA coverage
    #[arg(long)]
    pub(crate) goals_csv: Option<PathBuf>,
    /// Print the report as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

impl ReportArgs {
    fn scope(&self) -> Option<Scope> {
        match (&self.team, &self.user) {
            (Some(team), _) => Some(Scope::Team(TeamId::new(team.as_str()))),
            (None, Some(user)) => Some(Scope::User(UserId::new(user.as_str()))),
            (None, None) => None,
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}

async fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let Some(scope) = args.scope() else {
        // clap enforces the group; nothing to report on otherwise.
        return Ok(());
    };

    let snapshot = WorkspaceImporter::from_paths(&args.tasks_csv, args.goals_csv.as_ref())?;
    let service = build_service(Arc::new(snapshot), config.reports.report_settings());
    let report = service.generate(&scope, args.week).await?;

    if args.json {
        write_report_json(&report, std::io::stdout().lock())?;
    } else {
        render_report(&report);
    }
    Ok(())
}
