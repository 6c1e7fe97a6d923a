/*
[INPUT]:  Parsed subcommand arguments, TaskConsole bound to the engine client
[OUTPUT]: Rendered views on stdout, intents sent to the engine, report files
[POS]:    CLI command layer - one function per subcommand
[UPDATE]: When adding subcommands or changing their output
*/

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, ValueEnum};
use console::{Term, style};
use secprobe_adapter::{CaseId, CategoryId, EngineClient, ReportFormat, TaskId, TaskQuery, TaskStatus};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use secprobe_console::catalog::CaseCatalog;
use secprobe_console::render;
use secprobe_console::{
    BoardUpdate, CompositionSession, ConsoleError, SessionUpdate, TaskConsole,
    TaskDetailSession, parse_target,
};

use crate::cli::interactive;

type Console = TaskConsole<EngineClient>;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Target IPv4 address
    #[arg(long, value_name = "IP")]
    pub target: String,
    /// Run every enabled case, resolved by the engine at execution time (default)
    #[arg(long, conflicts_with_all = ["cases", "categories", "interactive"])]
    pub all: bool,
    /// Run a specific case (repeatable)
    #[arg(long = "case", value_name = "ID")]
    pub cases: Vec<CaseId>,
    /// Run every case of a category (repeatable)
    #[arg(long = "category", value_name = "ID")]
    pub categories: Vec<CategoryId>,
    /// Pick cases from the catalog interactively
    #[arg(long)]
    pub interactive: bool,
    #[arg(long, value_name = "TEXT")]
    pub description: Option<String>,
    /// Follow the task after submitting it
    #[arg(long)]
    pub watch: bool,
}

impl RunArgs {
    fn is_run_all(&self) -> bool {
        self.all || (self.cases.is_empty() && self.categories.is_empty() && !self.interactive)
    }
}

#[derive(Args, Debug)]
pub struct TasksArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long = "page-size", default_value_t = 20)]
    pub page_size: u32,
    #[arg(long, value_parser = parse_status)]
    pub status: Option<TaskStatus>,
    #[arg(long, value_name = "IP")]
    pub target: Option<String>,
    /// Only tasks created by the logged-in user
    #[arg(long)]
    pub mine: bool,
    /// Keep refreshing until Ctrl-C
    #[arg(long)]
    pub watch: bool,
}

impl TasksArgs {
    fn query(&self) -> TaskQuery {
        TaskQuery {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, 100),
            status: self.status,
            target_ip: self.target.clone(),
            my_tasks: self.mine,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Json,
    Html,
}

impl From<ExportFormat> for ReportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => ReportFormat::Json,
            ExportFormat::Html => ReportFormat::Html,
        }
    }
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    pub task_id: TaskId,
    #[arg(long, value_enum, default_value = "html")]
    pub format: ExportFormat,
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

fn parse_status(raw: &str) -> std::result::Result<TaskStatus, String> {
    TaskStatus::ALL
        .into_iter()
        .find(|status| status.as_str().eq_ignore_ascii_case(raw))
        .ok_or_else(|| {
            let names: Vec<&str> = TaskStatus::ALL.iter().map(|status| status.as_str()).collect();
            format!("expected one of: {}", names.join(", "))
        })
}

pub async fn cases(console: &Console) -> Result<()> {
    let mut session = console.compose().await.context("load case catalog")?;
    let category_ids: Vec<CategoryId> = session
        .catalog()
        .categories()
        .iter()
        .map(|category| category.id)
        .collect();
    for category_id in category_ids {
        session.selection_mut().toggle_expansion(category_id);
    }

    println!(
        "{} enabled cases in {} categories",
        session.catalog().len(),
        session.catalog().categories().len()
    );
    print!("{}", render::catalog_listing(session.selection()));
    Ok(())
}

/// Checks that need no engine: the target address.
pub fn check_run(args: &RunArgs) -> Result<()> {
    parse_target(&args.target).map_err(ConsoleError::from)?;
    Ok(())
}

pub async fn summary(console: &Console) -> Result<()> {
    let overview = console.summary().await.context("load summary")?;
    print!("{}", render::summary(&overview));
    Ok(())
}

pub async fn run(console: &Console, args: RunArgs) -> Result<()> {
    let mut session = if args.is_run_all() {
        CompositionSession::new(Arc::new(CaseCatalog::default()))
    } else {
        let mut session = console.compose().await.context("load case catalog")?;
        session.selection_mut().set_run_all(false);
        apply_selection(&mut session, &args)?;
        session
    };
    session.set_description(args.description.clone());

    let task = console.submit(&mut session, &args.target).await?;
    println!(
        "{} task {} for {} ({})",
        style("created").green().bold(),
        task.id,
        task.target_ip,
        render::task_status(task.status)
    );

    if args.watch {
        follow(console.open_task(task.id)).await?;
    }
    Ok(())
}

fn apply_selection(session: &mut CompositionSession, args: &RunArgs) -> Result<()> {
    for category_id in &args.categories {
        if session.catalog().category(*category_id).is_none() {
            warn!(category_id, "category has no enabled cases; skipped");
        }
        session.selection_mut().select_category(*category_id);
    }
    for case_id in &args.cases {
        let selection = session.selection_mut();
        if selection.is_selected(*case_id) {
            continue;
        }
        if !selection.toggle_case(*case_id) {
            warn!(case_id, "case is not an enabled catalog case; skipped");
        }
    }
    if args.interactive {
        interactive::select_cases(session)?;
    }
    Ok(())
}

pub async fn tasks(console: &Console, args: TasksArgs, shutdown: &CancellationToken) -> Result<()> {
    let query = args.query();
    if !args.watch {
        let page = console.list_tasks(&query).await?;
        print!("{}", render::task_table(&page));
        return Ok(());
    }

    let term = Term::stdout();
    let (board, mut updates) = console.watch_board(query);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            update = updates.recv() => match update {
                Some(BoardUpdate::Page(page)) => {
                    if term.is_term() {
                        term.clear_screen()?;
                    }
                    print!("{}", render::task_table(&page));
                }
                Some(BoardUpdate::Failed(err)) => {
                    eprintln!("{} {err}", style("refresh failed:").yellow());
                }
                None => break,
            },
        }
    }
    board.cancel();
    Ok(())
}

pub async fn watch(console: &Console, task_id: TaskId) -> Result<()> {
    follow(console.open_task(task_id)).await
}

/// Poll a task and redraw on every applied snapshot until it finishes or
/// the process is asked to stop.
async fn follow(mut session: TaskDetailSession<EngineClient>) -> Result<()> {
    let term = Term::stdout();
    session.start_polling();

    while let Some(update) = session.next_update().await {
        match update {
            SessionUpdate::Snapshot(outcome) if outcome.is_applied() => {
                if term.is_term() {
                    term.clear_screen()?;
                }
                print!(
                    "{}",
                    render::task_detail(session.view(), session.available_actions())
                );
            }
            SessionUpdate::Snapshot(_) => {}
            SessionUpdate::FetchFailed(err) => {
                eprintln!("{} {err}", style("fetch failed:").yellow());
            }
        }
    }

    match session.view().task() {
        Some(task) if task.status.is_terminal() && !session.is_polling() => {
            println!("task {} finished: {}", task.id, render::task_status(task.status));
        }
        _ => {
            session.stop_polling();
            println!("stopped watching task {}", session.task_id());
        }
    }
    Ok(())
}

pub async fn stop(console: &Console, task_id: TaskId) -> Result<()> {
    let mut session = console.open_task(task_id);
    session.refresh().await?;

    let outcome = session.request_stop().await;
    report_action(&session, outcome.map(|ack| ack.message))
}

pub async fn retry(console: &Console, task_id: TaskId) -> Result<()> {
    let mut session = console.open_task(task_id);
    session.refresh().await?;

    let outcome = session.request_retry().await.map(|ack| match ack.retry_count {
        Some(count) => format!("{} ({count} cases re-queued)", ack.message),
        None => ack.message,
    });
    report_action(&session, outcome)
}

fn report_action(
    session: &TaskDetailSession<EngineClient>,
    outcome: secprobe_console::Result<String>,
) -> Result<()> {
    match outcome {
        Ok(message) => {
            println!("{} {message}", style("ok").green().bold());
            print!(
                "{}",
                render::task_detail(session.view(), session.available_actions())
            );
            Ok(())
        }
        Err(err) if err.needs_refresh() => {
            eprintln!("{} {err}", style("rejected:").red().bold());
            print!(
                "{}",
                render::task_detail(session.view(), session.available_actions())
            );
            Err(anyhow!(err))
        }
        Err(err) => Err(anyhow!(err)),
    }
}

pub async fn export(console: &Console, args: ExportArgs) -> Result<()> {
    let format = ReportFormat::from(args.format);
    let bytes = console.export_report(args.task_id, format).await?;
    if bytes.is_empty() {
        bail!("engine returned an empty report for task {}", args.task_id);
    }

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("task_{}_report.{}", args.task_id, format.extension())));
    std::fs::write(&output, &bytes)
        .with_context(|| format!("failed to write report to {}", output.display()))?;
    println!(
        "report written to {} ({} bytes)",
        style(output.display()).cyan(),
        bytes.len()
    );
    Ok(())
}
