/*
[INPUT]:  SelectionTree, task pages, TaskView, ActionSet
[OUTPUT]: Styled text blocks for the terminal
[POS]:    Display layer - pure string rendering, no IO
[UPDATE]: When views gain columns or status colors change
*/

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use console::{StyledObject, style};
use secprobe_adapter::{Page, ResultStatus, RiskLevel, Task, TaskResult, TaskStatus};

use crate::gate::ActionSet;
use crate::reconcile::TaskView;
use crate::selection::{CategoryState, SelectionTree};
use crate::summary::DashboardSummary;

const PROGRESS_WIDTH: usize = 30;

pub fn task_status(status: TaskStatus) -> StyledObject<&'static str> {
    let styled = style(status.as_str());
    match status {
        TaskStatus::Completed => styled.green(),
        TaskStatus::Error => styled.red(),
        TaskStatus::Running => styled.blue(),
        TaskStatus::Pending => styled.dim(),
        TaskStatus::Stopped => styled.yellow(),
    }
}

pub fn result_status(status: ResultStatus) -> StyledObject<&'static str> {
    let styled = style(status.as_str());
    match status {
        ResultStatus::Pass => styled.green(),
        ResultStatus::Fail | ResultStatus::Error => styled.red(),
        ResultStatus::Running => styled.blue(),
        ResultStatus::Pending => styled.dim(),
    }
}

pub fn risk_level(risk: RiskLevel) -> StyledObject<&'static str> {
    let styled = style(risk.as_str());
    match risk {
        RiskLevel::High => styled.red().bold(),
        RiskLevel::Medium => styled.yellow(),
        RiskLevel::Low => styled.green(),
    }
}

pub fn progress_bar(progress: f64) -> String {
    let clamped = progress.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * PROGRESS_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {clamped:>5.1}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled)
    )
}

fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Category tree with tri-state badges; cases are listed for expanded categories.
pub fn catalog_tree(tree: &SelectionTree) -> String {
    let catalog = tree.catalog();
    let mut out = String::new();

    if tree.run_all() {
        let _ = writeln!(
            out,
            "{} all {} enabled cases (resolved by the engine at run time)",
            style("RUN ALL").cyan().bold(),
            catalog.len()
        );
    } else {
        let _ = writeln!(out, "{} of {} cases selected", tree.selected_count(), catalog.len());
    }
    out.push_str(&catalog_listing(tree));
    out
}

/// Category rows (and case rows of expanded categories) without the mode header.
pub fn catalog_listing(tree: &SelectionTree) -> String {
    let catalog = tree.catalog();
    let mut out = String::new();

    for category in catalog.categories() {
        let badge = match tree.category_state(category.id) {
            CategoryState::Full => "[x]",
            CategoryState::Partial => "[-]",
            CategoryState::None => "[ ]",
        };
        let marker = if tree.is_expanded(category.id) { "v" } else { ">" };
        let _ = writeln!(
            out,
            "{marker} {badge} {} ({}/{}) #{}",
            style(&category.name).bold(),
            tree.selected_count_for(category.id),
            category.case_ids.len(),
            category.id
        );

        if !tree.is_expanded(category.id) {
            continue;
        }
        for case in catalog.cases_in(category.id) {
            let check = if tree.is_selected(case.id) { "[x]" } else { "[ ]" };
            let _ = writeln!(
                out,
                "    {check} {:>4}  {:<6}  {}",
                case.id,
                risk_level(case.risk_level),
                case.name
            );
        }
    }

    let uncategorized = catalog.uncategorized();
    if !uncategorized.is_empty() {
        let _ = writeln!(out, "  {} uncategorized cases", uncategorized.len());
    }
    out
}

pub fn task_table(page: &Page<Task>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>6}  {:<15}  {:<9}  {:>8}  {:>13}  {:<19}",
        "ID", "TARGET", "STATUS", "PROGRESS", "PASS/FAIL/ERR", "CREATED"
    );
    for task in &page.items {
        let _ = writeln!(
            out,
            "{:>6}  {:<15}  {:<9}  {:>7.1}%  {:>13}  {:<19}",
            task.id,
            task.target_ip,
            task_status(task.status),
            task.progress,
            format!("{}/{}/{}", task.passed_count, task.failed_count, task.error_count),
            timestamp(Some(task.created_at))
        );
    }
    let _ = writeln!(
        out,
        "page {} of {} ({} tasks)",
        page.page,
        page.total_pages().max(1),
        page.total
    );
    out
}

pub fn summary(overview: &DashboardSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} cases in {} categories",
        overview.total_cases, overview.total_categories
    );
    let _ = writeln!(
        out,
        "recent {} tasks: {} running, {} completed",
        overview.recent.len(),
        overview.running(),
        overview.completed()
    );
    if overview.recent.is_empty() {
        let _ = writeln!(out, "no tasks yet");
        return out;
    }
    for task in overview.shown() {
        let _ = writeln!(
            out,
            "  #{:<5} {:<15} {:<9} {:>3}/{:<3} passed  {:>5.1}%",
            task.id,
            task.target_ip,
            task_status(task.status),
            task.passed_count,
            task.total_cases,
            task.progress
        );
    }
    out
}

/// Detail view: header, progress, counters, result rows, inspector and actions.
pub fn task_detail(view: &TaskView, actions: ActionSet) -> String {
    let mut out = String::new();
    let Some(task) = view.task() else {
        let _ = writeln!(out, "task {}: waiting for first snapshot", view.task_id());
        return out;
    };

    let _ = writeln!(
        out,
        "task {} -> {}  {}",
        task.id,
        style(&task.target_ip).bold(),
        task_status(task.status)
    );
    let _ = writeln!(out, "{}", progress_bar(task.progress));
    let _ = writeln!(
        out,
        "cases {}/{}  pass {}  fail {}  error {}",
        task.completed_cases,
        task.total_cases,
        style(task.passed_count).green(),
        style(task.failed_count).red(),
        style(task.error_count).red()
    );
    let _ = writeln!(
        out,
        "started {}  finished {}",
        timestamp(task.start_time),
        timestamp(task.end_time)
    );

    if let Some(issue) = view.fetch_issue() {
        let _ = writeln!(
            out,
            "{} {} (failed {}x, retrying)",
            style("!").yellow().bold(),
            issue.message,
            issue.consecutive_failures
        );
    }

    if !view.results().is_empty() {
        let _ = writeln!(out);
        for result in view.results() {
            let _ = writeln!(
                out,
                "  {:>5}  {:<7}  {}",
                result.id,
                result_status(result.status),
                result.case_name.as_deref().unwrap_or("-")
            );
        }
    }

    if let Some(result) = view.inspected_result() {
        let _ = writeln!(out);
        out.push_str(&result_inspector(result));
    }

    let hints: Vec<&str> = actions.iter().map(|action| action.as_str()).collect();
    if !hints.is_empty() {
        let _ = writeln!(out, "actions: {}", hints.join(", "));
    }
    out
}

pub fn result_inspector(result: &TaskResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "result {} (case {}) {}",
        result.id,
        result.case_id,
        result_status(result.status)
    );
    if let Some(name) = &result.case_name {
        let _ = writeln!(out, "  case:     {name}");
    }
    if let Some(category) = &result.category_name {
        let _ = writeln!(out, "  category: {category}");
    }
    if let Some(risk) = result.risk_level {
        let _ = writeln!(out, "  risk:     {}", risk_level(risk));
    }
    let _ = writeln!(out, "  retries:  {}", result.retry_count);
    let _ = writeln!(
        out,
        "  ran:      {} .. {}",
        timestamp(result.start_time),
        timestamp(result.end_time)
    );
    if let Some(message) = &result.error_message {
        let _ = writeln!(out, "  error:    {}", style(message).red());
    }
    out
}
