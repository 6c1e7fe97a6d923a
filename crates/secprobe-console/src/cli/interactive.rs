/*
[INPUT]:  CompositionSession (catalog + selection tree) and user input via CLI
[OUTPUT]: Selection tree updated through its own transitions
[POS]:    CLI interactive flow
[UPDATE]: When selection operations exposed to the prompt change
*/

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, MultiSelect, theme::ColorfulTheme};

use secprobe_console::render;
use secprobe_console::{CategoryState, CompositionSession};

pub fn select_cases(session: &mut CompositionSession) -> Result<()> {
    let theme = ColorfulTheme::default();
    println!("{}", style("Select detection cases").bold().cyan());

    let run_all = Confirm::with_theme(&theme)
        .with_prompt("Run every enabled case (resolved when the task starts)?")
        .default(false)
        .interact()?;
    if run_all {
        session.selection_mut().set_run_all(true);
        return Ok(());
    }
    session.selection_mut().set_run_all(false);

    let categories: Vec<(i64, String, usize)> = session
        .catalog()
        .categories()
        .iter()
        .map(|category| (category.id, category.name.clone(), category.case_ids.len()))
        .collect();
    if categories.is_empty() {
        println!("{}", style("The catalog has no enabled cases.").yellow());
        return Ok(());
    }

    let labels: Vec<String> = categories
        .iter()
        .map(|(_, name, count)| format!("{name} ({count} cases)"))
        .collect();
    let defaults: Vec<bool> = categories
        .iter()
        .map(|(id, _, _)| session.selection().category_state(*id) == CategoryState::Full)
        .collect();
    let chosen = MultiSelect::with_theme(&theme)
        .with_prompt("Categories to run in full (space to toggle)")
        .items(&labels)
        .defaults(&defaults)
        .interact()?;

    for (index, (category_id, _, _)) in categories.iter().enumerate() {
        if chosen.contains(&index) {
            session.selection_mut().select_category(*category_id);
        } else if defaults[index] {
            session.selection_mut().clear_category(*category_id);
        }
    }

    let fine_tune = Confirm::with_theme(&theme)
        .with_prompt("Pick individual cases as well?")
        .default(false)
        .interact()?;
    if fine_tune {
        for (category_id, name, _) in &categories {
            pick_category_cases(session, &theme, *category_id, name)?;
        }
    }

    println!();
    print!("{}", render::catalog_tree(session.selection()));
    Ok(())
}

fn pick_category_cases(
    session: &mut CompositionSession,
    theme: &ColorfulTheme,
    category_id: i64,
    name: &str,
) -> Result<()> {
    let cases: Vec<(i64, String)> = session
        .catalog()
        .cases_in(category_id)
        .map(|case| (case.id, format!("#{} {} [{}]", case.id, case.name, case.risk_level.as_str())))
        .collect();
    let defaults: Vec<bool> = cases
        .iter()
        .map(|(case_id, _)| session.selection().is_selected(*case_id))
        .collect();
    let labels: Vec<&str> = cases.iter().map(|(_, label)| label.as_str()).collect();

    let chosen = MultiSelect::with_theme(theme)
        .with_prompt(format!("Cases in {name}"))
        .items(&labels)
        .defaults(&defaults)
        .interact()?;

    for (index, (case_id, _)) in cases.iter().enumerate() {
        if chosen.contains(&index) != defaults[index] {
            session.selection_mut().toggle_case(*case_id);
        }
    }
    Ok(())
}
