//! Interactive pickers for the context mode and the selected files

use anyhow::Result;
use console::Term;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{MultiSelect, Select};

use super::style::{colors, format_size};
use crate::context::ContextMode;

/// Ask which context mode to use; `None` if the user cancelled
pub fn pick_mode(current: ContextMode) -> Result<Option<ContextMode>> {
    print_question_header("Which context should accompany your questions?");

    let items: Vec<String> = ContextMode::ALL
        .iter()
        .map(|mode| format!("{:<9} {}", mode.name(), mode.description()))
        .collect();
    let default = ContextMode::ALL
        .iter()
        .position(|m| *m == current)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .items(&items)
        .default(default)
        .interact_on_opt(&Term::stderr())?;

    Ok(selection.map(|idx| ContextMode::ALL[idx]))
}

/// Checkbox list over the workspace files, pre-checking `selected`.
/// Returns the checked paths, or `None` if the user cancelled.
pub fn pick_files(files: &[(String, usize)], selected: &[String]) -> Result<Option<Vec<String>>> {
    print_question_header("Select files to include (space to toggle, enter to confirm)");

    let items: Vec<String> = files
        .iter()
        .map(|(path, size)| format!("{}  {}({}){}", path, colors::DIM, format_size(*size), colors::RESET))
        .collect();
    let checked: Vec<bool> = files
        .iter()
        .map(|(path, _)| selected.contains(path))
        .collect();

    let selection = MultiSelect::with_theme(&ColorfulTheme::default())
        .items(&items)
        .defaults(&checked)
        .max_length(15)
        .interact_on_opt(&Term::stderr())?;

    Ok(selection.map(|idxs| idxs.into_iter().map(|i| files[i].0.clone()).collect()))
}

fn print_question_header(question: &str) {
    println!();
    println!(
        "{}{}󰌤 {}{}",
        colors::PRIMARY, colors::BOLD, question, colors::RESET
    );
    println!(
        "{}  ╭{}─{}",
        colors::MUTED, "─".repeat(50), colors::RESET
    );
}
