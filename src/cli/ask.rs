//! Ask command - one question with workspace context, no chat loop

use anyhow::Result;

use super::{build_session, Workspace};
use crate::config::Config;
use crate::context::ContextMode;
use crate::ui::style::{colors, print_ai_message, print_error, print_muted, symbols, thinking_spinner};

pub async fn run(
    config: Config,
    workspace: Workspace,
    question: &str,
    mode: Option<ContextMode>,
    selected: Vec<String>,
) -> Result<()> {
    let mut session = build_session(&config, workspace)?;

    // Naming files without a mode implies selected mode
    let mode = match mode {
        Some(mode) => mode,
        None if !selected.is_empty() => ContextMode::Selected,
        None => config.context.mode(),
    };
    session.set_context_mode(mode);
    if !selected.is_empty() {
        session.set_selected_files(selected);
    }

    print_header(question, mode);

    let spinner = thinking_spinner("Companion");
    let result = session.send_query(question).await;
    spinner.finish_and_clear();

    match result {
        Ok(response) => print_ai_message(&response),
        Err(e) => {
            print_error(&e.user_message());
            // Non-zero exit for scripts
            return Err(e.into());
        }
    }

    Ok(())
}

fn print_header(question: &str, mode: ContextMode) {
    println!();
    println!(
        "{}{}  {} Asking about your workspace...{}",
        colors::PRIMARY, colors::BOLD, symbols::AI_ICON, colors::RESET
    );
    println!(
        "{}  │ {}{}{}",
        colors::MUTED, colors::FG, question, colors::RESET
    );
    println!(
        "{}  ╰{}─{}",
        colors::MUTED, "─".repeat(50), colors::RESET
    );
    print_muted(&format!("Context mode: {}", mode));
}
