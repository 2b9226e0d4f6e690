//! Interactive chat command
//!
//! A terminal chat loop that talks to the session through its request queue.

use anyhow::Result;
use std::io::{self, Write};

use super::{build_session, load_active_file, Workspace};
use crate::config::Config;
use crate::context::ContextMode;
use crate::session::{self, Role, SessionError, SessionHandle};
use crate::ui::picker;
use crate::ui::style::{
    colors, format_size, print_ai_message, print_divider, print_error, print_muted,
    print_success, print_user_message, print_warning, symbols, thinking_spinner,
};

/// Print help information
fn print_help() {
    println!();
    println!(
        "{}{}  Available Commands:{}",
        colors::PRIMARY, colors::BOLD, colors::RESET
    );
    let commands = [
        ("/help", "Show this help message"),
        ("/mode [name]", "Switch context mode: current, selected, auto, whole"),
        ("/select [paths]", "Choose files for selected mode (no paths opens a picker)"),
        ("/files", "List files available as context"),
        ("/open <file>", "Set the current file"),
        ("/close", "Close the current file"),
        ("/status", "Show mode, selection and model"),
        ("/history", "Show the conversation so far"),
        ("/test", "Check the model connection"),
        ("/clear", "Clear conversation and selection"),
        ("/exit", "Exit the chat"),
    ];
    for (command, description) in commands {
        println!(
            "{}  {:<16}{} - {}",
            colors::FG, command, colors::MUTED, description
        );
    }
    println!();
    println!("{}  Tips:{}", colors::PRIMARY, colors::RESET);
    println!(
        "{}  • Type your message and press Enter twice to send",
        colors::MUTED
    );
    println!(
        "{}  • Say \"this file\" or \"explain this\" to focus on the current file{}",
        colors::MUTED, colors::RESET
    );
    println!();
}

/// Read multi-line input from user
fn read_input() -> Option<String> {
    print!(
        "\n{}  {} {}",
        colors::PRIMARY, symbols::USER_ICON, colors::RESET
    );
    io::stdout().flush().ok();

    let mut lines = Vec::new();

    loop {
        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                // EOF sends whatever was typed
                break;
            }
            Ok(_) => {
                let trimmed = line.trim_end();

                if trimmed.is_empty() {
                    if !lines.is_empty() {
                        // Double enter = send
                        break;
                    }
                } else if lines.is_empty() && trimmed.starts_with('/') {
                    // Slash commands run on a single Enter
                    return Some(trimmed.to_string());
                } else {
                    lines.push(trimmed.to_string());
                    print!("{}  {} {}", colors::MUTED, ".", colors::RESET);
                    io::stdout().flush().ok();
                }
            }
            Err(_) => return None,
        }
    }

    let input = lines.join("\n").trim().to_string();
    if input.is_empty() {
        None
    } else {
        Some(input)
    }
}

/// Main chat loop
pub async fn run(config: Config, workspace: Workspace, initial_prompt: Option<String>) -> Result<()> {
    let session = build_session(&config, workspace)?;
    let handle = session::spawn(session);

    print_banner(&handle).await?;

    if let Some(prompt) = initial_prompt {
        send(&handle, &prompt).await?;
    }

    loop {
        let input = match read_input() {
            Some(i) => i,
            None => {
                println!();
                break;
            }
        };

        if input.starts_with('/') {
            if handle_command(&input, &handle).await? {
                break;
            }
            continue;
        }

        send(&handle, &input).await?;
    }

    println!();
    Ok(())
}

/// One chat turn; model errors become a notice and the loop continues
async fn send(handle: &SessionHandle, input: &str) -> Result<()> {
    print_user_message(input);
    let spinner = thinking_spinner("Companion");

    let result = handle.send_query(input).await;
    spinner.finish_and_clear();

    match result {
        Ok(response) => print_ai_message(&response),
        Err(SessionError::Model(e)) => print_error(&e.user_message()),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Handle a slash command; returns true when the chat should end
async fn handle_command(input: &str, handle: &SessionHandle) -> Result<bool> {
    let mut parts = input.split_whitespace();
    let command = parts.next().unwrap_or_default().to_lowercase();
    let args: Vec<&str> = parts.collect();

    match command.as_str() {
        "/exit" | "/quit" | "/q" => {
            print_success("Goodbye! Happy coding!");
            return Ok(true);
        }
        "/help" | "/h" | "/?" => print_help(),
        "/clear" | "/c" => {
            handle.reset().await?;
            print_success("Conversation and selection cleared");
        }
        "/mode" | "/m" => {
            let current = handle.status().await?.selection.mode;
            let chosen = match args.first() {
                Some(name) => match name.parse::<ContextMode>() {
                    Ok(mode) => Some(mode),
                    Err(e) => {
                        print_error(&e);
                        None
                    }
                },
                None => picker::pick_mode(current)?,
            };
            if let Some(mode) = chosen {
                handle.set_context_mode(mode).await?;
                print_success(&format!("Context mode: {} ({})", mode, mode.description()));
            }
        }
        "/select" | "/s" => {
            let paths = if args.is_empty() {
                let files = handle.list_available_files().await?;
                if files.is_empty() {
                    print_warning("No files found in the workspace");
                    None
                } else {
                    let selected = handle.status().await?.selection.selected_files;
                    picker::pick_files(&files, &selected)?
                }
            } else {
                Some(args.iter().map(|a| a.to_string()).collect())
            };

            if let Some(paths) = paths {
                let count = paths.len();
                handle.set_selected_files(paths).await?;
                handle.set_context_mode(ContextMode::Selected).await?;
                print_success(&format!("{} files selected (mode: selected)", count));
            }
        }
        "/files" | "/f" => {
            let files = handle.list_available_files().await?;
            println!();
            for (path, size) in &files {
                println!(
                    "{}  {} {}{}  {}{}{}",
                    colors::MUTED, symbols::FILE, colors::FG, path,
                    colors::MUTED, format_size(*size), colors::RESET
                );
            }
            print_muted(&format!("{} files available", files.len()));
        }
        "/open" | "/o" => match args.first() {
            Some(path) => {
                let root = handle.status().await?.root;
                match load_active_file(std::path::Path::new(path), root.as_deref()) {
                    Some(file) => {
                        let name = file.name.clone();
                        handle.set_active_file(Some(file)).await?;
                        print_success(&format!("Current file: {}", name));
                    }
                    None => print_error(&format!("Cannot open {}", path)),
                }
            }
            None => print_error("Usage: /open <file>"),
        },
        "/close" => {
            handle.set_active_file(None).await?;
            print_success("Current file closed");
        }
        "/status" | "/model" => {
            let status = handle.status().await?;
            println!();
            print_muted(&format!("Model:        {}", status.model));
            print_muted(&format!("Context mode: {}", status.selection.mode));
            print_muted(&format!(
                "Current file: {}",
                status.active_file.as_deref().unwrap_or("none")
            ));
            print_muted(&format!(
                "Selected:     {}",
                if status.selection.selected_files.is_empty() {
                    "none".to_string()
                } else {
                    status.selection.selected_files.join(", ")
                }
            ));
            print_muted(&format!("Messages:     {}", status.messages));
        }
        "/history" => {
            let history = handle.history().await?;
            if history.is_empty() {
                print_muted("No messages yet");
            }
            println!();
            for message in &history {
                let who = match message.role {
                    Role::User => "You",
                    Role::Assistant => "Companion",
                };
                let first_line = message.content.lines().next().unwrap_or_default();
                print_muted(&format!(
                    "[{}] {}: {}",
                    message.at.with_timezone(&chrono::Local).format("%H:%M:%S"),
                    who,
                    truncate_line(first_line, 60)
                ));
            }
        }
        "/test" | "/t" => {
            let spinner = thinking_spinner("Companion");
            let ok = handle.test_model_connection().await?;
            spinner.finish_and_clear();
            if ok {
                print_success("Model connection works");
            } else {
                print_error("Model connection failed (run with --verbose for details)");
            }
        }
        _ => {
            print_error(&format!("Unknown command: {}", input));
            print_muted("Type /help for available commands");
        }
    }

    Ok(false)
}

fn truncate_line(line: &str, max: usize) -> String {
    if line.chars().count() <= max {
        line.to_string()
    } else {
        format!("{}...", line.chars().take(max).collect::<String>())
    }
}

/// Print banner with model and workspace info
async fn print_banner(handle: &SessionHandle) -> Result<()> {
    let status = handle.status().await?;

    println!();
    println!(
        "{}{}╭─────────────────────────────────────────────────────╮{}",
        colors::PRIMARY, colors::BOLD, colors::RESET
    );
    println!(
        "{}│{}  {} Code Companion v{:<33}{}│{}",
        colors::PRIMARY, colors::AI_ACCENT, symbols::AI_ICON,
        env!("CARGO_PKG_VERSION"), colors::PRIMARY, colors::RESET
    );
    println!(
        "{}╰─────────────────────────────────────────────────────╯{}",
        colors::PRIMARY, colors::RESET
    );
    print_muted(&format!("Model: {}", status.model));
    print_muted(&format!(
        "Workspace: {}",
        status
            .root
            .as_deref()
            .map(|r| r.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    ));
    print_muted(&format!("Context mode: {}", status.selection.mode));
    if let Some(file) = &status.active_file {
        print_muted(&format!("Current file: {}", file));
    }
    println!();
    print_muted("Commands: /help, /mode, /select, /clear, /exit");
    print_muted("Press Enter twice to send your message");
    print_divider();
    Ok(())
}
