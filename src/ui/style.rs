//! Terminal colors, symbols and message printers shared by the commands

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

// ANSI color codes from design system
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const PRIMARY: &str = "\x1b[38;2;100;181;246m";      // #64B5F6
    pub const SUCCESS: &str = "\x1b[38;2;165;214;167m";      // #A5D6A7
    pub const WARNING: &str = "\x1b[38;2;255;245;157m";      // #FFF59D
    pub const ERROR: &str = "\x1b[38;2;239;154;154m";        // #EF9A9A
    pub const AI_ACCENT: &str = "\x1b[38;2;255;202;40m";     // #FFCA28
    pub const MUTED: &str = "\x1b[38;2;84;110;122m";         // #546E7A
    pub const FG: &str = "\x1b[38;2;212;212;215m";           // #D4D4D7
}

pub mod symbols {
    pub const AI_ICON: &str = "󰌤";
    pub const USER_ICON: &str = ">";
    pub const FILE: &str = "󰈙";
    pub const SUCCESS: &str = "󰄂";
    pub const WARNING: &str = "⚠";
    pub const ERROR: &str = "󰅚";
    pub const DIVIDER: &str = "─";
    pub const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
}

/// Print a horizontal divider
pub fn print_divider() {
    println!(
        "{}{}{}",
        colors::MUTED,
        symbols::DIVIDER.repeat(55),
        colors::RESET
    );
}

/// Print user message bubble
pub fn print_user_message(content: &str) {
    println!();
    println!(
        "{}{}  You {}{}",
        colors::PRIMARY, colors::BOLD, colors::RESET, colors::MUTED
    );
    for line in content.lines() {
        println!("{}  │ {}{}", colors::MUTED, colors::FG, line);
    }
    println!("{}  ╰{}─{}", colors::MUTED, symbols::DIVIDER.repeat(50), colors::RESET);
}

/// Print AI response bubble
pub fn print_ai_message(content: &str) {
    println!();
    println!(
        "{}{}  {} Companion {}{}",
        colors::AI_ACCENT, colors::BOLD, symbols::AI_ICON, colors::RESET, colors::MUTED
    );
    for line in content.lines() {
        println!("{}  │ {}{}", colors::MUTED, colors::FG, line);
    }
    println!("{}  ╰{}─{}", colors::MUTED, symbols::DIVIDER.repeat(50), colors::RESET);
}

/// Print error message
pub fn print_error(message: &str) {
    println!(
        "\n{}  {} Error: {}{}",
        colors::ERROR, symbols::ERROR, message, colors::RESET
    );
}

/// Print success message
pub fn print_success(message: &str) {
    println!(
        "\n{}  {} {}{}",
        colors::SUCCESS, symbols::SUCCESS, message, colors::RESET
    );
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!(
        "\n{}  {} {}{}",
        colors::WARNING, symbols::WARNING, message, colors::RESET
    );
}

/// Print a muted informational line
pub fn print_muted(message: &str) {
    println!("{}  {}{}", colors::MUTED, message, colors::RESET);
}

/// Spinner shown while the model is thinking
pub fn thinking_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("  {spinner:.yellow} {msg:.yellow}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&symbols::SPINNER),
    );
    pb.set_message(format!("{} {} is thinking", symbols::AI_ICON, label));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Human-readable size in characters
pub fn format_size(chars: usize) -> String {
    if chars < 1_000 {
        format!("{} chars", chars)
    } else {
        format!("{:.1}k chars", chars as f64 / 1_000.0)
    }
}
