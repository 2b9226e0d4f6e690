//! Connection check against the configured model

use anyhow::{bail, Result};

use super::{build_session, Workspace};
use crate::config::Config;
use crate::ui::style::{print_error, print_muted, print_success, thinking_spinner};

pub async fn run(config: Config, workspace: Workspace) -> Result<()> {
    let session = build_session(&config, workspace)?;
    print_muted(&format!("Model: {}", session.model_name()));

    let spinner = thinking_spinner("Companion");
    let ok = session.test_model_connection().await;
    spinner.finish_and_clear();

    if ok {
        print_success("Model connection works");
        Ok(())
    } else {
        if config.verbose {
            print_error("Model connection failed");
        } else {
            print_error("Model connection failed (run with --verbose for details)");
        }
        bail!("model connection failed")
    }
}
