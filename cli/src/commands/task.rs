// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Task operations against a running coordinator
//!
//! Commands: create, output

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::fmt::Write as _;

use taskfleet_sdk::{LatestOutputResponse, TaskId, TaskfleetClient};

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Create a recurring task and schedule it on every agent
    Create {
        /// Command line to run, e.g. "echo hi"
        #[arg(long)]
        command: String,

        /// Cadence, e.g. "every 15 minutes"
        #[arg(short, long)]
        frequency: String,
    },

    /// Show the latest finalized cycle of a task
    Output {
        /// Task ID returned by `task create`
        #[arg(value_name = "TASK_ID")]
        task_id: String,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_command(command: TaskCommand, client: &TaskfleetClient) -> Result<()> {
    match command {
        TaskCommand::Create { command, frequency } => {
            let task_id = create(client, &command, &frequency).await?;
            println!("{}", format!("✓ Task created: {}", task_id).green());
            Ok(())
        }
        TaskCommand::Output { task_id, json } => {
            let task_id = TaskId::from(task_id);
            match output(client, &task_id).await? {
                Some(latest) if json => {
                    println!("{}", serde_json::to_string_pretty(&latest)?);
                }
                Some(latest) => print!("{}", render_output(&task_id, &latest)),
                None => println!(
                    "{}",
                    format!("No finalized cycle yet for task {}", task_id).yellow()
                ),
            }
            Ok(())
        }
    }
}

async fn create(client: &TaskfleetClient, command: &str, frequency: &str) -> Result<TaskId> {
    let created = client
        .create_task(command, frequency)
        .await
        .with_context(|| format!("Failed to create task on {}", client.base_url()))?;
    Ok(created.task_id)
}

async fn output(client: &TaskfleetClient, task_id: &TaskId) -> Result<Option<LatestOutputResponse>> {
    client
        .latest_output(task_id)
        .await
        .with_context(|| format!("Failed to fetch output for task {}", task_id))
}

fn render_output(task_id: &TaskId, latest: &LatestOutputResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "Task:".bold(), task_id);
    let _ = writeln!(out, "{} {}", "Completed:".bold(), latest.completion_time.to_rfc3339());
    for output in &latest.outputs {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", format!("[{}]", output.agent_id).cyan());
        if !output.stdout.is_empty() {
            let _ = write!(out, "{}", output.stdout);
            if !output.stdout.ends_with('\n') {
                let _ = writeln!(out);
            }
        }
        if !output.stderr.is_empty() {
            let _ = writeln!(out, "{} {}", "stderr:".red(), output.stderr.trim_end());
        }
    }
    out
}
