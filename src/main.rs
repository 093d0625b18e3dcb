//! Terminal demo entry point.
//!
//! Wires the coordinator, bridge, and console handlers together, then runs a
//! scripted background worker that pauses for operator input while the main
//! task pumps the presentation loop.

mod cli;

use clap::Parser;
use handoff::bridge::Bridge;
use handoff::config::load_config;
use handoff::console::{ConsoleClarificationHandler, ConsolePermissionHandler};
use handoff::coordinator::Coordinator;
use handoff::error::InputError;
use handoff::permission::PermissionGate;
use handoff::provider::clarification::{parse_answers, questions_payload};
use handoff::provider::{ClarificationProvider, PermissionProvider};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    let color = config.display.color && !args.no_color;

    let coordinator = Arc::new(Coordinator::new());
    let mut bridge = Bridge::new(Arc::clone(&coordinator));
    let registered = bridge
        .register_input_type(
            Arc::new(ClarificationProvider),
            Box::new(ConsoleClarificationHandler::stdio(color)),
        )
        .and_then(|_| {
            bridge.register_input_type(
                Arc::new(PermissionProvider),
                Box::new(ConsolePermissionHandler::stdio(color)),
            )
        });
    if let Err(e) = registered {
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    let gate = Arc::new(PermissionGate::new(Arc::clone(&coordinator)));
    for dir in &config.permission.session_dirs {
        gate.grant(dir, true);
    }

    // The scripted worker blocks in `ask`, so it gets a blocking thread; the
    // main task stays free to pump prompts.
    let demo = args.demo;
    let (done_tx, mut done_rx) = tokio::sync::oneshot::channel::<()>();
    let worker = tokio::task::spawn_blocking(move || {
        let outcome = run_demo(demo, &coordinator, &gate);
        let _ = done_tx.send(());
        outcome
    });

    loop {
        tokio::select! {
            maybe_request = bridge.next_request() => match maybe_request {
                Some(request) => bridge.dispatch(request),
                None => break,
            },
            _ = &mut done_rx => break,
        }
    }

    match worker.await {
        Ok(Ok(lines)) => {
            for line in lines {
                println!("{line}");
            }
        }
        Ok(Err(e)) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("error: worker panicked: {e}");
            std::process::exit(1);
        }
    }
}

/// Run the scripted worker, returning its summary lines.
fn run_demo(
    demo: cli::Demo,
    coordinator: &Coordinator,
    gate: &PermissionGate,
) -> Result<Vec<String>, InputError> {
    let mut lines = Vec::new();
    if matches!(demo, cli::Demo::Clarification | cli::Demo::Full) {
        lines.extend(run_clarification(coordinator)?);
    }
    if matches!(demo, cli::Demo::Permission | cli::Demo::Full) {
        lines.extend(run_permission(gate)?);
    }
    Ok(lines)
}

fn run_clarification(coordinator: &Coordinator) -> Result<Vec<String>, InputError> {
    let response = coordinator.ask(
        "clarification",
        questions_payload(&["What is the task goal?", "Any constraints to respect?"]),
    )?;
    if response.cancelled {
        return Ok(vec!["clarification: cancelled by operator".to_string()]);
    }
    let answers = response
        .data
        .as_ref()
        .and_then(parse_answers)
        .unwrap_or_default();
    let mut lines = vec![format!("clarification: {} answer(s)", answers.len())];
    for (key, answer) in answers {
        lines.push(format!("  {key}: {} -> {}", answer.question, answer.response));
    }
    Ok(lines)
}

fn run_permission(gate: &PermissionGate) -> Result<Vec<String>, InputError> {
    let mut lines = Vec::new();
    for path in ["/tmp/handoff-demo/report.txt", "/tmp/handoff-demo/notes.md"] {
        let allowed = gate.request(path, "write", false)?;
        lines.push(format!(
            "permission: write {path} -> {}",
            if allowed { "allowed" } else { "refused" }
        ));
    }
    Ok(lines)
}
