use crate::OutputArgs;
use colored::Colorize;
use dropflow_cloud::ServerInstance;
use dropflow_config::Config;
use dropflow_lifecycle::{LifecycleError, LifecycleOutcome, Operation, Stage, StopOutcome};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub async fn start(config: Config, args: OutputArgs, cancel: CancellationToken) -> anyhow::Result<()> {
    let control = super::control(&config, args.timeout.map(Duration::from_secs), cancel);
    let fqdn = config.cloud.fqdn();
    let orchestrator = super::orchestrator(config)?;

    if !args.json {
        println!("{}", "Starting server...".yellow());
    }

    match orchestrator.start(&control).await {
        Ok(instance) => {
            if args.json {
                print_json(&LifecycleOutcome::started(instance))?;
            } else {
                println!();
                println!("{}", "✓ Server is up".green().bold());
                print_instance(&instance);
                println!("  address : {}", fqdn.cyan());
            }
            Ok(())
        }
        Err(e) => fail(Operation::Start, e, args.json),
    }
}

pub async fn stop(config: Config, args: OutputArgs, cancel: CancellationToken) -> anyhow::Result<()> {
    let control = super::control(&config, args.timeout.map(Duration::from_secs), cancel);
    let orchestrator = super::orchestrator(config)?;

    if !args.json {
        println!("{}", "Stopping server...".yellow());
    }

    match orchestrator.stop(&control).await {
        Ok(outcome) => {
            if args.json {
                print_json(&LifecycleOutcome::stopped(outcome))?;
                return Ok(());
            }
            println!();
            match outcome {
                StopOutcome::Stopped {
                    instance_id,
                    terminated_pids,
                } => {
                    println!(
                        "{}",
                        format!("✓ Server {} destroyed", instance_id).green().bold()
                    );
                    if !terminated_pids.is_empty() {
                        let pids: Vec<String> = terminated_pids.iter().map(u32::to_string).collect();
                        println!("  stopped processes: {}", pids.join(", "));
                    }
                }
                StopOutcome::AlreadyStopped => {
                    println!("{}", "ℹ No server is running".dimmed());
                }
            }
            Ok(())
        }
        Err(e) => fail(Operation::Stop, e, args.json),
    }
}

pub async fn status(config: Config, args: OutputArgs, cancel: CancellationToken) -> anyhow::Result<()> {
    let control = super::control(&config, args.timeout.map(Duration::from_secs), cancel);
    let orchestrator = super::orchestrator(config)?;
    let poll = control
        .guard(Stage::Poll, 1, orchestrator.poll())
        .await
        .and_then(|r| r);

    match poll {
        Ok(instance) => {
            if args.json {
                print_json(&LifecycleOutcome::status(instance))?;
            } else {
                match instance {
                    Some(instance) => {
                        println!("{} {}", "●".green(), "running".green().bold());
                        print_instance(&instance);
                    }
                    None => println!("{} {}", "○".dimmed(), "stopped".dimmed()),
                }
            }
            Ok(())
        }
        Err(e) => fail(Operation::Status, e, args.json),
    }
}

fn print_instance(instance: &ServerInstance) {
    println!("  id      : {}", instance.id);
    println!("  name    : {}", instance.name.cyan());
    println!("  region  : {}", instance.region);
    println!("  status  : {}", instance.status);
    if let Some(ip) = instance.public_ipv4 {
        println!("  ipv4    : {}", ip);
    }
}

fn print_json(outcome: &LifecycleOutcome) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}

fn fail(operation: Operation, err: LifecycleError, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(&LifecycleOutcome::failed(operation, &err))?;
    }
    Err(err.into())
}
