//! # smolagent CLI
//!
//! Command-line interface for running the calculator agent.
//!
//! Usage:
//!   smolagent <task>
//!   smolagent run <task>
//!   smolagent tools
//!   smolagent demo
//!   smolagent examples
//!
//! Examples:
//!   smolagent "What is 15 * 23 + 47?"
//!   smolagent -q --model openai/gpt-4o-mini "Calculate the square root of 144"
//!   smolagent --base-url http://localhost:11434/v1 --model llama3 "What is 2 ** 10?"
//!   smolagent demo

mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::{FileConfig, Overrides, Settings, DEFAULT_API_KEY_ENV};
use serde_json::json;
use smolagent_agent::{Agent, RunReport};
use smolagent_llm::{OpenAIProvider, ProviderError, ScriptedProvider};
use smolagent_tools::{calculator_registry, calculator_tools, Arguments};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tasks run by `smolagent examples`
const EXAMPLE_TASKS: &[&str] = &[
    "What is 15 * 23 + 47?",
    "Calculate the square root of 144",
    "What is the factorial of 5 plus 10?",
    "Is the calculation '25 * 4 = 100' correct?",
];

#[derive(Parser)]
#[command(name = "smolagent")]
#[command(author, version, about = "smolagent - a minimal tool-using AI agent")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Task to execute (when not using subcommands)
    #[arg(trailing_var_arg = true)]
    task: Vec<String>,

    /// Config file (default: ./smolagent.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API key for the model provider
    #[arg(long, env = DEFAULT_API_KEY_ENV, hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Model to use
    #[arg(long, global = true)]
    model: Option<String>,

    /// Model calls allowed before giving up
    #[arg(long, global = true)]
    max_iterations: Option<usize>,

    /// Sampling temperature
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Maximum tokens per reply
    #[arg(long, global = true)]
    max_tokens: Option<usize>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show every iteration and debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only show final answer
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task
    Run {
        /// The task description
        #[arg(trailing_var_arg = true, required = true)]
        task: Vec<String>,
    },
    /// List the available tools
    Tools,
    /// Use the tools directly and replay a scripted agent run (no API key needed)
    Demo,
    /// Run the sample tasks against the configured model
    Examples,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            max_iterations: self.max_iterations,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_secs: self.timeout,
        }
    }

    fn settings(&self) -> anyhow::Result<Settings> {
        let file = FileConfig::load(self.config.as_deref())?;
        let settings = Settings::resolve(file, self.overrides(), |name| std::env::var(name).ok())?;
        tracing::debug!(
            base_url = %settings.base_url,
            model = %settings.model,
            max_iterations = settings.agent.max_iterations,
            "resolved settings"
        );
        Ok(settings)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,smolagent_cli=debug,smolagent_agent=debug,smolagent_llm=debug,smolagent_tools=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_agent(settings: &Settings) -> anyhow::Result<Agent<OpenAIProvider>> {
    let provider = OpenAIProvider::new(settings.provider_config()?)
        .map_err(ProviderError::into_error)
        .context("failed to create model provider")?;
    Ok(Agent::with_config(
        provider,
        calculator_tools(),
        settings.agent.clone(),
    ))
}

fn print_report(report: &RunReport, quiet: bool) {
    if !quiet {
        println!("\n--- FINAL ANSWER ---\n");
    }
    println!("{}", report.answer);
    if !quiet {
        println!(
            "\n({} iterations, {} tokens)",
            report.iterations,
            report.usage.total_tokens()
        );
    }
}

async fn run_task(settings: &Settings, task: &str, verbose: bool, quiet: bool) -> anyhow::Result<()> {
    let agent = build_agent(settings)?;
    if !quiet {
        println!("Task: {}", task);
    }
    let report = agent.run_with_report(task, verbose && !quiet).await?;
    print_report(&report, quiet);
    Ok(())
}

fn list_tools() {
    let tools = calculator_registry();
    println!("Available tools ({}):", tools.len());
    for tool in tools.iter() {
        println!("  - {}: {}", tool.name(), tool.description());
    }
}

fn banner(title: &str) {
    println!("{}", "=".repeat(60));
    println!("{}", title);
    println!("{}", "=".repeat(60));
}

fn demo_tools() -> anyhow::Result<()> {
    banner("Demo: Using Calculator Tools Directly");
    let tools = calculator_registry();

    let calls = [
        ("calculator", json!({"expression": "2 + 2 * 3"})),
        ("calculator", json!({"expression": "(10 + 5) * 2"})),
        ("math_function", json!({"function": "sqrt", "value": 144})),
        ("math_function", json!({"function": "factorial", "value": 5})),
        ("verify_calculation", json!({"expression": "25 * 4", "expected": 100})),
        ("verify_calculation", json!({"expression": "25 * 4", "expected": 101})),
    ];

    for (name, arguments) in calls {
        let tool = tools
            .get(name)
            .with_context(|| format!("tool {} is not registered", name))?;
        let arguments: Arguments = match arguments {
            serde_json::Value::Object(map) => map,
            _ => Arguments::new(),
        };
        let result = tool.execute(&arguments)?;
        println!("\n{}({})", name, serde_json::Value::Object(arguments));
        println!("Result: {}", smolagent_agent::render_value(&result));
    }
    Ok(())
}

async fn demo_agent(verbose: bool) -> anyhow::Result<()> {
    println!();
    banner("Demo: Scripted Agent Run");

    let provider = ScriptedProvider::new([
        r#"{"tool": "calculator", "arguments": {"expression": "15 * 23 + 47"}}"#,
        r#"{"tool": "verify_calculation", "arguments": {"expression": "15 * 23 + 47", "expected": 392}}"#,
        r#"{"final_answer": "15 * 23 + 47 = 392"}"#,
    ]);
    let agent = Agent::new(provider, calculator_tools());

    let task = EXAMPLE_TASKS[0];
    println!("Task: {}", task);
    let report = agent.run_with_report(task, true).await?;
    print_report(&report, false);

    if verbose {
        println!("\n--- Conversation ---\n");
        report.conversation.pretty_print();
    }

    println!("\nTo use the agent with a real model:");
    println!("  1. Get an API key from https://openrouter.ai/");
    println!("  2. export {}='your-key'", DEFAULT_API_KEY_ENV);
    println!("  3. smolagent \"{}\"", task);
    Ok(())
}

async fn run_examples(settings: &Settings, verbose: bool, quiet: bool) -> anyhow::Result<()> {
    let agent = build_agent(settings)?;
    let mut failures = 0;

    for (i, task) in EXAMPLE_TASKS.iter().enumerate() {
        println!("\n\nTask {}: {}", i + 1, task);
        println!("{}", "-".repeat(70));

        match agent.run_with_report(task, verbose && !quiet).await {
            Ok(report) => print_report(&report, quiet),
            Err(e) => {
                failures += 1;
                tracing::warn!(task, error = %e, "example task failed");
                println!("Error: {}", e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} example tasks failed", failures, EXAMPLE_TASKS.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Some(Commands::Run { task }) => {
            let settings = cli.settings()?;
            run_task(&settings, &task.join(" "), cli.verbose, cli.quiet).await
        }
        Some(Commands::Tools) => {
            list_tools();
            Ok(())
        }
        Some(Commands::Demo) => {
            demo_tools()?;
            demo_agent(cli.verbose).await
        }
        Some(Commands::Examples) => {
            let settings = cli.settings()?;
            run_examples(&settings, cli.verbose, cli.quiet).await
        }
        None => {
            if cli.task.is_empty() {
                eprintln!("Usage: smolagent <task>");
                eprintln!("       smolagent run <task>");
                eprintln!("       smolagent tools");
                eprintln!("       smolagent demo");
                eprintln!("       smolagent examples");
                eprintln!("\nRun 'smolagent --help' for more options.");
                std::process::exit(1);
            }
            let settings = cli.settings()?;
            run_task(&settings, &cli.task.join(" "), cli.verbose, cli.quiet).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_positional_task() {
        let cli = Cli::try_parse_from(["smolagent", "What", "is", "2", "+", "2?"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.task.join(" "), "What is 2 + 2?");
    }

    #[test]
    fn test_run_subcommand_with_flags() {
        let cli = Cli::try_parse_from([
            "smolagent",
            "run",
            "--model",
            "m",
            "--max-iterations",
            "3",
            "-q",
            "hello",
        ])
        .unwrap();

        match &cli.command {
            Some(Commands::Run { task }) => assert_eq!(task, &vec!["hello".to_string()]),
            _ => panic!("expected run"),
        }
        let overrides = cli.overrides();
        assert_eq!(overrides.model.as_deref(), Some("m"));
        assert_eq!(overrides.max_iterations, Some(3));
        assert!(cli.quiet);
    }

    #[test]
    fn test_tools_subcommand() {
        let cli = Cli::try_parse_from(["smolagent", "tools"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Tools)));
    }

    #[test]
    fn test_demo_tools_run_offline() {
        demo_tools().unwrap();
    }

    #[tokio::test]
    async fn test_demo_agent_runs_offline() {
        demo_agent(false).await.unwrap();
    }
}
