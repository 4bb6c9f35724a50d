use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lumi_a11y::driver::{self, AccessibilityDriver};
use lumi_a11y::report::{self, FileSink};
use lumi_a11y::runner::{self, ConsoleEventListener, Controller, ExecutionContext, UseCaseExecutor};
use lumi_a11y::strategy::InteractionMode;
use lumi_a11y::utils::Config;
use lumi_a11y::widget::{ConcreteNode, UiTree};

#[derive(Parser)]
#[command(name = "lumi-a11y")]
#[command(author = "NL Team")]
#[command(version = "0.1.0")]
#[command(about = "Accessibility-driven UI command runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where commands are sent
#[derive(clap::Args)]
struct Target {
    /// Replay a uiautomator hierarchy dump instead of using a device
    #[arg(long, conflicts_with = "device")]
    hierarchy: Option<PathBuf>,

    /// Android device serial (defaults to the only connected device)
    #[arg(short, long)]
    device: Option<String>,

    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interaction mode, overrides the configuration file
    #[arg(short, long, value_enum)]
    mode: Option<InteractionMode>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run use-case script(s) from a file or directory
    Run {
        /// Path to script file or directory
        path: PathBuf,

        #[command(flatten)]
        target: Target,

        /// Walk screen-reader focus step by step instead of addressing widgets directly
        #[arg(long, default_value = "false")]
        sequential: bool,

        /// Output directory for results and reports
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,
    },

    /// Execute one serialized command and print its result record
    Exec {
        /// Command JSON, e.g. '{"action":"next"}'
        json: String,

        #[command(flatten)]
        target: Target,
    },

    /// Print the structural fingerprint of every node in a hierarchy dump
    Fingerprints {
        /// Path to a uiautomator XML dump
        hierarchy: PathBuf,
    },

    /// List connected devices
    Devices {
        /// Target platform
        #[arg(short, long, default_value = "android")]
        platform: String,
    },

    /// Generate report from a results file
    Report {
        /// Path to a results.jsonl file
        results: PathBuf,

        /// Output format (json, junit, text)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Target {
    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        Ok(config)
    }

    async fn connect(&self) -> anyhow::Result<Arc<dyn AccessibilityDriver>> {
        Ok(match &self.hierarchy {
            Some(path) => Arc::new(driver::ReplayDriver::load(path)?),
            None => Arc::new(driver::android::AndroidDriver::new(self.device.as_deref()).await?),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            path,
            target,
            sequential,
            output,
        } => {
            let mut config = target.load_config()?;
            if sequential {
                config.step_executor = runner::StepStrategy::ScreenReader;
            }

            println!(
                "{} Running use cases from: {}",
                "▶".green().bold(),
                path.display()
            );
            println!("  Mode: {}", config.mode.to_string().cyan());
            if sequential {
                println!("  Sequential: {}", "Enabled".yellow());
            }
            println!("  Output: {}", output.display().to_string().cyan());

            let files = lumi_a11y::parser::discover_scripts(&path)?;
            if files.is_empty() {
                println!("{} No use-case scripts found.", "ℹ".blue());
                return Ok(());
            }

            let driver = target.connect().await?;
            config.check_driver(driver.as_ref())?;
            let sink = Arc::new(FileSink::new(&output)?);
            let ctx = Arc::new(ExecutionContext::new(config, driver, sink.clone()));
            tokio::spawn(ConsoleEventListener::listen(ctx.events.subscribe()));

            let executor = Arc::new(UseCaseExecutor::new(ctx));
            let id = executor.enable();
            let handler_executor = executor.clone();
            ctrlc::set_handler(move || {
                println!("\n{} Stopping...", "⏹".yellow());
                handler_executor.disable();
            })?;

            let reports = runner::run_use_cases(&files, &executor, id).await?;
            let passed = reports.iter().filter(|r| r.is_success()).count();

            println!(
                "\n{} {}/{} use cases passed. Results: {}",
                if passed == files.len() {
                    "✓".green().bold()
                } else {
                    "✗".red().bold()
                },
                passed,
                files.len(),
                sink.records_path().display()
            );
            if passed < files.len() {
                std::process::exit(1);
            }
        }

        Commands::Exec { json, target } => {
            let config = target.load_config()?;
            let driver = target.connect().await?;
            config.check_driver(driver.as_ref())?;
            let (sink, mut receiver) = report::ChannelSink::new();
            let mode = config.mode;
            let ctx = Arc::new(ExecutionContext::new(config, driver, Arc::new(sink)));

            let controller = Controller::new(ctx, mode);
            controller.execute_command(&json).await;
            // Dropping the controller closes the channel
            drop(controller);

            while let Some(message) = receiver.recv().await {
                if let report::SinkMessage::Record(record) = message {
                    println!("{}", serde_json::to_string_pretty(&record)?);
                }
            }
        }

        Commands::Fingerprints { hierarchy } => {
            print_fingerprints(&hierarchy)?;
        }

        Commands::Devices { platform } => {
            println!(
                "{} Listing {} devices...",
                "🔍".to_string().blue(),
                platform.cyan()
            );
            let devices = driver::list_devices(&platform).await?;
            if devices.is_empty() {
                println!("  No {} devices connected", platform);
            }
            for device in devices {
                // Unauthorized or offline devices show up but cannot take commands
                let state = if device.state == "device" {
                    device.state.green()
                } else {
                    device.state.yellow()
                };
                println!("    {} {} ({})", "•".green(), device.serial.white().bold(), state);
            }
        }

        Commands::Report {
            results,
            format,
            output,
        } => {
            println!(
                "{} Generating {} report from: {}",
                "📊".to_string().blue(),
                format.cyan(),
                results.display()
            );
            report::generate_report(&results, &format, output.as_deref())?;
        }
    }

    Ok(())
}

fn print_fingerprints(path: &Path) -> anyhow::Result<()> {
    let xml = std::fs::read_to_string(path)?;
    let tree: UiTree = driver::uiautomator::parse_tree(&xml)?;

    for index in tree.preorder() {
        let node = ConcreteNode::from_tree(&tree, index);
        let line = node.describe();
        if node.visible {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }
    Ok(())
}
