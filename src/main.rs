use chrono::NaiveDateTime;
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{LevelFilter, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use mailing_scheduler::dataset::Dataset;
use mailing_scheduler::domain::{Message, Priority};
use mailing_scheduler::factory::TemplateFactory;
use mailing_scheduler::generator::generate_dataset;
use mailing_scheduler::planning::{LocalTimeReceiveTimeCalculator, ReceiveTimeCalculator};
use mailing_scheduler::scheduler::{PoolConfig, Scheduler};
use mailing_scheduler::statistics::{ScheduleStatistics, StatisticsCalculator};

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(env!("CARGO_PKG_NAME"))
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join(format!("{}.log", env!("CARGO_PKG_NAME")));

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // Without RUST_LOG the filter stays open and the max level decides
    let env = env_logger::Env::default().default_filter_or("trace");
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(target))
        .init();
    if std::env::var_os("RUST_LOG").is_none() {
        log::set_max_level(LevelFilter::Info);
    }

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn parse_log_level(level: &str) -> Result<LevelFilter> {
    level
        .trim()
        .parse()
        .context(format!("Invalid log_level: {:?}", level))
}

/// Apply the configured level; RUST_LOG wins when set.
fn apply_log_level(log_level: Option<&str>) -> Result<()> {
    if std::env::var_os("RUST_LOG").is_some() {
        return Ok(());
    }
    if let Some(level) = log_level {
        let filter = parse_log_level(level)?;
        log::set_max_level(filter);
        info!("Log level set to {} from config", filter);
    }
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let command = cli.command.clone().unwrap_or_default();
    match command {
        Commands::Schedule {
            input,
            output,
            json,
            report,
            seed,
        } => handle_schedule_command(
            cli,
            config,
            ScheduleArgs {
                input: input.as_deref(),
                output: output.as_deref(),
                report: report.as_deref(),
                json,
                seed,
            },
        ),
        Commands::Generate { output, seed } => handle_generate_command(cli, config, &output, seed),
        Commands::ValidateConfig => handle_validate_config_command(config),
    }
}

fn reference_time(config: &Config) -> NaiveDateTime {
    config
        .scheduling
        .reference_time
        .unwrap_or_else(|| chrono::Local::now().naive_local())
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

struct ScheduleArgs<'a> {
    input: Option<&'a Path>,
    output: Option<&'a Path>,
    report: Option<&'a Path>,
    json: bool,
    seed: Option<u64>,
}

fn handle_schedule_command(cli: &Cli, config: &Config, args: ScheduleArgs<'_>) -> Result<()> {
    let ScheduleArgs {
        input,
        output,
        report,
        json,
        seed,
    } = args;
    let reference = reference_time(config);
    info!("Scheduling cycle at reference time {}", reference);

    let dataset = match input {
        Some(path) => {
            if cli.is_verbose() {
                println!("{} {}", "Loading dataset:".cyan(), path.display());
            }
            Dataset::load(path).context(format!("Failed to load dataset from {}", path.display()))?
        }
        None => {
            if cli.is_verbose() {
                println!("{}", "Generating dataset...".cyan());
            }
            let mut rng = make_rng(seed.or(config.generator.seed));
            generate_dataset(&config.generator, reference, &mut rng)
        }
    };
    let dataset = dataset.take_messages(config.scheduling.max_to_fetch);

    let s = &config.scheduling;
    let calculator: Arc<dyn ReceiveTimeCalculator> = Arc::new(LocalTimeReceiveTimeCalculator::new(reference));
    let factory = TemplateFactory::create(
        dataset.distinct_template_count(),
        s.priority_fraction,
        s.non_priority_fraction,
        s.uniform_fraction,
        s.max_send_speed,
        s.work_interval,
        calculator,
    );
    let templates = factory
        .map_to_templates(&dataset.templates)
        .context("Failed to build templates")?;

    let max_to_send = usize::try_from(config.global_budget()).unwrap_or(usize::MAX);
    let pool = s.workers.map(PoolConfig::new).unwrap_or_default();
    let scheduler = Scheduler::new(templates, max_to_send).with_pool(pool);

    let started = Instant::now();
    let admitted: Vec<Message> = scheduler
        .schedule(dataset.messages.iter().cloned())
        .context("Scheduling cycle failed")?
        .collect();
    let elapsed = started.elapsed();
    info!(
        "Cycle admitted {} of at most {} messages in {:?}",
        admitted.len(),
        max_to_send,
        elapsed
    );

    let stats = StatisticsCalculator::new(scheduler.templates()).calculate(&dataset.messages, &admitted, elapsed);

    if let Some(path) = report {
        write_json(path, &stats).context("Failed to write statistics report")?;
        if cli.is_verbose() {
            println!("{} {}", "Report written to:".green(), path.display());
        }
    }

    if let Some(path) = output {
        write_json(path, &admitted).context("Failed to write admitted messages")?;
        if cli.is_verbose() {
            println!("{} {}", "Admitted messages written to:".green(), path.display());
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialize statistics")?
        );
    } else {
        print_statistics(&stats);
    }
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    let content = serde_json::to_string_pretty(value).context("Failed to serialize")?;
    fs::write(path, content).context(format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn print_statistics(stats: &ScheduleStatistics) {
    println!(
        "{} {} of {} messages from {} of {} templates in {} ms",
        "Scheduled".green().bold(),
        stats.total_messages.to_string().bold(),
        stats.candidate_messages,
        stats.different_templates,
        stats.candidate_templates,
        stats.schedule_time_ms
    );

    println!();
    println!("{}", format!("{:<10} {:>12}", "TIER", "TAKEN/TOTAL").bold());
    for (priority, count) in &stats.per_priority {
        let candidates = stats.candidate_per_priority.get(priority).copied().unwrap_or(0);
        println!("{} {:>12}", tier_label(*priority), ratio(Some(*count), Some(candidates)));
    }

    if stats.templates.is_empty() {
        return;
    }

    println!();
    println!(
        "{}",
        format!(
            "{:<12} {:<10} {:<10} {:>12} {:>12} {:>12}",
            "TEMPLATE", "TIER", "WINDOW", "ALL", "IN WINDOW", "OUTSIDE"
        )
        .bold()
    );
    for summary in &stats.templates {
        println!(
            "{:<12} {} {:<10} {:>12} {:>12} {:>12}",
            summary.template_code,
            tier_label(summary.priority),
            summary.distribution.as_str(),
            ratio(Some(summary.total_messages), Some(summary.candidate_messages)),
            ratio(summary.priority_messages, summary.candidate_priority_messages),
            ratio(summary.non_priority_messages, summary.candidate_non_priority_messages),
        );
    }
}

/// `taken/total`, or `-` when the count does not apply.
fn ratio(taken: Option<usize>, total: Option<usize>) -> String {
    match (taken, total) {
        (Some(taken), Some(total)) => format!("{}/{}", taken, total),
        _ => "-".to_string(),
    }
}

fn tier_label(priority: Priority) -> ColoredString {
    let label = format!("{:<10}", priority.as_str());
    match priority {
        Priority::Realtime => label.red(),
        Priority::High => label.yellow(),
        Priority::Normal => label.cyan(),
        Priority::Low => label.dimmed(),
    }
}

fn handle_generate_command(cli: &Cli, config: &Config, output: &Path, seed: Option<u64>) -> Result<()> {
    let reference = reference_time(config);
    let seed = seed.or(config.generator.seed);
    info!("Generating dataset (seed: {:?}) at reference time {}", seed, reference);

    if cli.is_verbose() {
        println!(
            "{} {} templates x {} messages",
            "Generating:".cyan(),
            config.generator.templates_count,
            config.generator.messages_per_template
        );
    }

    let dataset = generate_dataset(&config.generator, reference, &mut make_rng(seed));
    dataset
        .save(output)
        .context(format!("Failed to write dataset to {}", output.display()))?;

    println!(
        "{} {} templates, {} messages -> {}",
        "Generated".green(),
        dataset.templates.len(),
        dataset.messages.len(),
        output.display()
    );
    Ok(())
}

fn handle_validate_config_command(config: &Config) -> Result<()> {
    info!("Validating configuration");
    let rendered = serde_yaml::to_string(config).context("Failed to render configuration")?;
    println!("{}", rendered.trim_end());
    println!("{} {}", "Global budget:".cyan(), config.global_budget());
    println!("{}", "Configuration is valid".green());
    Ok(())
}

fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    apply_log_level(config.log_level.as_deref())?;

    info!("Starting with config from: {:?}", cli.config);

    config.validate().context("Invalid configuration")?;

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_log_level(" WARN ").unwrap(), LevelFilter::Warn);
        assert_eq!(parse_log_level("off").unwrap(), LevelFilter::Off);
        assert!(parse_log_level("loud").is_err());
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(Some(2), Some(5)), "2/5");
        assert_eq!(ratio(None, None), "-");
        assert_eq!(ratio(Some(0), None), "-");
    }
}
