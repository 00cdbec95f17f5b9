//! Agentdeck CLI - orchestrator inspection and control

use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use agentdeck_core::api::ApiClient;
use agentdeck_core::config::Config;
use agentdeck_core::model::{BackendConfigPatch, Blueprint};
use agentdeck_core::sync::{SyncOptions, Synchronizer, visible_decisions};

#[derive(Parser)]
#[command(name = "agentdeck")]
#[command(author, version, about = "Terminal client for AI home-automation orchestrators", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Backend base URL (overrides config and AGENTDECK_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,
}

#[derive(Clone, Copy, Default, PartialEq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and manage agents
    Agents {
        #[command(subcommand)]
        action: AgentAction,
    },

    /// Show recent decisions
    Decisions {
        /// Maximum number of decisions to fetch
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
        /// Scope to a single agent
        #[arg(short, long)]
        agent: Option<String>,
        /// Include heartbeat decisions (no actionable tool call)
        #[arg(long)]
        heartbeats: bool,
    },

    /// Aggregate statistics
    Stats {
        #[command(subcommand)]
        action: StatsAction,
    },

    /// Agent factory: templates and drafts
    Factory {
        #[command(subcommand)]
        action: FactoryAction,
    },

    /// Backend runtime configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Local client settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Send a natural-language command to the orchestrator
    Chat {
        /// The message to send
        message: String,
    },

    /// AI-generated visual dashboard
    Dashboard {
        #[command(subcommand)]
        action: DashboardAction,
    },

    /// Run health checks against the backend
    Doctor,

    /// Probe the live event stream (connect, report, disconnect)
    Watch,
}

#[derive(Subcommand)]
enum AgentAction {
    /// List all agents with their status
    List,
    /// Edit an agent's instruction text
    Edit {
        id: String,
        #[arg(short, long)]
        instruction: String,
    },
    /// Delete an agent
    Delete {
        id: String,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum StatsAction {
    /// Per-day decision counts by agent
    Daily,
    /// Per-agent 24-hour performance rollup
    Performance,
}

#[derive(Subcommand)]
enum FactoryAction {
    /// List server-proposed agent templates
    Suggestions,
    /// Draft a new agent from a free-text prompt
    Generate { prompt: String },
    /// Persist an approved blueprint (JSON file)
    Save { file: std::path::PathBuf },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the backend settings snapshot
    Show,
    /// Enable or disable dry-run mode
    SetDryRun {
        #[arg(value_parser = clap::builder::BoolishValueParser::new())]
        enabled: bool,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// List all settings
    List,
    /// Get one setting
    Get { key: String },
    /// Set one setting
    Set { key: String, value: String },
    /// Reset settings to defaults
    Reset,
    /// Print the settings file path
    Path,
}

#[derive(Subcommand)]
enum DashboardAction {
    /// Print the dashboard HTML document to stdout
    Dump,
    /// Trigger regeneration of the dashboard
    Refresh,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agentdeck=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    let base_url = cli
        .base_url
        .clone()
        .unwrap_or_else(|| config.server.resolved_base_url());
    let client = ApiClient::builder()
        .base_url(base_url)
        .timeout_secs(config.server.timeout_secs)
        .build()?;

    match cli.command {
        Commands::Agents { action } => cmd_agents(&client, action, cli.format, cli.quiet).await,

        Commands::Decisions {
            limit,
            agent,
            heartbeats,
        } => cmd_decisions(&client, limit, agent.as_deref(), heartbeats, cli.format).await,

        Commands::Stats { action } => cmd_stats(&client, action, cli.format).await,

        Commands::Factory { action } => cmd_factory(&client, action, cli.format, cli.quiet).await,

        Commands::Config { action } => cmd_config(&client, action, cli.format, cli.quiet).await,

        Commands::Settings { action } => cmd_settings(config, action, cli.quiet),

        Commands::Chat { message } => cmd_chat(&client, &message, cli.format, cli.quiet).await,

        Commands::Dashboard { action } => cmd_dashboard(&client, action, cli.quiet).await,

        Commands::Doctor => cmd_doctor(&client, cli.quiet).await,

        Commands::Watch => cmd_watch(client, &config, cli.quiet).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_agents(
    client: &ApiClient,
    action: AgentAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    match action {
        AgentAction::List => {
            let agents = client.agents().await?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&agents)?);
                return Ok(());
            }
            if agents.is_empty() {
                if !quiet {
                    println!("No agents configured.");
                    println!("\nDraft one with: agentdeck factory generate \"<what it should do>\"");
                }
                return Ok(());
            }
            if !quiet {
                println!("Agents:");
            }
            for agent in agents {
                let last = agent
                    .last_decision
                    .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "  {:12} {:10} {:24} last decision: {}",
                    agent.agent_id, agent.status, agent.model, last
                );
            }
        }
        AgentAction::Edit { id, instruction } => {
            client.update_instruction(&id, &instruction).await?;
            if !quiet {
                println!("Agent '{}' instruction updated.", id);
            }
        }
        AgentAction::Delete { id, force } => {
            if !force {
                println!("Warning: This will permanently delete agent '{}'.", id);
                println!("Use --force to confirm deletion.");
                return Ok(());
            }
            client.delete_agent(&id).await?;
            info!(agent_id = %id, "Agent deleted");
            if !quiet {
                println!("Agent '{}' deleted.", id);
            }
        }
    }
    Ok(())
}

async fn cmd_decisions(
    client: &ApiClient,
    limit: usize,
    agent: Option<&str>,
    heartbeats: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let decisions = client.decisions(limit, agent).await?;
    let visible = visible_decisions(&decisions, heartbeats);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&visible)?);
        return Ok(());
    }

    if visible.is_empty() {
        println!("No relevant decisions found.");
        if !heartbeats {
            println!("(heartbeats are hidden; pass --heartbeats to include them)");
        }
        return Ok(());
    }

    for d in visible {
        let reasoning = d.reasoning.as_deref().unwrap_or("-");
        let dry = if d.dry_run { " [dry-run]" } else { "" };
        println!(
            "{} {:12} {}{}",
            d.timestamp.format("%Y-%m-%d %H:%M:%S"),
            d.agent_id,
            d.action.summary(),
            dry
        );
        println!("    {}", reasoning);
    }
    Ok(())
}

async fn cmd_stats(
    client: &ApiClient,
    action: StatsAction,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match action {
        StatsAction::Daily => {
            let rows = client.daily_stats().await?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }
            if rows.is_empty() {
                println!("No daily stats available.");
                return Ok(());
            }
            for row in rows {
                let breakdown = row
                    .counts
                    .iter()
                    .map(|(agent, n)| format!("{}: {}", agent, n))
                    .collect::<Vec<_>>()
                    .join("  ");
                println!("{}  total: {:4}  {}", row.date, row.total(), breakdown);
            }
        }
        StatsAction::Performance => {
            let stats = client.performance_stats().await?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }
            if stats.is_empty() {
                println!("No performance stats available.");
                return Ok(());
            }
            for (agent, perf) in stats {
                println!(
                    "{:12} decisions(24h): {:4}  error rate: {:5.1}%  top tool: {}",
                    agent,
                    perf.decisions_24h,
                    perf.error_rate * 100.0,
                    if perf.top_tool.is_empty() {
                        "none"
                    } else {
                        perf.top_tool.as_str()
                    }
                );
            }
        }
    }
    Ok(())
}

async fn cmd_factory(
    client: &ApiClient,
    action: FactoryAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    match action {
        FactoryAction::Suggestions => {
            let suggestions = client.suggestions().await?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&suggestions)?);
                return Ok(());
            }
            if suggestions.is_empty() {
                println!("No suggestions right now.");
                return Ok(());
            }
            for (i, s) in suggestions.iter().enumerate() {
                println!("{}. {}", i + 1, s.title);
                println!("   {}", s.reason);
                println!("   prompt: {}", s.prompt);
            }
        }
        FactoryAction::Generate { prompt } => {
            let blueprint = client.generate_blueprint(&prompt).await?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&blueprint)?);
                return Ok(());
            }
            println!("Blueprint '{}' ({})", blueprint.name, blueprint.id);
            println!("  Model: {}", blueprint.model);
            println!("  Interval: {}s", blueprint.decision_interval);
            println!("  Entities: {}", blueprint.entities.join(", "));
            println!("  Instruction: {}", blueprint.instruction);
            if !quiet {
                println!("\nSave it with: agentdeck factory save <file.json>");
                println!("(write the JSON above to the file, editing as needed)");
            }
        }
        FactoryAction::Save { file } => {
            let contents = std::fs::read_to_string(&file)?;
            let blueprint: Blueprint = serde_json::from_str(&contents)?;
            match client.save_blueprint(&blueprint).await {
                Ok(()) => {
                    if !quiet {
                        println!("Agent '{}' saved. Backend restart may be required.", blueprint.id);
                    }
                }
                Err(err) => {
                    warn!(code = err.code(), "Blueprint save rejected by backend");
                    // Surface the backend's own validation message when present
                    let message = err.detail().unwrap_or_else(|| err.to_string());
                    return Err(anyhow::anyhow!("Save rejected: {}", message));
                }
            }
        }
    }
    Ok(())
}

async fn cmd_config(
    client: &ApiClient,
    action: ConfigAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let config = client.backend_config().await?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&config)?);
                return Ok(());
            }
            println!("Backend configuration:");
            println!("  Version: {}", config.version);
            println!("  Dry-run mode: {}", config.dry_run_mode);
            println!("  Ollama host: {}", config.ollama_host);
            println!("  Orchestrator model: {}", config.orchestrator_model);
            for (agent, model) in &config.agents {
                println!("  Agent {}: {}", agent, model);
            }
        }
        ConfigAction::SetDryRun { enabled } => {
            let ack = client
                .update_backend_config(&BackendConfigPatch {
                    dry_run_mode: Some(enabled),
                })
                .await?;
            if !quiet {
                println!("Dry-run mode is now {}.", ack.dry_run_mode);
            }
        }
    }
    Ok(())
}

fn cmd_settings(mut config: Config, action: SettingsAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        SettingsAction::List => {
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        SettingsAction::Get { key } => {
            println!("{}", config.get(&key)?);
        }
        SettingsAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        SettingsAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Settings reset to defaults.");
            }
        }
        SettingsAction::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}

async fn cmd_chat(
    client: &ApiClient,
    message: &str,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let reply = client.chat(message).await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }
    println!("{}", reply.response);
    if !reply.actions_executed.is_empty() && !quiet {
        println!("\nActions executed:");
        for action in &reply.actions_executed {
            println!("  {}", action);
        }
    }
    Ok(())
}

async fn cmd_dashboard(
    client: &ApiClient,
    action: DashboardAction,
    quiet: bool,
) -> anyhow::Result<()> {
    match action {
        DashboardAction::Dump => {
            let html = client.dynamic_dashboard().await?;
            println!("{}", html);
        }
        DashboardAction::Refresh => {
            client.refresh_dashboard().await?;
            if !quiet {
                println!("Dashboard regeneration triggered.");
            }
        }
    }
    Ok(())
}

async fn cmd_doctor(client: &ApiClient, quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("Agentdeck Health Check");
        println!("======================");
        println!();
    }

    let mut all_ok = true;

    // Check local settings
    match Config::load() {
        Ok(_) => {
            if !quiet {
                println!("[OK] Settings: Valid");
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Settings: Error - {}", e);
            }
        }
    }

    // Check backend reachability
    match client.health().await {
        Ok(health) => {
            if !quiet {
                println!(
                    "[OK] Backend: {} (version {}, {} agents, model {})",
                    health.status, health.version, health.agent_count, health.orchestrator_model
                );
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Backend: Unreachable - {}", e);
                println!("     Check the base URL: {}", client.base_url());
            }
        }
    }

    // Check settings file location
    if !quiet {
        match Config::config_path() {
            Ok(path) => {
                if path.exists() {
                    println!("[OK] Settings file: {}", path.display());
                } else {
                    println!("[--] Settings file: {} (using defaults)", path.display());
                }
            }
            Err(e) => println!("[!!] Settings file: Error - {}", e),
        }
        println!();
    }

    if all_ok {
        if !quiet {
            println!("All checks passed.");
        }
        Ok(())
    } else {
        Err(anyhow::anyhow!("One or more health checks failed"))
    }
}

async fn cmd_watch(client: ApiClient, config: &Config, quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("Probing event stream at {} ...", client.base_url());
    }

    let mut handle = Synchronizer::spawn(client, SyncOptions::from(&config.sync));

    let connected = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if handle.snapshot().connected {
                return true;
            }
            if !handle.changed().await {
                return false;
            }
        }
    })
    .await
    .unwrap_or(false);

    let snapshot = handle.snapshot();
    handle.shutdown().await;

    if connected {
        info!(
            agents = snapshot.agents.len(),
            decisions = snapshot.decisions.len(),
            "Event stream probe succeeded"
        );
        println!(
            "Connected. {} agents, {} recent decisions mirrored.",
            snapshot.agents.len(),
            snapshot.decisions.len()
        );
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Event stream did not come up within 5 seconds; the dashboard would be pull-only"
        ))
    }
}
