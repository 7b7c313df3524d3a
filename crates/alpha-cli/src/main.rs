//! Alpha governance operator CLI
//!
//! `alphactl` is a thin presentation layer over `alpha-core` and
//! `alpha-state`.
//!
//! ## Commands
//!
//! - `rules` / `questions`: print the rulebook and the interview questions
//! - `validate`: offline validation of a signal file
//! - `decision check`: schema check of a decision record
//! - `ledger verify|tail`: audit ledger integrity and inspection
//! - `agent ...`: governed agent operations on the configured roster
//! - `queue ...`: outbound decision queue inspection and retry

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, Level};

use alpha_core::orchestrator::CallContext;
use alpha_core::{
    mandatory_questions, rulebook, validate_against_schema, AgentId, AgentMode, AgentRole,
    AgentStatus, AuditLedger, DecisionCanonicalizer, GovernanceConfig, GovernanceOrchestrator,
    Governed, RuleValidator, Signal,
};
use alpha_state::{DecisionQueue, SurrealDecisionQueue};

#[derive(Parser)]
#[command(name = "alphactl")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Alpha decision-governance operator CLI", long_about = None)]
struct Cli {
    /// Governance configuration file (TOML)
    #[arg(short, long, global = true, env = "ALPHA_CONFIG")]
    config: Option<PathBuf>,

    /// Identity recorded in the audit ledger for governed calls
    #[arg(long, global = true, default_value = alpha_core::orchestrator::DEFAULT_ACTOR)]
    actor: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the golden rules
    Rules,

    /// List the mandatory interview questions
    Questions,

    /// Validate a signal file offline and print the decision it would produce
    Validate {
        /// Signal record (JSON object)
        #[arg(short, long)]
        signal: PathBuf,

        #[arg(short, long, value_enum, default_value_t = ModeArg::Human)]
        mode: ModeArg,
    },

    /// Decision record tools
    Decision {
        #[command(subcommand)]
        action: DecisionAction,
    },

    /// Audit ledger tools
    Ledger {
        #[command(subcommand)]
        action: LedgerAction,
    },

    /// Governed agent operations
    Agent {
        #[command(subcommand)]
        action: AgentAction,
    },

    /// Outbound decision queue
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum DecisionAction {
    /// Check a decision record against the schema
    Check { path: PathBuf },
}

#[derive(Subcommand)]
enum LedgerAction {
    /// Walk the whole hash chain
    Verify,
    /// Print the last entries
    Tail {
        #[arg(short = 'n', long, default_value = "20")]
        count: usize,
    },
}

#[derive(Subcommand)]
enum AgentAction {
    /// List agents
    List {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Run a full interview from a JSON array of answers
    Evaluate {
        #[arg(long)]
        name: String,
        #[arg(long)]
        role: String,
        #[arg(short, long, value_enum, default_value_t = ModeArg::Llm)]
        mode: ModeArg,
        #[arg(long)]
        answers: PathBuf,
    },
    /// Submit a signal on behalf of an active agent
    Submit {
        #[arg(long)]
        agent: String,
        #[arg(short, long)]
        signal: PathBuf,
        /// Also enqueue the resulting decision
        #[arg(long)]
        publish: bool,
    },
    /// Issue a formal warning
    Warn {
        #[arg(long)]
        agent: String,
        #[arg(long)]
        reason: String,
    },
    /// Exclude an agent immediately
    Exclude {
        #[arg(long)]
        agent: String,
        #[arg(long)]
        reason: String,
    },
    /// Review an agent's decision history
    Audit {
        #[arg(long)]
        agent: String,
    },
}

#[derive(Subcommand)]
enum QueueAction {
    /// List pending decisions in FIFO order
    Pending {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Count decisions by status
    Stats,
    /// Move failed decisions with retry budget left back to pending
    Retry,
    /// Schema-check and enqueue a decision record
    Publish { path: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Human,
    Llm,
}

impl From<ModeArg> for AgentMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Human => AgentMode::Human,
            ModeArg::Llm => AgentMode::Llm,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Candidate,
    Active,
    Excluded,
}

impl From<StatusArg> for AgentStatus {
    fn from(s: StatusArg) -> Self {
        match s {
            StatusArg::Candidate => AgentStatus::Candidate,
            StatusArg::Active => AgentStatus::Active,
            StatusArg::Excluded => AgentStatus::Excluded,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    alpha_core::init_tracing(cli.json, level);

    let config = load_config(cli.config.as_deref())?;
    let ctx = CallContext::operator(cli.actor.clone());

    let outcome = match cli.command {
        Commands::Rules => cmd_rules(),
        Commands::Questions => cmd_questions(),
        Commands::Validate { signal, mode } => cmd_validate(&config, &signal, mode.into()),
        Commands::Decision {
            action: DecisionAction::Check { path },
        } => cmd_decision_check(&path),
        Commands::Ledger { action } => match action {
            LedgerAction::Verify => cmd_ledger_verify(&config),
            LedgerAction::Tail { count } => cmd_ledger_tail(&config, count),
        },
        Commands::Agent { action } => cmd_agent(config, &ctx, action).await,
        Commands::Queue { action } => cmd_queue(&config, action).await,
        Commands::Config => print_json(&config),
    };
    alpha_core::metrics::METRICS.flush();
    outcome
}

fn load_config(path: Option<&Path>) -> Result<GovernanceConfig> {
    let config = match path {
        Some(p) => GovernanceConfig::load(p).with_context(|| format!("loading {}", p.display()))?,
        None => GovernanceConfig::default(),
    };
    let config = config.with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn read_signal(path: &Path) -> Result<Signal> {
    match read_json(path)? {
        serde_json::Value::Object(map) => Ok(Signal::from(map)),
        _ => bail!("{} must contain a JSON object", path.display()),
    }
}

fn governed<T>(outcome: Governed<T>) -> Result<T> {
    outcome.map_err(|e| anyhow::anyhow!(e))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_rules() -> Result<()> {
    for rule in rulebook() {
        println!("{:>2}. {}", rule.number, rule.title);
        println!("    {}", rule.description);
    }
    Ok(())
}

fn cmd_questions() -> Result<()> {
    for q in mandatory_questions() {
        let trap = if q.trap { " [trap]" } else { "" };
        println!("{}{} (rule {}, max {} sentences)", q.id, trap, q.rule_tested, q.max_sentences);
        println!("    {}", q.prompt);
    }
    Ok(())
}

fn cmd_validate(config: &GovernanceConfig, path: &Path, mode: AgentMode) -> Result<()> {
    let signal = read_signal(path)?;
    let validator = RuleValidator::new(config.clone());
    let validation = validator.validate_as(&signal, mode);
    let clarity = validator.clarity_score(&signal);
    let decision = DecisionCanonicalizer.build(&signal, &validation, clarity, false);

    print_json(&serde_json::json!({
        "validation": validation,
        "clarity_score": clarity,
        "decision": decision,
    }))
}

fn cmd_decision_check(path: &Path) -> Result<()> {
    let record = read_json(path)?;
    let report = validate_against_schema(&record);
    print_json(&report)?;
    if !report.valid {
        bail!("decision record failed the schema check");
    }
    Ok(())
}

fn open_ledger(config: &GovernanceConfig) -> Result<AuditLedger> {
    let Some(path) = &config.ledger_path else {
        bail!("no ledger_path configured (set it in the config file or ALPHA_LEDGER_PATH)");
    };
    AuditLedger::open(path).with_context(|| format!("opening ledger {}", path.display()))
}

fn cmd_ledger_verify(config: &GovernanceConfig) -> Result<()> {
    let ledger = open_ledger(config)?;
    let report = ledger.verify_integrity();
    print_json(&report)?;
    if !report.valid {
        bail!("ledger integrity check failed");
    }
    Ok(())
}

fn cmd_ledger_tail(config: &GovernanceConfig, count: usize) -> Result<()> {
    let ledger = open_ledger(config)?;
    for entry in ledger.read_log(count)? {
        println!(
            "#{:<6} {} {:<28} {:<16} {}",
            entry.sequence,
            entry.timestamp.to_rfc3339(),
            entry.action,
            entry.actor,
            entry.result
        );
    }
    Ok(())
}

async fn cmd_agent(config: GovernanceConfig, ctx: &CallContext, action: AgentAction) -> Result<()> {
    if config.roster_path.is_none() {
        tracing::warn!("no roster_path configured; agent changes will not outlive this process");
    }
    let queue_retries = config.queue_max_retries;
    let orch = GovernanceOrchestrator::new(config).context("starting governance orchestrator")?;

    match action {
        AgentAction::List { status } => print_json(&orch.list_agents(status.map(Into::into))),
        AgentAction::Evaluate {
            name,
            role,
            mode,
            answers,
        } => {
            let role: AgentRole = governed(role.parse())?;
            let answers: Vec<String> = serde_json::from_value(read_json(&answers)?)
                .context("answers must be a JSON array of strings")?;
            let evaluation = governed(orch.evaluate_candidate(&name, role, mode.into(), &answers, ctx)?)?;
            info!(agent_id = %evaluation.agent_id, recruited = evaluation.recruited, "candidate evaluated");
            print_json(&evaluation)
        }
        AgentAction::Submit {
            agent,
            signal,
            publish,
        } => {
            let signal = read_signal(&signal)?;
            let report = governed(orch.submit_signal(&AgentId::from(agent), signal, ctx)?)?;
            if publish {
                let queue = SurrealDecisionQueue::from_env()
                    .await
                    .context("connecting to decision queue")?
                    .with_max_retries(queue_retries);
                let enqueued = alpha_core::outbox::publish(&queue, &report.decision).await?;
                info!(decision_id = %report.decision.decision_id, enqueued, "decision published");
            }
            print_json(&report)
        }
        AgentAction::Warn { agent, reason } => {
            let outcome = governed(orch.issue_warning(&AgentId::from(agent), &reason, ctx)?)?;
            print_json(&outcome)
        }
        AgentAction::Exclude { agent, reason } => {
            let outcome = governed(orch.exclude_agent(&AgentId::from(agent), &reason, ctx)?)?;
            print_json(&outcome)
        }
        AgentAction::Audit { agent } => {
            let report = governed(orch.audit_agent(&AgentId::from(agent), ctx)?)?;
            print_json(&report)
        }
    }
}

async fn cmd_queue(config: &GovernanceConfig, action: QueueAction) -> Result<()> {
    let queue = SurrealDecisionQueue::from_env()
        .await
        .context("connecting to decision queue")?
        .with_max_retries(config.queue_max_retries);

    match action {
        QueueAction::Pending { limit } => {
            let pending = queue.fetch_pending(limit).await?;
            if pending.is_empty() {
                println!("No pending decisions.");
            }
            for d in pending {
                println!(
                    "{}  retries {}/{}  queued {}",
                    d.decision_id,
                    d.retry_count,
                    d.max_retries,
                    d.created_at.to_rfc3339()
                );
            }
            Ok(())
        }
        QueueAction::Stats => {
            for (status, count) in queue.count_by_status().await? {
                println!("{:<10} {}", status.as_str(), count);
            }
            Ok(())
        }
        QueueAction::Retry => {
            let moved = queue.retry_failed().await?;
            println!("{} decision(s) moved back to pending", moved);
            Ok(())
        }
        QueueAction::Publish { path } => {
            let record = read_json(&path)?;
            let enqueued = alpha_core::outbox::publish_value(&queue, record).await?;
            println!("{}", if enqueued { "enqueued" } else { "already queued" });
            Ok(())
        }
    }
}
