//! # Codeloop CLI
//!
//! Runs a programmer/designer session on one task and prints the
//! programmer's final answer.
//!
//! Usage:
//!   codeloop --prompt <task>
//!   codeloop --prompt <task> --rounds 5 --human
//!   codeloop --config codeloop.toml --prompt <task> --verbose
//!
//! Logs go to stderr; `RUST_LOG` overrides `--verbose` and `--quiet`.

use clap::Parser;
use codeloop_agent::{
    Agent, AgentRole, AnalyzerAgent, ChatAgent, CodingAgent, HumanAgent, ModelSettings,
    Orchestrator, RepairLoop, RepairReport,
};
use codeloop_core::{
    CodeloopConfig, HttpChatClient, Language, Result, Sandbox, StaticAnalysis,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "codeloop")]
#[command(author, version, about = "Codeloop - generate, compile and repair code with LLM agents")]
struct Cli {
    /// The programming task handed to the programmer
    #[arg(short, long)]
    prompt: String,

    /// Config file (default: ./codeloop.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rounds after the opening exchange
    #[arg(short, long)]
    rounds: Option<usize>,

    /// Ask a human for feedback after every programmer turn
    #[arg(long)]
    human: bool,

    /// Debug logging and the programmer transcript at the end
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only warnings and the final answer
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn export_conversation<A: Agent>(agent: &A, dir: &Path) {
    let path = dir.join(format!("{}.csv", agent.role()));
    if let Err(e) = agent.conversation().export_csv(&path) {
        tracing::warn!(error = %e, "could not export conversation");
    }
}

/// Polish fixed code with the static analyzer
async fn analyze(config: &CodeloopConfig, code: &str) -> Result<String> {
    let persona = config.repair.persona_for(Language::C);
    let repair = RepairLoop::new(StaticAnalysis::for_c()?, persona, config.analysis.trial_budget)
        .with_model(config.fixer.model.clone(), config.fixer.sampling());
    let mut analyzer = AnalyzerAgent::analyzer(HttpChatClient::new(&config.fixer)?, repair);

    let result = analyzer.respond(code).await;

    let path = config.session.export_dir.join("analysis.csv");
    if let Err(e) = analyzer.export_analysis(&path) {
        tracing::warn!(error = %e, "could not export analysis log");
    }
    Ok(result)
}

/// Code that should go through the analyzer, if any
fn analysis_input(report: Option<&RepairReport>) -> Option<&str> {
    report.filter(|r| r.is_fixed()).map(RepairReport::code)
}

async fn run(cli: Cli) -> Result<String> {
    let mut config = CodeloopConfig::discover(cli.config.as_deref())?;
    if let Some(rounds) = cli.rounds {
        config.session.rounds = rounds;
    }
    config.session.human_in_loop |= cli.human;

    let language = config.repair.language;
    let mut sandbox = Sandbox::new(language)?
        .with_timeout(Duration::from_secs(config.repair.run_timeout_secs));
    if let Some(dir) = &config.repair.scratch_dir {
        sandbox = sandbox.with_scratch_dir(dir)?;
    }

    let repair = RepairLoop::new(
        sandbox,
        config.repair.persona_for(language),
        config.repair.trial_budget,
    )
    .with_model(config.programmer.model.clone(), config.programmer.sampling());
    let programmer = CodingAgent::new(
        HttpChatClient::new(&config.programmer)?,
        ModelSettings {
            system_prompt: config.programmer_persona(),
            ..ModelSettings::from(&config.programmer)
        },
        repair,
    );
    let designer = ChatAgent::new(
        AgentRole::Designer,
        HttpChatClient::new(&config.designer)?,
        ModelSettings {
            system_prompt: config.designer_persona(),
            ..ModelSettings::from(&config.designer)
        },
    );
    let human = config
        .session
        .human_in_loop
        .then(|| HumanAgent::console().with_prompt_file(&config.session.human_prompt_file));

    let export_dir = config.session.export_dir.clone();
    let mut session = Orchestrator::new(programmer, designer, human)
        .with_rounds(config.session.rounds)
        .with_export(export_dir.join("turns.csv"));

    let mut answer = session.run(&cli.prompt).await;

    export_conversation(session.programmer(), &export_dir);
    export_conversation(session.designer(), &export_dir);
    if cli.verbose {
        session.programmer().conversation().pretty_print();
    }

    if config.analysis.enabled {
        if language != Language::C {
            tracing::warn!(language = %language, "static analysis is only available for C, skipped");
        } else if let Some(code) = analysis_input(session.programmer().last_report()) {
            match analyze(&config, code).await {
                Ok(polished) => answer = polished,
                Err(e) => tracing::warn!(error = %e, "static analysis unavailable, keeping answer"),
            }
        } else {
            tracing::warn!("programmer code never built, static analysis skipped");
        }
    }

    Ok(answer)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(answer) => println!("{}", answer),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
