use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use vision_voice::config::WakeWordConfig;
use vision_voice::voice::{
    AppMode, CommandMatch, CommandMatcher, CommandTable, LearningStats, StdinEngine,
    TracingActions, TracingSpeech, WakeDetection, WakeWordDetector,
};
use vision_voice::{Config, Daemon};

/// Vision Voice - hands-free voice commands
#[derive(Parser)]
#[command(name = "vision-voice", version, about)]
struct Cli {
    /// Override the wake phrase (e.g., "hey vision")
    #[arg(short, long)]
    wake_phrase: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Listen for commands typed on stdin (default)
    Listen,
    /// Run wake detection and command matching on one utterance
    Match {
        /// Utterance text
        text: String,
        /// Current application mode
        #[arg(short, long, default_value = "home")]
        mode: AppMode,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,vision_voice=info",
        1 => "info,vision_voice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(phrase) = cli.wake_phrase.as_deref() {
        config.wake_word = WakeWordConfig::for_phrase(phrase);
        config.validate()?;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Listen) {
        Command::Listen => listen(config).await,
        Command::Match { text, mode, json } => match_once(&config, &text, mode, json),
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn listen(config: Config) -> anyhow::Result<()> {
    let phrase = config.wake_word.phrase.clone();
    let daemon = Daemon::new(config)?;
    let (engine, events) = StdinEngine::new();

    tracing::info!("vision voice ready - type \"{phrase} <command>\", or !end / !network to simulate engine events");

    daemon.run(engine, events, TracingActions, TracingSpeech).await?;
    Ok(())
}

#[derive(Serialize)]
struct MatchReport {
    wake: WakeReport,
    command: Option<CommandMatch>,
    accepted: bool,
    suggestion: Option<String>,
}

#[derive(Serialize)]
struct WakeReport {
    activated: bool,
    confidence: f64,
    residual: String,
}

impl From<WakeDetection> for WakeReport {
    fn from(d: WakeDetection) -> Self {
        Self {
            activated: d.activated,
            confidence: d.confidence,
            residual: d.residual,
        }
    }
}

fn match_once(config: &Config, text: &str, mode: AppMode, json: bool) -> anyhow::Result<()> {
    let rec = &config.recognition;
    let detector = WakeWordDetector::new(&config.wake_word, rec.wake_threshold);
    let matcher = CommandMatcher::new(
        CommandTable::default(),
        rec.command_threshold,
        rec.adaptive_learning,
    );

    let wake = detector.detect(text, &[]);
    let command = matcher.score(&wake.residual, mode, &LearningStats::new());
    let accepted = wake.activated
        && command
            .as_ref()
            .is_some_and(|c| c.confidence > matcher.threshold());
    let suggestion = if accepted || !wake.activated {
        None
    } else {
        matcher.suggest(&wake.residual)
    };

    let report = MatchReport {
        wake: wake.into(),
        command,
        accepted,
        suggestion,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "wake: {} (confidence {:.3}, residual \"{}\")",
        if report.wake.activated { "yes" } else { "no" },
        report.wake.confidence,
        report.wake.residual
    );
    match &report.command {
        Some(c) => println!(
            "command: {} via {:?} \"{}\" (confidence {:.3}, {})",
            c.action,
            c.method,
            c.phrase,
            c.confidence,
            if report.accepted { "accepted" } else { "rejected" }
        ),
        None => println!("command: none"),
    }
    if let Some(s) = &report.suggestion {
        println!("suggestion: did you mean \"{s}\"?");
    }

    Ok(())
}
