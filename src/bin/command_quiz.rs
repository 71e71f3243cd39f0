use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use command_quiz::clients::{GeminiClient, GeminiConfig};
use command_quiz::config::{parse_model_list, QuizConfig};
use command_quiz::core::LowLevelClient;
use command_quiz::interceptors::TranscriptInterceptor;
use command_quiz::view;
use command_quiz::{QuizError, QuizGenerator, Session};
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Shell command quizzes generated from a spreadsheet", long_about = None)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    GOOGLE_API_KEY                API key for the Generative Language API (required)
    QUIZ_LANGUAGE                 Language of the questions [default: Turkish]
    QUIZ_MODELS                   Comma-separated models, tried in order
    QUIZ_ATTEMPTS_PER_MODEL       Attempts per model before falling back
    QUIZ_RATE_LIMIT_BACKOFF_SECS  Wait after a rate limit
    QUIZ_TRANSCRIPT_DIR           Save every prompt/response here
    RUST_LOG                      Log filter [default: command_quiz=info]")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play quiz rounds over a command table
    Play(PlayArgs),
    /// Check the API key and list the models it can use
    Models(PolicyArgs),
}

#[derive(Args)]
struct PlayArgs {
    /// CSV/TSV file with a "Command" column
    #[arg(short, long)]
    file: PathBuf,

    /// Default number of questions per round
    #[arg(short, long, default_value_t = 5)]
    count: usize,

    /// Seed for command selection
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    policy: PolicyArgs,
}

#[derive(Args)]
struct PolicyArgs {
    /// Language the questions are written in
    #[arg(short, long)]
    language: Option<String>,

    /// Comma-separated models, tried in order
    #[arg(short, long)]
    models: Option<String>,

    /// Attempts per model
    #[arg(long)]
    attempts: Option<usize>,

    /// Seconds to wait after a rate limit
    #[arg(long)]
    backoff_secs: Option<u64>,

    /// Directory for prompt/response transcripts
    #[arg(long)]
    transcripts: Option<PathBuf>,
}

impl PolicyArgs {
    fn apply(&self, mut config: QuizConfig) -> Result<QuizConfig> {
        if let Some(language) = &self.language {
            config.language = language.clone();
        }
        if let Some(models) = &self.models {
            config.retry.models = parse_model_list(models)?;
        }
        if let Some(attempts) = self.attempts {
            anyhow::ensure!(attempts > 0, "--attempts must be at least 1");
            config.retry.attempts_per_model = attempts;
        }
        if let Some(secs) = self.backoff_secs {
            config.retry.rate_limit_backoff = Duration::from_secs(secs);
        }
        if let Some(dir) = &self.transcripts {
            config.transcript_dir = Some(dir.clone());
        }
        Ok(config)
    }
}

fn init_tracing() {
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("command_quiz=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Play(args) => play(args).await,
        Command::Models(policy) => models(policy).await,
    }
}

fn prompt_line(label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;
    let mut input = String::new();
    let read = io::stdin().lock().read_line(&mut input)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(['\r', '\n']).to_string()))
}

async fn play(args: PlayArgs) -> Result<()> {
    let config = args.policy.apply(QuizConfig::from_env()?)?;
    let client = GeminiClient::from_env()?;

    let mut generator = QuizGenerator::new(client, config.retry.clone(), config.language.clone());
    if let Some(dir) = &config.transcript_dir {
        generator = generator.with_interceptor(Arc::new(TranscriptInterceptor::new(dir.clone())));
    }
    let mut session = match args.seed {
        Some(seed) => Session::with_seed(generator, seed),
        None => Session::new(generator),
    };

    let loaded = session
        .load_table(&args.file)
        .with_context(|| format!("loading {}", args.file.display()))?;
    println!("{}", format!("Loaded {loaded} commands.").green());

    loop {
        let progress = session.progress();
        println!("\n{}", view::progress_line(&progress).cyan());

        if session.pool().is_exhausted() {
            println!("{}", "Every command has been used.".yellow());
            match prompt_line("Start over with the full list? [y/N] ")? {
                Some(ans) if ans.trim().eq_ignore_ascii_case("y") => {
                    session.reset_pool()?;
                    continue;
                }
                _ => return Ok(()),
            }
        }

        let default = args.count.min(progress.remaining).max(1);
        let Some(input) = prompt_line(&format!(
            "Questions this round (1-{}, Enter = {default}, q = quit): ",
            progress.remaining
        ))?
        else {
            return Ok(());
        };
        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            return Ok(());
        }
        let n = if input.is_empty() {
            default
        } else {
            match input.parse::<usize>() {
                Ok(n) => n,
                Err(_) => {
                    println!("{}", "Please enter a number.".red());
                    continue;
                }
            }
        };

        println!("{}", "Generating questions...".dim());
        match session.new_round(n).await {
            Ok(_) => {}
            Err(QuizError::Generation(err)) => {
                for line in view::render_generation_failure(&err) {
                    println!("{}", line.red());
                }
                continue;
            }
            Err(QuizError::Pool(err)) => {
                println!("{}", err.to_string().red());
                continue;
            }
            Err(other) => return Err(other.into()),
        }

        if !ask_questions(&mut session)? {
            return Ok(());
        }

        let result = session.submit()?;
        println!();
        for (correct, line) in view::render_result(session.round().questions(), &result) {
            if correct {
                println!("{}", line.green());
            } else {
                println!("{}", line.red());
            }
        }
        session.next_round();
    }
}

/// Returns false when input ended before the round was finished.
fn ask_questions<C: LowLevelClient>(session: &mut Session<C>) -> Result<bool> {
    let questions = session.round().questions().to_vec();
    for (i, question) in questions.iter().enumerate() {
        println!("\n{}", view::render_question(i, question).bold());
        let Some(input) = prompt_line("> ")? else {
            return Ok(false);
        };
        session.answer(i, view::resolve_answer(question, &input))?;
    }
    Ok(true)
}

async fn models(policy: PolicyArgs) -> Result<()> {
    let config = policy.apply(QuizConfig::from_env()?)?;
    let gemini = GeminiConfig::from_env()?;
    println!("{} {}", "API key found:".green(), gemini.key_preview());

    let generator = QuizGenerator::new(GeminiClient::new(gemini), config.retry, config.language);
    let report = generator
        .check_models()
        .await
        .context("listing models from the Generative Language API")?;
    println!("{}", format!("Connected; {} models available:", report.available.len()).green());
    for name in &report.available {
        println!("  {name}");
    }

    println!("\nConfigured models (in order):");
    for model in &report.configured {
        if model.available {
            println!("  {} {}", "ok".green(), model.name);
        } else {
            println!("  {} {}", "missing".red(), model.name);
        }
    }
    Ok(())
}
