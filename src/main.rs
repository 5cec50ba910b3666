use std::{
    fs::{self, OpenOptions},
    io::{self, stdin, Write},
    process::ExitCode,
    sync::Mutex,
    time::Duration,
};

use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use study_aid::{
    app::{Action, App},
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore, API_URL_ENV},
    history::HistoryStore,
    runtime::{CrosstermEventSource, Runner, StudyEvent},
    storage::{FileStore, KeyValueStore},
    HttpStudyClient, Mode, SessionController, SessionState, StudyData, StudyFetcher,
};

const TICK_RATE_MS: u64 = 250;

/// terminal study companion: summaries, quizzes and study tips for any topic
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Ask the study service about any topic and get a short summary, a multiple choice quiz and a study tip, or a worked math problem in math mode. Recent topics and the dark mode preference are remembered between runs."
)]
pub struct Cli {
    /// topic to study (pre-fills the form, or is fetched directly with --print)
    topic: Option<String>,

    /// ask for a math problem instead of a summary and quiz
    #[clap(short, long)]
    math: bool,

    /// base url of the study service (overrides config and STUDY_AID_API_URL)
    #[clap(long)]
    api_url: Option<String>,

    /// fetch once and print the study guide instead of starting the tui
    #[clap(short, long)]
    print: bool,

    /// write the effective settings to the config file
    #[clap(long)]
    save_config: bool,

    /// forget all remembered topics and exit
    #[clap(long)]
    clear_history: bool,
}

fn init_logging(to_stderr: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("study_aid=info"));

    if to_stderr {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
        return;
    }

    // the tui owns the terminal, so logs go to a file
    let path = AppDirs::log_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config_store = FileConfigStore::new();
    let config = config_store
        .load()
        .with_overrides(std::env::var(API_URL_ENV).ok(), cli.api_url.clone());
    let mode = if cli.math { Mode::Math } else { config.default_mode };

    init_logging(cli.print || cli.clear_history);
    tracing::debug!(?config, "effective configuration");

    if cli.save_config {
        config_store
            .save(&config)
            .context("failed to save configuration")?;
    }

    if cli.clear_history {
        HistoryStore::load(FileStore::new()).clear();
        println!("History cleared");
        return Ok(ExitCode::SUCCESS);
    }

    let rt = Runtime::new().context("failed to start async runtime")?;
    let client = HttpStudyClient::from_config(&config)?;

    if cli.print {
        let Some(topic) = cli.topic.as_deref() else {
            let mut cmd = Cli::command();
            cmd.error(
                ErrorKind::MissingRequiredArgument,
                "a topic is required with --print",
            )
            .exit();
        };
        return print_once(&rt, client, FileStore::new(), topic, mode);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty (use --print for scripts)")
            .exit();
    }

    let mut app = App::new(client, FileStore::new(), mode);
    if let Some(topic) = cli.topic {
        app.input = topic;
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_tui(&mut terminal, &mut app, &rt);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result.map(|_| ExitCode::SUCCESS)
}

fn run_tui<B, F, S>(
    terminal: &mut Terminal<B>,
    app: &mut App<F, S>,
    rt: &Runtime,
) -> anyhow::Result<()>
where
    B: Backend,
    F: StudyFetcher,
    S: KeyValueStore,
{
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            StudyEvent::Tick => app.on_tick(),
            StudyEvent::Resize => {}
            StudyEvent::Key(key) => match app.on_key(key) {
                Action::Quit => break,
                Action::Submit => {
                    if let Some(submission) = app.begin_submit() {
                        // show the loading state before blocking on the request
                        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                        rt.block_on(app.finish_submit(&submission));
                    }
                }
                Action::None => {}
            },
        }
    }

    Ok(())
}

fn print_once<F: StudyFetcher, S: KeyValueStore>(
    rt: &Runtime,
    client: F,
    store: S,
    topic: &str,
    mode: Mode,
) -> anyhow::Result<ExitCode> {
    let mut controller = SessionController::new(client, HistoryStore::load(store));
    let state = rt.block_on(controller.submit(topic, mode));

    let mut out = io::stdout().lock();
    match report(&mut out, state)? {
        true => Ok(ExitCode::SUCCESS),
        false => Ok(ExitCode::FAILURE),
    }
}

/// Write the outcome of a finished submission. Returns whether it succeeded.
fn report<W: Write>(out: &mut W, state: &SessionState) -> io::Result<bool> {
    if let Some(data) = state.result() {
        write_study_guide(out, &state.topic, data)?;
        return Ok(true);
    }
    let message = state
        .error_message()
        .unwrap_or_else(|| "Failed to fetch study data. Please try again.".to_string());
    eprintln!("Error: {message}");
    Ok(false)
}

fn write_study_guide<W: Write>(out: &mut W, topic: &str, data: &StudyData) -> io::Result<()> {
    writeln!(out, "# {topic}")?;
    match data {
        StudyData::Default { summary, quiz, .. } => {
            writeln!(out, "\n## Summary")?;
            for bullet in summary {
                writeln!(out, "- {bullet}")?;
            }
            writeln!(out, "\n## Quiz")?;
            for (i, q) in quiz.iter().enumerate() {
                writeln!(out, "{}. {}", i + 1, q.question)?;
                for (oi, option) in q.options.iter().enumerate() {
                    let mark = if q.is_correct(oi) { " *" } else { "" };
                    writeln!(
                        out,
                        "   {}. {option}{mark}",
                        study_aid::study::QuizQuestion::option_label(oi)
                    )?;
                }
            }
        }
        StudyData::Math { math_question, .. } => {
            writeln!(out, "\n## Math Problem")?;
            writeln!(out, "{}", math_question.question)?;
            writeln!(out, "\nAnswer: {}", math_question.answer)?;
            writeln!(out, "Explanation: {}", math_question.explanation)?;
        }
    }
    writeln!(out, "\n## Study Tip")?;
    writeln!(out, "{}", data.study_tip())?;
    Ok(())
}
