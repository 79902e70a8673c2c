//! Interactive focus timer.
//!
//! Reads one command per line from stdin and prints every timer event as a
//! JSON line on stdout.

use clap::Args;
use studify_core::storage::BackendMode;
use studify_core::{
    Command, Config, Database, Event, FocusController, FocusSession, LocalStore, RestClient,
    SinkDispatcher, SystemClock, TickSource, TimerMode,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const LAST_SUBJECT_KEY: &str = "last_subject";

const HELP: &str = "commands: start | pause | toggle | reset | skip | mode <focus|short|long> | subject <text> | status | quit";

#[derive(Args)]
pub struct FocusArgs {
    /// Subject attached to completed sessions (defaults to the last one used)
    #[arg(long)]
    subject: Option<String>,
    /// User id stamped on session logs (defaults to account.user_id)
    #[arg(long)]
    user: Option<String>,
    /// Override the focus duration, in seconds
    #[arg(long)]
    focus_secs: Option<u32>,
    /// Override the short break duration, in seconds
    #[arg(long)]
    short_break_secs: Option<u32>,
    /// Override the long break duration, in seconds
    #[arg(long)]
    long_break_secs: Option<u32>,
}

#[derive(Debug)]
enum Input {
    Command(Command),
    Help,
    Quit,
}

fn parse_input(line: &str) -> Result<Option<Input>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let input = match word.to_ascii_lowercase().as_str() {
        "start" => Input::Command(Command::Start),
        "pause" => Input::Command(Command::Pause),
        "toggle" | "t" => Input::Command(Command::Toggle),
        "reset" => Input::Command(Command::Reset),
        "skip" => Input::Command(Command::Skip),
        "status" => Input::Command(Command::Status),
        "mode" => {
            let mode: TimerMode = rest.parse().map_err(|e| format!("{e}"))?;
            Input::Command(Command::SelectMode(mode))
        }
        "subject" => Input::Command(Command::SetSubject(rest.to_string())),
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(Some(input))
}

pub fn run(args: FocusArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut durations = config.durations()?;
    if let Some(secs) = args.focus_secs {
        durations.focus_secs = secs;
    }
    if let Some(secs) = args.short_break_secs {
        durations.short_break_secs = secs;
    }
    if let Some(secs) = args.long_break_secs {
        durations.long_break_secs = secs;
    }
    durations.validate()?;

    let user = args.user.unwrap_or_else(|| config.account.user_id.clone());
    let state_db = Database::open()?;
    let subject = match args.subject {
        Some(subject) => subject,
        None => state_db.kv_get(LAST_SUBJECT_KEY)?.unwrap_or_default(),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let final_subject = runtime.block_on(async move {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
        let printer = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::error!(error = %e, "failed to encode event"),
                }
            }
        });

        let (sink, writer) = match config.backend.mode {
            BackendMode::Local => SinkDispatcher::spawn(LocalStore::open()?, event_tx.clone()),
            BackendMode::Remote => {
                let backend = &config.backend;
                let client = RestClient::new(
                    backend.supabase_url.as_deref(),
                    &backend.stats_url,
                    backend.anon_key.clone().unwrap_or_default(),
                    backend.resolved_access_token(),
                )?;
                SinkDispatcher::spawn(client, event_tx.clone())
            }
        };
        tracing::info!(%user, mode = ?config.backend.mode, "focus session starting");

        let mut controller = FocusController::new(durations, user, sink, SystemClock);
        if !subject.is_empty() {
            controller.set_subject_label(subject);
        }
        let session = FocusSession::new(controller, TickSource::seconds());

        let (command_tx, command_rx) = mpsc::channel::<Command>(32);
        let reader = tokio::spawn(read_commands(command_tx));

        let _ = event_tx.send(session.controller().snapshot());
        let controller = session.run(command_rx, event_tx.clone()).await;
        let final_subject = controller.state().subject_label.clone();

        // Dropping the controller drops the dispatcher so pending writes drain.
        drop(controller);
        drop(event_tx);
        let _ = writer.await;
        let _ = reader.await;
        let _ = printer.await;
        Ok::<_, Box<dyn std::error::Error>>(final_subject)
    })?;

    state_db.kv_set(LAST_SUBJECT_KEY, &final_subject)?;
    Ok(())
}

async fn read_commands(commands: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "failed to read stdin");
                break;
            }
        };
        match parse_input(&line) {
            Ok(Some(Input::Command(command))) => {
                if commands.send(command).await.is_err() {
                    break;
                }
            }
            Ok(Some(Input::Help)) => eprintln!("{HELP}"),
            Ok(Some(Input::Quit)) => break,
            Ok(None) => {}
            Err(e) => eprintln!("error: {e}\n{HELP}"),
        }
    }
}
