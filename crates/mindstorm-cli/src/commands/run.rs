use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use mindstorm_application::{BrainstormService, OutputWriter, start_idle_sweeper};
use mindstorm_core::MindstormError;
use mindstorm_core::config::MindstormConfig;
use mindstorm_core::session::{CloseReason, EventStream, SessionCode, SessionEvent};
use mindstorm_interaction::Provider;

use super::parse_provider;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Topic the session brainstorms about
    #[arg(long)]
    pub topic: String,

    /// Your display name (prompted for when omitted)
    #[arg(long)]
    pub name: Option<String>,

    /// Classifier backend used by /generate
    #[arg(long, default_value = "claude", value_parser = parse_provider)]
    pub provider: Provider,

    /// Directory the rendered mindmap is written to
    #[arg(long, default_value = "output")]
    pub output: PathBuf,
}

/// REPL helper for rustyline that completes, highlights and hints the
/// slash commands.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: vec![
                "/ideas".to_string(),
                "/participants".to_string(),
                "/generate".to_string(),
                "/mindmap".to_string(),
                "/close".to_string(),
                "/help".to_string(),
                "/quit".to_string(),
            ],
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Hosts one brainstorming session in the terminal.
///
/// Plain input is submitted as an idea; slash commands inspect the session,
/// trigger mindmap generation or end it. Session events arrive on a
/// background task so other activity shows up while the prompt is open.
pub async fn run(args: RunArgs) -> Result<()> {
    let config = MindstormConfig::load_or_default();
    let classifier = args.provider.classifier_from_env()?;
    let service = BrainstormService::new(&config, classifier);
    start_idle_sweeper(Arc::clone(service.store()), config.lifecycle.clone());

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    let name = match args.name {
        Some(name) => name,
        None => loop {
            match rl.readline("Your name: ") {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => break line.trim().to_string(),
                Err(rustyline::error::ReadlineError::Interrupted)
                | Err(rustyline::error::ReadlineError::Eof) => return Ok(()),
                Err(err) => return Err(err.into()),
            }
        },
    };

    let session = service.create_session(&args.topic, &name).await?;
    let code = session.code().clone();
    service.join(code.as_str(), &name).await?;

    let events = service.subscribe(code.as_str()).await?;
    let printer = spawn_event_printer(events, name.clone());

    let writer = OutputWriter::new(args.output);

    println!();
    println!(
        "{}",
        format!("=== Mindstorm: {} ===", args.topic)
            .bright_magenta()
            .bold()
    );
    println!("{}", format!("Session code: {code}").bright_magenta());
    println!(
        "{}",
        "Type an idea and press enter to submit it. /help lists commands.".bright_black()
    );
    println!();

    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                match dispatch(&service, &writer, &code, &name, trimmed).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(err) if err.is_retryable() => {
                        println!("{}", err.to_string().yellow());
                    }
                    Err(err) => {
                        println!("{}", err.to_string().red());
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                let _ = service.leave(code.as_str(), &name).await;
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    printer.abort();

    Ok(())
}

/// Handles one line of input. Returns `false` when the REPL should stop.
async fn dispatch(
    service: &BrainstormService,
    writer: &OutputWriter,
    code: &SessionCode,
    name: &str,
    line: &str,
) -> Result<bool, MindstormError> {
    match line {
        "/help" => print_help(),
        "/ideas" => show_ideas(service, code).await?,
        "/participants" => show_participants(service, code).await?,
        "/mindmap" => show_mindmap(service, code).await?,
        "/generate" => generate(service, writer, code).await?,
        "/close" => {
            service.close(code.as_str()).await?;
            println!("{}", "Session closed.".bright_green());
            return Ok(false);
        }
        "/quit" | "/exit" => {
            let _ = service.leave(code.as_str(), name).await;
            println!("{}", "Goodbye!".bright_green());
            return Ok(false);
        }
        cmd if cmd.starts_with('/') => {
            println!("{}", "Unknown command (see /help)".bright_black());
        }
        idea => {
            let accepted = service.submit_idea(code.as_str(), name, idea).await?;
            println!("{}", format!("> #{} {}", accepted.seq, accepted.text).green());
        }
    }

    Ok(true)
}

fn print_help() {
    println!("{}", "Type an idea and press enter to submit it.".bright_black());
    println!("{}", "  /ideas         list submitted ideas".bright_black());
    println!("{}", "  /participants  list who is in the session".bright_black());
    println!("{}", "  /generate      turn the ideas into a mindmap".bright_black());
    println!("{}", "  /mindmap       show the last generated outline".bright_black());
    println!("{}", "  /close         close the session for good".bright_black());
    println!("{}", "  /quit          leave and exit".bright_black());
}

async fn show_ideas(
    service: &BrainstormService,
    code: &SessionCode,
) -> Result<(), MindstormError> {
    let snapshot = service.snapshot(code.as_str()).await?;

    if snapshot.ideas.is_empty() {
        println!("{}", "No ideas yet.".bright_black());
        return Ok(());
    }

    println!("{}", format!("{} ideas:", snapshot.idea_count()).bright_magenta());
    for idea in &snapshot.ideas {
        println!(
            "  {}",
            format!("#{} [{}] {}", idea.seq, idea.author, idea.text).bright_blue()
        );
    }
    Ok(())
}

async fn show_participants(
    service: &BrainstormService,
    code: &SessionCode,
) -> Result<(), MindstormError> {
    let snapshot = service.snapshot(code.as_str()).await?;

    println!(
        "{}",
        format!("{} participants:", snapshot.participants.len()).bright_magenta()
    );
    for name in &snapshot.participants {
        println!("  {}", name.bright_blue());
    }
    Ok(())
}

async fn show_mindmap(
    service: &BrainstormService,
    code: &SessionCode,
) -> Result<(), MindstormError> {
    let snapshot = service.snapshot(code.as_str()).await?;

    match snapshot.mindmap {
        Some(mindmap) => {
            println!(
                "{}",
                format!(
                    "Generated {} by {}",
                    mindmap.generated_at.format("%Y-%m-%d %H:%M UTC"),
                    mindmap.model
                )
                .bright_black()
            );
            for line in mindmap.markdown.lines() {
                println!("{}", line.bright_blue());
            }
        }
        None => println!("{}", "No mindmap yet. Use /generate.".bright_black()),
    }
    Ok(())
}

async fn generate(
    service: &BrainstormService,
    writer: &OutputWriter,
    code: &SessionCode,
) -> Result<(), MindstormError> {
    let result = service.generate_mindmap(code.as_str()).await?;
    let path = writer.write(code, &result.html)?;

    println!("{}", format!("Saved {}", path.display()).green());
    if !result.unclustered.is_empty() {
        println!(
            "{}",
            format!("{} ideas could not be placed", result.unclustered.len()).yellow()
        );
    }
    for warning in &result.warnings {
        println!("{}", format!("warning: {warning}").yellow());
    }
    println!();
    for line in result.markdown.lines() {
        println!("{}", line.bright_blue());
    }
    Ok(())
}

/// Prints session events as they arrive. The subscriber's own submissions
/// are skipped; the REPL already echoed those inline.
fn spawn_event_printer(mut events: EventStream, own_name: String) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                SessionEvent::IdeaSubmitted {
                    seq, author, text, ..
                } => {
                    if author != own_name {
                        println!("{}", format!("[{author}] #{seq} {text}").bright_blue());
                    }
                }
                SessionEvent::ParticipantJoined {
                    name,
                    participant_count,
                } => {
                    if name != own_name {
                        println!(
                            "{}",
                            format!("{name} joined ({participant_count} here)").bright_black()
                        );
                    }
                }
                SessionEvent::ParticipantLeft {
                    name,
                    participant_count,
                } => {
                    println!(
                        "{}",
                        format!("{name} left ({participant_count} here)").bright_black()
                    );
                }
                SessionEvent::AnalysisStarted { idea_count, .. } => {
                    println!(
                        "{}",
                        format!("Analyzing {idea_count} ideas...").bright_yellow()
                    );
                }
                SessionEvent::MindmapReady {
                    node_count,
                    unclustered_count,
                    ..
                } => {
                    let mut message = format!("Mindmap ready: {node_count} nodes");
                    if unclustered_count > 0 {
                        message.push_str(&format!(", {unclustered_count} unclustered"));
                    }
                    println!("{}", message.green());
                }
                SessionEvent::AnalysisFailed { message, retryable } => {
                    let hint = if retryable { " (try /generate again)" } else { "" };
                    println!("{}", format!("Analysis failed: {message}{hint}").red());
                }
                SessionEvent::Closed { reason } => {
                    // A moderator close was triggered at this prompt and
                    // already confirmed inline.
                    if reason == CloseReason::IdleTimeout {
                        println!("{}", "Session closed after sitting idle.".bright_yellow());
                    }
                    break;
                }
            }
        }
    })
}
