use clap::{CommandFactory, Parser};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use taskboard_cli::cli::{Cli, Command, build_overrides};
use taskboard_core::board::Board;
use taskboard_core::clock::{self, Clock};
use taskboard_core::config::{self, Config, Theme};
use taskboard_core::error::AppError;
use taskboard_core::journal::FsVault;
use taskboard_core::model::Task;
use taskboard_core::notify::notifier_for;
use taskboard_core::storage::json_store;
use taskboard_core::summary::{SummaryOutcome, write_daily_summary};
use taskboard_core::ticker::DISPLAY_TICK;
use taskboard_core::timer::format_elapsed;
use taskboard_core::view::{BoardView, NoopView};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Points")]
    points: i64,
    #[tabled(rename = "Elapsed")]
    elapsed: String,
}

#[derive(Tabled)]
struct CompletedRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Points")]
    points: i64,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Completed")]
    completed_at: String,
    #[tabled(rename = "By")]
    completed_by: String,
}

/// Prints one line per display tick while `watch` runs.
struct TerminalView {
    titles: HashMap<String, String>,
    theme: Theme,
}

impl BoardView for TerminalView {
    fn refresh_tasks(&self, _tasks: &[Task]) {}

    fn refresh_completed(&self, _completed: &[Task]) {}

    fn show_elapsed(&self, task_id: &str, seconds: u64) {
        let title = self.titles.get(task_id).map(String::as_str).unwrap_or("?");
        let mut stdout = io::stdout().lock();
        let _ = writeln!(
            stdout,
            "{} {} ({})",
            self.theme.highlight(&format_elapsed(seconds)),
            title,
            task_id
        );
        let _ = stdout.flush();
    }
}

fn status_label(task: &Task) -> &'static str {
    if task.is_completed() {
        "done"
    } else if task.is_timer_running() {
        "running"
    } else {
        "idle"
    }
}

fn format_timestamp(millis: i64) -> String {
    clock::to_datetime(millis)
        .map(|datetime| datetime.to_offset(clock::local_offset()))
        .map(|datetime| {
            format!(
                "{} {:02}:{:02}",
                datetime.date(),
                datetime.hour(),
                datetime.minute()
            )
        })
        .unwrap_or_else(|| "-".to_string())
}

fn task_json(task: &Task, now_ms: i64) -> Result<serde_json::Value, AppError> {
    let mut value = serde_json::to_value(task)?;
    if let Some(object) = value.as_object_mut() {
        object.insert(
            "elapsed".to_string(),
            serde_json::Value::String(format_elapsed(task.display_elapsed(now_ms))),
        );
    }
    Ok(value)
}

fn print_task_json(task: &Task, now_ms: i64) -> Result<(), AppError> {
    println!("{}", task_json(task, now_ms)?);
    Ok(())
}

fn print_tasks_json(tasks: &[Task], now_ms: i64) -> Result<(), AppError> {
    let payload = tasks
        .iter()
        .map(|task| task_json(task, now_ms))
        .collect::<Result<Vec<_>, _>>()?;
    println!("{}", serde_json::Value::Array(payload));
    Ok(())
}

fn print_tasks_table(tasks: &[Task], now_ms: i64, theme: Theme) {
    if tasks.is_empty() {
        println!("{}", theme.dim("No tasks"));
        return;
    }

    let rows = tasks.iter().map(|task| TaskRow {
        id: task.id.clone(),
        status: status_label(task),
        title: task.title.clone(),
        points: task.points,
        elapsed: format_elapsed(task.display_elapsed(now_ms)),
    });
    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn print_completed_table(tasks: &[Task], theme: Theme) {
    if tasks.is_empty() {
        println!("{}", theme.dim("No completed tasks"));
        return;
    }

    let rows = tasks.iter().map(|task| CompletedRow {
        id: task.id.clone(),
        title: task.title.clone(),
        points: task.points,
        time: format_elapsed(task.time_spent),
        completed_at: task
            .completed_at()
            .map(format_timestamp)
            .unwrap_or_else(|| "-".to_string()),
        completed_by: task.completed_by().unwrap_or("-").to_string(),
    });
    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn print_summary_json(outcome: &SummaryOutcome) {
    let json = match outcome {
        SummaryOutcome::JournalDisabled => serde_json::json!({ "outcome": "journal_disabled" }),
        SummaryOutcome::NothingToSummarize => {
            serde_json::json!({ "outcome": "nothing_to_summarize" })
        }
        SummaryOutcome::Written { path, tasks } => serde_json::json!({
            "outcome": "written",
            "path": path.display().to_string(),
            "tasks": tasks,
        }),
        SummaryOutcome::WriteFailed { path, error } => serde_json::json!({
            "outcome": "write_failed",
            "path": path.as_ref().map(|path| path.display().to_string()),
            "error": error.to_string(),
        }),
    };
    println!("{}", json);
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

/// Asks for a title on stdin. `None` means the prompt was cancelled.
fn prompt_title() -> Result<Option<String>, AppError> {
    print!("Title: ");
    io::stdout().flush()?;

    let mut line = String::new();
    let bytes = io::stdin().lock().read_line(&mut line)?;
    let title = line.trim();
    if bytes == 0 || title.is_empty() {
        Ok(None)
    } else {
        Ok(Some(title.to_string()))
    }
}

fn resolve_config(cli: &Cli) -> Result<Config, AppError> {
    let load = config::load_config_with_fallback();
    if let Some(err) = load.error {
        tracing::warn!(error = %err, "config could not be loaded, using defaults");
        eprintln!("WARNING: {}", err);
    }

    let overrides = build_overrides(&cli.config_override).map_err(AppError::invalid_input)?;
    Ok(config::merge_overrides(&load.config, &overrides))
}

fn open_board(clock: Arc<dyn Clock>, view: Arc<dyn BoardView>) -> Result<Board, AppError> {
    let path = json_store::store_path()?;
    Board::open(path, clock, view)
}

fn run_watch(clock: Arc<dyn Clock>, theme: Theme, ticks: Option<u32>) -> Result<(), AppError> {
    let titles = json_store::load_board(&json_store::store_path()?)?
        .tasks
        .into_iter()
        .map(|task| (task.id, task.title))
        .collect();
    let view = Arc::new(TerminalView { titles, theme });

    let mut board = open_board(clock, view)?;
    if board.watch_running() == 0 {
        println!("{}", theme.dim("No running timers"));
        return board.close();
    }

    match ticks {
        // A little slack so the last tick lands before teardown.
        Some(ticks) => std::thread::sleep(DISPLAY_TICK * ticks + DISPLAY_TICK / 4),
        None => loop {
            std::thread::sleep(DISPLAY_TICK);
        },
    }

    board.close()
}

/// `interactive` is set for lines read by the interactive loop, where stdin
/// carries commands and cannot double as the title prompt.
fn run_command(cli: Cli, interactive: bool) -> Result<(), AppError> {
    let config = resolve_config(&cli)?;
    let theme = Theme::from_config(&config);
    let clock = clock::clock_from_env();

    let mut board = open_board(Arc::clone(&clock), Arc::new(NoopView))?;
    let now_ms = board.now_ms();

    match cli.command {
        Command::Add { title, points } => {
            let title = match title {
                Some(value) => Some(value),
                None if interactive => return Err(AppError::invalid_input("title is required")),
                None => prompt_title()?,
            };
            let Some(title) = title else {
                println!("Cancelled");
                return Ok(());
            };

            let task = board.add_task(&title, points)?;
            if cli.json {
                print_task_json(&task, now_ms)?;
            } else {
                println!("Added task: {} ({})", theme.highlight(&task.title), task.id);
            }
        }
        Command::List => {
            if cli.json {
                print_tasks_json(board.tasks(), now_ms)?;
            } else {
                print_tasks_table(board.tasks(), now_ms, theme);
            }
        }
        Command::Completed => {
            let completed = board.completed_tasks();
            if cli.json {
                print_tasks_json(&completed, now_ms)?;
            } else {
                print_completed_table(&completed, theme);
            }
        }
        Command::Start { id } => {
            let task = board.start_timer(&id)?;
            if cli.json {
                print_task_json(&task, now_ms)?;
            } else {
                println!("Started timer: {} ({})", task.title, task.id);
            }
        }
        Command::Pause { id } => {
            let task = board.pause_timer(&id)?;
            if cli.json {
                print_task_json(&task, now_ms)?;
            } else {
                println!(
                    "Paused timer: {} ({}) at {}",
                    task.title,
                    task.id,
                    format_elapsed(task.time_spent)
                );
            }
        }
        Command::Reset { id } => {
            let task = board.reset_timer(&id)?;
            if cli.json {
                print_task_json(&task, now_ms)?;
            } else {
                println!("Reset timer: {} ({})", task.title, task.id);
            }
        }
        Command::Toggle { id } => {
            let task = board.toggle_task(&id)?;
            if cli.json {
                print_task_json(&task, now_ms)?;
            } else if task.is_completed() {
                println!(
                    "Completed task: {} ({}) in {}",
                    task.title,
                    task.id,
                    format_elapsed(task.time_spent)
                );
            } else {
                println!("Reopened task: {} ({})", task.title, task.id);
            }
        }
        Command::Delete { id } => {
            let task = board.delete_task(&id)?;
            if cli.json {
                print_task_json(&task, now_ms)?;
            } else {
                println!("Deleted task: {} ({})", task.title, task.id);
            }
        }
        Command::DeleteCompleted { id } => {
            let task = board.delete_completed_task(&id)?;
            if cli.json {
                print_task_json(&task, now_ms)?;
            } else {
                println!("Deleted completed task: {} ({})", task.title, task.id);
            }
        }
        Command::ClearCompleted => {
            let removed = board.clear_completed_tasks()?;
            if cli.json {
                print_tasks_json(&removed, now_ms)?;
            } else {
                println!("Cleared {} completed task(s)", removed.len());
            }
        }
        Command::Summary => {
            let offset = clock::local_offset();
            let today = clock::local_date(now_ms, offset)
                .ok_or_else(|| AppError::invalid_data("clock is out of range"))?;
            let vault = FsVault::new(config.journal.root());
            let outcome = write_daily_summary(board.tasks(), &config.journal, &vault, today, offset);

            if let Err(err) = notifier_for(config.desktop_notices).notice(&outcome.notice()) {
                tracing::warn!(error = %err, "notice could not be delivered");
            }
            if cli.json {
                print_summary_json(&outcome);
            }
        }
        Command::User { id } => {
            board.set_current_user(&id)?;
            if cli.json {
                println!("{}", serde_json::json!({ "currentUserId": board.current_user_id() }));
            } else {
                println!("Current user: {}", board.current_user_id());
            }
        }
        Command::Watch { ticks } => {
            board.close()?;
            return run_watch(clock, theme, ticks);
        }
    }

    board.close()
}

fn run_interactive() -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();

    loop {
        input.clear();
        let bytes = stdin.lock().read_line(&mut input)?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("taskboard".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(cli, true) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn main() {
    init_tracing();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(cli, false) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
