use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{Local, NaiveDate};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::store::{FileStore, StateStore};
use crate::model::task::{Subtask, Task};
use crate::ops::due;
use crate::ops::reminder::{Notifier, Reminder};
use crate::ops::view::{self, CategoryFilter, ViewParams};
use crate::session::{Session, now_ms};

type CmdResult = Result<(), Box<dyn Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;

    // Reminders don't touch stored state
    if let Commands::Remind(args) = cli.command {
        return cmd_remind(args);
    }

    let data_dir = config_io::data_dir(cli.data_dir.as_deref());
    tracing::debug!(dir = %data_dir.display(), "using data directory");
    let mut session = open_session(&data_dir)?;

    match cli.command {
        // Read commands
        Commands::List(args) => cmd_list(&session, args, json),
        Commands::Stats => cmd_stats(&session, json),
        Commands::History => cmd_history(&session, json),
        Commands::Agenda => cmd_agenda(&session, json),

        // Task changes
        Commands::Add(args) => cmd_add(&mut session, args),
        Commands::Toggle(args) => {
            let id = session.resolve(&args.id)?;
            session.toggle(&id);
            Ok(())
        }
        Commands::Rm(args) => {
            let id = session.resolve(&args.id)?;
            session.delete(&id);
            Ok(())
        }
        Commands::Edit(args) => {
            let id = session.resolve(&args.id)?;
            session.edit_text(&id, &args.text.join(" "));
            Ok(())
        }
        Commands::Due(args) => cmd_due(&mut session, args),
        Commands::ClearDone => {
            let removed = session.clear_done();
            println!("removed {}", plural(removed, "task"));
            Ok(())
        }
        Commands::Batch(args) => cmd_batch(&mut session, args),
        Commands::Undo => {
            if !session.undo() {
                println!("nothing to undo");
            }
            Ok(())
        }
        Commands::Redo => {
            if !session.redo() {
                println!("nothing to redo");
            }
            Ok(())
        }
        Commands::Import(args) => cmd_import(&mut session, args),
        Commands::Export(args) => cmd_export(&session, args),

        // Out-of-band state
        Commands::Sub(args) => cmd_sub(&mut session, args, json),
        Commands::Tag(args) => cmd_tag(&mut session, args, json),
        Commands::Theme(args) => cmd_theme(&mut session, args),
        Commands::Recur(args) => cmd_recur(&mut session, args, json),

        Commands::Remind(_) => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_session(data_dir: &Path) -> Result<Session<FileStore>, Box<dyn Error>> {
    let config = config_io::read_config(data_dir)?;
    let store = FileStore::new(data_dir);
    Ok(Session::open(store, config)?)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

/// Parse a due date: `YYYY-MM-DD`, `today`, `tomorrow`, or `+N` days
pub fn parse_due_date(s: &str, today: NaiveDate) -> Result<NaiveDate, String> {
    let s = s.trim();
    match s {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + chrono::Days::new(1)),
        _ => {}
    }
    if let Some(days) = s.strip_prefix('+') {
        let n: u64 = days
            .parse()
            .map_err(|_| format!("invalid day offset '{}'", s))?;
        return today
            .checked_add_days(chrono::Days::new(n))
            .ok_or_else(|| format!("day offset out of range: {}", s));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD, today, tomorrow, or +N)", s))
}

/// Parse a delay like `90`, `30s`, `5m` or `1h`
pub fn parse_delay(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let (digits, unit) = match s.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((i, _)) => (&s[..i], &s[i..]),
        None => (s, "s"),
    };
    let n: u64 = digits
        .parse()
        .map_err(|_| format!("invalid delay '{}'", s))?;
    let secs = match unit {
        "s" => Some(n),
        "m" => n.checked_mul(60),
        "h" => n.checked_mul(3600),
        _ => return Err(format!("invalid delay unit in '{}' (expected s, m, or h)", s)),
    };
    secs.map(Duration::from_secs)
        .ok_or_else(|| format!("delay '{}' is too large", s))
}

/// Resolve a subtask by 1-based position or unique id prefix
pub fn resolve_subtask(subtasks: &[Subtask], reference: &str) -> Result<String, String> {
    if let Ok(n) = reference.parse::<usize>()
        && n >= 1
        && n <= subtasks.len()
    {
        return Ok(subtasks[n - 1].id.clone());
    }
    let matches: Vec<&Subtask> = subtasks
        .iter()
        .filter(|s| s.id.starts_with(reference))
        .collect();
    match matches.as_slice() {
        [only] => Ok(only.id.clone()),
        [] => Err(format!("subtask not found: {}", reference)),
        _ => Err(format!(
            "subtask reference '{}' is ambiguous ({} matches)",
            reference,
            matches.len()
        )),
    }
}

fn task_json<'a, S: StateStore>(session: &Session<S>, task: &'a Task, today: NaiveDate) -> TaskJson<'a> {
    let progress = session.subtask_progress(&task.id);
    TaskJson {
        task,
        due: due::task_due_info(task, today, session.config().due.soon_days),
        subtasks: (progress.total > 0).then_some(progress),
    }
}

fn task_line<S: StateStore>(session: &Session<S>, task: &Task, today: NaiveDate) -> String {
    let info = due::task_due_info(task, today, session.config().due.soon_days);
    format_task_line(task, info.as_ref(), Some(session.subtask_progress(&task.id)))
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list<S: StateStore>(session: &Session<S>, args: ListArgs, json: bool) -> CmdResult {
    let params = ViewParams {
        status: args.status,
        category: args
            .category
            .map(CategoryFilter::Only)
            .unwrap_or_default(),
        search: args.search.unwrap_or_default(),
        sort: args.sort.unwrap_or(session.config().view.sort),
    };
    let view = session.view(&params);
    let today = today();

    if json {
        let output = ListJson {
            tasks: view
                .tasks
                .iter()
                .map(|t| task_json(session, t, today))
                .collect(),
            stats: &view.stats,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        if view.tasks.is_empty() {
            println!("no tasks");
        }
        for task in &view.tasks {
            println!("{}", task_line(session, task, today));
        }
        println!();
        println!(
            "{} shown, {} total ({} active, {} done)",
            view.tasks.len(),
            view.stats.total,
            view.stats.active,
            view.stats.done
        );
    }
    Ok(())
}

fn cmd_stats<S: StateStore>(session: &Session<S>, json: bool) -> CmdResult {
    let stats = view::compute_stats(session.tasks());
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        for line in format_stats(&stats) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_history<S: StateStore>(session: &Session<S>, json: bool) -> CmdResult {
    let (cursor, snapshots) = session.history_position();
    let output = HistoryJson {
        cursor,
        snapshots,
        limit: session.config().history.limit,
        can_undo: session.can_undo(),
        can_redo: session.can_redo(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let yes_no = |b: bool| if b { "yes" } else { "no" };
        println!(
            "position {} of {} (limit {})",
            output.cursor + 1,
            output.snapshots,
            output.limit
        );
        println!("undo: {}  redo: {}", yes_no(output.can_undo), yes_no(output.can_redo));
    }
    Ok(())
}

fn cmd_agenda<S: StateStore>(session: &Session<S>, json: bool) -> CmdResult {
    let today = today();
    let overdue = session.overdue(today);
    let due_soon = session.due_soon(today);

    if json {
        let output = AgendaJson {
            overdue: overdue.iter().map(|t| task_json(session, t, today)).collect(),
            due_soon: due_soon.iter().map(|t| task_json(session, t, today)).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if overdue.is_empty() && due_soon.is_empty() {
        println!("nothing due");
        return Ok(());
    }
    if !overdue.is_empty() {
        println!("-- Overdue --");
        for task in &overdue {
            println!("{}", task_line(session, task, today));
        }
    }
    if !due_soon.is_empty() {
        if !overdue.is_empty() {
            println!();
        }
        println!("-- Due soon --");
        for task in &due_soon {
            println!("{}", task_line(session, task, today));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add<S: StateStore>(session: &mut Session<S>, args: AddArgs) -> CmdResult {
    let mut draft = session.draft(args.text.join(" "));
    if let Some(category) = args.category {
        draft.category = category;
    }
    if let Some(priority) = args.priority {
        draft.priority = priority;
    }
    if let Some(ref due) = args.due {
        draft.due_date = Some(parse_due_date(due, today())?);
    }
    // Blank text adds nothing
    if let Some(id) = session.add_task(&draft) {
        println!("{}", id);
    }
    Ok(())
}

fn cmd_due<S: StateStore>(session: &mut Session<S>, args: DueArgs) -> CmdResult {
    let id = session.resolve(&args.id)?;
    let date = match args.date {
        Some(ref s) if !args.clear => Some(parse_due_date(s, today())?),
        _ => None,
    };
    session.set_due(&id, date);
    Ok(())
}

fn batch_ids<S: StateStore>(session: &Session<S>, target: &BatchTarget) -> Result<Vec<String>, Box<dyn Error>> {
    if !target.ids.is_empty() {
        return target
            .ids
            .iter()
            .map(|r| session.resolve(r).map_err(Into::into))
            .collect();
    }
    if target.status.is_none() && target.in_category.is_none() {
        return Err("no tasks selected (give IDs, --status, or --in)".into());
    }
    let status = target.status.unwrap_or_default();
    let category = target
        .in_category
        .clone()
        .map(CategoryFilter::Only)
        .unwrap_or_default();
    Ok(session.select_ids(|t| status.matches(t) && category.matches(t)))
}

fn cmd_batch<S: StateStore>(session: &mut Session<S>, args: BatchCmd) -> CmdResult {
    let (ids, verb) = match &args.action {
        BatchAction::Done(t) => (batch_ids(session, t)?, "completed"),
        BatchAction::Undone(t) => (batch_ids(session, t)?, "reopened"),
        BatchAction::Delete(t) => (batch_ids(session, t)?, "deleted"),
        BatchAction::Move(a) => (batch_ids(session, &a.target)?, "moved"),
        BatchAction::Priority(a) => (batch_ids(session, &a.target)?, "updated"),
    };
    let before = session.tasks().to_vec();
    match &args.action {
        BatchAction::Done(_) => session.mark_done(&ids),
        BatchAction::Undone(_) => session.mark_undone(&ids),
        BatchAction::Delete(_) => session.delete_many(&ids),
        BatchAction::Move(a) => session.move_to_category(&ids, &a.to),
        BatchAction::Priority(a) => session.set_priority(&ids, a.to),
    };
    // duplicates and tasks already in the target state do not count
    let changed = before
        .iter()
        .filter(|t| session.task(&t.id) != Some(*t))
        .count();
    println!("{} {}", verb, plural(changed, "task"));
    Ok(())
}

fn cmd_import<S: StateStore>(session: &mut Session<S>, args: ImportArgs) -> CmdResult {
    let content = fs::read_to_string(&args.file)
        .map_err(|e| format!("could not read {}: {}", args.file.display(), e))?;
    let count = session.import_json(&content)?;
    println!("imported {}", plural(count, "task"));
    Ok(())
}

fn cmd_export<S: StateStore>(session: &Session<S>, args: ExportArgs) -> CmdResult {
    let content = match args.format {
        ExportFormat::Json => session.export_json()?,
        ExportFormat::Csv => session.export_csv(),
    };
    match args.output {
        Some(path) => fs::write(&path, content)
            .map_err(|e| format!("could not write {}: {}", path.display(), e))?,
        None => println!("{}", content),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Subtasks
// ---------------------------------------------------------------------------

fn cmd_sub<S: StateStore>(session: &mut Session<S>, args: SubCmd, json: bool) -> CmdResult {
    match args.action {
        SubAction::Add(a) => {
            let task_id = session.resolve(&a.task)?;
            if let Some(id) = session.add_subtask(&task_id, &a.text.join(" ")) {
                println!("{}", id);
            }
        }
        SubAction::Toggle(a) => {
            let task_id = session.resolve(&a.task)?;
            let sub_id = resolve_subtask(session.subtasks(&task_id), &a.subtask)?;
            session.toggle_subtask(&task_id, &sub_id);
        }
        SubAction::Rm(a) => {
            let task_id = session.resolve(&a.task)?;
            let sub_id = resolve_subtask(session.subtasks(&task_id), &a.subtask)?;
            session.delete_subtask(&task_id, &sub_id);
        }
        SubAction::List(a) => {
            let task_id = session.resolve(&a.id)?;
            let subtasks = session.subtasks(&task_id);
            let progress = session.subtask_progress(&task_id);
            if json {
                let output = SubtaskListJson {
                    task_id: &task_id,
                    subtasks,
                    progress,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else if subtasks.is_empty() {
                println!("no subtasks");
            } else {
                for (i, sub) in subtasks.iter().enumerate() {
                    println!("{}", format_subtask_line(i + 1, sub));
                }
                println!("{}", format_progress(&progress));
            }
        }
        SubAction::Clear(a) => {
            let task_id = session.resolve(&a.id)?;
            let removed = session.clear_subtasks(&task_id);
            println!("removed {}", plural(removed, "subtask"));
        }
        SubAction::Prune => {
            let pruned = session.prune_subtasks();
            println!("pruned subtasks of {}", plural(pruned.len(), "deleted task"));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

fn cmd_tag<S: StateStore>(session: &mut Session<S>, args: TagCmd, json: bool) -> CmdResult {
    match args.action {
        TagAction::Add(a) => {
            if let Some(tag) = session.add_tag(&a.name) {
                println!("{}", tag.id);
            }
        }
        TagAction::Rm(a) => {
            let id = tag_id(session, &a.tag)?;
            session.remove_tag(&id);
        }
        TagAction::Edit(a) => {
            let id = tag_id(session, &a.tag)?;
            session.update_tag(&id, a.name.as_deref(), a.color.as_deref())?;
        }
        TagAction::List => {
            if json {
                println!("{}", serde_json::to_string_pretty(session.tags())?);
            } else {
                for tag in session.tags() {
                    println!("{}", format_tag_line(tag));
                }
            }
        }
    }
    Ok(())
}

fn tag_id<S: StateStore>(session: &Session<S>, reference: &str) -> Result<String, String> {
    session
        .find_tag(reference)
        .map(|t| t.id.clone())
        .ok_or_else(|| format!("tag not found: {}", reference))
}

// ---------------------------------------------------------------------------
// Theme / recurring / reminders
// ---------------------------------------------------------------------------

fn cmd_theme<S: StateStore>(session: &mut Session<S>, args: ThemeArgs) -> CmdResult {
    if let Some(choice) = args.theme {
        let theme = choice.resolve(session.theme());
        session.set_theme(theme);
    }
    println!("{}", session.theme());
    Ok(())
}

fn cmd_recur<S: StateStore>(session: &mut Session<S>, args: RecurCmd, json: bool) -> CmdResult {
    match args.action {
        RecurAction::Add(a) => {
            let mut draft = session.draft(a.text.join(" "));
            if let Some(category) = a.category {
                draft.category = category;
            }
            if let Some(priority) = a.priority {
                draft.priority = priority;
            }
            session.add_recurring(&draft, a.every, now_ms());
        }
        RecurAction::List => {
            let templates = session.recurring();
            if json {
                let output: Vec<RecurringJson> = templates
                    .iter()
                    .enumerate()
                    .map(|(i, template)| RecurringJson {
                        index: i + 1,
                        template,
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else if templates.is_empty() {
                println!("no recurring tasks");
            } else {
                for (i, template) in templates.iter().enumerate() {
                    println!("{}", format_recurring_line(i + 1, template));
                }
            }
        }
        RecurAction::Rm(a) => {
            let removed = a
                .index
                .checked_sub(1)
                .and_then(|i| session.remove_recurring(i));
            if removed.is_none() {
                return Err(format!("no recurring task #{}", a.index).into());
            }
        }
        RecurAction::Run => {
            let ids = session.run_recurring(now_ms());
            if json {
                println!("{}", serde_json::to_string_pretty(&ids)?);
            } else {
                for id in &ids {
                    println!("{}", id);
                }
                eprintln!("created {}", plural(ids.len(), "task"));
            }
        }
    }
    Ok(())
}

/// Prints notifications to stdout
struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&self, title: &str, body: &str) {
        println!("{}: {}", title, body);
    }
}

fn cmd_remind(args: RemindArgs) -> CmdResult {
    let delay = parse_delay(&args.delay)?;
    let reminder = Reminder::schedule(args.text.join(" "), delay, StdoutNotifier);
    reminder.wait();
    Ok(())
}
