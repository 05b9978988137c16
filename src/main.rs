// hourglass - keeps track of the time you put into your projects
//
// This is the main entry point. Parses CLI args, asks for confirmation where
// needed and dispatches to the tracker.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use hourglass_lib::{
    core::{tracker::validate_duration, NewProject, NewSession, Progress, Tracker},
    error::EXIT_FAILURE,
    logging,
    store::{DeleteOutcome, DeleteReport, ElementType, PutOutcome, Status},
    Config, TrackerError,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "hourglass", version)]
#[command(about = "Track time against your projects", long_about = None)]
struct Cli {
    /// Directory holding projects.json and sessions.json
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// More log output on stderr (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Manage sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum ProjectAction {
    /// Add a new project
    Add {
        name: String,
        /// Target duration
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        duration: i64,
        /// Time already spent
        #[arg(short = 't', long = "time_done", default_value_t = 0, allow_negative_numbers = true)]
        time_done: i64,
        /// active or inactive
        #[arg(short, long, default_value_t = Status::Active)]
        status: Status,
        /// Force existing project overwrite
        #[arg(short, long)]
        force: bool,
    },
    /// List projects
    List {
        /// Only show projects with this status (active or inactive)
        #[arg(short, long)]
        status: Option<Status>,
    },
    /// Delete projects ("all" deletes every project)
    Delete {
        #[arg(required = true)]
        names: Vec<String>,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Remove every project
    Purge {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Show progress bars (all projects when no name is given)
    Progress { names: Vec<String> },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Log a session against a project
    Add {
        project: String,
        name: String,
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        duration: i64,
        /// YYYY-MM-DD or "today"
        #[arg(short = 't', long, default_value = "today")]
        date: String,
    },
    /// List sessions
    List {
        /// Only show sessions of this project
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Reset a project's sessions, or remove every session with --all
    Purge {
        #[arg(required_unless_present = "all")]
        project: Option<String>,
        /// Clear the whole sessions store
        #[arg(long, conflicts_with = "project")]
        all: bool,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = match err.downcast_ref::<TrackerError>() {
                Some(e) => {
                    eprintln!("{}", e.user_message().red());
                    e.exit_code()
                }
                None => {
                    eprintln!("{}", format!("Error: {:#}", err).red());
                    EXIT_FAILURE
                }
            };
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::resolve(cli.data_dir).context("resolving data directory")?;
    let tracker = Tracker::new(&config);

    match cli.command {
        Commands::Project { action } => match action {
            ProjectAction::Add {
                name,
                duration,
                time_done,
                status,
                force,
            } => handle_project_add(&tracker, name, duration, time_done, status, force),
            ProjectAction::List { status } => handle_project_list(&tracker, status),
            ProjectAction::Delete { names, force } => handle_project_delete(&tracker, &names, force),
            ProjectAction::Purge { force } => handle_project_purge(&tracker, force),
            ProjectAction::Progress { names } => handle_project_progress(&tracker, &names),
        },
        Commands::Session { action } => match action {
            SessionAction::Add {
                project,
                name,
                duration,
                date,
            } => handle_session_add(&tracker, project, name, duration, date),
            SessionAction::List { project } => handle_session_list(&tracker, project.as_deref()),
            SessionAction::Purge {
                project,
                all,
                force,
            } => handle_session_purge(&tracker, project, all, force),
        },
    }
}

fn handle_project_add(
    tracker: &Tracker,
    name: String,
    duration: i64,
    time_done: i64,
    status: Status,
    force: bool,
) -> Result<()> {
    // Bad input should fail before anyone gets asked anything
    validate_duration(duration)?;
    validate_duration(time_done)?;

    let id = name.trim().to_string();
    let mut overwrite = force;

    if !force && tracker.project_exists(&id)? {
        let prompt = format!("Warning: project - {} already exists. Do you want to overwrite it", id);
        if !confirm(&prompt)? {
            print_cancelled();
            return Ok(());
        }
        println!("{}", "Overwriting existing data...".green());
        overwrite = true;
    }

    let input = NewProject {
        name,
        duration,
        time_done,
        status,
    };

    match tracker.add_project(input, overwrite)? {
        PutOutcome::Inserted | PutOutcome::Replaced => {
            println!("{}", format!("Project {} added successfully.", id).green());
        }
        PutOutcome::Cancelled => print_cancelled(),
    }

    Ok(())
}

fn handle_project_list(tracker: &Tracker, status: Option<Status>) -> Result<()> {
    let projects = tracker.list_projects(status)?;

    if !projects.store_present {
        print_no_data();
        return Ok(());
    }

    if projects.is_empty() {
        let message = match status {
            Some(s) => format!("No projects found with status '{}'", s),
            None => "No projects found.".to_string(),
        };
        println!("{}", message.red());
        return Ok(());
    }

    let rows: Vec<Vec<String>> = projects
        .iter()
        .map(|(_, p)| {
            vec![
                p.name.clone(),
                p.duration.to_string(),
                p.time_done.to_string(),
                p.status.to_string(),
                ElementType::Project.to_string(),
            ]
        })
        .collect();

    print_table(
        "Projects",
        &["Name", "Duration", "Time Done", "Status", "Element Type"],
        &rows,
    );

    Ok(())
}

fn handle_project_delete(tracker: &Tracker, names: &[String], force: bool) -> Result<()> {
    let report = if names.iter().any(|n| n == "all") {
        let proceed = force
            || confirm("Warning: You are about to delete all projects.\nDo you want to proceed")?;
        tracker.delete_all_projects(proceed)?
    } else {
        let proceed = force
            || confirm(&format!(
                "Warning: You are about to delete {} elements.\nDo you want to proceed",
                names.len()
            ))?;
        tracker.delete_projects(names, proceed)?
    };

    print_delete_report(&report);
    Ok(())
}

fn handle_project_purge(tracker: &Tracker, force: bool) -> Result<()> {
    let proceed = force
        || confirm("Warning: You are about to remove every project.\nDo you want to proceed")?;
    if !proceed {
        print_cancelled();
        return Ok(());
    }

    tracker.purge_projects()?;
    println!("{}", "All projects purged.".green());
    Ok(())
}

fn handle_project_progress(tracker: &Tracker, names: &[String]) -> Result<()> {
    let projects = tracker.list_projects(None)?;

    if !projects.store_present {
        print_no_data();
        return Ok(());
    }

    if projects.is_empty() {
        println!("{}", "No projects found.".red());
        return Ok(());
    }

    let selected: Vec<_> = if names.is_empty() {
        projects.iter().collect()
    } else {
        names
            .iter()
            .filter_map(|name| {
                let found = projects.iter().find(|(id, _)| id == name);
                if found.is_none() {
                    println!("{}", format!("Error: Project {} not found.", name).red());
                }
                found
            })
            .collect()
    };

    let width = selected
        .iter()
        .map(|(id, _)| id.chars().count())
        .max()
        .unwrap_or(0);

    for (id, project) in selected {
        println!(
            "{}  {}({}/{})",
            format!("{:<width$}", id, width = width).magenta(),
            Progress::render(project),
            project.time_done,
            project.duration
        );
    }

    Ok(())
}

fn handle_session_add(
    tracker: &Tracker,
    project: String,
    name: String,
    duration: i64,
    date: String,
) -> Result<()> {
    let added = tracker.add_session(NewSession {
        project,
        name,
        duration,
        date,
    })?;

    if added.outcome == PutOutcome::Replaced {
        println!(
            "{}",
            format!("Note: a session with id {} already existed and was replaced.", added.id)
                .yellow()
        );
    }
    println!("{}", format!("Session {} added successfully.", added.id).green());

    Ok(())
}

fn handle_session_list(tracker: &Tracker, project: Option<&str>) -> Result<()> {
    let sessions = tracker.list_sessions(project)?;

    if !sessions.store_present {
        print_no_data();
        return Ok(());
    }

    if sessions.is_empty() {
        println!("{}", "No sessions found.".red());
        return Ok(());
    }

    let rows: Vec<Vec<String>> = sessions
        .iter()
        .map(|(id, s)| {
            vec![
                id.clone(),
                s.project.clone(),
                s.duration.to_string(),
                s.date.format("%Y-%m-%d").to_string(),
            ]
        })
        .collect();

    print_table("Sessions", &["ID", "Project", "Duration", "Date"], &rows);

    Ok(())
}

fn handle_session_purge(
    tracker: &Tracker,
    project: Option<String>,
    all: bool,
    force: bool,
) -> Result<()> {
    if all {
        let proceed = force
            || confirm("Warning: You are about to delete all sessions.\nDo you want to proceed")?;
        if !proceed {
            print_cancelled();
            return Ok(());
        }
        tracker.purge_sessions()?;
        println!("{}", "All sessions purged.".green());
        return Ok(());
    }

    // clap guarantees one of the two
    let Some(project) = project else {
        return Ok(());
    };

    if !tracker.project_exists(&project)? {
        return Err(TrackerError::ProjectNotFound(project).into());
    }

    let proceed = force
        || confirm(&format!(
            "Warning: This resets the sessions and time done of {}.\nDo you want to proceed",
            project
        ))?;
    if !proceed {
        print_cancelled();
        return Ok(());
    }

    tracker.purge_project_sessions(&project)?;
    println!("{}", format!("Sessions of project {} purged.", project).green());

    Ok(())
}

/// Ask a y/N question on the terminal. Anything but yes is a no.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} ", format!("{} (y/N)?", prompt).yellow());
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_cancelled() {
    println!("{}", "Operation cancelled.".red());
}

fn print_no_data() {
    println!("{}", "No data found.".red());
}

fn print_delete_report(report: &DeleteReport) {
    if report.cancelled {
        print_cancelled();
        return;
    }

    if !report.store_present {
        print_no_data();
        return;
    }

    for (id, outcome) in &report.outcomes {
        match outcome {
            DeleteOutcome::Deleted => println!("{}", format!("{} deleted successfully.", id).green()),
            DeleteOutcome::NotFound => println!("{}", format!("Error: {} not found.", id).red()),
        }
    }
}

fn print_table(title: &str, headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |cells: Vec<String>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", cell, w = *w))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let total = widths.iter().sum::<usize>() + 3 * widths.len().saturating_sub(1);

    println!("\n{}", title.bold());
    println!("{}", "=".repeat(total));
    println!("{}", line(headers.iter().map(|h| h.to_string()).collect()).cyan());
    println!("{}", "-".repeat(total));
    for row in rows {
        println!("{}", line(row.clone()));
    }
    println!("{}", "=".repeat(total));
}
