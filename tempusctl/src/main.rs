use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tempus::clock::SystemClock;
use tempus::config::{self, Config};
use tempus::hierarchy::FolderTree;
use tempus::persistence;
use tempus::session::StopwatchSession;
use tempus::stopwatch::{format_elapsed, Stopwatch};
use tempus::store::{FolderStore, NoteStore, ProjectStore, TimeBoxStore, TimeEntryStore};
use tempus::timebox::{format_minutes, DayLayout};
use tempus_api::models::{
    EntryCreate, EntryId, Folder, FolderId, FolderInput, Interval, Note, NoteId, NoteInput,
    ProjectCreate, ProjectId, TimeBoxEntry, TimeEntry,
};
use tempus_api::ApiClient;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tempusctl")]
#[command(about = "Control the Tempus stopwatch and browse your backend data", long_about = None)]
struct Cli {
    /// Print lists as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the configured token against the backend
    Login,
    /// Show the stopwatch
    Status,
    /// Start the stopwatch (restarts it if already running)
    Start {
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        project: Option<ProjectId>,
    },
    /// Stop the stopwatch and save the time entry
    Stop,
    /// Manage projects
    Projects {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Logged time entries
    Entries {
        #[command(subcommand)]
        command: EntryCommands,
    },
    /// Planned time boxes
    Boxes {
        #[command(subcommand)]
        command: BoxCommands,
    },
    /// Folder hierarchy
    Folders {
        #[command(subcommand)]
        command: FolderCommands,
    },
    /// Notes
    Notes {
        #[command(subcommand)]
        command: NoteCommands,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    List,
    Add {
        name: String,
        #[arg(short, long, default_value = "#7fb4ca")]
        color: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Change a project's name, color or description
    Edit {
        id: ProjectId,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        color: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    Rm { id: ProjectId },
}

/// A new interval on one local day.
#[derive(Args, Debug)]
struct NewInterval {
    #[arg(short, long)]
    description: String,
    /// Local start time as HH:MM
    #[arg(long, value_parser = parse_time)]
    start: NaiveTime,
    /// Local end time as HH:MM
    #[arg(long, value_parser = parse_time)]
    end: NaiveTime,
    /// Local day as YYYY-MM-DD, today by default
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
    #[arg(short, long)]
    project: Option<ProjectId>,
}

impl NewInterval {
    fn day(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }

    fn draft(self) -> Result<EntryCreate> {
        let day = self.day();
        Ok(EntryCreate {
            start_date: local_instant(day, self.start)?,
            end_date: local_instant(day, self.end)?,
            description: self.description,
            project_id: self.project,
        })
    }
}

/// Changes to an existing interval; anything left out is kept.
#[derive(Args, Debug, Default)]
struct IntervalEdit {
    #[arg(short, long)]
    description: Option<String>,
    /// New local start time as HH:MM
    #[arg(long, value_parser = parse_time)]
    start: Option<NaiveTime>,
    /// New local end time as HH:MM
    #[arg(long, value_parser = parse_time)]
    end: Option<NaiveTime>,
    /// Move to another local day, keeping the times unless given
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
    #[arg(short, long, conflicts_with = "no_project")]
    project: Option<ProjectId>,
    /// Detach from its project
    #[arg(long)]
    no_project: bool,
}

impl IntervalEdit {
    /// New start and end. Once any time or the day changes, both ends are
    /// placed on the same local day.
    fn reschedule(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        if self.start.is_none() && self.end.is_none() && self.date.is_none() {
            return Ok((start, end));
        }
        let (local_start, local_end) = (start.with_timezone(&Local), end.with_timezone(&Local));
        let day = self.date.unwrap_or_else(|| local_start.date_naive());
        Ok((
            local_instant(day, self.start.unwrap_or_else(|| local_start.time()))?,
            local_instant(day, self.end.unwrap_or_else(|| local_end.time()))?,
        ))
    }

    /// `None` leaves the project alone.
    fn project(&self) -> Option<Option<ProjectId>> {
        if self.no_project {
            Some(None)
        } else {
            self.project.map(Some)
        }
    }

    fn apply(
        &self,
        description: &mut String,
        project_id: &mut Option<ProjectId>,
        start_date: &mut DateTime<Utc>,
        end_date: &mut DateTime<Utc>,
    ) -> Result<()> {
        if let Some(new) = &self.description {
            description.clone_from(new);
        }
        if let Some(project) = self.project() {
            *project_id = project;
        }
        let (start, end) = self.reschedule(*start_date, *end_date)?;
        *start_date = start;
        *end_date = end;
        Ok(())
    }
}

#[derive(Subcommand)]
enum EntryCommands {
    List {
        /// Local day as YYYY-MM-DD, today by default
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    Add(NewInterval),
    Edit {
        id: EntryId,
        #[command(flatten)]
        edit: IntervalEdit,
    },
    Rm { id: EntryId },
    /// Attach to a project, or detach when none is given
    Assign {
        id: EntryId,
        #[arg(short, long)]
        project: Option<ProjectId>,
    },
}

#[derive(Subcommand)]
enum BoxCommands {
    /// Show one day of time boxes, marking those already tracked
    Day {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Plan a time box (1 minute to 8 hours)
    Add(NewInterval),
    Edit {
        id: EntryId,
        #[command(flatten)]
        edit: IntervalEdit,
    },
    Rm { id: EntryId },
    /// Attach to a project, or detach when none is given
    Assign {
        id: EntryId,
        #[arg(short, long)]
        project: Option<ProjectId>,
    },
}

#[derive(Subcommand)]
enum FolderCommands {
    Tree,
    /// Subfolders of a folder, or the top level
    Ls { parent: Option<FolderId> },
    /// A folder with its path, subfolders and notes
    Show { id: FolderId },
    /// Root-first path to a folder
    Path { id: FolderId },
    /// Folders the given folder may be moved under
    Parents { id: FolderId },
    Add {
        name: String,
        #[arg(long)]
        parent: Option<FolderId>,
    },
    Rename { id: FolderId, name: String },
    /// Move under another folder, or to the top level
    Mv {
        id: FolderId,
        #[arg(long)]
        parent: Option<FolderId>,
    },
    /// Delete a folder; the backend also removes what is inside it
    Rm { id: FolderId },
}

#[derive(Subcommand)]
enum NoteCommands {
    List {
        /// Only notes directly inside this folder
        #[arg(long)]
        folder: Option<FolderId>,
    },
    Show { id: NoteId },
    Add {
        title: String,
        #[arg(short, long, default_value = "")]
        content: String,
        #[arg(short, long)]
        folder: Option<FolderId>,
    },
    Edit {
        id: NoteId,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        content: Option<String>,
        #[arg(short, long, conflicts_with = "no_folder")]
        folder: Option<FolderId>,
        /// Move out of any folder
        #[arg(long)]
        no_folder: bool,
    },
    Rm { id: NoteId },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| format!("expected HH:MM: {e}"))
}

fn local_instant(date: NaiveDate, time: NaiveTime) -> Result<DateTime<Utc>> {
    date.and_time(time)
        .and_local_timezone(Local)
        .single()
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("{date} {time} is not a single local time"))
}

fn local_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TEMPUS_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load_config()?;
    let client = Arc::new(config.build_client()?);

    match cli.command {
        Commands::Login => {
            let user = client.login().await.context("Login failed")?;
            println!("Logged in as {} ({})", user.email, user.id);
        }
        Commands::Status => status(&config, &client).await?,
        Commands::Start {
            description,
            project,
        } => start(&config, description, project)?,
        Commands::Stop => stop(&config, client).await?,
        Commands::Projects { command } => projects(command, client, cli.json).await?,
        Commands::Entries { command } => entries(command, client, cli.json).await?,
        Commands::Boxes { command } => boxes(&config, command, client, cli.json).await?,
        Commands::Folders { command } => folders(command, client, cli.json).await?,
        Commands::Notes { command } => notes(command, client, cli.json).await?,
    }

    Ok(())
}

fn load_stopwatch(config: &Config) -> Result<Stopwatch> {
    let state = persistence::load_timer()?.unwrap_or_default();
    Ok(Stopwatch::restore(state, Arc::new(SystemClock))
        .with_default_description(config.stopwatch.default_description.clone()))
}

async fn status(config: &Config, client: &Arc<ApiClient>) -> Result<()> {
    let stopwatch = load_stopwatch(config)?;
    let state = stopwatch.state();
    if !state.is_running {
        println!("State: idle");
        return Ok(());
    }

    let project = match state.project_id {
        Some(id) => {
            let mut store = ProjectStore::new(client.clone());
            let name = match store.fetch().await {
                Ok(()) => store.find(Some(id)).map(|p| p.name.clone()),
                Err(e) => {
                    debug!(error = %e, "Could not resolve project name");
                    None
                }
            };
            name.unwrap_or_else(|| format!("#{id}"))
        }
        None => "none".to_string(),
    };
    println!("State: running");
    println!("Elapsed: {}", format_elapsed(state.elapsed_millis));
    println!("Description: {}", state.description);
    println!("Project: {project}");
    Ok(())
}

fn start(config: &Config, description: Option<String>, project: Option<ProjectId>) -> Result<()> {
    let mut stopwatch = load_stopwatch(config)?;
    if stopwatch.is_running() {
        warn!("Stopwatch was already running; restarting it");
        eprintln!(
            "Discarding running timer ({})",
            format_elapsed(stopwatch.elapsed_millis())
        );
    }
    stopwatch.start(description.unwrap_or_default(), project);
    persistence::save_timer(stopwatch.state())?;
    println!("Started");
    Ok(())
}

async fn stop(config: &Config, client: Arc<ApiClient>) -> Result<()> {
    let stopwatch = load_stopwatch(config)?;
    if !stopwatch.is_running() {
        bail!("Stopwatch is not running");
    }
    let mut session = StopwatchSession::new(stopwatch, config.stopwatch.tick_every());
    let mut sink = client;
    let result = session.stop(&mut sink).await;
    // The run is over either way.
    persistence::clear_timer()?;

    match result.context("Time entry was not saved")? {
        Some(draft) => println!(
            "Saved \"{}\" ({})",
            draft.description,
            format_elapsed(draft.duration().num_milliseconds())
        ),
        None => println!("Nothing to save"),
    }
    Ok(())
}

async fn projects(command: ProjectCommands, client: Arc<ApiClient>, json: bool) -> Result<()> {
    let mut store = ProjectStore::new(client);
    match command {
        ProjectCommands::List => store.fetch().await?,
        ProjectCommands::Add {
            name,
            color,
            description,
        } => {
            store
                .create(&ProjectCreate {
                    name,
                    description,
                    color,
                })
                .await?
        }
        ProjectCommands::Edit {
            id,
            name,
            color,
            description,
        } => {
            store.fetch().await?;
            let mut project = store
                .find(Some(id))
                .cloned()
                .with_context(|| format!("No project {id}"))?;
            if let Some(name) = name {
                project.name = name;
            }
            if let Some(color) = color {
                project.color = color;
            }
            if let Some(description) = description {
                project.description = description;
            }
            store.update(&project).await?
        }
        ProjectCommands::Rm { id } => store.delete(id).await?,
    }
    if json {
        return print_json(&store.projects());
    }
    for project in store.projects() {
        println!("{}: {} {}", project.id, project.name, project.color);
    }
    Ok(())
}

fn print_entries(entries: &[&TimeEntry], json: bool) -> Result<()> {
    if json {
        return print_json(&entries);
    }
    for entry in entries {
        println!(
            "{}: {}-{} {} ({})",
            entry.id,
            entry.start_date.with_timezone(&Local).format("%H:%M"),
            entry.end_date.with_timezone(&Local).format("%H:%M"),
            entry.description,
            format_minutes(entry.duration_minutes())
        );
    }
    Ok(())
}

async fn entries(command: EntryCommands, client: Arc<ApiClient>, json: bool) -> Result<()> {
    let mut store = TimeEntryStore::new(client);
    let day = match command {
        EntryCommands::List { date } => {
            store.fetch().await?;
            date.unwrap_or_else(|| Local::now().date_naive())
        }
        EntryCommands::Add(new) => {
            let day = new.day();
            store.create(&new.draft()?).await?;
            day
        }
        EntryCommands::Edit { id, edit } => {
            store.fetch().await?;
            let mut entry = find_entry(store.entries(), id)?;
            edit.apply(
                &mut entry.description,
                &mut entry.project_id,
                &mut entry.start_date,
                &mut entry.end_date,
            )?;
            store.update(&entry).await?;
            local_day(entry.start_date)
        }
        EntryCommands::Rm { id } => {
            store.delete(id).await?;
            println!("Deleted time entry {id}");
            return Ok(());
        }
        EntryCommands::Assign { id, project } => {
            store.assign_project(id, project).await?;
            let entry = find_entry(store.entries(), id)?;
            local_day(entry.start_date)
        }
    };

    if !json {
        println!("{day}:");
    }
    print_entries(&store.on_day(day), json)
}

fn find_entry(entries: &[TimeEntry], id: EntryId) -> Result<TimeEntry> {
    entries
        .iter()
        .find(|e| e.id == id)
        .cloned()
        .with_context(|| format!("No time entry {id}"))
}

fn find_box(boxes: &[TimeBoxEntry], id: EntryId) -> Result<TimeBoxEntry> {
    boxes
        .iter()
        .find(|b| b.id == id)
        .cloned()
        .with_context(|| format!("No time box {id}"))
}

async fn boxes(
    config: &Config,
    command: BoxCommands,
    client: Arc<ApiClient>,
    json: bool,
) -> Result<()> {
    let mut store = TimeBoxStore::new(client.clone());
    let day = match command {
        BoxCommands::Day { date } => {
            store.fetch().await?;
            date.unwrap_or_else(|| Local::now().date_naive())
        }
        BoxCommands::Add(new) => {
            let day = new.day();
            store.create(&new.draft()?).await?;
            day
        }
        BoxCommands::Edit { id, edit } => {
            store.fetch().await?;
            let mut planned = find_box(store.boxes(), id)?;
            edit.apply(
                &mut planned.description,
                &mut planned.project_id,
                &mut planned.start_date,
                &mut planned.end_date,
            )?;
            store.update(&planned).await?;
            local_day(planned.start_date)
        }
        BoxCommands::Rm { id } => {
            store.delete(id).await?;
            println!("Deleted time box {id}");
            return Ok(());
        }
        BoxCommands::Assign { id, project } => {
            store.assign_project(id, project).await?;
            local_day(find_box(store.boxes(), id)?.start_date)
        }
    };
    print_day(config, &store, client, day, json).await
}

/// One day of time boxes, marking those already logged.
async fn print_day(
    config: &Config,
    boxes: &TimeBoxStore,
    client: Arc<ApiClient>,
    day: NaiveDate,
    json: bool,
) -> Result<()> {
    let mut entries = TimeEntryStore::new(client);
    entries.fetch().await?;

    let tracked = entries.tracked_index();
    let layout = DayLayout::build(boxes.boxes(), &tracked, day, &config.timebox, &Local);

    if json {
        let blocks: Vec<_> = layout
            .blocks
            .iter()
            .map(|b| {
                serde_json::json!({
                    "entry": b.entry,
                    "tracked": b.tracked,
                    "top": b.placement.top,
                    "height": b.placement.height,
                    "column": b.column,
                    "columns": b.columns,
                })
            })
            .collect();
        return print_json(&blocks);
    }

    println!(
        "{day}: {} planned, {}",
        layout.summary.count,
        format_minutes(layout.summary.total_minutes)
    );
    for slot in &layout.slots {
        if slot.entries.is_empty() {
            continue;
        }
        println!("{:02}:00", slot.hour);
        for entry in &slot.entries {
            let mark = if tracked.is_already_tracked(*entry) {
                "✓"
            } else {
                " "
            };
            println!(
                "  [{mark}] {}: {}-{} {} ({})",
                entry.id,
                entry.start_date.with_timezone(&Local).format("%H:%M"),
                entry.end_date.with_timezone(&Local).format("%H:%M"),
                entry.description,
                format_minutes(entry.duration_minutes())
            );
        }
    }
    Ok(())
}

async fn folders(command: FolderCommands, client: Arc<ApiClient>, json: bool) -> Result<()> {
    let mut store = FolderStore::new(client.clone());
    store.fetch().await?;

    match command {
        FolderCommands::Tree => {
            let tree = store.tree();
            if json {
                return print_json(&store.folders());
            }
            for root in tree.roots() {
                print_subtree(&tree, root, 0);
            }
            let stranded = tree.unreachable();
            if !stranded.is_empty() {
                warn!(count = stranded.len(), "Folders unreachable from any root");
                eprintln!("Not reachable from any root (their parents form a cycle):");
                for folder in stranded {
                    let parent = folder
                        .parent_id
                        .map(|id| id.to_string())
                        .unwrap_or_default();
                    eprintln!("  {} ({}) under {parent}", folder.name, folder.id);
                }
            }
        }
        FolderCommands::Ls { parent } => {
            let children = store.fetch_children(parent).await?;
            if json {
                return print_json(&children);
            }
            for folder in children {
                println!("{}: {}", folder.id, folder.name);
            }
        }
        FolderCommands::Show { id } => {
            let folder = store.load(id).await?;
            let mut notes = NoteStore::new(client);
            notes.fetch_in(Some(id)).await?;
            if json {
                return print_json(&serde_json::json!({
                    "folder": folder,
                    "path": store.breadcrumbs(),
                    "notes": notes.notes_in(Some(id)),
                }));
            }
            let path: Vec<&str> = store
                .breadcrumbs()
                .iter()
                .map(|f| f.name.as_str())
                .collect();
            println!("{}", path.join(" / "));
            for child in store.tree().children(Some(id)) {
                println!("  {}/ ({})", child.name, child.id);
            }
            for note in notes.notes_in(Some(id)) {
                println!("  {} ({})", note.title, note.id);
            }
        }
        FolderCommands::Path { id } => {
            let tree = store.tree();
            let path = tree.folder_path(id)?;
            if json {
                return print_json(&path);
            }
            println!("{}", tree.breadcrumbs(id)?);
        }
        FolderCommands::Parents { id } => {
            let tree = store.tree();
            let candidates = tree.parent_candidates(id)?;
            if json {
                return print_json(&candidates);
            }
            for folder in candidates {
                println!("{}: {}", folder.id, folder.name);
            }
        }
        FolderCommands::Add { name, parent } => {
            let folder = store
                .create(&FolderInput {
                    name,
                    parent_id: parent,
                })
                .await?;
            print_folder_path(&store, folder.id, json)?;
        }
        FolderCommands::Rename { id, name } => {
            let parent_id = cached_folder(&store, id)?.parent_id;
            store.edit(id, &FolderInput { name, parent_id }).await?;
            print_folder_path(&store, id, json)?;
        }
        FolderCommands::Mv { id, parent } => {
            let name = cached_folder(&store, id)?.name;
            store
                .edit(id, &FolderInput {
                    name,
                    parent_id: parent,
                })
                .await
                .with_context(|| format!("Cannot move folder {id}"))?;
            print_folder_path(&store, id, json)?;
        }
        FolderCommands::Rm { id } => {
            store.delete(id).await?;
            println!("Deleted folder {id} and everything inside it");
        }
    }
    Ok(())
}

fn cached_folder(store: &FolderStore, id: FolderId) -> Result<Folder> {
    store
        .tree()
        .get(id)
        .cloned()
        .with_context(|| format!("No folder {id}"))
}

fn print_folder_path(store: &FolderStore, id: FolderId, json: bool) -> Result<()> {
    let tree = store.tree();
    if json {
        return print_json(&tree.get(id));
    }
    println!("{}: {}", id, tree.breadcrumbs(id)?);
    Ok(())
}

fn print_subtree(tree: &FolderTree<'_>, folder: &Folder, depth: usize) {
    println!("{}{} ({})", "  ".repeat(depth), folder.name, folder.id);
    // Depth-guarded so a corrupt cycle cannot recurse forever.
    if depth >= tree.len() {
        return;
    }
    for child in tree.children(Some(folder.id)) {
        print_subtree(tree, child, depth + 1);
    }
}

async fn notes(command: NoteCommands, client: Arc<ApiClient>, json: bool) -> Result<()> {
    let mut store = NoteStore::new(client);
    match command {
        NoteCommands::List { folder } => {
            match folder {
                Some(id) => store.fetch_in(Some(id)).await?,
                None => store.fetch().await?,
            }
            if json {
                return print_json(&store.notes());
            }
            for note in store.notes() {
                println!("{}: {}", note.id, note.title);
            }
        }
        NoteCommands::Show { id } => {
            let note = store.load(id).await?;
            if json {
                return print_json(&note);
            }
            println!("{}", note.title);
            if let Some(folder) = note.folder_id {
                println!("Folder: {folder}");
            }
            println!();
            println!("{}", note.content);
        }
        NoteCommands::Add {
            title,
            content,
            folder,
        } => {
            let note = store
                .create(&NoteInput {
                    title,
                    content,
                    folder_id: folder,
                })
                .await?;
            print_note_saved(&note, json)?;
        }
        NoteCommands::Edit {
            id,
            title,
            content,
            folder,
            no_folder,
        } => {
            let current = store.load(id).await?;
            let folder_id = if no_folder {
                None
            } else {
                folder.or(current.folder_id)
            };
            let input = NoteInput {
                title: title.unwrap_or(current.title),
                content: content.unwrap_or(current.content),
                folder_id,
            };
            let note = store.edit(id, &input).await?;
            print_note_saved(&note, json)?;
        }
        NoteCommands::Rm { id } => {
            store.delete(id).await?;
            println!("Deleted note {id}");
        }
    }
    Ok(())
}

fn print_note_saved(note: &Note, json: bool) -> Result<()> {
    if json {
        return print_json(note);
    }
    println!("{}: {}", note.id, note.title);
    Ok(())
}
