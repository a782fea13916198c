use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Subcommand;

use reelplan_lib::core::settings::SettingsManager;
use reelplan_lib::core::timeline::{EventStatus, ReleaseEvent};

use crate::project_cmds::{open_project, save_project};

#[derive(Subcommand)]
pub enum EventCommands {
    /// Schedule a new event
    Add {
        /// Project file
        project: PathBuf,
        /// Release date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Content type (reel, story, post, tutorial, ...)
        #[arg(long = "type")]
        content_type: String,
        /// Event title (defaults to "<Type> Content")
        #[arg(long)]
        title: Option<String>,
        /// Free-text brief used as the generation prompt
        #[arg(long)]
        description: Option<String>,
        /// Target platform (repeatable; defaults come from settings)
        #[arg(long = "platform")]
        platforms: Vec<String>,
        /// Hashtag (repeatable)
        #[arg(long = "hashtag")]
        hashtags: Vec<String>,
        /// Referenced asset id (repeatable)
        #[arg(long = "asset")]
        assets: Vec<String>,
        /// Running time in seconds
        #[arg(long)]
        duration: Option<u32>,
        /// Explicit event id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
    },
    /// List events chronologically
    List {
        /// Project file
        project: PathBuf,
        /// Only events on or after this date
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Only events on or before this date
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Change fields of an existing event
    Update {
        /// Project file
        project: PathBuf,
        /// Event id
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "type")]
        content_type: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        status: Option<EventStatus>,
        #[arg(long)]
        duration: Option<u32>,
        /// Replace platforms (repeatable)
        #[arg(long = "platform")]
        platforms: Vec<String>,
        /// Replace hashtags (repeatable)
        #[arg(long = "hashtag")]
        hashtags: Vec<String>,
    },
    /// Move an event to another date
    Move {
        /// Project file
        project: PathBuf,
        /// Event id
        id: String,
        /// New release date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
    },
    /// Remove an event and its event-specific template
    Remove {
        /// Project file
        project: PathBuf,
        /// Event id
        id: String,
    },
}

pub fn run_event_command(settings: &SettingsManager, command: EventCommands) -> anyhow::Result<()> {
    match command {
        EventCommands::Add {
            project: path,
            date,
            content_type,
            title,
            description,
            platforms,
            hashtags,
            assets,
            duration,
            id,
        } => {
            let app_settings = settings.load();
            let mut project = open_project(settings, &path)?;

            let mut event = ReleaseEvent::new(date, &content_type).with_duration(
                duration.unwrap_or(app_settings.planning.default_event_duration_seconds),
            );
            if let Some(id) = id {
                event = event.with_id(id);
            }
            if let Some(title) = title {
                event = event.with_title(title);
            }
            if let Some(description) = description {
                event = event.with_description(description);
            }
            let platforms = if platforms.is_empty() {
                app_settings.planning.default_platforms
            } else {
                platforms
            };
            event.platforms = platforms;
            event.hashtags = hashtags;
            event.asset_ids = assets;

            let id = project.add_event(event)?;
            save_project(&mut project, &path)?;
            println!("Added event {id} on {date}");
        }
        EventCommands::List {
            project: path,
            from,
            to,
            json,
        } => {
            let project = open_project(settings, &path)?;
            let store = project.events();
            let events = match (from, to) {
                (None, None) => store.events(),
                (from, to) => store.events_in_range(
                    from.unwrap_or(NaiveDate::MIN),
                    to.unwrap_or(NaiveDate::MAX),
                ),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
                return Ok(());
            }
            if events.is_empty() {
                println!("No events.");
            }
            for event in events {
                println!(
                    "{}  {:<10} {:<9} {}  [{}]",
                    event.date,
                    event.content_type,
                    event.status,
                    event.title,
                    event.id()
                );
            }
        }
        EventCommands::Update {
            project: path,
            id,
            title,
            description,
            content_type,
            date,
            status,
            duration,
            platforms,
            hashtags,
        } => {
            let mut project = open_project(settings, &path)?;
            let mut event = project.event(&id)?.clone();
            if let Some(title) = title {
                event.title = title;
            }
            if let Some(description) = description {
                event.description = description;
            }
            if let Some(content_type) = content_type {
                event.content_type = content_type;
            }
            if let Some(date) = date {
                event.date = date;
            }
            if let Some(status) = status {
                event.status = status;
            }
            if let Some(duration) = duration {
                event.duration_seconds = duration;
            }
            if !platforms.is_empty() {
                event.platforms = platforms;
            }
            if !hashtags.is_empty() {
                event.hashtags = hashtags;
            }

            project.update_event(event)?;
            save_project(&mut project, &path)?;
            println!("Updated event {id}");
        }
        EventCommands::Move {
            project: path,
            id,
            date,
        } => {
            let mut project = open_project(settings, &path)?;
            let previous = project.move_event(&id, date)?;
            save_project(&mut project, &path)?;
            println!("Moved event {id} from {} to {date}", previous.date);
        }
        EventCommands::Remove { project: path, id } => {
            let mut project = open_project(settings, &path)?;
            let removed = project.remove_event(&id)?;
            save_project(&mut project, &path)?;
            println!("Removed event {id} ({})", removed.title);
        }
    }
    Ok(())
}
