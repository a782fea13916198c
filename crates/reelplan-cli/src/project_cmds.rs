use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;

use reelplan_lib::core::fs::{safe_file_stem, with_forced_extension};
use reelplan_lib::core::project::{Project, PROJECT_EXTENSION};
use reelplan_lib::core::settings::{AppSettings, SettingsManager};
use reelplan_lib::core::timeline::TimelinePlan;

/// Loads a project file and records it as recently opened.
pub fn open_project(settings: &SettingsManager, path: &Path) -> anyhow::Result<Project> {
    let project = Project::load(path)
        .with_context(|| format!("cannot open project: {}", path.display()))?;
    if let Err(e) = settings.record_recent_project(path) {
        tracing::warn!("Could not update recent projects: {}", e);
    }
    Ok(project)
}

/// Saves a project back to its file.
pub fn save_project(project: &mut Project, path: &Path) -> anyhow::Result<PathBuf> {
    project
        .save(path)
        .with_context(|| format!("cannot save project: {}", path.display()))
}

/// Bare file names land in the configured default project location.
fn project_path(settings: &AppSettings, path: &Path) -> PathBuf {
    let is_bare = path.parent().is_none_or(|p| p.as_os_str().is_empty());
    match settings.general.default_project_location.as_deref() {
        Some(location) if is_bare && path.is_relative() => Path::new(location).join(path),
        _ => path.to_path_buf(),
    }
}

/// Execute `reelplan new`: create and save an empty project.
pub fn run_new(
    settings: &SettingsManager,
    path: &Path,
    name: &str,
    description: Option<&str>,
    global_prompt: Option<&str>,
) -> anyhow::Result<()> {
    let app_settings = settings.load();
    let mut target = project_path(&app_settings, path);
    if target.is_dir() {
        target.push(safe_file_stem(name));
    }
    let target = with_forced_extension(&target, PROJECT_EXTENSION);
    if target.exists() {
        anyhow::bail!("project file already exists: {}", target.display());
    }

    let mut project = Project::new(name)?;
    if let Some(description) = description {
        project.set_description(description);
    }
    if let Some(prompt) = global_prompt {
        project.set_global_prompt(prompt);
    }
    project.initialize_timeline(chrono::Local::now().date_naive());
    project.set_timeline_duration(app_settings.planning.default_duration_weeks)?;

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create directory: {}", parent.display()))?;
    }
    let written = save_project(&mut project, &target)?;
    settings.record_recent_project(&written)?;

    println!("Created project '{}' at {}", project.name(), written.display());
    Ok(())
}

/// Execute `reelplan info`: print a project summary.
pub fn run_info(settings: &SettingsManager, path: &Path) -> anyhow::Result<()> {
    let project = open_project(settings, path)?;
    let meta = project.meta();

    println!("Project: {}", meta.name);
    if !meta.description.is_empty() {
        println!("  {}", meta.description);
    }
    println!("  Format: {} @ {} fps", meta.format, meta.fps);
    println!("  Modified: {}", meta.modified_at);
    if let Some(plan) = project.timeline_plan() {
        println!(
            "  Timeline: {} to {} ({} week(s))",
            plan.start_date(),
            plan.end_date(),
            plan.duration_weeks()
        );
    }
    if let Some(prompt) = project.global_prompt() {
        println!("  Global prompt: {prompt}");
    }

    let events = project.events();
    let types: Vec<&str> = events.content_types_in_use().into_iter().collect();
    println!("  Events: {}", events.len());
    if !types.is_empty() {
        println!("  Content types: {}", types.join(", "));
    }
    println!("  Assets: {}", project.assets().len());
    println!(
        "  Event templates: {}",
        project.content_generation().event_template_ids().count()
    );
    Ok(())
}

/// Execute `reelplan plan`: move or resize the planning window.
pub fn run_plan(
    settings: &SettingsManager,
    path: &Path,
    start: Option<NaiveDate>,
    weeks: Option<u32>,
    shift: Option<i64>,
) -> anyhow::Result<()> {
    let app_settings = settings.load();
    let mut project = open_project(settings, path)?;

    let current = project.timeline_plan().copied();
    let weeks = weeks
        .or(current.map(|plan| plan.duration_weeks()))
        .unwrap_or(app_settings.planning.default_duration_weeks);
    let anchor = start
        .or(current.map(|plan| plan.start_date()))
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let mut plan = TimelinePlan::starting(anchor, weeks);
    if let Some(periods) = shift {
        plan = plan.shifted(periods);
    }
    project.set_timeline_plan(plan);
    save_project(&mut project, path)?;

    let outside = project
        .events()
        .events()
        .into_iter()
        .filter(|event| !plan.contains(event.date))
        .count();
    println!(
        "Timeline: {} to {} ({} week(s))",
        plan.start_date(),
        plan.end_date(),
        plan.duration_weeks()
    );
    if outside > 0 {
        println!("  {outside} event(s) fall outside this window");
    }
    Ok(())
}

/// Execute `reelplan recent`: list (or clear) recently opened projects.
pub fn run_recent(settings: &SettingsManager, clear: bool) -> anyhow::Result<()> {
    if clear {
        let mut app_settings = settings.load();
        app_settings.clear_recent_projects();
        settings.save(&app_settings)?;
        println!("Recent projects cleared.");
        return Ok(());
    }

    let recent = settings.existing_recent_projects()?;
    if recent.is_empty() {
        println!("No recent projects.");
    }
    for (i, path) in recent.iter().enumerate() {
        println!("{:>2}. {path}", i + 1);
    }
    Ok(())
}
