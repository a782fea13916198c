use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;

use reelplan_lib::core::settings::SettingsManager;
use reelplan_lib::core::template::{
    ConfigParameter, Constraints, LayerScope, ModeKind, ParamKey, ParamValue, Section, Template,
};

use crate::project_cmds::{open_project, save_project};

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Set a parameter's mode, value or constraints
    Set {
        /// Project file
        project: PathBuf,
        /// Parameter key, e.g. subtitle_fontSize or custom_hook
        key: String,
        /// Layer: project | type:<contentType> | event:<eventId>
        #[arg(long, default_value = "project")]
        scope: String,
        /// Mode tag: fixed | guided | free
        #[arg(long)]
        mode: Option<ModeKind>,
        /// New value (numbers, booleans and comma lists are detected)
        #[arg(long)]
        value: Option<String>,
        /// Guided lower bound
        #[arg(long)]
        min: Option<f64>,
        /// Guided upper bound
        #[arg(long)]
        max: Option<f64>,
        /// Allowed guided value (repeatable)
        #[arg(long = "option")]
        options: Vec<String>,
        /// Free-text hint for guided parameters
        #[arg(long)]
        note: Option<String>,
        /// Parameter description shown in guided instructions
        #[arg(long)]
        description: Option<String>,
    },
    /// Drop a layer: the project-wide or event template is removed, a
    /// content-type template is reset to its built-in defaults
    Clear {
        /// Project file
        project: PathBuf,
        /// Layer: project | type:<contentType> | event:<eventId>
        #[arg(long)]
        scope: String,
    },
    /// Show every parameter of one layer
    Show {
        /// Project file
        project: PathBuf,
        /// Layer: project | type:<contentType> | event:<eventId>
        #[arg(long, default_value = "project")]
        scope: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Parses `project`, `type:<ct>` or `event:<id>`.
pub fn parse_scope(scope: &str) -> anyhow::Result<LayerScope> {
    let scope = scope.trim();
    if scope == "project" {
        return Ok(LayerScope::ProjectWide);
    }
    match scope.split_once(':') {
        Some(("type", ct)) if !ct.is_empty() => Ok(LayerScope::ContentType(ct.to_string())),
        Some(("event", id)) if !id.is_empty() => Ok(LayerScope::Event(id.to_string())),
        _ => anyhow::bail!("invalid scope '{scope}': expected project, type:<ct> or event:<id>"),
    }
}

fn constraints_from_args(
    min: Option<f64>,
    max: Option<f64>,
    options: Vec<String>,
    note: Option<String>,
) -> Option<Constraints> {
    let constraints = Constraints {
        min,
        max,
        options,
        note,
    };
    (!constraints.is_empty()).then_some(constraints)
}

pub fn run_template_command(
    settings: &SettingsManager,
    command: TemplateCommands,
) -> anyhow::Result<()> {
    match command {
        TemplateCommands::Set {
            project: path,
            key,
            scope,
            mode,
            value,
            min,
            max,
            options,
            note,
            description,
        } => {
            let scope = parse_scope(&scope)?;
            let parsed_key = ParamKey::parse(&key)?;
            let constraints = constraints_from_args(min, max, options, note);

            let mut project = open_project(settings, &path)?;
            let template = project.template_mut(&scope)?;
            if parsed_key.section == Section::Custom && template.parameter(&key).is_none() {
                template.set_custom(parsed_key.name.clone(), ConfigParameter::free(""));
            }

            let param = template.parameter_mut(&key)?;
            if let Some(mode) = mode {
                param.set_mode(mode);
            }
            if let Some(value) = value {
                param.set_value(ParamValue::parse_loose(&value));
            }
            if let Some(constraints) = constraints {
                param
                    .set_constraints(constraints)
                    .with_context(|| format!("cannot constrain {key}; use --mode guided"))?;
            }
            if let Some(description) = description {
                param.description = description;
            }
            let summary = format!("{} = {} ({})", key, param.value, param.kind());

            save_project(&mut project, &path)?;
            println!("[{scope}] {summary}");
        }
        TemplateCommands::Clear {
            project: path,
            scope,
        } => {
            let scope = parse_scope(&scope)?;
            let mut project = open_project(settings, &path)?;
            if let LayerScope::Event(id) = &scope {
                project.event(id)?;
            }
            let engine = project.content_generation_mut();
            let cleared = match &scope {
                LayerScope::ProjectWide => engine.clear_project_wide_template().is_some(),
                LayerScope::ContentType(ct) => {
                    engine.set_content_type_template(ct, Template::for_content_type(ct));
                    true
                }
                LayerScope::Event(id) => engine.remove_event_template(id).is_some(),
            };
            if !cleared {
                println!("[{scope}] nothing to clear");
                return Ok(());
            }
            save_project(&mut project, &path)?;
            println!("[{scope}] cleared");
        }
        TemplateCommands::Show {
            project: path,
            scope,
            json,
        } => {
            let scope = parse_scope(&scope)?;
            let project = open_project(settings, &path)?;
            let template = project.content_generation().template(&scope)?;

            if json {
                println!("{}", serde_json::to_string_pretty(template)?);
                return Ok(());
            }
            println!("Template [{scope}] for {}", template.content_type);
            for entry in template.parameters() {
                let constraints = entry
                    .param
                    .constraints()
                    .map(|c| format!("  ({c})"))
                    .unwrap_or_default();
                println!(
                    "  {:<28} {:<7} {}{}",
                    entry.key(),
                    entry.param.kind(),
                    entry.param.value,
                    constraints
                );
            }
        }
    }
    Ok(())
}

/// Execute `reelplan resolve`: print the fixed configuration for a layer stack.
pub fn run_resolve(
    settings: &SettingsManager,
    path: &Path,
    content_type: &str,
    event: Option<&str>,
) -> anyhow::Result<()> {
    let project = open_project(settings, path)?;
    if let Some(id) = event {
        project.event(id)?;
    }
    let config = project.resolve_config(content_type, event);
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Execute `reelplan prompt`: print generation instructions.
/// Without `--base`, an event's own brief is used as the base prompt.
pub fn run_prompt(
    settings: &SettingsManager,
    path: &Path,
    content_type: &str,
    event: Option<&str>,
    base: &str,
) -> anyhow::Result<()> {
    let project = open_project(settings, path)?;
    let base = match event {
        Some(id) if base.is_empty() => project.event(id)?.description.clone(),
        _ => base.to_string(),
    };
    let instructions = project
        .content_generation()
        .generate_instructions(content_type, event, &base);
    println!("{instructions}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelplan_lib::core::project::Project;
    use tempfile::TempDir;

    #[test]
    fn test_parse_scope() {
        assert_eq!(parse_scope("project").unwrap(), LayerScope::ProjectWide);
        assert_eq!(
            parse_scope("type:reel").unwrap(),
            LayerScope::ContentType("reel".into())
        );
        assert_eq!(
            parse_scope("event:abc").unwrap(),
            LayerScope::Event("abc".into())
        );
        assert!(parse_scope("type:").is_err());
        assert!(parse_scope("channel:x").is_err());
    }

    #[test]
    fn test_set_guided_parameter_persists() {
        let dir = TempDir::new().unwrap();
        let settings = SettingsManager::new(dir.path().join("config"));
        let path = dir.path().join("plan.reelplan");
        Project::new("Plan").unwrap().save(&path).unwrap();

        run_template_command(
            &settings,
            TemplateCommands::Set {
                project: path.clone(),
                key: "subtitle_fontSize".into(),
                scope: "type:reel".into(),
                mode: Some(ModeKind::Guided),
                value: Some("28".into()),
                min: Some(18.0),
                max: Some(32.0),
                options: Vec::new(),
                note: None,
                description: Some("Readable on phones".into()),
            },
        )
        .unwrap();

        let project = Project::load(&path).unwrap();
        let template = project
            .content_generation()
            .content_type_template("reel")
            .unwrap();
        let param = template.parameter("subtitle_fontSize").unwrap();
        assert_eq!(param.kind(), ModeKind::Guided);
        assert_eq!(param.value, ParamValue::Integer(28));
        assert_eq!(param.constraints().unwrap().max, Some(32.0));
        assert!(!project.resolve_config("reel", None).contains_key("subtitle_fontSize"));
    }

    #[test]
    fn test_constraints_on_fixed_parameter_fail() {
        let dir = TempDir::new().unwrap();
        let settings = SettingsManager::new(dir.path().join("config"));
        let path = dir.path().join("plan.reelplan");
        Project::new("Plan").unwrap().save(&path).unwrap();

        let result = run_template_command(
            &settings,
            TemplateCommands::Set {
                project: path.clone(),
                key: "timing_duration".into(),
                scope: "project".into(),
                mode: None,
                value: None,
                min: Some(1.0),
                max: None,
                options: Vec::new(),
                note: None,
                description: None,
            },
        );
        assert!(result.is_err());
        assert!(Project::load(&path)
            .unwrap()
            .content_generation()
            .project_wide_template()
            .is_none());
    }

    #[test]
    fn test_clear_project_wide_template() {
        let dir = TempDir::new().unwrap();
        let settings = SettingsManager::new(dir.path().join("config"));
        let path = dir.path().join("plan.reelplan");
        let mut project = Project::new("Plan").unwrap();
        project
            .template_mut(&LayerScope::ProjectWide)
            .unwrap()
            .subtitle
            .color = ConfigParameter::fixed("yellow");
        project.save(&path).unwrap();

        let clear = || TemplateCommands::Clear {
            project: path.clone(),
            scope: "project".into(),
        };
        run_template_command(&settings, clear()).unwrap();
        assert!(Project::load(&path)
            .unwrap()
            .content_generation()
            .project_wide_template()
            .is_none());
        run_template_command(&settings, clear()).unwrap();
    }
}
