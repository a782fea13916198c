use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use reelplan_lib::core::export::{
    export_project, ExternalValue, InMemoryLayouts, LayoutPayload, LayoutProvider,
};
use reelplan_lib::core::settings::{AppSettings, SettingsManager};

use crate::project_cmds::open_project;

/// Layouts captured from the editor, as plain JSON.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutFile {
    #[serde(default)]
    content_types: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    events: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

fn payload(elements: BTreeMap<String, serde_json::Value>) -> LayoutPayload {
    elements
        .into_iter()
        .map(|(name, value)| (name, ExternalValue::from(value)))
        .collect()
}

fn load_layouts(path: Option<&Path>) -> anyhow::Result<InMemoryLayouts> {
    let mut layouts = InMemoryLayouts::new();
    let Some(path) = path else {
        return Ok(layouts);
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read layout file: {}", path.display()))?;
    let file: LayoutFile = serde_json::from_str(&content)
        .with_context(|| format!("invalid layout file: {}", path.display()))?;

    for (content_type, elements) in file.content_types {
        layouts.apply_layout(&content_type, payload(elements));
    }
    for (event_id, elements) in file.events {
        layouts.set_event_layout(&event_id, payload(elements));
    }
    Ok(layouts)
}

/// `<stem>.export.json` in the configured export location, or next to the project.
fn default_output(settings: &AppSettings, project: &Path) -> PathBuf {
    let stem = project
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "untitled".to_string());
    let file_name = format!("{stem}.export.json");
    match settings.export.default_export_location.as_deref() {
        Some(location) => Path::new(location).join(file_name),
        None => project.with_file_name(file_name),
    }
}

/// Execute `reelplan export`.
pub fn run_export(
    settings: &SettingsManager,
    project_path: &Path,
    output: Option<&Path>,
    layouts_path: Option<&Path>,
    compact: bool,
) -> anyhow::Result<()> {
    let app_settings = settings.load();
    let project = open_project(settings, project_path)?;
    let layouts = load_layouts(layouts_path)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(&app_settings, project_path));
    let pretty = app_settings.export.pretty_json && !compact;

    let document = export_project(&project, &layouts, &output, pretty)
        .with_context(|| format!("export failed for {}", project_path.display()))?;

    println!(
        "Exported {} scheduled item(s) and {} template(s) to {}",
        document.scheduled_content.len(),
        document.templates.len(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelplan_lib::core::project::Project;
    use reelplan_lib::core::timeline::ReleaseEvent;
    use tempfile::TempDir;

    #[test]
    fn test_default_output_location() {
        let mut settings = AppSettings::default();
        assert_eq!(
            default_output(&settings, Path::new("/work/spring.reelplan")),
            PathBuf::from("/work/spring.export.json")
        );

        settings.export.default_export_location = Some("/exports".to_string());
        assert_eq!(
            default_output(&settings, Path::new("/work/spring.reelplan")),
            PathBuf::from("/exports/spring.export.json")
        );
    }

    #[test]
    fn test_export_with_layout_file() {
        let dir = TempDir::new().unwrap();
        let settings = SettingsManager::new(dir.path().join("config"));
        let project_path = dir.path().join("spring.reelplan");

        let mut project = Project::new("Spring").unwrap();
        let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        project.add_event(ReleaseEvent::new(date, "story")).unwrap();
        project.save(&project_path).unwrap();

        let layout_path = dir.path().join("layouts.json");
        std::fs::write(
            &layout_path,
            r#"{"contentTypes": {"story": {"title": {"x": 10, "y": 20}}}}"#,
        )
        .unwrap();

        run_export(&settings, &project_path, None, Some(&layout_path), true).unwrap();

        let written = std::fs::read_to_string(dir.path().join("spring.export.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["templates"]["story"]["layoutSource"], "provider");
        assert_eq!(value["templates"]["story"]["layout"]["title"]["x"], 10);
        assert!(!written.contains('\n'));
    }
}
