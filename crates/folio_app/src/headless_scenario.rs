//! Scenario definition for headless page runs.

use crate::contact::FormState;
use crate::cursor::CursorMode;
use crate::stage::LoadingStage;
use anyhow::{Context, Result};
use folio_layout::SectionId;
use folio_theme::ColorScheme;
use serde::Deserialize;
use std::path::Path;

/// Sequence of headless page steps.
#[derive(Debug, Clone, Deserialize)]
pub struct HeadlessScenario {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<ScenarioStep>,
}

impl HeadlessScenario {
    /// Load a scenario from JSON text.
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load a scenario from file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid scenario {}", path.display()))
    }

    /// Number of steps that inspect page state rather than drive it.
    pub fn assertion_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_assertion()).count()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Let page time pass, one frame at a time.
    Wait { ms: u64 },
    Tick { frames: u32 },
    Scroll { y: f32 },
    /// Follow an in-page link; `#projects` and `projects` both work.
    Navigate { target: String },
    Resize { width: u32, height: u32 },
    ToggleTheme,
    PointerMove { x: f32, y: f32 },
    PointerDown,
    PointerUp,
    /// Pointer onto (or off) the navbar link for `section`
    HoverLink {
        section: SectionId,
        #[serde(default = "default_inside")]
        inside: bool,
    },
    SubmitContact {
        name: String,
        email: String,
        subject: String,
        message: String,
    },
    AssertMounted { section: SectionId },
    AssertNotMounted { section: SectionId },
    AssertVisible { section: SectionId },
    AssertHidden { section: SectionId },
    AssertStage { stage: LoadingStage },
    AssertTheme { theme: ColorScheme },
    AssertRootClass { class: String },
    AssertNoRootClass { class: String },
    AssertTransitioning,
    AssertIdle,
    AssertNavbar { scrolled: bool },
    AssertRejectedToggles { count: u32 },
    AssertActiveSection { section: SectionId },
    AssertCursor { mode: CursorMode },
    AssertContact { state: FormState },
}

fn default_inside() -> bool {
    true
}

impl ScenarioStep {
    pub fn is_assertion(&self) -> bool {
        !matches!(
            self,
            ScenarioStep::Wait { .. }
                | ScenarioStep::Tick { .. }
                | ScenarioStep::Scroll { .. }
                | ScenarioStep::Navigate { .. }
                | ScenarioStep::Resize { .. }
                | ScenarioStep::ToggleTheme
                | ScenarioStep::PointerMove { .. }
                | ScenarioStep::PointerDown
                | ScenarioStep::PointerUp
                | ScenarioStep::HoverLink { .. }
                | ScenarioStep::SubmitContact { .. }
        )
    }

    /// Name used in failure reports.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioStep::Wait { .. } => "wait",
            ScenarioStep::Tick { .. } => "tick",
            ScenarioStep::Scroll { .. } => "scroll",
            ScenarioStep::Navigate { .. } => "navigate",
            ScenarioStep::Resize { .. } => "resize",
            ScenarioStep::ToggleTheme => "toggle_theme",
            ScenarioStep::PointerMove { .. } => "pointer_move",
            ScenarioStep::PointerDown => "pointer_down",
            ScenarioStep::PointerUp => "pointer_up",
            ScenarioStep::HoverLink { .. } => "hover_link",
            ScenarioStep::SubmitContact { .. } => "submit_contact",
            ScenarioStep::AssertMounted { .. } => "assert_mounted",
            ScenarioStep::AssertNotMounted { .. } => "assert_not_mounted",
            ScenarioStep::AssertVisible { .. } => "assert_visible",
            ScenarioStep::AssertHidden { .. } => "assert_hidden",
            ScenarioStep::AssertStage { .. } => "assert_stage",
            ScenarioStep::AssertTheme { .. } => "assert_theme",
            ScenarioStep::AssertRootClass { .. } => "assert_root_class",
            ScenarioStep::AssertNoRootClass { .. } => "assert_no_root_class",
            ScenarioStep::AssertTransitioning => "assert_transitioning",
            ScenarioStep::AssertIdle => "assert_idle",
            ScenarioStep::AssertNavbar { .. } => "assert_navbar",
            ScenarioStep::AssertRejectedToggles { .. } => "assert_rejected_toggles",
            ScenarioStep::AssertActiveSection { .. } => "assert_active_section",
            ScenarioStep::AssertCursor { .. } => "assert_cursor",
            ScenarioStep::AssertContact { .. } => "assert_contact",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_tagged_steps() {
        let scenario = HeadlessScenario::from_json(
            r##"{
                "name": "stages",
                "steps": [
                    { "type": "tick", "frames": 1 },
                    { "type": "assert_stage", "stage": "high" },
                    { "type": "navigate", "target": "#projects" },
                    { "type": "toggle_theme" },
                    { "type": "assert_theme", "theme": "light" },
                    { "type": "assert_mounted", "section": "about" }
                ]
            }"##,
        )
        .unwrap();

        assert_eq!(scenario.name.as_deref(), Some("stages"));
        assert_eq!(scenario.steps.len(), 6);
        assert_eq!(scenario.assertion_count(), 3);
        assert!(matches!(
            scenario.steps[1],
            ScenarioStep::AssertStage {
                stage: LoadingStage::High
            }
        ));
        assert_eq!(scenario.steps[3].name(), "toggle_theme");
    }

    #[test]
    fn test_parses_pointer_and_contact_steps() {
        let scenario = HeadlessScenario::from_json(
            r#"{ "steps": [
                { "type": "hover_link", "section": "skills" },
                { "type": "hover_link", "section": "skills", "inside": false },
                { "type": "assert_cursor", "mode": "hover" },
                { "type": "submit_contact", "name": "Ada", "email": "ada@example.com",
                  "subject": "Hi", "message": "Hello" },
                { "type": "assert_contact", "state": "submitting" }
            ] }"#,
        )
        .unwrap();

        assert!(matches!(
            scenario.steps[0],
            ScenarioStep::HoverLink {
                section: SectionId::Skills,
                inside: true
            }
        ));
        assert!(matches!(
            scenario.steps[1],
            ScenarioStep::HoverLink { inside: false, .. }
        ));
        assert_eq!(scenario.assertion_count(), 2);
        assert_eq!(scenario.steps[3].name(), "submit_contact");
    }

    #[test]
    fn test_rejects_unknown_step() {
        let err = HeadlessScenario::from_json(r#"{ "steps": [{ "type": "explode" }] }"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_unknown_section() {
        let err = HeadlessScenario::from_json(
            r#"{ "steps": [{ "type": "assert_mounted", "section": "blog" }] }"#,
        );
        assert!(err.is_err());
    }
}
