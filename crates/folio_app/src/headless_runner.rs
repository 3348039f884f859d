//! Scenario runner that drives a page through headless steps.

use crate::contact::ContactFields;
use crate::headless_assert::{
    evaluate_assert_active_section, evaluate_assert_contact, evaluate_assert_cursor,
    evaluate_assert_hidden, evaluate_assert_mounted, evaluate_assert_navbar,
    evaluate_assert_not_mounted, evaluate_assert_root_class, evaluate_assert_stage,
    evaluate_assert_theme, evaluate_assert_transitioning, evaluate_assert_visible,
    AssertionResult, DiagnosticsSnapshot,
};
use crate::headless_report::{HeadlessReport, PageSummary};
use crate::headless_runtime::{wait_frames, HeadlessRunConfig, HeadlessRuntime};
use crate::headless_scenario::{HeadlessScenario, ScenarioStep};
use crate::page::{nav_link_target, Page};
use folio_layout::SectionId;
use anyhow::Result;

/// What a scenario can do to a page.
pub trait ScenarioDriver {
    fn advance(&mut self, ms: u64);
    fn scroll(&mut self, y: f32);
    fn navigate(&mut self, target: &str) -> Result<(), String>;
    fn resize(&mut self, width: u32, height: u32);
    /// Returns whether the toggle was accepted.
    fn toggle_theme(&mut self) -> bool;
    fn pointer_move(&mut self, x: f32, y: f32);
    fn pointer_button(&mut self, pressed: bool);
    fn hover_link(&mut self, section: SectionId, inside: bool);
    fn submit_contact(&mut self, fields: ContactFields) -> Result<(), String>;
    fn snapshot(&self) -> DiagnosticsSnapshot;
    fn summary(&self) -> PageSummary;
}

impl ScenarioDriver for Page {
    fn advance(&mut self, ms: u64) {
        Page::advance(self, ms);
    }

    fn scroll(&mut self, y: f32) {
        Page::scroll(self, y);
    }

    fn navigate(&mut self, target: &str) -> Result<(), String> {
        self.navigate_anchor(target)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    fn resize(&mut self, width: u32, height: u32) {
        Page::resize(self, width, height);
    }

    fn toggle_theme(&mut self) -> bool {
        Page::toggle_theme(self).is_accepted()
    }

    fn pointer_move(&mut self, x: f32, y: f32) {
        Page::pointer_move(self, x, y);
    }

    fn pointer_button(&mut self, pressed: bool) {
        if pressed {
            self.pointer_down();
        } else {
            self.pointer_up();
        }
    }

    fn hover_link(&mut self, section: SectionId, inside: bool) {
        self.hover(nav_link_target(section), inside);
    }

    fn submit_contact(&mut self, fields: ContactFields) -> Result<(), String> {
        Page::submit_contact(self, fields).map_err(|e| e.to_string())
    }

    fn snapshot(&self) -> DiagnosticsSnapshot {
        Page::snapshot(self)
    }

    fn summary(&self) -> PageSummary {
        self.sync_surface();
        PageSummary {
            stage: self.stage(),
            theme: self.sequencer().scheme(),
            mounted: self.mounted_sections().len(),
            transitions_completed: self.sequencer().completed(),
            rejected_toggles: self.rejected_toggles(),
            environment_changes: self.surface().applied(),
            contact_sent: self.contact().sent(),
        }
    }
}

/// Final outcome of a scenario run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Passed { report: HeadlessReport },
    Failed { report: HeadlessReport },
}

impl RunOutcome {
    pub fn report(&self) -> &HeadlessReport {
        match self {
            RunOutcome::Passed { report } => report,
            RunOutcome::Failed { report } => report,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }
}

/// Execute scenario JSON against `driver`.
pub fn run_scenario<D: ScenarioDriver>(
    input: &str,
    runtime_cfg: HeadlessRunConfig,
    driver: &mut D,
) -> Result<RunOutcome> {
    let scenario = HeadlessScenario::from_json(input)?;
    run_loaded_scenario(&scenario, runtime_cfg, driver)
}

struct Clock {
    frames: u64,
    ms: u64,
}

/// Execute a pre-loaded scenario against `driver`.
pub fn run_loaded_scenario<D: ScenarioDriver>(
    scenario: &HeadlessScenario,
    runtime_cfg: HeadlessRunConfig,
    driver: &mut D,
) -> Result<RunOutcome> {
    let mut clock = Clock { frames: 0, ms: 0 };

    for (step_index, step) in scenario.steps.iter().enumerate() {
        tracing::trace!(step_index, step = step.name(), "scenario step");

        let failure = match step {
            ScenarioStep::Wait { ms } => {
                let frames = wait_frames(*ms, runtime_cfg.tick_ms);
                let mut remaining_ms = *ms;
                run_frames(runtime_cfg, frames, &mut clock, driver, || {
                    let step_ms = remaining_ms.min(runtime_cfg.tick_ms);
                    remaining_ms = remaining_ms.saturating_sub(step_ms);
                    step_ms
                })?
            }
            ScenarioStep::Tick { frames } => {
                run_frames(runtime_cfg, *frames, &mut clock, driver, || {
                    runtime_cfg.tick_ms
                })?
            }
            ScenarioStep::Scroll { y } => {
                driver.scroll(*y);
                None
            }
            ScenarioStep::Navigate { target } => driver.navigate(target).err(),
            ScenarioStep::Resize { width, height } => {
                driver.resize(*width, *height);
                None
            }
            ScenarioStep::ToggleTheme => {
                // Rejections are counted in the page summary
                driver.toggle_theme();
                None
            }
            ScenarioStep::PointerMove { x, y } => {
                driver.pointer_move(*x, *y);
                None
            }
            ScenarioStep::PointerDown => {
                driver.pointer_button(true);
                None
            }
            ScenarioStep::PointerUp => {
                driver.pointer_button(false);
                None
            }
            ScenarioStep::HoverLink { section, inside } => {
                driver.hover_link(*section, *inside);
                None
            }
            ScenarioStep::SubmitContact {
                name,
                email,
                subject,
                message,
            } => driver
                .submit_contact(ContactFields {
                    name: name.clone(),
                    email: email.clone(),
                    subject: subject.clone(),
                    message: message.clone(),
                })
                .err(),
            ScenarioStep::AssertRejectedToggles { count } => {
                let actual = driver.summary().rejected_toggles;
                (actual != *count)
                    .then(|| format!("expected {count} rejected toggles, got {actual}"))
            }
            assertion => failure_message(evaluate(assertion, &driver.snapshot())),
        };

        if let Some(message) = failure {
            let report =
                HeadlessReport::failed(step.name(), step_index, message, clock.frames, clock.ms)
                    .with_page(driver.summary());
            return Ok(RunOutcome::Failed { report });
        }
    }

    Ok(RunOutcome::Passed {
        report: HeadlessReport::passed(clock.frames, clock.ms).with_page(driver.summary()),
    })
}

fn evaluate(step: &ScenarioStep, snapshot: &DiagnosticsSnapshot) -> AssertionResult {
    match step {
        ScenarioStep::AssertMounted { section } => evaluate_assert_mounted(*section, snapshot),
        ScenarioStep::AssertNotMounted { section } => {
            evaluate_assert_not_mounted(*section, snapshot)
        }
        ScenarioStep::AssertVisible { section } => evaluate_assert_visible(*section, snapshot),
        ScenarioStep::AssertHidden { section } => evaluate_assert_hidden(*section, snapshot),
        ScenarioStep::AssertStage { stage } => evaluate_assert_stage(*stage, snapshot),
        ScenarioStep::AssertTheme { theme } => evaluate_assert_theme(*theme, snapshot),
        ScenarioStep::AssertRootClass { class } => {
            evaluate_assert_root_class(class, true, snapshot)
        }
        ScenarioStep::AssertNoRootClass { class } => {
            evaluate_assert_root_class(class, false, snapshot)
        }
        ScenarioStep::AssertTransitioning => evaluate_assert_transitioning(true, snapshot),
        ScenarioStep::AssertIdle => evaluate_assert_transitioning(false, snapshot),
        ScenarioStep::AssertNavbar { scrolled } => evaluate_assert_navbar(*scrolled, snapshot),
        ScenarioStep::AssertActiveSection { section } => {
            evaluate_assert_active_section(*section, snapshot)
        }
        ScenarioStep::AssertCursor { mode } => evaluate_assert_cursor(*mode, snapshot),
        ScenarioStep::AssertContact { state } => evaluate_assert_contact(*state, snapshot),
        _ => AssertionResult::Passed,
    }
}

fn failure_message(result: AssertionResult) -> Option<String> {
    match result {
        AssertionResult::Passed => None,
        AssertionResult::Failed { code, message } => Some(format!("{code}: {message}")),
    }
}

fn run_frames<D, A>(
    runtime_cfg: HeadlessRunConfig,
    frames: u32,
    clock: &mut Clock,
    driver: &mut D,
    mut advance_ms: A,
) -> Result<Option<String>>
where
    D: ScenarioDriver,
    A: FnMut() -> u64,
{
    if clock.frames.saturating_add(frames as u64) > runtime_cfg.max_frames {
        return Ok(Some(format!(
            "frame budget of {} exceeded",
            runtime_cfg.max_frames
        )));
    }

    HeadlessRuntime::run(runtime_cfg, frames, |_| {
        let ms = advance_ms();
        driver.advance(ms);
        clock.frames = clock.frames.saturating_add(1);
        clock.ms = clock.ms.saturating_add(ms);
    })?;

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FolioConfig;
    use crate::stage::LoadingStage;
    use folio_core::scheduler::EventLoop;
    use folio_theme::{FixedAmbient, MemoryBackend, PreferenceStore};

    fn page() -> Page {
        let event_loop = EventLoop::new();
        Page::new(
            &event_loop,
            FolioConfig::default(),
            PreferenceStore::new(MemoryBackend::new()),
            &FixedAmbient::dark(),
        )
    }

    #[test]
    fn test_passing_scenario_reports_summary() {
        let mut page = page();
        let outcome = run_scenario(
            r#"{ "steps": [
                { "type": "tick", "frames": 1 },
                { "type": "assert_stage", "stage": "high" },
                { "type": "assert_not_mounted", "section": "projects" },
                { "type": "wait", "ms": 1000 },
                { "type": "assert_mounted", "section": "projects" }
            ] }"#,
            HeadlessRunConfig::default(),
            &mut page,
        )
        .unwrap();

        assert!(!outcome.is_failed());
        let report = outcome.report();
        assert_eq!(report.elapsed_ms, 1016);
        assert_eq!(report.page.as_ref().map(|p| p.stage), Some(LoadingStage::Low));
    }

    #[test]
    fn test_failed_assertion_stops_run() {
        let mut page = page();
        let outcome = run_scenario(
            r#"{ "steps": [
                { "type": "assert_mounted", "section": "contact" },
                { "type": "wait", "ms": 1000 }
            ] }"#,
            HeadlessRunConfig::default(),
            &mut page,
        )
        .unwrap();

        assert!(outcome.is_failed());
        let report = outcome.report();
        assert_eq!(report.failed_step_index, Some(0));
        assert_eq!(report.assertion.as_deref(), Some("assert_mounted"));
        assert_eq!(report.elapsed_frames, 0);
    }

    #[test]
    fn test_unknown_anchor_fails_step() {
        let mut page = page();
        let outcome = run_scenario(
            r##"{ "steps": [{ "type": "navigate", "target": "#blog" }] }"##,
            HeadlessRunConfig::default(),
            &mut page,
        )
        .unwrap();
        assert!(outcome.is_failed());
        assert!(outcome.report().message.as_deref().unwrap().contains("blog"));
    }

    #[test]
    fn test_contact_before_mount_fails_step() {
        let mut page = page();
        let outcome = run_scenario(
            r#"{ "steps": [
                { "type": "submit_contact", "name": "Ada", "email": "ada@example.com",
                  "subject": "Hi", "message": "Hello" }
            ] }"#,
            HeadlessRunConfig::default(),
            &mut page,
        )
        .unwrap();
        assert!(outcome.is_failed());
        assert!(outcome.report().message.as_deref().unwrap().contains("not mounted"));
    }

    #[test]
    fn test_pointer_and_contact_steps() {
        let mut page = page();
        let outcome = run_scenario(
            r#"{ "steps": [
                { "type": "wait", "ms": 1000 },
                { "type": "hover_link", "section": "contact" },
                { "type": "assert_cursor", "mode": "hover" },
                { "type": "pointer_down" },
                { "type": "assert_cursor", "mode": "pressed" },
                { "type": "pointer_up" },
                { "type": "hover_link", "section": "contact", "inside": false },
                { "type": "assert_cursor", "mode": "rest" },
                { "type": "submit_contact", "name": "Ada", "email": "ada@example.com",
                  "subject": "Hi", "message": "Hello" },
                { "type": "assert_contact", "state": "submitting" },
                { "type": "wait", "ms": 1500 },
                { "type": "assert_contact", "state": "submitted" },
                { "type": "wait", "ms": 3000 },
                { "type": "assert_contact", "state": "editing" }
            ] }"#,
            HeadlessRunConfig::default(),
            &mut page,
        )
        .unwrap();

        assert!(!outcome.is_failed(), "{:?}", outcome.report());
        let summary = outcome.report().page.clone().unwrap();
        assert_eq!(summary.contact_sent, 1);
        assert!(summary.environment_changes >= 3);
    }

    #[test]
    fn test_frame_budget() {
        let mut page = page();
        let cfg = HeadlessRunConfig {
            tick_ms: 16,
            max_frames: 10,
        };
        let outcome =
            run_scenario(r#"{ "steps": [{ "type": "tick", "frames": 11 }] }"#, cfg, &mut page)
                .unwrap();
        assert!(outcome.is_failed());
    }
}
