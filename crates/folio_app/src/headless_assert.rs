//! Assertion helpers for headless page scenarios.

use crate::contact::FormState;
use crate::cursor::CursorMode;
use crate::loading::LoadingPhase;
use crate::readiness::ReadinessOutcome;
use crate::stage::LoadingStage;
use folio_layout::SectionId;
use folio_theme::{ColorScheme, TransitionPhase};
use serde::Serialize;
use std::collections::BTreeMap;

/// Snapshot of page-observable state used for headless assertions.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsSnapshot {
    pub now_ms: u64,
    pub frame: u64,
    pub stage: LoadingStage,
    pub scheme: ColorScheme,
    pub phase: TransitionPhase,
    pub transitioning: bool,
    pub overlay_opacity: f32,
    pub root_classes: Vec<String>,
    /// Environment changes applied to the root surface so far
    pub applied_changes: u64,
    /// Page background as presented, overlay included
    pub background: String,
    pub scroll_y: f32,
    pub navbar_scrolled: bool,
    pub active_section: Option<SectionId>,
    pub sections: BTreeMap<SectionId, SectionSnapshot>,
    pub loading: Option<LoadingPhase>,
    pub readiness: Option<ReadinessOutcome>,
    pub hero_text: String,
    /// `None` when the native cursor is in use
    pub cursor: Option<CursorMode>,
    pub contact: FormState,
}

/// A mounted section as rendered.
#[derive(Debug, Clone, Serialize)]
pub struct SectionSnapshot {
    pub revealed: bool,
    pub opacity: f32,
    pub transform: String,
    pub mounted_at_ms: u64,
}

/// Assertion result with structured failure details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionResult {
    Passed,
    Failed { code: String, message: String },
}

impl AssertionResult {
    fn failed(code: &str, message: String) -> Self {
        AssertionResult::Failed {
            code: code.to_string(),
            message,
        }
    }

    fn check(ok: bool, code: &str, message: impl FnOnce() -> String) -> Self {
        if ok {
            AssertionResult::Passed
        } else {
            Self::failed(code, message())
        }
    }
}

pub fn evaluate_assert_mounted(section: SectionId, snapshot: &DiagnosticsSnapshot) -> AssertionResult {
    AssertionResult::check(
        snapshot.sections.contains_key(&section),
        "not_mounted",
        || format!("{section}: not mounted at stage {}", snapshot.stage),
    )
}

pub fn evaluate_assert_not_mounted(
    section: SectionId,
    snapshot: &DiagnosticsSnapshot,
) -> AssertionResult {
    AssertionResult::check(
        !snapshot.sections.contains_key(&section),
        "unexpectedly_mounted",
        || format!("{section}: mounted at stage {}", snapshot.stage),
    )
}

pub fn evaluate_assert_visible(section: SectionId, snapshot: &DiagnosticsSnapshot) -> AssertionResult {
    let Some(entry) = snapshot.sections.get(&section) else {
        return AssertionResult::failed("not_mounted", format!("{section}: not mounted"));
    };
    AssertionResult::check(entry.revealed, "not_revealed", || {
        format!("{section}: still hidden ({})", entry.transform)
    })
}

/// Hidden means not revealed; unmounted sections count as hidden.
pub fn evaluate_assert_hidden(section: SectionId, snapshot: &DiagnosticsSnapshot) -> AssertionResult {
    let revealed = snapshot
        .sections
        .get(&section)
        .is_some_and(|entry| entry.revealed);
    AssertionResult::check(!revealed, "revealed", || {
        format!("{section}: revealed, expected hidden")
    })
}

pub fn evaluate_assert_stage(expected: LoadingStage, snapshot: &DiagnosticsSnapshot) -> AssertionResult {
    AssertionResult::check(snapshot.stage == expected, "stage_mismatch", || {
        format!("expected stage {expected}, got {}", snapshot.stage)
    })
}

pub fn evaluate_assert_theme(expected: ColorScheme, snapshot: &DiagnosticsSnapshot) -> AssertionResult {
    AssertionResult::check(snapshot.scheme == expected, "theme_mismatch", || {
        format!("expected theme {expected}, got {}", snapshot.scheme)
    })
}

pub fn evaluate_assert_root_class(
    class: &str,
    present: bool,
    snapshot: &DiagnosticsSnapshot,
) -> AssertionResult {
    let has = snapshot.root_classes.iter().any(|c| c == class);
    if present {
        AssertionResult::check(has, "missing_root_class", || {
            format!("root class '{class}' not set (have {:?})", snapshot.root_classes)
        })
    } else {
        AssertionResult::check(!has, "unexpected_root_class", || {
            format!("root class '{class}' is set")
        })
    }
}

pub fn evaluate_assert_transitioning(
    expected: bool,
    snapshot: &DiagnosticsSnapshot,
) -> AssertionResult {
    if expected {
        AssertionResult::check(snapshot.transitioning, "idle", || {
            "expected a theme transition in flight".to_string()
        })
    } else {
        AssertionResult::check(!snapshot.transitioning, "transitioning", || {
            format!("theme transition still in phase {:?}", snapshot.phase)
        })
    }
}

pub fn evaluate_assert_navbar(scrolled: bool, snapshot: &DiagnosticsSnapshot) -> AssertionResult {
    AssertionResult::check(snapshot.navbar_scrolled == scrolled, "navbar_mismatch", || {
        format!(
            "expected navbar scrolled={scrolled} at scroll {}px",
            snapshot.scroll_y
        )
    })
}

pub fn evaluate_assert_active_section(
    expected: SectionId,
    snapshot: &DiagnosticsSnapshot,
) -> AssertionResult {
    AssertionResult::check(
        snapshot.active_section == Some(expected),
        "active_section_mismatch",
        || {
            format!(
                "expected active section {expected} at scroll {}px, got {:?}",
                snapshot.scroll_y, snapshot.active_section
            )
        },
    )
}

pub fn evaluate_assert_cursor(expected: CursorMode, snapshot: &DiagnosticsSnapshot) -> AssertionResult {
    match snapshot.cursor {
        None => AssertionResult::failed("native_cursor", "custom cursor is not installed".into()),
        Some(mode) => AssertionResult::check(mode == expected, "cursor_mismatch", || {
            format!("expected cursor {expected}, got {mode}")
        }),
    }
}

pub fn evaluate_assert_contact(expected: FormState, snapshot: &DiagnosticsSnapshot) -> AssertionResult {
    AssertionResult::check(snapshot.contact == expected, "contact_mismatch", || {
        format!("expected contact form {expected}, got {}", snapshot.contact)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> DiagnosticsSnapshot {
        let mut sections = BTreeMap::new();
        sections.insert(
            SectionId::Hero,
            SectionSnapshot {
                revealed: true,
                opacity: 1.0,
                transform: "translate3d(0, 0, 0)".to_string(),
                mounted_at_ms: 0,
            },
        );
        sections.insert(
            SectionId::About,
            SectionSnapshot {
                revealed: false,
                opacity: 0.0,
                transform: "translateY(50px)".to_string(),
                mounted_at_ms: 16,
            },
        );
        DiagnosticsSnapshot {
            now_ms: 32,
            frame: 2,
            stage: LoadingStage::High,
            scheme: ColorScheme::Dark,
            phase: TransitionPhase::Idle,
            transitioning: false,
            overlay_opacity: 0.0,
            root_classes: vec!["dark".to_string()],
            applied_changes: 1,
            background: "#0f172a".to_string(),
            scroll_y: 0.0,
            navbar_scrolled: false,
            active_section: Some(SectionId::Hero),
            sections,
            loading: None,
            readiness: None,
            hero_text: String::new(),
            cursor: Some(CursorMode::Rest),
            contact: FormState::Editing,
        }
    }

    #[test]
    fn test_mount_assertions() {
        let snap = snapshot();
        assert_eq!(evaluate_assert_mounted(SectionId::About, &snap), AssertionResult::Passed);
        assert!(matches!(
            evaluate_assert_mounted(SectionId::Skills, &snap),
            AssertionResult::Failed { code, .. } if code == "not_mounted"
        ));
        assert_eq!(
            evaluate_assert_not_mounted(SectionId::Skills, &snap),
            AssertionResult::Passed
        );
    }

    #[test]
    fn test_visibility_assertions() {
        let snap = snapshot();
        assert_eq!(evaluate_assert_visible(SectionId::Hero, &snap), AssertionResult::Passed);
        assert_eq!(evaluate_assert_hidden(SectionId::About, &snap), AssertionResult::Passed);
        assert_eq!(evaluate_assert_hidden(SectionId::Contact, &snap), AssertionResult::Passed);
        assert!(matches!(
            evaluate_assert_visible(SectionId::About, &snap),
            AssertionResult::Failed { .. }
        ));
    }

    #[test]
    fn test_root_class_and_theme() {
        let snap = snapshot();
        assert_eq!(
            evaluate_assert_root_class("dark", true, &snap),
            AssertionResult::Passed
        );
        assert!(matches!(
            evaluate_assert_root_class("dark", false, &snap),
            AssertionResult::Failed { code, .. } if code == "unexpected_root_class"
        ));
        assert_eq!(
            evaluate_assert_theme(ColorScheme::Dark, &snap),
            AssertionResult::Passed
        );
        assert_eq!(
            evaluate_assert_stage(LoadingStage::High, &snap),
            AssertionResult::Passed
        );
        assert_eq!(evaluate_assert_transitioning(false, &snap), AssertionResult::Passed);
    }

    #[test]
    fn test_navbar_cursor_and_contact() {
        let mut snap = snapshot();
        assert_eq!(
            evaluate_assert_active_section(SectionId::Hero, &snap),
            AssertionResult::Passed
        );
        assert!(matches!(
            evaluate_assert_active_section(SectionId::About, &snap),
            AssertionResult::Failed { code, .. } if code == "active_section_mismatch"
        ));
        assert_eq!(evaluate_assert_cursor(CursorMode::Rest, &snap), AssertionResult::Passed);
        assert_eq!(
            evaluate_assert_contact(FormState::Editing, &snap),
            AssertionResult::Passed
        );

        snap.cursor = None;
        assert!(matches!(
            evaluate_assert_cursor(CursorMode::Rest, &snap),
            AssertionResult::Failed { code, .. } if code == "native_cursor"
        ));
    }
}
