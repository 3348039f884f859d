use folio_app::{
    run_loaded_scenario, FolioConfig, HeadlessRunConfig, HeadlessScenario, Page, ReportStatus,
};
use folio_core::scheduler::EventLoop;
use folio_theme::{ColorScheme, FixedAmbient, MemoryBackend, PreferenceStore};
use std::path::Path;

fn scenario(name: &str) -> HeadlessScenario {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../scenarios")
        .join(name);
    HeadlessScenario::from_path(&path).unwrap()
}

fn page(backend: MemoryBackend) -> Page {
    let event_loop = EventLoop::new();
    Page::new(
        &event_loop,
        FolioConfig::default(),
        PreferenceStore::new(backend),
        &FixedAmbient::dark(),
    )
}

#[test]
fn progressive_reveal_scenario_passes() {
    let mut page = page(MemoryBackend::new());
    let outcome = run_loaded_scenario(
        &scenario("progressive_reveal.json"),
        HeadlessRunConfig::default(),
        &mut page,
    )
    .unwrap();

    let report = outcome.report();
    assert_eq!(report.status, ReportStatus::Passed, "{:?}", report.message);
    assert_eq!(report.page.as_ref().map(|p| p.mounted), Some(6));
}

#[test]
fn theme_toggle_scenario_passes() {
    let backend = MemoryBackend::new();
    let mut page = page(backend.clone());
    let outcome = run_loaded_scenario(
        &scenario("theme_toggle.json"),
        HeadlessRunConfig::default(),
        &mut page,
    )
    .unwrap();

    let report = outcome.report();
    assert_eq!(report.status, ReportStatus::Passed, "{:?}", report.message);
    let summary = report.page.clone().unwrap();
    assert_eq!(summary.theme, ColorScheme::Dark);
    assert_eq!(summary.transitions_completed, 2);
    assert_eq!(summary.rejected_toggles, 1);
    assert_eq!(backend.get("theme").as_deref(), Some("dark"));
}

#[test]
fn contact_and_cursor_scenario_passes() {
    let mut page = page(MemoryBackend::new());
    let outcome = run_loaded_scenario(
        &scenario("contact_and_cursor.json"),
        HeadlessRunConfig::default(),
        &mut page,
    )
    .unwrap();

    let report = outcome.report();
    assert_eq!(report.status, ReportStatus::Passed, "{:?}", report.message);
    assert_eq!(report.page.as_ref().map(|p| p.contact_sent), Some(1));
}
