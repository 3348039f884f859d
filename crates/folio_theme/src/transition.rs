//! Theme transition sequencing
//!
//! A toggle plays a cover/commit/reveal cycle:
//!
//! ```text
//! Idle --Toggle--> CoveringIn --CoverOpaque--> Committing --Committed--> Revealing --RevealComplete--> Idle
//! ```
//!
//! - **CoveringIn**: a full-viewport overlay in the target background fades
//!   in while theme-sensitive content fades out.
//! - **Committing**: entered by a timer once the cover is opaque. The
//!   preference is persisted, the scheme swapped and the `dark` root class
//!   toggled, all behind the opaque overlay.
//! - **Revealing**: the overlay fades out and content fades back in as a
//!   staggered cascade.
//! - Back to **Idle** after the cascade settles and the overlay is removed.
//!
//! Only one cycle runs at a time. A toggle while the sequencer is not idle is
//! rejected outright; nothing is queued.
//!
//! Every timer belongs to the sequencer's [`TaskScope`], so
//! [`ThemeTransitionSequencer::teardown`] (or dropping the sequencer) stops
//! the cycle with no further side effects.

use crate::palette::Palette;
use crate::platform::AmbientPreference;
use crate::scheme::ColorScheme;
use crate::store::PreferenceStore;
use folio_animation::{Easing, Timeline, Tween};
use folio_core::environment::SharedEnvironment;
use folio_core::fsm::StateMachine;
use folio_core::scheduler::{EventLoop, TaskScope};
use folio_core::Color;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Root class that switches theme-dependent styling
pub const DARK_CLASS: &str = "dark";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPhase {
    Idle,
    CoveringIn,
    Committing,
    Revealing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TransitionEvent {
    Toggle,
    CoverOpaque,
    Committed,
    RevealComplete,
}

/// Result of a toggle request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// A cycle toward `target` started
    Accepted { target: ColorScheme },
    /// A cycle was already running; nothing changed
    Rejected,
}

impl ToggleOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ToggleOutcome::Accepted { .. })
    }
}

/// Durations of one cycle, in milliseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionTimings {
    /// Overlay fade-in; the commit fires when it ends
    pub cover_ms: u64,
    /// Hold on the opaque cover after committing
    pub commit_pause_ms: u64,
    /// Overlay fade-out
    pub reveal_ms: u64,
    /// Fade-in of each content element
    pub content_fade_ms: u64,
    /// Delay before the first content element fades in
    pub stagger_base_ms: u64,
    /// Additional delay per content element index
    pub stagger_ms: u64,
    /// Wait after the cascade before the overlay is removed
    pub cleanup_ms: u64,
}

impl Default for TransitionTimings {
    fn default() -> Self {
        Self {
            cover_ms: 400,
            commit_pause_ms: 100,
            reveal_ms: 400,
            content_fade_ms: 400,
            stagger_base_ms: 200,
            stagger_ms: 50,
            cleanup_ms: 100,
        }
    }
}

impl TransitionTimings {
    /// Time from entering Revealing until the cycle completes
    pub fn reveal_span_ms(&self, content_count: usize) -> u64 {
        let cascade = if content_count == 0 {
            0
        } else {
            self.stagger_base_ms
                + self.stagger_ms * (content_count as u64 - 1)
                + self.content_fade_ms
        };
        self.reveal_ms.max(cascade) + self.cleanup_ms
    }

    /// Wall-clock length of a full cycle
    pub fn cycle_ms(&self, content_count: usize) -> u64 {
        self.cover_ms + self.commit_pause_ms + self.reveal_span_ms(content_count)
    }
}

/// A recorded phase change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChange {
    pub phase: TransitionPhase,
    pub at_ms: u64,
}

#[derive(Clone, Copy, Debug)]
struct Overlay {
    color: Color,
    opacity: Tween,
}

#[derive(Clone, Debug)]
enum ContentFade {
    Resting,
    FadingOut(Tween),
    Hidden,
    Cascade { timeline: Timeline, started_ms: u64 },
}

struct SequencerState {
    machine: StateMachine<TransitionPhase, TransitionEvent>,
    scheme: ColorScheme,
    target: Option<ColorScheme>,
    store: PreferenceStore,
    environment: SharedEnvironment,
    timings: TransitionTimings,
    overlay: Option<Overlay>,
    content: ContentFade,
    content_count: usize,
    completed: u32,
    log: Vec<PhaseChange>,
    torn_down: bool,
    scope: TaskScope,
}

impl SequencerState {
    fn now(&self) -> u64 {
        self.scope.event_loop().now_ms()
    }

    fn send(&mut self, event: TransitionEvent) -> bool {
        let Some(phase) = self.machine.send(event) else {
            return false;
        };
        let at_ms = self.now();
        tracing::debug!(?phase, at_ms, target = ?self.target, "theme transition phase");
        self.log.push(PhaseChange { phase, at_ms });
        true
    }
}

/// Runs theme toggles as cover/commit/reveal cycles
pub struct ThemeTransitionSequencer {
    state: Rc<RefCell<SequencerState>>,
}

impl ThemeTransitionSequencer {
    /// Resolve the initial scheme from `store` and apply its root class
    pub fn new(
        event_loop: &EventLoop,
        mut store: PreferenceStore,
        ambient: &dyn AmbientPreference,
        environment: SharedEnvironment,
        timings: TransitionTimings,
    ) -> Self {
        let scheme = store.read_initial(ambient);
        environment
            .borrow_mut()
            .set_root_class(DARK_CLASS, scheme.is_dark());

        let machine = StateMachine::builder(TransitionPhase::Idle)
            .on(
                TransitionPhase::Idle,
                TransitionEvent::Toggle,
                TransitionPhase::CoveringIn,
            )
            .on(
                TransitionPhase::CoveringIn,
                TransitionEvent::CoverOpaque,
                TransitionPhase::Committing,
            )
            .on(
                TransitionPhase::Committing,
                TransitionEvent::Committed,
                TransitionPhase::Revealing,
            )
            .on(
                TransitionPhase::Revealing,
                TransitionEvent::RevealComplete,
                TransitionPhase::Idle,
            )
            .build();

        Self {
            state: Rc::new(RefCell::new(SequencerState {
                machine,
                scheme,
                target: None,
                store,
                environment,
                timings,
                overlay: None,
                content: ContentFade::Resting,
                content_count: 0,
                completed: 0,
                log: Vec::new(),
                torn_down: false,
                scope: TaskScope::new(event_loop),
            })),
        }
    }

    /// Request a switch to the other scheme
    pub fn toggle(&self) -> ToggleOutcome {
        let mut state = self.state.borrow_mut();
        if state.torn_down || !state.machine.can_send(TransitionEvent::Toggle) {
            return ToggleOutcome::Rejected;
        }

        let target = state.scheme.toggle();
        let now = state.now();
        let timings = state.timings;

        state.target = Some(target);
        state.send(TransitionEvent::Toggle);
        state.overlay = Some(Overlay {
            color: Palette::for_scheme(target).background,
            opacity: Tween::new(0.0, 1.0, now, timings.cover_ms).with_easing(Easing::EaseInOut),
        });
        state.content = ContentFade::FadingOut(
            Tween::new(1.0, 0.0, now, timings.cover_ms).with_easing(Easing::EaseInOut),
        );

        let weak = Rc::downgrade(&self.state);
        state
            .scope
            .set_timeout(timings.cover_ms, move || on_cover_opaque(&weak));

        ToggleOutcome::Accepted { target }
    }

    /// Number of theme-sensitive content elements, indexed from 0
    pub fn set_content_count(&self, count: usize) {
        self.state.borrow_mut().content_count = count;
    }

    pub fn content_count(&self) -> usize {
        self.state.borrow().content_count
    }

    pub fn phase(&self) -> TransitionPhase {
        self.state.borrow().machine.current_state()
    }

    /// The scheme currently applied to the page
    pub fn scheme(&self) -> ColorScheme {
        self.state.borrow().scheme
    }

    /// Target of the running cycle
    pub fn target(&self) -> Option<ColorScheme> {
        self.state.borrow().target
    }

    pub fn is_torn_down(&self) -> bool {
        self.state.borrow().torn_down
    }

    /// The re-entrancy guard
    pub fn is_transitioning(&self) -> bool {
        !self.state.borrow().machine.is_in(TransitionPhase::Idle)
    }

    pub fn overlay_mounted(&self) -> bool {
        self.state.borrow().overlay.is_some()
    }

    pub fn overlay_color(&self) -> Option<Color> {
        self.state.borrow().overlay.map(|o| o.color)
    }

    /// Page palette as seen through the overlay now
    pub fn presented_palette(&self) -> Palette {
        let state = self.state.borrow();
        let base = Palette::for_scheme(state.scheme);
        match (state.overlay, state.target) {
            (Some(overlay), Some(target)) => base.lerp(
                &Palette::for_scheme(target),
                overlay.opacity.value_at(state.now()),
            ),
            _ => base,
        }
    }

    /// Overlay opacity now; 0 when no overlay is mounted
    pub fn overlay_opacity(&self) -> f32 {
        let state = self.state.borrow();
        let now = state.now();
        state
            .overlay
            .map(|o| o.opacity.value_at(now))
            .unwrap_or(0.0)
    }

    /// Opacity of the `index`-th theme-sensitive element now
    pub fn content_opacity(&self, index: usize) -> f32 {
        let state = self.state.borrow();
        let now = state.now();
        match &state.content {
            ContentFade::Resting => 1.0,
            ContentFade::FadingOut(tween) => tween.value_at(now),
            ContentFade::Hidden => 0.0,
            ContentFade::Cascade {
                timeline,
                started_ms,
            } => timeline
                .value_at_index(index, now.saturating_sub(*started_ms))
                // Mounted after the cascade began: shown directly
                .unwrap_or(1.0),
        }
    }

    /// Number of cycles that ran to completion
    pub fn completed(&self) -> u32 {
        self.state.borrow().completed
    }

    /// The persisted preference as the backend currently reports it
    pub fn persisted(&self) -> Option<ColorScheme> {
        self.state.borrow().store.persisted()
    }

    pub fn timings(&self) -> TransitionTimings {
        self.state.borrow().timings
    }

    /// Every phase entered so far, with its time
    pub fn phase_log(&self) -> Vec<PhaseChange> {
        self.state.borrow().log.clone()
    }

    /// Cancel the running cycle and remove the overlay
    ///
    /// A cycle torn down before its commit leaves scheme, preference and root
    /// class untouched. Later toggles are rejected.
    pub fn teardown(&self) {
        let mut state = self.state.borrow_mut();
        state.torn_down = true;
        let cancelled = state.scope.cancel_all();
        if !state.machine.is_in(TransitionPhase::Idle) {
            tracing::debug!(
                phase = ?state.machine.current_state(),
                cancelled,
                "theme transition torn down"
            );
        }
        state.machine.reset(TransitionPhase::Idle);
        state.overlay = None;
        state.content = ContentFade::Resting;
        state.target = None;
    }
}

impl Drop for ThemeTransitionSequencer {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for ThemeTransitionSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeTransitionSequencer")
            .field("phase", &self.phase())
            .field("scheme", &self.scheme())
            .finish()
    }
}

fn on_cover_opaque(weak: &Weak<RefCell<SequencerState>>) {
    let Some(rc) = weak.upgrade() else {
        return;
    };
    let mut state = rc.borrow_mut();
    if !state.send(TransitionEvent::CoverOpaque) {
        return;
    }
    let Some(target) = state.target else {
        return;
    };

    let now = state.now();
    if let Some(overlay) = state.overlay.as_mut() {
        overlay.opacity = Tween::settled(1.0, now);
    }
    state.content = ContentFade::Hidden;

    state.store.commit(target);
    state.scheme = target;
    state
        .environment
        .borrow_mut()
        .set_root_class(DARK_CLASS, target.is_dark());

    let pause = state.timings.commit_pause_ms;
    let weak = weak.clone();
    state.scope.set_timeout(pause, move || on_committed(&weak));
}

fn on_committed(weak: &Weak<RefCell<SequencerState>>) {
    let Some(rc) = weak.upgrade() else {
        return;
    };
    let mut state = rc.borrow_mut();
    if !state.send(TransitionEvent::Committed) {
        return;
    }

    let now = state.now();
    let timings = state.timings;
    let count = state.content_count;

    if let Some(overlay) = state.overlay.as_mut() {
        overlay.opacity =
            Tween::new(1.0, 0.0, now, timings.reveal_ms).with_easing(Easing::EaseInOut);
    }
    state.content = ContentFade::Cascade {
        timeline: Timeline::stagger(
            count,
            timings.stagger_base_ms,
            timings.stagger_ms,
            timings.content_fade_ms,
            0.0,
            1.0,
            Easing::EaseOut,
        ),
        started_ms: now,
    };

    let weak = weak.clone();
    state
        .scope
        .set_timeout(timings.reveal_span_ms(count), move || on_reveal_complete(&weak));
}

fn on_reveal_complete(weak: &Weak<RefCell<SequencerState>>) {
    let Some(rc) = weak.upgrade() else {
        return;
    };
    let mut state = rc.borrow_mut();
    if !state.send(TransitionEvent::RevealComplete) {
        return;
    }
    state.overlay = None;
    state.content = ContentFade::Resting;
    state.target = None;
    state.completed += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::FixedAmbient;
    use crate::store::MemoryBackend;
    use folio_core::environment::UiEnvironment;

    fn sequencer(
        event_loop: &EventLoop,
        backend: MemoryBackend,
    ) -> (ThemeTransitionSequencer, SharedEnvironment) {
        let environment = UiEnvironment::shared();
        let sequencer = ThemeTransitionSequencer::new(
            event_loop,
            PreferenceStore::new(backend),
            &FixedAmbient::dark(),
            environment.clone(),
            TransitionTimings::default(),
        );
        (sequencer, environment)
    }

    #[test]
    fn test_initial_scheme_applies_root_class() {
        let event_loop = EventLoop::with_frame_interval(10);
        let (seq, env) = sequencer(&event_loop, MemoryBackend::new());
        assert_eq!(seq.scheme(), ColorScheme::Dark);
        assert!(env.borrow().has_root_class(DARK_CLASS));
        assert_eq!(seq.phase(), TransitionPhase::Idle);
        assert!(!seq.overlay_mounted());
    }

    #[test]
    fn test_full_cycle_phase_order() {
        let event_loop = EventLoop::with_frame_interval(10);
        let backend = MemoryBackend::new();
        let (seq, env) = sequencer(&event_loop, backend.clone());
        seq.set_content_count(6);

        assert_eq!(
            seq.toggle(),
            ToggleOutcome::Accepted {
                target: ColorScheme::Light
            }
        );
        assert_eq!(seq.phase(), TransitionPhase::CoveringIn);
        assert_eq!(seq.overlay_color(), Some(Palette::light().background));

        event_loop.advance(400);
        assert_eq!(seq.phase(), TransitionPhase::Committing);
        assert_eq!(seq.overlay_opacity(), 1.0);
        assert_eq!(backend.get("theme").as_deref(), Some("light"));
        assert!(!env.borrow().has_root_class(DARK_CLASS));

        event_loop.advance(100);
        assert_eq!(seq.phase(), TransitionPhase::Revealing);

        event_loop.advance(TransitionTimings::default().reveal_span_ms(6));
        assert_eq!(seq.phase(), TransitionPhase::Idle);
        assert!(!seq.overlay_mounted());
        assert!(!seq.is_transitioning());
        assert_eq!(seq.completed(), 1);

        let phases: Vec<_> = seq.phase_log().iter().map(|c| c.phase).collect();
        assert_eq!(
            phases,
            vec![
                TransitionPhase::CoveringIn,
                TransitionPhase::Committing,
                TransitionPhase::Revealing,
                TransitionPhase::Idle,
            ]
        );
    }

    #[test]
    fn test_reentrant_toggle_is_rejected() {
        let event_loop = EventLoop::with_frame_interval(10);
        let (seq, _env) = sequencer(&event_loop, MemoryBackend::new());

        assert!(seq.toggle().is_accepted());
        event_loop.advance(50);
        assert_eq!(seq.toggle(), ToggleOutcome::Rejected);
        assert_eq!(seq.target(), Some(ColorScheme::Light));

        event_loop.advance(TransitionTimings::default().cycle_ms(0));
        assert_eq!(seq.scheme(), ColorScheme::Light);
        assert_eq!(seq.completed(), 1);
        assert!(seq.toggle().is_accepted());
    }

    #[test]
    fn test_old_theme_visible_until_cover_is_opaque() {
        let event_loop = EventLoop::with_frame_interval(10);
        let backend = MemoryBackend::with_entry("theme", "dark");
        let (seq, env) = sequencer(&event_loop, backend.clone());

        seq.toggle();
        event_loop.advance(390);
        assert_eq!(seq.phase(), TransitionPhase::CoveringIn);
        assert!(seq.overlay_opacity() < 1.0);
        assert_eq!(backend.get("theme").as_deref(), Some("dark"));
        assert!(env.borrow().has_root_class(DARK_CLASS));
        assert_eq!(seq.scheme(), ColorScheme::Dark);
    }

    #[test]
    fn test_content_cascade_is_staggered() {
        let event_loop = EventLoop::with_frame_interval(10);
        let (seq, _env) = sequencer(&event_loop, MemoryBackend::new());
        seq.set_content_count(3);

        seq.toggle();
        event_loop.advance(200);
        let mid = seq.content_opacity(0);
        assert!(mid > 0.0 && mid < 1.0);

        event_loop.advance(300);
        assert_eq!(seq.phase(), TransitionPhase::Revealing);
        assert_eq!(seq.content_opacity(0), 0.0);

        // 250ms into the reveal: element 0 started at 200, element 2 starts at 300
        event_loop.advance(250);
        assert!(seq.content_opacity(0) > 0.0);
        assert_eq!(seq.content_opacity(2), 0.0);
        assert!(seq.content_opacity(0) > seq.content_opacity(1));
    }

    #[test]
    fn test_teardown_before_commit_has_no_side_effects() {
        let event_loop = EventLoop::with_frame_interval(10);
        let backend = MemoryBackend::new();
        let (seq, env) = sequencer(&event_loop, backend.clone());
        env.borrow_mut().take_changes();

        seq.toggle();
        event_loop.advance(200);
        seq.teardown();

        assert!(!seq.overlay_mounted());
        assert_eq!(event_loop.pending(), 0);
        event_loop.advance(2000);
        assert_eq!(seq.scheme(), ColorScheme::Dark);
        assert_eq!(backend.get("theme"), None);
        assert!(env.borrow_mut().take_changes().is_empty());
    }

    #[test]
    fn test_presented_palette_blends_under_cover() {
        let event_loop = EventLoop::with_frame_interval(10);
        let (seq, _env) = sequencer(&event_loop, MemoryBackend::new());
        assert_eq!(seq.presented_palette(), Palette::dark());

        seq.toggle();
        event_loop.advance(200);
        let mid = seq.presented_palette().background;
        assert_ne!(mid, Palette::dark().background);
        assert_ne!(mid, Palette::light().background);

        event_loop.advance(200);
        assert_eq!(seq.presented_palette(), Palette::light());
        event_loop.advance(2000);
        assert_eq!(seq.presented_palette(), Palette::light());
    }

    #[test]
    fn test_toggle_after_teardown_is_rejected() {
        let event_loop = EventLoop::with_frame_interval(10);
        let backend = MemoryBackend::new();
        let (seq, env) = sequencer(&event_loop, backend.clone());
        seq.teardown();
        env.borrow_mut().take_changes();

        assert_eq!(seq.toggle(), ToggleOutcome::Rejected);
        assert!(seq.is_torn_down());
        assert_eq!(event_loop.pending(), 0);
        event_loop.advance(2000);
        assert_eq!(seq.scheme(), ColorScheme::Dark);
        assert!(env.borrow().has_root_class(DARK_CLASS));
        assert_eq!(backend.get("theme"), None);
        assert!(env.borrow_mut().take_changes().is_empty());
    }

    #[test]
    fn test_drop_cancels_pending_timers() {
        let event_loop = EventLoop::with_frame_interval(10);
        let (seq, env) = sequencer(&event_loop, MemoryBackend::new());
        seq.toggle();
        assert_eq!(event_loop.pending(), 1);
        drop(seq);
        assert_eq!(event_loop.pending(), 0);
        event_loop.advance(1000);
        assert!(env.borrow().has_root_class(DARK_CLASS));
    }

    #[test]
    fn test_cycle_length_in_expected_range() {
        let timings = TransitionTimings::default();
        assert_eq!(timings.cycle_ms(0), 400 + 100 + 400 + 100);
        assert_eq!(timings.cycle_ms(6), 400 + 100 + (200 + 250 + 400) + 100);
        assert!((1200..=1600).contains(&timings.cycle_ms(6)));
    }
}
