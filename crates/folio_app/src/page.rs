//! Page composition
//!
//! [`Page`] wires the runtime pieces into one portfolio page:
//!
//! - the [`StageScheduler`] opens mount gates, and each section mounts the
//!   first time its gate is open (mounting is latched);
//! - every mounted section registers with the page's [`GeometryObserver`]
//!   and owns a [`RevealAnimator`] fed by it;
//! - theme toggles go through the [`ThemeTransitionSequencer`], with each
//!   mounted section counted as theme-sensitive content in mount order;
//! - scroll, resize and pointer input arrive as events through an
//!   [`EventDispatcher`];
//! - environment changes are drained into a [`RootSurface`] after every
//!   presented frame.
//!
//! Dropping the page (or calling [`Page::teardown`]) cancels all pending
//! work and releases every observation.

use crate::config::FolioConfig;
use crate::contact::{ContactError, ContactFields, ContactForm};
use crate::cursor::CustomCursor;
use crate::headless_assert::{DiagnosticsSnapshot, SectionSnapshot};
use crate::loading::LoadingScreen;
use crate::readiness::{ReadinessOutcome, ReadinessWait};
use crate::stage::{LoadingStage, StageScheduler};
use folio_animation::{RevealAnimator, RevealStyle, Typewriter};
use folio_core::environment::{RootSurface, SharedEnvironment, UiEnvironment};
use folio_core::events::{event_types, Event, EventData, EventDispatcher, WINDOW_TARGET};
use folio_core::scheduler::{EventLoop, PresentHook};
use folio_layout::{
    ElementId, GeometryObserver, SectionId, SectionLayout, UnknownSection, Unobserve, Viewport,
    VisibilityObserver,
};
use folio_theme::{AmbientPreference, PreferenceStore, ThemeTransitionSequencer, ToggleOutcome};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

/// Scroll offset past which the navbar switches to its compact style
pub const NAVBAR_SCROLL_THRESHOLD: f32 = 10.0;

/// Root class present while the loading screen is up
pub const LOADING_CLASS: &str = "loading";

/// Dispatcher target of the first navbar link
pub const NAV_LINK_TARGET_BASE: u64 = 100;

/// Dispatcher target of the contact form's send button
pub const SUBMIT_BUTTON_TARGET: u64 = 200;

/// Dispatcher target of the navbar link for `section`
pub fn nav_link_target(section: SectionId) -> u64 {
    NAV_LINK_TARGET_BASE + section.index() as u64
}

struct MountedSection {
    animator: RevealAnimator,
    /// Dropped on teardown, which ends the observation
    _observation: Unobserve,
    order: usize,
    mounted_at_ms: u64,
}

/// Everything a stage advance needs to mount sections
struct MountContext {
    event_loop: EventLoop,
    observer: GeometryObserver,
    layout: SectionLayout,
    config: FolioConfig,
    mounted: RefCell<BTreeMap<SectionId, MountedSection>>,
}

impl MountContext {
    fn element(section: SectionId) -> ElementId {
        ElementId(section.index() as u64 + 1)
    }

    fn is_mounted(&self, section: SectionId) -> bool {
        self.mounted.borrow().contains_key(&section)
    }

    /// Mount every unmounted section whose gate `stage` opens
    fn mount_open(self: &Rc<Self>, stage: LoadingStage) -> usize {
        let due: Vec<SectionId> = self
            .layout
            .sections()
            .filter(|&s| self.config.stages.gate(s) <= stage && !self.is_mounted(s))
            .collect();

        for &section in &due {
            let element = Self::element(section);
            if let Some(bounds) = self.layout.bounds(section) {
                self.observer.set_element_bounds(element, bounds);
            }

            let reveal = self.config.reveal_for(section);
            let weak = Rc::downgrade(self);
            let observation = self.observer.observe(
                element,
                reveal.threshold,
                Box::new(move |visible| on_visibility(&weak, section, visible)),
            );

            let now = self.event_loop.now_ms();
            let mut mounted = self.mounted.borrow_mut();
            let order = mounted.len();
            mounted.insert(
                section,
                MountedSection {
                    animator: RevealAnimator::new(reveal),
                    _observation: observation,
                    order,
                    mounted_at_ms: now,
                },
            );
            tracing::debug!(%section, %stage, order, at_ms = now, "section mounted");
        }

        if !due.is_empty() {
            // Deliver initial visibility for the new observations
            self.observer.refresh();
        }
        due.len()
    }

    /// Critical content is ready once everything gated at High or earlier is mounted
    fn critical_ready(&self) -> bool {
        self.layout
            .sections()
            .filter(|&s| self.config.stages.gate(s) <= LoadingStage::High)
            .all(|s| self.is_mounted(s))
    }
}

fn on_visibility(weak: &Weak<MountContext>, section: SectionId, visible: bool) {
    let Some(ctx) = weak.upgrade() else {
        return;
    };
    let now = ctx.event_loop.now_ms();
    let mut mounted = ctx.mounted.borrow_mut();
    if let Some(entry) = mounted.get_mut(&section) {
        if entry.animator.set_visible(visible, now) {
            tracing::trace!(%section, visible, "section visibility changed");
        }
    }
}

/// A running portfolio page
pub struct Page {
    event_loop: EventLoop,
    environment: SharedEnvironment,
    ctx: Rc<MountContext>,
    dispatcher: EventDispatcher,
    navbar_scrolled: Rc<Cell<bool>>,
    sequencer: ThemeTransitionSequencer,
    stages: StageScheduler,
    loading: Option<LoadingScreen>,
    readiness: ReadinessWait,
    hero_text: Typewriter,
    cursor: Option<CustomCursor>,
    contact: ContactForm,
    surface: Rc<RefCell<RootSurface>>,
    present: RefCell<Option<PresentHook>>,
    rejected_toggles: u32,
}

impl Page {
    /// Build a page driven by `event_loop`
    pub fn new(
        event_loop: &EventLoop,
        config: FolioConfig,
        store: PreferenceStore,
        ambient: &dyn AmbientPreference,
    ) -> Self {
        let environment = UiEnvironment::shared();
        let viewport = Viewport::new(config.viewport.width, config.viewport.height);
        let heights: Vec<(SectionId, f32)> = config
            .viewport
            .sections
            .iter()
            .map(|s| (s.id, s.height))
            .collect();
        let layout = SectionLayout::stacked(viewport.width, &heights);
        let observer = GeometryObserver::new(viewport);

        let sequencer = ThemeTransitionSequencer::new(
            event_loop,
            store,
            ambient,
            environment.clone(),
            config.theme.timings,
        );

        let loading = config.loading.enabled.then(|| {
            environment.borrow_mut().add_root_class(LOADING_CLASS);
            let env = Rc::downgrade(&environment);
            LoadingScreen::start(event_loop, config.loading, move || {
                if let Some(env) = env.upgrade() {
                    env.borrow_mut().remove_root_class(LOADING_CLASS);
                }
            })
        });

        let hero_text = Typewriter::start(event_loop, &config.hero.headline, config.hero.typewriter);
        let contact = ContactForm::new(event_loop, config.contact);
        let readiness_cfg = config.readiness.clone();
        let stage_step = config.stages.step_ms;
        let cursor_cfg = config.cursor;

        let ctx = Rc::new(MountContext {
            event_loop: event_loop.clone(),
            observer: observer.clone(),
            layout,
            config,
            mounted: RefCell::new(BTreeMap::new()),
        });

        let stages = StageScheduler::mount_with_step(event_loop, stage_step);
        ctx.mount_open(stages.current());
        let weak = Rc::downgrade(&ctx);
        stages.on_advance(move |stage| {
            if let Some(ctx) = weak.upgrade() {
                ctx.mount_open(stage);
            }
        });

        let weak = Rc::downgrade(&ctx);
        let release = loading.as_ref().map(LoadingScreen::hold_until_ready);
        let readiness = ReadinessWait::start(
            event_loop,
            readiness_cfg.poll_ms,
            readiness_cfg.ceiling_ms,
            move || weak.upgrade().is_some_and(|ctx| ctx.critical_ready()),
            move |_| {
                if let Some(release) = release {
                    release.resolve();
                }
            },
        );

        let navbar_scrolled = Rc::new(Cell::new(false));
        let mut dispatcher = EventDispatcher::new();
        {
            let observer = observer.clone();
            let navbar = navbar_scrolled.clone();
            dispatcher.register(WINDOW_TARGET, event_types::SCROLL, move |event| {
                if let EventData::Scroll { offset_y } = event.data {
                    navbar.set(offset_y > NAVBAR_SCROLL_THRESHOLD);
                    observer.scroll_to(offset_y);
                }
            });
        }
        {
            let weak = Rc::downgrade(&ctx);
            dispatcher.register(WINDOW_TARGET, event_types::RESIZE, move |event| {
                let (EventData::Resize { width, height }, Some(ctx)) = (&event.data, weak.upgrade())
                else {
                    return;
                };
                let viewport = Viewport::new(*width as f32, *height as f32);
                let scroll_y = ctx
                    .observer
                    .viewport()
                    .scroll_y
                    .clamp(0.0, ctx.layout.max_scroll(&viewport));
                ctx.observer.set_viewport(viewport.scrolled_to(scroll_y));
            });
        }

        let cursor = cursor_cfg.enabled.then(|| {
            let links = SectionId::ALL
                .into_iter()
                .map(nav_link_target)
                .chain([SUBMIT_BUTTON_TARGET]);
            CustomCursor::install(&mut dispatcher, &environment, cursor_cfg, links)
        });

        let surface = Rc::new(RefCell::new(RootSurface::new()));
        surface.borrow_mut().sync(&mut environment.borrow_mut());
        let present = {
            let environment = Rc::downgrade(&environment);
            let surface = surface.clone();
            event_loop.on_present(move |frame| {
                let Some(environment) = environment.upgrade() else {
                    return;
                };
                let applied = surface.borrow_mut().sync(&mut environment.borrow_mut());
                if applied > 0 {
                    tracing::trace!(frame, applied, "root surface synced");
                }
            })
        };

        tracing::info!(
            scheme = %sequencer.scheme(),
            sections = ctx.layout.sections().count(),
            "page mounted"
        );

        Self {
            event_loop: event_loop.clone(),
            environment,
            ctx,
            dispatcher,
            navbar_scrolled,
            sequencer,
            stages,
            loading,
            readiness,
            hero_text,
            cursor,
            contact,
            surface,
            present: RefCell::new(Some(present)),
            rejected_toggles: 0,
        }
    }

    /// Build a page and its event loop from configuration alone
    pub fn from_config(config: FolioConfig) -> Self {
        let event_loop = EventLoop::with_frame_interval(config.runtime.frame_ms);
        let store = config.theme.open_store();
        let ambient = config.theme.ambient.resolve();
        Self::new(&event_loop, config, store, ambient.as_ref())
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    pub fn environment(&self) -> &SharedEnvironment {
        &self.environment
    }

    pub fn config(&self) -> &FolioConfig {
        &self.ctx.config
    }

    pub fn layout(&self) -> &SectionLayout {
        &self.ctx.layout
    }

    /// The viewport as the observer currently sees it
    pub fn viewport(&self) -> Viewport {
        self.ctx.observer.viewport()
    }

    pub fn sequencer(&self) -> &ThemeTransitionSequencer {
        &self.sequencer
    }

    pub fn stages(&self) -> &StageScheduler {
        &self.stages
    }

    /// Present one frame
    pub fn tick(&self) -> usize {
        self.event_loop.tick(self.event_loop.frame_interval())
    }

    /// Let `ms` of page time pass
    pub fn advance(&self, ms: u64) -> usize {
        self.event_loop.advance(ms)
    }

    /// Scroll the page to `y`, clamped to the scrollable range
    pub fn scroll(&self, y: f32) -> f32 {
        let viewport = self.ctx.observer.viewport();
        let y = y.clamp(0.0, self.ctx.layout.max_scroll(&viewport));
        let mut event = Event::scroll(y, self.event_loop.now_ms());
        self.dispatcher.dispatch(&mut event);
        y
    }

    /// Jump to a section's anchor
    pub fn navigate(&self, section: SectionId) -> f32 {
        let viewport = self.ctx.observer.viewport();
        let target = self
            .ctx
            .layout
            .scroll_target(section, &viewport)
            .unwrap_or(viewport.scroll_y);
        tracing::debug!(%section, target, "navigating to section");
        self.scroll(target)
    }

    /// Follow an in-page link such as `#projects`
    pub fn navigate_anchor(&self, anchor: &str) -> Result<f32, UnknownSection> {
        let section = SectionId::from_id(anchor)?;
        Ok(self.navigate(section))
    }

    /// Resize the viewport, pulling the scroll offset back into range
    pub fn resize(&self, width: u32, height: u32) {
        let before = self.ctx.observer.viewport().scroll_y;
        let mut event = Event::resize(width, height, self.event_loop.now_ms());
        self.dispatcher.dispatch(&mut event);

        let after = self.ctx.observer.viewport().scroll_y;
        if after != before {
            let mut event = Event::scroll(after, self.event_loop.now_ms());
            self.dispatcher.dispatch(&mut event);
        }
    }

    /// Section under the middle of the viewport, highlighted in the navbar
    pub fn active_section(&self) -> Option<SectionId> {
        let viewport = self.ctx.observer.viewport();
        self.ctx
            .layout
            .section_at(viewport.scroll_y + viewport.height / 2.0)
    }

    pub fn pointer_move(&self, x: f32, y: f32) {
        let mut event = Event::pointer_move(x, y, self.event_loop.now_ms());
        self.dispatcher.dispatch(&mut event);
    }

    pub fn pointer_down(&self) {
        let mut event = Event::pointer_down(self.event_loop.now_ms());
        self.dispatcher.dispatch(&mut event);
    }

    pub fn pointer_up(&self) {
        let mut event = Event::pointer_up(self.event_loop.now_ms());
        self.dispatcher.dispatch(&mut event);
    }

    /// Move the pointer onto or off an element such as a navbar link
    pub fn hover(&self, target: u64, inside: bool) {
        let now = self.event_loop.now_ms();
        let mut event = if inside {
            Event::pointer_enter(target, now)
        } else {
            Event::pointer_leave(target, now)
        };
        self.dispatcher.dispatch(&mut event);
    }

    pub fn cursor(&self) -> Option<&CustomCursor> {
        self.cursor.as_ref()
    }

    pub fn contact(&self) -> &ContactForm {
        &self.contact
    }

    /// Send the contact form; only possible once its section is mounted
    pub fn submit_contact(&self, fields: ContactFields) -> Result<(), ContactError> {
        if !self.is_mounted(SectionId::Contact) {
            return Err(ContactError::NotMounted);
        }
        self.contact.submit(fields)
    }

    /// Apply pending environment changes to the surface now
    pub fn sync_surface(&self) -> usize {
        self.surface
            .borrow_mut()
            .sync(&mut self.environment.borrow_mut())
    }

    /// The root element as last rendered
    pub fn surface(&self) -> RootSurface {
        self.surface.borrow().clone()
    }

    /// Request a theme switch
    pub fn toggle_theme(&mut self) -> ToggleOutcome {
        self.sequencer
            .set_content_count(self.ctx.mounted.borrow().len());
        let outcome = self.sequencer.toggle();
        if outcome == ToggleOutcome::Rejected {
            self.rejected_toggles += 1;
        }
        outcome
    }

    pub fn rejected_toggles(&self) -> u32 {
        self.rejected_toggles
    }

    pub fn stage(&self) -> LoadingStage {
        self.stages.current()
    }

    pub fn is_mounted(&self, section: SectionId) -> bool {
        self.ctx.is_mounted(section)
    }

    /// Mounted sections in mount order
    pub fn mounted_sections(&self) -> Vec<SectionId> {
        let mounted = self.ctx.mounted.borrow();
        let mut sections: Vec<_> = mounted.iter().map(|(id, m)| (m.order, *id)).collect();
        sections.sort_unstable();
        sections.into_iter().map(|(_, id)| id).collect()
    }

    pub fn reveal_style(&self, section: SectionId) -> Option<RevealStyle> {
        self.ctx
            .mounted
            .borrow()
            .get(&section)
            .map(|m| m.animator.style())
    }

    pub fn navbar_scrolled(&self) -> bool {
        self.navbar_scrolled.get()
    }

    pub fn readiness(&self) -> Option<ReadinessOutcome> {
        self.readiness.outcome()
    }

    pub fn loading_screen(&self) -> Option<&LoadingScreen> {
        self.loading.as_ref()
    }

    pub fn hero_text(&self) -> String {
        self.hero_text.displayed()
    }

    /// Export the page state for assertions and reports
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        self.sync_surface();
        let now = self.event_loop.now_ms();
        let sections = self
            .ctx
            .mounted
            .borrow()
            .iter()
            .map(|(id, m)| {
                let style = m.animator.style();
                (
                    *id,
                    SectionSnapshot {
                        revealed: m.animator.is_revealed(),
                        opacity: style.opacity,
                        transform: style.transform.to_string(),
                        mounted_at_ms: m.mounted_at_ms,
                    },
                )
            })
            .collect();

        DiagnosticsSnapshot {
            now_ms: now,
            frame: self.event_loop.frame_index(),
            stage: self.stages.current(),
            scheme: self.sequencer.scheme(),
            phase: self.sequencer.phase(),
            transitioning: self.sequencer.is_transitioning(),
            overlay_opacity: self.sequencer.overlay_opacity(),
            root_classes: self
                .environment
                .borrow()
                .root_classes()
                .map(str::to_string)
                .collect(),
            applied_changes: self.surface.borrow().applied(),
            background: self.sequencer.presented_palette().background.to_css(),
            scroll_y: self.ctx.observer.viewport().scroll_y,
            navbar_scrolled: self.navbar_scrolled.get(),
            active_section: self.active_section(),
            sections,
            loading: self.loading.as_ref().map(|l| l.phase()),
            readiness: self.readiness.outcome(),
            hero_text: self.hero_text.displayed(),
            cursor: self.cursor.as_ref().map(CustomCursor::mode),
            contact: self.contact.state(),
        }
    }

    /// Cancel all pending work and release every observation
    pub fn teardown(&self) {
        self.stages.teardown();
        self.sequencer.teardown();
        self.readiness.cancel();
        self.hero_text.stop();
        if let Some(loading) = &self.loading {
            loading.cancel();
        }
        if let Some(cursor) = &self.cursor {
            cursor.uninstall();
        }
        self.contact.cancel();
        self.sync_surface();
        drop(self.present.borrow_mut().take());
        let released = std::mem::take(&mut *self.ctx.mounted.borrow_mut());
        if !released.is_empty() {
            tracing::debug!(sections = released.len(), "page torn down");
        }
        drop(released);
    }
}

impl Drop for Page {
    fn drop(&mut self) {
        self.teardown();
    }
}
