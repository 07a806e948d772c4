//! The drag engine: turns pointer, key, transition and timer input into drag
//! sessions and their notifications.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::{DraggableDescriptor, EngineConfig};
use crate::constants::{
    ATTR_DRAGGABLE, CLASS_DRAGGING, CLASS_DROP_ACTIVE, CLASS_HIDDEN_SOURCE, CLASS_HIGH_Z,
    CLASS_INVISIBLE, CLASS_MASTER, CLASS_NO_TRANSITION, CLASS_OPACITY, PRIMARY_BUTTON,
    STYLE_LEFT, STYLE_POSITION, STYLE_TOP,
};
use crate::constraint::{Constraint, constrain};
use crate::document::{ElementId, VisualTree};
use crate::drop::{self, DropOutcome, Placement, Settle};
use crate::dropzone::{TickKind, collect_dropzones, find_target, watch_holds};
use crate::effect::EffectMode;
use crate::events::{
    DefaultAction, DragEvent, Handler, Phase, Stage, Subscribers, SubscriptionId,
};
use crate::geometry::Point;
use crate::hover::HoverWatch;
use crate::modifier::ModifierTracker;
use crate::session::{DragSession, Relative};

/// A pointer sample in client (viewport) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerEvent {
    pub client: Point,
    /// Bitmask of held buttons; bit 0 is the primary button.
    pub buttons: u8,
}

impl PointerEvent {
    pub fn new(client: Point, buttons: u8) -> Self {
        Self { client, buttons }
    }

    pub fn primary(x: i32, y: i32) -> Self {
        Self::new(Point::new(x, y), PRIMARY_BUTTON)
    }

    pub fn released(x: i32, y: i32) -> Self {
        Self::new(Point::new(x, y), 0)
    }

    fn holds_primary(&self) -> bool {
        self.buttons & PRIMARY_BUTTON != 0
    }
}

#[derive(Debug, Default)]
pub struct DragEngine {
    config: EngineConfig,
    initialized: bool,
    subscribers: Subscribers,
    modifiers: ModifierTracker,
    session: Option<DragSession>,
    /// The session being dropped, while the drop notification runs.
    closing: Option<DragSession>,
    /// A session whose drop a subscriber prevented. Its elements stay where
    /// they were released until `restore_draggables` or the next press.
    held: Option<DragSession>,
    pending_start: Option<DraggableDescriptor>,
    followups: Vec<DragEvent>,
    settles: Vec<Settle>,
}

impl DragEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Starts listening for input. Input received before is ignored.
    /// Returns `false` when the engine was already initialized.
    pub fn init(&mut self) -> bool {
        if self.initialized {
            return false;
        }
        self.initialized = true;
        tracing::debug!(default_emitter = %self.config.default_emitter, "drag engine initialized");
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn held(&self) -> Option<&DragSession> {
        self.held.as_ref()
    }

    pub fn modifier_pressed(&self) -> bool {
        self.modifiers.pressed()
    }

    pub fn pending_settles(&self) -> usize {
        self.settles.len()
    }

    pub fn next_settle_deadline(&self) -> Option<Instant> {
        self.settles.iter().map(|settle| settle.deadline).min()
    }

    pub fn before<F>(&mut self, phase: Phase, handler: F) -> SubscriptionId
    where
        F: FnMut(&mut DragEvent, &dyn VisualTree) + 'static,
    {
        self.subscribe(phase, Stage::Before, None, false, Box::new(handler))
    }

    pub fn after<F>(&mut self, phase: Phase, handler: F) -> SubscriptionId
    where
        F: FnMut(&mut DragEvent, &dyn VisualTree) + 'static,
    {
        self.subscribe(phase, Stage::After, None, false, Box::new(handler))
    }

    /// Subscribes to notifications of one emitter only. `Start` is never
    /// scoped, so a scoped `Start` subscriber never runs.
    pub fn scoped<F>(&mut self, phase: Phase, stage: Stage, emitter: &str, handler: F) -> SubscriptionId
    where
        F: FnMut(&mut DragEvent, &dyn VisualTree) + 'static,
    {
        self.subscribe(phase, stage, Some(emitter.to_string()), false, Box::new(handler))
    }

    pub fn once<F>(&mut self, phase: Phase, stage: Stage, handler: F) -> SubscriptionId
    where
        F: FnMut(&mut DragEvent, &dyn VisualTree) + 'static,
    {
        self.subscribe(phase, stage, None, true, Box::new(handler))
    }

    pub fn subscribe(
        &mut self,
        phase: Phase,
        stage: Stage,
        emitter: Option<String>,
        once: bool,
        handler: Handler,
    ) -> SubscriptionId {
        let id = self.subscribers.add(phase, stage, emitter, once, handler);
        tracing::trace!(%phase, ?stage, once, total = self.subscribers.len(), "subscribed");
        id
    }

    pub fn detach(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.detach(id)
    }

    /// Handles a press on `target`. Returns whether a drag session started.
    pub fn pointer_down(
        &mut self,
        doc: &mut dyn VisualTree,
        target: ElementId,
        pointer: PointerEvent,
    ) -> bool {
        if !self.initialized || !pointer.holds_primary() {
            return false;
        }
        if self.session.is_some() {
            tracing::debug!("press during an active drag, releasing it first");
            self.release(doc, false);
        }
        self.restore_draggables(doc);
        let Some(source) = find_draggable(doc, target) else {
            return false;
        };
        let descriptor = DraggableDescriptor::from_element(doc, source);
        if let Some(handle) = &descriptor.handle
            && !doc
                .query_all(Some(source), handle)
                .into_iter()
                .any(|h| doc.contains_node(h, target))
        {
            tracing::trace!(element = %source, handle = %handle, "press outside drag handle");
            return false;
        }
        self.finish_settles_of(doc, source);

        let at = pointer.client + doc.window_scroll();
        let mut event = DragEvent::new(Phase::Start, target, source);
        event.pointer = at;
        event.pointer_origin = at;
        event.buttons = pointer.buttons;
        self.pending_start = Some(descriptor);
        self.dispatch(doc, event);
        self.pending_start = None;
        self.session.is_some()
    }

    pub fn pointer_move(&mut self, doc: &mut dyn VisualTree, pointer: PointerEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.last_pointer = pointer.client + doc.window_scroll();
        if !pointer.holds_primary() {
            tracing::debug!(element = %session.source, "button no longer held, releasing");
            self.release(doc, false);
            return;
        }
        session.buttons = pointer.buttons;
        let event = session.event(Phase::Drag, session.drag_element);
        self.dispatch(doc, event);
        self.hover_tick(doc, TickKind::Pointer);
    }

    pub fn pointer_up(&mut self, doc: &mut dyn VisualTree, pointer: PointerEvent) {
        if let Some(session) = self.session.as_mut() {
            session.last_pointer = pointer.client + doc.window_scroll();
            session.buttons = pointer.buttons;
        }
        self.release(doc, false);
    }

    /// Tracks the copy modifier and cancels an active drag on Escape.
    pub fn key_event(&mut self, doc: &mut dyn VisualTree, key: &KeyEvent) {
        if let Some(pressed) = self.modifiers.key_event(key) {
            self.modifier_toggled(doc, pressed);
        }
        if key.code == KeyCode::Esc && key.kind == KeyEventKind::Press {
            self.cancel(doc);
        }
    }

    /// Records the modifiers reported alongside any input event.
    pub fn modifiers_changed(&mut self, doc: &mut dyn VisualTree, modifiers: KeyModifiers) {
        if let Some(pressed) = self.modifiers.update(modifiers) {
            self.modifier_toggled(doc, pressed);
        }
    }

    /// Ends the active drag, sending every element back to its origin.
    pub fn cancel(&mut self, doc: &mut dyn VisualTree) -> bool {
        if self.session.is_none() {
            return false;
        }
        tracing::debug!("drag cancelled");
        self.release(doc, true);
        true
    }

    /// Sends the elements of a prevented drop back to their origins. Returns
    /// `false` when no drop was held.
    pub fn restore_draggables(&mut self, doc: &mut dyn VisualTree) -> bool {
        let Some(session) = self.held.take() else {
            return false;
        };
        tracing::debug!(source = %session.source, "restoring held draggables");
        let deadline = Instant::now() + self.config.settle_timeout;
        let outcome = drop::revert_all(doc, &session, deadline);
        self.settles.extend(outcome.settles);
        for zone in outcome.rechecks {
            let mut over = session.event(Phase::Over, zone);
            over.synthetic = true;
            over.drop_target = None;
            self.dispatch(doc, over);
        }
        true
    }

    /// Completes the settle of `element` when its transition reports the end.
    pub fn transition_end(&mut self, doc: &mut dyn VisualTree, element: ElementId) -> bool {
        let Some(index) = self.settles.iter().position(|s| s.drag == element) else {
            return false;
        };
        self.settles.remove(index).finish(doc);
        true
    }

    /// Completes every settle whose deadline has passed. Returns how many.
    pub fn poll_settles(&mut self, doc: &mut dyn VisualTree, now: Instant) -> usize {
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.settles)
            .into_iter()
            .partition(|settle| settle.deadline <= now);
        self.settles = pending;
        let count = due.len();
        for settle in due {
            settle.finish(doc);
        }
        count
    }

    fn finish_settles_of(&mut self, doc: &mut dyn VisualTree, source: ElementId) {
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.settles)
            .into_iter()
            .partition(|settle| settle.source == source);
        self.settles = pending;
        for settle in due {
            settle.finish(doc);
        }
    }

    fn dispatch(&mut self, doc: &mut dyn VisualTree, mut event: DragEvent) -> DragEvent {
        let spec = event.phase.spec();
        self.subscribers.notify(Stage::Before, &mut event, &*doc);
        if spec.cancelable && event.is_prevented() {
            tracing::debug!(phase = %event.phase, "default prevented");
            return event;
        }
        match spec.default {
            DefaultAction::InitializeDrag => self.initialize_drag(doc, &mut event),
            DefaultAction::ApplyMove => self.apply_move(doc, &mut event),
            DefaultAction::MarkHover => doc.add_class(event.target, CLASS_DROP_ACTIVE),
            DefaultAction::ResolveDrop => self.resolve_drop(doc, &mut event),
            DefaultAction::Notify => {}
        }
        self.subscribers.notify(Stage::After, &mut event, &*doc);
        event
    }

    fn initialize_drag(&mut self, doc: &mut dyn VisualTree, event: &mut DragEvent) {
        let Some(descriptor) = self.pending_start.take() else {
            return;
        };
        let source = event.source;
        let emitter = event
            .emitter_name
            .clone()
            .or_else(|| descriptor.emitter_name.clone())
            .unwrap_or_else(|| self.config.default_emitter.clone());
        let dropzone_specified = descriptor.dropzone || emitter != self.config.default_emitter;
        let effect = if dropzone_specified {
            descriptor.effect_allowed.initial_mode(self.modifiers.pressed())
        } else {
            EffectMode::None
        };
        let constraint = descriptor.constrain.as_ref().and_then(|target| {
            let resolved = Constraint::resolve(&*doc, source, target);
            if resolved.is_none() {
                tracing::debug!(element = %source, constrain = %target, "constrain target not found, dragging unconstrained");
            }
            resolved
        });
        let dropzones = if effect == EffectMode::None {
            Vec::new()
        } else {
            collect_dropzones(doc)
        };

        let origin = doc.position(source);
        let inline_left = doc.inline_style(source, STYLE_LEFT);
        let inline_top = doc.inline_style(source, STYLE_TOP);
        let drag_element = lift(doc, source, origin, dropzone_specified, effect, constraint.as_ref());

        let mut relatives: Vec<Relative> = Vec::new();
        for element in event.relatives.iter().copied() {
            if element == source
                || !doc.is_attached(element)
                || relatives.iter().any(|r| r.source == element)
            {
                continue;
            }
            let rel_origin = doc.position(element);
            let inline_left = doc.inline_style(element, STYLE_LEFT);
            let inline_top = doc.inline_style(element, STYLE_TOP);
            let drag = lift(doc, element, rel_origin, dropzone_specified, effect, None);
            relatives.push(Relative {
                source: element,
                drag,
                origin: rel_origin,
                shift: rel_origin - origin,
                inline_left,
                inline_top,
            });
        }
        if !relatives.is_empty() {
            doc.add_class(source, CLASS_MASTER);
            doc.add_class(drag_element, CLASS_MASTER);
        }

        let session = DragSession {
            source,
            drag_element,
            origin,
            inline_left,
            inline_top,
            pointer_origin: event.pointer_origin,
            last_pointer: event.pointer_origin,
            buttons: event.buttons,
            constraint,
            effect,
            effect_allowed: descriptor.effect_allowed,
            emitter,
            dropzone_specified,
            relatives,
            dropzones,
            target: None,
            hover: Vec::new(),
        };
        event.emitter_name = Some(session.emitter.clone());
        event.drag_element = drag_element;
        event.relatives = session.relatives.iter().map(|r| r.source).collect();
        event.relative_drag_elements = session.relatives.iter().map(|r| r.drag).collect();
        event.effect = effect;
        tracing::debug!(
            source = %source,
            drag_element = %drag_element,
            %effect,
            emitter = %session.emitter,
            relatives = session.relatives.len(),
            "drag started"
        );
        self.session = Some(session);
    }

    fn apply_move(&mut self, doc: &mut dyn VisualTree, event: &mut DragEvent) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let drag = session.drag_element;
        let requested = session.origin + (event.pointer - session.pointer_origin);
        let size = doc.offset_size(drag);
        let placed = constrain(doc, session.constraint.as_ref(), requested, size);
        doc.set_position(drag, placed);
        for relative in &session.relatives {
            if doc.is_attached(relative.drag) {
                doc.set_position(relative.drag, placed + relative.shift);
            }
        }
        let constraint = session.constraint.as_ref();
        if !matches!(constraint, Some(Constraint::Viewport)) {
            doc.scroll_into_view(drag);
        }
        if let Some(container) = constraint.and_then(Constraint::container) {
            doc.scroll_into_container(drag, container);
        }
        event.position = Some(placed);
        tracing::trace!(element = %drag, x = placed.x, y = placed.y, "moved");
    }

    fn hover_tick(&mut self, doc: &mut dyn VisualTree, kind: TickKind) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.effect == EffectMode::None {
            return;
        }
        let pointer = session.last_pointer;
        if let Some(zone) = session.target.clone()
            && !watch_holds(doc, &zone, kind, pointer, session.effect)
        {
            session.target = None;
            let mut notify = false;
            for watch in session.hover.iter_mut().filter(|w| w.dropzone == zone.element) {
                if watch.resolve(false) {
                    notify |= watch.notifies_out();
                }
            }
            session.hover.retain(HoverWatch::is_pending);
            doc.remove_class(zone.element, CLASS_DROP_ACTIVE);
            tracing::debug!(dropzone = %zone.element, ?kind, "left drop target");
            if notify {
                let mut event = session.event(Phase::Out, zone.element);
                event.synthetic = kind == TickKind::Synthetic;
                self.dispatch(doc, event);
            }
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.target.is_some() {
            return;
        }
        let Some(zone) = find_target(
            doc,
            &session.dropzones,
            session.drag_element,
            pointer,
            session.effect,
            &session.emitter,
        )
        .cloned() else {
            return;
        };
        let element = zone.element;
        session.hover.push(HoverWatch::new(element));
        session.target = Some(zone);
        tracing::debug!(dropzone = %element, ?kind, "entered drop target");
        let mut event = session.event(Phase::Over, element);
        event.synthetic = kind == TickKind::Synthetic;
        self.dispatch(doc, event);
    }

    fn modifier_toggled(&mut self, doc: &mut dyn VisualTree, pressed: bool) {
        tracing::debug!(pressed, "copy modifier changed");
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.effect == EffectMode::None || !session.effect_allowed.allows_switch() {
            return;
        }
        session.effect = session.effect_allowed.initial_mode(pressed);
        set_effect_markers(doc, session.source, session.drag_element, session.effect);
        for relative in &session.relatives {
            set_effect_markers(doc, relative.source, relative.drag, session.effect);
        }
        self.hover_tick(doc, TickKind::Synthetic);
    }

    fn release(&mut self, doc: &mut dyn VisualTree, cancelled: bool) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let pointer = session.last_pointer;
        let inside = !cancelled
            && session
                .target
                .as_ref()
                .is_some_and(|zone| doc.inner_box(zone.element).contains(pointer));
        let watches = session.close_watches(inside);
        if !inside {
            session.target = None;
        }
        for watch in &watches {
            doc.remove_class(watch.dropzone, CLASS_DROP_ACTIVE);
        }
        for watch in watches.iter().filter(|w| w.notifies_out()) {
            let event = session.event(Phase::Out, watch.dropzone);
            self.dispatch(doc, event);
        }

        let mut event = session.event(Phase::Drop, session.drag_element);
        event.cancelled = cancelled;
        tracing::debug!(
            source = %session.source,
            target = ?session.target_element(),
            cancelled,
            "drag released"
        );
        self.closing = Some(session);
        let event = self.dispatch(doc, event);
        let session = self.closing.take();
        if event.is_prevented() {
            tracing::debug!("drop prevented, holding draggables in place");
            self.held = session;
        }
        for followup in std::mem::take(&mut self.followups) {
            self.dispatch(doc, followup);
        }
    }

    fn resolve_drop(&mut self, doc: &mut dyn VisualTree, event: &mut DragEvent) {
        let Some(session) = self.closing.as_ref() else {
            return;
        };
        let allowed = session.effect_allowed;
        let copy = !event.cancelled
            && session.target.is_some()
            && ((self.modifiers.pressed() && allowed.allows_copy()) || allowed.only_copy());
        event.is_copied = copy;

        let deadline = Instant::now() + self.config.settle_timeout;
        let outcome = if event.cancelled {
            drop::revert_all(doc, session, deadline)
        } else if session.dropzone_specified {
            drop::resolve(doc, session, copy, deadline)
        } else {
            drop::release_in_place(doc, session);
            DropOutcome::default()
        };

        if let Some(zone) = session.target_element() {
            for placement in &outcome.placements {
                let (Placement::Copied(landed) | Placement::Moved(landed)) = *placement else {
                    continue;
                };
                let mut notice = session.event(Phase::Dropzone, zone);
                notice.drag_element = landed;
                notice.is_copied = copy;
                self.followups.push(notice);
            }
        }
        for zone in outcome.rechecks {
            let mut over = session.event(Phase::Over, zone);
            over.synthetic = true;
            over.drop_target = None;
            self.followups.push(over);
        }
        self.settles.extend(outcome.settles);
    }
}

fn find_draggable<D: VisualTree + ?Sized>(doc: &D, target: ElementId) -> Option<ElementId> {
    let mut current = Some(target);
    while let Some(node) = current {
        if doc.attr(node, ATTR_DRAGGABLE).as_deref() == Some("true") {
            return Some(node);
        }
        current = doc.parent(node);
    }
    None
}

/// Prepares an element for dragging and returns the element that follows
/// the pointer: the element itself, or a proxy clone inserted after it.
fn lift<D: VisualTree + ?Sized>(
    doc: &mut D,
    element: ElementId,
    origin: Point,
    proxied: bool,
    effect: EffectMode,
    constraint: Option<&Constraint>,
) -> ElementId {
    if !proxied {
        doc.add_class(element, CLASS_NO_TRANSITION);
        doc.add_class(element, CLASS_DRAGGING);
        doc.add_class(element, CLASS_HIGH_Z);
        return element;
    }
    let proxy = doc.clone_element(element);
    doc.add_class(proxy, CLASS_INVISIBLE);
    doc.insert_after(proxy, element);
    doc.set_inline_style(proxy, STYLE_POSITION, Some("absolute"));
    let placed = constrain(doc, constraint, origin, doc.offset_size(element));
    doc.set_position(proxy, placed);
    doc.add_class(proxy, CLASS_NO_TRANSITION);
    doc.add_class(proxy, CLASS_DRAGGING);
    doc.add_class(proxy, CLASS_HIGH_Z);
    doc.remove_class(proxy, CLASS_INVISIBLE);
    set_effect_markers(doc, element, proxy, effect);
    proxy
}

/// Copy keeps the source visible under a translucent proxy; move hides it.
fn set_effect_markers<D: VisualTree + ?Sized>(
    doc: &mut D,
    source: ElementId,
    drag: ElementId,
    effect: EffectMode,
) {
    if source == drag {
        return;
    }
    match effect {
        EffectMode::Copy => {
            doc.remove_class(source, CLASS_HIDDEN_SOURCE);
            doc.add_class(drag, CLASS_OPACITY);
        }
        EffectMode::Move => {
            doc.add_class(source, CLASS_HIDDEN_SOURCE);
            doc.remove_class(drag, CLASS_OPACITY);
        }
        EffectMode::None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use crate::geometry::{Rect, Size};

    #[test]
    fn draggable_lookup_walks_up() {
        let mut doc = MemoryDocument::new(Size::new(200, 200));
        let card = doc.create(doc.root(), "div", Rect::new(0, 0, 50, 50)).unwrap();
        doc.set_attr(card, ATTR_DRAGGABLE, "true");
        let label = doc.create(card, "span", Rect::new(0, 0, 10, 10)).unwrap();
        let other = doc.create(doc.root(), "div", Rect::new(60, 0, 50, 50)).unwrap();
        doc.set_attr(other, ATTR_DRAGGABLE, "false");

        assert_eq!(find_draggable(&doc, label), Some(card));
        assert_eq!(find_draggable(&doc, other), None);
    }

    #[test]
    fn proxy_follows_effect_markers() {
        let mut doc = MemoryDocument::new(Size::new(200, 200));
        let card = doc.create(doc.root(), "div", Rect::new(20, 30, 50, 50)).unwrap();
        let proxy = lift(&mut doc, card, Point::new(20, 30), true, EffectMode::Move, None);

        assert_ne!(proxy, card);
        assert_eq!(doc.children(doc.root()), &[card, proxy]);
        assert_eq!(doc.position(proxy), Point::new(20, 30));
        assert!(doc.has_class(card, CLASS_HIDDEN_SOURCE));
        assert!(!doc.has_class(proxy, CLASS_INVISIBLE));
        assert_eq!(doc.inline_style(proxy, STYLE_POSITION).as_deref(), Some("absolute"));

        set_effect_markers(&mut doc, card, proxy, EffectMode::Copy);
        assert!(!doc.has_class(card, CLASS_HIDDEN_SOURCE));
        assert!(doc.has_class(proxy, CLASS_OPACITY));
    }

    #[test]
    fn input_before_init_is_ignored() {
        let mut doc = MemoryDocument::new(Size::new(200, 200));
        let card = doc.create(doc.root(), "div", Rect::new(0, 0, 50, 50)).unwrap();
        doc.set_attr(card, ATTR_DRAGGABLE, "true");
        let mut engine = DragEngine::default();
        assert!(!engine.pointer_down(&mut doc, card, PointerEvent::primary(5, 5)));
        assert!(engine.init());
        assert!(!engine.init());
        assert!(engine.pointer_down(&mut doc, card, PointerEvent::primary(5, 5)));
    }
}
