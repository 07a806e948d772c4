//! Terminal demo host: a small board of cards and dropzones laid out in
//! terminal cells, driven by crossterm input.

pub mod render;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use crossterm::event::{Event, KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};

use crate::config::{DraggableConfig, DropzoneConfig, EngineConfig};
use crate::constants::PRIMARY_BUTTON;
use crate::constraint::ConstrainTarget;
use crate::document::{ElementId, MemoryDocument, VisualTree};
use crate::effect::{DropzoneAccept, EffectAllowed};
use crate::engine::{DragEngine, PointerEvent};
use crate::error::DdError;
use crate::events::Phase;
use crate::geometry::{Edges, Point, Rect, Size};

/// Text shown in an element's title.
pub const ATTR_LABEL: &str = "data-label";
/// Cards sharing a group are dragged together.
pub const ATTR_GROUP: &str = "data-group";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DemoStats {
    pub started: usize,
    pub dropped: usize,
    pub copied: usize,
    pub cancelled: usize,
    pub last_landing: Option<String>,
}

pub struct Demo {
    pub doc: MemoryDocument,
    pub engine: DragEngine,
    stats: Rc<RefCell<DemoStats>>,
    policy: EffectAllowed,
}

impl Demo {
    pub fn new(viewport: Size, policy: EffectAllowed, config: EngineConfig) -> Result<Self, DdError> {
        let mut doc = MemoryDocument::new(viewport);
        build_scene(&mut doc, policy)?;
        let mut engine = DragEngine::new(config);
        engine.init();
        let stats = Rc::new(RefCell::new(DemoStats::default()));
        subscribe(&mut engine, &stats);
        Ok(Self {
            doc,
            engine,
            stats,
            policy,
        })
    }

    pub fn stats(&self) -> DemoStats {
        self.stats.borrow().clone()
    }

    /// Rebuilds the board. Any drag in progress is cancelled first.
    pub fn reset(&mut self) -> Result<(), DdError> {
        self.engine.cancel(&mut self.doc);
        self.engine.poll_settles(&mut self.doc, far_future());
        let mut doc = MemoryDocument::new(self.doc.viewport_size());
        build_scene(&mut doc, self.policy)?;
        self.doc = doc;
        Ok(())
    }

    /// Routes one input event. Returns `true` when the demo should quit.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        match event {
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Key(key) => {
                self.engine.key_event(&mut self.doc, key);
                if key.kind != KeyEventKind::Press || self.engine.is_dragging() {
                    return false;
                }
                match key.code {
                    KeyCode::Char('q') => return true,
                    KeyCode::Char('r') => {
                        if let Err(err) = self.reset() {
                            tracing::warn!(%err, "reset failed");
                        }
                    }
                    _ => {}
                }
            }
            Event::Resize(width, height) => {
                self.doc.set_viewport(render::viewport_for(*width, *height));
            }
            _ => {}
        }
        false
    }

    /// Runs due settles. Returns the next instant the demo needs a tick.
    pub fn tick(&mut self, now: Instant) -> Option<Instant> {
        self.engine.poll_settles(&mut self.doc, now);
        self.engine.next_settle_deadline()
    }

    pub fn label(&self, element: ElementId) -> String {
        self.doc
            .attr(element, ATTR_LABEL)
            .unwrap_or_else(|| element.to_string())
    }

    pub fn report(&self) -> String {
        let stats = self.stats();
        indoc::formatdoc!(
            r#"
            Drag session summary.
            Started: {started} | Dropped: {dropped} (copied {copied}) | Cancelled: {cancelled}
            Last landing: {landing}
            "#,
            started = stats.started,
            dropped = stats.dropped,
            copied = stats.copied,
            cancelled = stats.cancelled,
            landing = stats.last_landing.as_deref().unwrap_or("none"),
        )
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent) {
        // Terminals rarely report bare modifier keys, so read them off
        // every mouse event.
        self.engine.modifiers_changed(&mut self.doc, mouse.modifiers);
        let client = Point::new(i32::from(mouse.column), i32::from(mouse.row));
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let at = client + self.doc.window_scroll();
                let target = self.doc.element_at(at).unwrap_or(self.doc.root());
                self.engine
                    .pointer_down(&mut self.doc, target, PointerEvent::new(client, PRIMARY_BUTTON));
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.engine
                    .pointer_move(&mut self.doc, PointerEvent::new(client, PRIMARY_BUTTON));
            }
            MouseEventKind::Moved if self.engine.is_dragging() => {
                self.engine.pointer_move(&mut self.doc, PointerEvent::new(client, 0));
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.engine.pointer_up(&mut self.doc, PointerEvent::new(client, 0));
            }
            _ => {}
        }
    }
}

fn far_future() -> Instant {
    Instant::now() + std::time::Duration::from_secs(3600)
}

fn subscribe(engine: &mut DragEngine, stats: &Rc<RefCell<DemoStats>>) {
    engine.before(Phase::Start, |event, doc| {
        let Some(group) = doc.attr(event.source, ATTR_GROUP) else {
            return;
        };
        event.relatives = doc
            .query_all(None, &format!("[{ATTR_GROUP}=\"{group}\"]"))
            .into_iter()
            .filter(|element| *element != event.source)
            .collect();
    });

    let counts = Rc::clone(stats);
    engine.after(Phase::Start, move |_, _| counts.borrow_mut().started += 1);

    let counts = Rc::clone(stats);
    engine.after(Phase::Drop, move |event, _| {
        let mut stats = counts.borrow_mut();
        if event.cancelled {
            stats.cancelled += 1;
        } else {
            stats.dropped += 1;
        }
        if event.is_copied {
            stats.copied += 1;
        }
    });

    let counts = Rc::clone(stats);
    engine.after(Phase::Dropzone, move |event, doc| {
        let zone = doc
            .attr(event.target, ATTR_LABEL)
            .unwrap_or_else(|| event.target.to_string());
        let verb = if event.is_copied { "copied" } else { "moved" };
        counts.borrow_mut().last_landing = Some(format!("{verb} into {zone}"));
    });
}

fn labelled(
    doc: &mut MemoryDocument,
    parent: ElementId,
    label: &str,
    rect: Rect,
) -> Result<ElementId, DdError> {
    let element = doc.create(parent, "div", rect)?;
    doc.set_attr(element, ATTR_LABEL, label);
    Ok(element)
}

/// Lays out the demo board. Every card and zone carries a `data-label`.
pub fn build_scene(doc: &mut MemoryDocument, policy: EffectAllowed) -> Result<(), DdError> {
    let root = doc.root();
    let board = labelled(doc, root, "Board", Rect::new(1, 1, 46, 16))?;
    doc.set_element_id(board, "board");
    doc.set_border(board, Edges::uniform(1));

    let plain = labelled(doc, board, "Plain", Rect::new(3, 3, 14, 3))?;
    DraggableConfig::new()
        .constrain(ConstrainTarget::Id("board".into()))
        .apply(doc, plain);

    let policy_card = labelled(doc, board, &format!("Policy {policy}"), Rect::new(3, 7, 14, 3))?;
    DraggableConfig::new()
        .dropzone(true)
        .effect_allowed(policy)
        .apply(doc, policy_card);

    let copy_card = labelled(doc, board, "Copy", Rect::new(3, 11, 14, 3))?;
    DraggableConfig::new()
        .dropzone(true)
        .effect_allowed(EffectAllowed::Copy)
        .apply(doc, copy_card);

    let handled = labelled(doc, board, "Grip", Rect::new(19, 3, 16, 3))?;
    DraggableConfig::new()
        .dropzone(true)
        .effect_allowed(EffectAllowed::All)
        .constrain(ConstrainTarget::Window)
        .handle(".grip")
        .apply(doc, handled);
    let grip = labelled(doc, handled, "::", Rect::new(19, 3, 4, 3))?;
    doc.add_class(grip, "grip");

    let files = labelled(doc, board, "Files", Rect::new(19, 7, 16, 3))?;
    DraggableConfig::new().emitter_name("files").apply(doc, files);

    for (label, x) in [("Pair A", 19), ("Pair B", 32)] {
        let card = labelled(doc, board, label, Rect::new(x, 11, 12, 3))?;
        DraggableConfig::new().dropzone(true).apply(doc, card);
        doc.set_attr(card, ATTR_GROUP, "pair");
    }

    let zones = [
        ("Inbox (move)", Rect::new(49, 1, 30, 7), DropzoneConfig::new().accept(DropzoneAccept::Move)),
        ("Archive (copy)", Rect::new(49, 9, 30, 7), DropzoneConfig::new().accept(DropzoneAccept::Copy)),
        (
            "Files only",
            Rect::new(49, 17, 30, 6),
            DropzoneConfig::new().emitter_name("files"),
        ),
        ("Anything", Rect::new(1, 18, 46, 5), DropzoneConfig::new()),
    ];
    for (label, rect, config) in zones {
        let zone = labelled(doc, root, label, rect)?;
        doc.set_border(zone, Edges::uniform(1));
        config.apply(doc, zone);
    }
    Ok(())
}
