//! Drag notifications: the phase table, the event payload and the
//! subscriber registry.

use std::fmt;

use crate::document::{ElementId, VisualTree};
use crate::effect::EffectMode;
use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Start,
    Drag,
    /// A dropzone became the drop target.
    Over,
    /// The drop target was left.
    Out,
    Drop,
    /// An element landed in a dropzone.
    Dropzone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultAction {
    InitializeDrag,
    ApplyMove,
    MarkHover,
    ResolveDrop,
    /// Observation only.
    Notify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSpec {
    pub phase: Phase,
    pub cancelable: bool,
    pub default: DefaultAction,
}

pub const PHASE_TABLE: [PhaseSpec; 6] = [
    PhaseSpec {
        phase: Phase::Start,
        cancelable: true,
        default: DefaultAction::InitializeDrag,
    },
    PhaseSpec {
        phase: Phase::Drag,
        cancelable: true,
        default: DefaultAction::ApplyMove,
    },
    PhaseSpec {
        phase: Phase::Over,
        cancelable: true,
        default: DefaultAction::MarkHover,
    },
    PhaseSpec {
        phase: Phase::Out,
        cancelable: false,
        default: DefaultAction::Notify,
    },
    PhaseSpec {
        phase: Phase::Drop,
        cancelable: true,
        default: DefaultAction::ResolveDrop,
    },
    PhaseSpec {
        phase: Phase::Dropzone,
        cancelable: false,
        default: DefaultAction::Notify,
    },
];

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Start,
        Phase::Drag,
        Phase::Over,
        Phase::Out,
        Phase::Drop,
        Phase::Dropzone,
    ];

    pub fn spec(self) -> &'static PhaseSpec {
        &PHASE_TABLE[self as usize]
    }

    pub fn cancelable(self) -> bool {
        self.spec().cancelable
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Start => "dd-start",
            Phase::Drag => "dd-drag",
            Phase::Over => "dd-over",
            Phase::Out => "dd-out",
            Phase::Drop => "dd-drop",
            Phase::Dropzone => "dd-dropzone",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload handed to subscribers.
///
/// `target` is the element the notification is about: the pressed element for
/// `Start`, the dropzone for `Over`/`Out`/`Dropzone`, and the drag element
/// otherwise. Points are in document coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEvent {
    pub phase: Phase,
    /// `Start` subscribers may set it; afterwards it holds the session's emitter.
    pub emitter_name: Option<String>,
    pub target: ElementId,
    pub source: ElementId,
    pub drag_element: ElementId,
    /// `Start` subscribers may add elements dragged in lock-step.
    pub relatives: Vec<ElementId>,
    pub relative_drag_elements: Vec<ElementId>,
    pub drop_target: Option<ElementId>,
    pub pointer: Point,
    pub pointer_origin: Point,
    /// Position applied to the drag element by the `Drag` default.
    pub position: Option<Point>,
    pub buttons: u8,
    pub effect: EffectMode,
    pub is_copied: bool,
    /// Raised by the engine rather than by pointer motion.
    pub synthetic: bool,
    pub cancelled: bool,
    prevented: bool,
}

impl DragEvent {
    pub fn new(phase: Phase, target: ElementId, source: ElementId) -> Self {
        Self {
            phase,
            emitter_name: None,
            target,
            source,
            drag_element: source,
            relatives: Vec::new(),
            relative_drag_elements: Vec::new(),
            drop_target: None,
            pointer: Point::default(),
            pointer_origin: Point::default(),
            position: None,
            buttons: 0,
            effect: EffectMode::None,
            is_copied: false,
            synthetic: false,
            cancelled: false,
            prevented: false,
        }
    }

    /// Skips the default behaviour of a cancelable phase. Ignored otherwise.
    pub fn prevent_default(&mut self) {
        if self.phase.cancelable() {
            self.prevented = true;
        }
    }

    pub fn is_prevented(&self) -> bool {
        self.prevented
    }

    /// `dd-drop.UI` style name, scoped by emitter for every phase but `Start`.
    pub fn qualified_name(&self) -> String {
        match (&self.emitter_name, self.phase) {
            (Some(emitter), phase) if phase != Phase::Start => format!("{phase}.{emitter}"),
            _ => self.phase.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Runs before the default behaviour and may prevent it.
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Handler = Box<dyn FnMut(&mut DragEvent, &dyn VisualTree)>;

struct Subscription {
    id: SubscriptionId,
    phase: Phase,
    stage: Stage,
    emitter: Option<String>,
    once: bool,
    handler: Handler,
}

impl Subscription {
    fn wants(&self, stage: Stage, event: &DragEvent) -> bool {
        if self.phase != event.phase || self.stage != stage {
            return false;
        }
        match &self.emitter {
            None => true,
            // Start is never scoped.
            Some(name) => {
                event.phase != Phase::Start && event.emitter_name.as_deref() == Some(name.as_str())
            }
        }
    }
}

/// Ordered registry of subscribers. Handlers run in subscription order.
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    entries: Vec<Subscription>,
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.entries.len())
            .finish()
    }
}

impl Subscribers {
    pub fn add(
        &mut self,
        phase: Phase,
        stage: Stage,
        emitter: Option<String>,
        once: bool,
        handler: Handler,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push(Subscription {
            id,
            phase,
            stage,
            emitter,
            once,
            handler,
        });
        id
    }

    pub fn detach(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn notify(&mut self, stage: Stage, event: &mut DragEvent, doc: &dyn VisualTree) {
        let mut fired_once = Vec::new();
        for entry in self.entries.iter_mut() {
            if !entry.wants(stage, event) {
                continue;
            }
            (entry.handler)(event, doc);
            if entry.once {
                fired_once.push(entry.id);
            }
        }
        if !fired_once.is_empty() {
            self.entries.retain(|entry| !fired_once.contains(&entry.id));
        }
    }
}
