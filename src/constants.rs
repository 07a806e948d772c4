//! Shared crate-wide constants: the declarative attribute surface, the marker
//! classes toggled on elements during a drag, and timing defaults.

use std::time::Duration;

/// Marks an element as draggable when set to `"true"`.
pub const ATTR_DRAGGABLE: &str = "dd-draggable";
/// Declares that the draggable may land in dropzones (dragging uses a proxy clone).
pub const ATTR_DROPZONE_SPECIFIED: &str = "dd-dropzone";
/// Constrain target of a draggable: `window`, `#id` or a selector.
pub const ATTR_CONSTRAIN: &str = "xy-constrain";
/// Emitter name scoping the drag notifications of a draggable.
pub const ATTR_EMITTER_NAME: &str = "dd-emitter-name";
/// Selector of the handle(s) inside a draggable.
pub const ATTR_HANDLE: &str = "dd-handle";
/// Effect policy of a draggable: `move`, `copy` or `all`.
pub const ATTR_EFFECT_ALLOWED: &str = "dd-effect-allowed";
/// Set on elements that were copied into a dropzone.
pub const ATTR_COPIED_NODE: &str = "dd-copied-node";
/// Acceptance string of a dropzone: `move`, `copy` or `true`, plus an optional
/// `emitter-name=<name>` token.
pub const ATTR_DROPZONE: &str = "dropzone";

pub const EMITTER_TOKEN: &str = "emitter-name=";

pub const CLASS_DRAGGING: &str = "dd-dragging";
pub const CLASS_MASTER: &str = "dd-master";
pub const CLASS_HIDDEN_SOURCE: &str = "dd-hidden-source";
pub const CLASS_TRANSITION: &str = "dd-transition";
pub const CLASS_OPACITY: &str = "dd-opacity";
pub const CLASS_HIGH_Z: &str = "dd-high-z";
pub const CLASS_NO_TRANSITION: &str = "el-notrans";
pub const CLASS_INVISIBLE: &str = "el-invisible";
pub const CLASS_DROP_ACTIVE: &str = "dropactive";

/// Classes carried by an element only while it is being dragged or settling.
pub const DRAG_MARKERS: [&str; 5] = [
    CLASS_NO_TRANSITION,
    CLASS_OPACITY,
    CLASS_TRANSITION,
    CLASS_HIGH_Z,
    CLASS_DRAGGING,
];

pub const STYLE_LEFT: &str = "left";
pub const STYLE_TOP: &str = "top";
pub const STYLE_POSITION: &str = "position";

/// Emitter name used when neither a start subscriber nor the draggable
/// provides one.
pub const DEFAULT_EMITTER: &str = "UI";

/// Upper bound for a revert transition. Transitions are not guaranteed to
/// report completion (for instance when the position did not change), so
/// settling always finishes after this delay.
pub const SETTLE_TIMEOUT: Duration = Duration::from_millis(260);

/// Bit of the primary pointer button in `PointerEvent::buttons`.
pub const PRIMARY_BUTTON: u8 = 1;
