//! Pointer-driven drag and drop for elements of a visual document tree.
//!
//! Hosts implement [`document::VisualTree`] over their element storage and
//! feed pointer, key, transition and timer input into a
//! [`engine::DragEngine`]. Elements opt in through declarative attributes
//! (see [`config`]).

pub mod config;
pub mod constants;
pub mod constraint;
pub mod demo;
pub mod document;
pub mod drivers;
pub mod drop;
pub mod dropzone;
pub mod effect;
pub mod engine;
pub mod error;
pub mod event_loop;
pub mod events;
pub mod geometry;
pub mod hover;
pub mod log_buffer;
pub mod modifier;
pub mod session;
pub mod tracing_sub;

pub use config::{DraggableConfig, DropzoneConfig, EngineConfig};
pub use document::{ElementId, MemoryDocument, VisualTree};
pub use effect::{DropzoneAccept, EffectAllowed, EffectMode};
pub use engine::{DragEngine, PointerEvent};
pub use error::DdError;
pub use events::{DragEvent, Phase, Stage};
