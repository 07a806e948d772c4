//! Typed configuration: engine defaults and the declarative attribute surface
//! of draggables and dropzones.

use std::time::Duration;

use crate::constants::{
    ATTR_CONSTRAIN, ATTR_DRAGGABLE, ATTR_DROPZONE, ATTR_DROPZONE_SPECIFIED, ATTR_EFFECT_ALLOWED,
    ATTR_EMITTER_NAME, ATTR_HANDLE, DEFAULT_EMITTER, EMITTER_TOKEN, SETTLE_TIMEOUT,
};
use crate::constraint::ConstrainTarget;
use crate::document::{ElementId, VisualTree};
use crate::effect::{DropzoneAccept, EffectAllowed};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Longest a revert waits for its transition to report completion.
    pub settle_timeout: Duration,
    pub default_emitter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_timeout: SETTLE_TIMEOUT,
            default_emitter: DEFAULT_EMITTER.to_string(),
        }
    }
}

/// The attributes of a draggable, read once when a press qualifies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DraggableDescriptor {
    pub effect_allowed: EffectAllowed,
    pub constrain: Option<ConstrainTarget>,
    pub emitter_name: Option<String>,
    pub handle: Option<String>,
    /// Whether the draggable declared that it may land in dropzones.
    pub dropzone: bool,
}

impl DraggableDescriptor {
    pub fn from_element<D: VisualTree + ?Sized>(doc: &D, element: ElementId) -> Self {
        let effect_allowed = match doc.attr(element, ATTR_EFFECT_ALLOWED) {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                tracing::warn!(element = %element, %err, "ignoring effect policy");
                EffectAllowed::default()
            }),
            None => EffectAllowed::default(),
        };
        let constrain = doc
            .attr(element, ATTR_CONSTRAIN)
            .and_then(|raw| match raw.parse::<ConstrainTarget>() {
                Ok(target) => Some(target),
                Err(err) => {
                    tracing::warn!(element = %element, %err, "ignoring constrain target");
                    None
                }
            });
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            effect_allowed,
            constrain,
            emitter_name: non_empty(doc.attr(element, ATTR_EMITTER_NAME)),
            handle: non_empty(doc.attr(element, ATTR_HANDLE)),
            dropzone: doc.has_attr(element, ATTR_DROPZONE_SPECIFIED),
        }
    }
}

/// Builder for the attributes that make an element draggable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DraggableConfig {
    pub dropzone: bool,
    pub effect_allowed: Option<EffectAllowed>,
    pub constrain: Option<ConstrainTarget>,
    pub emitter_name: Option<String>,
    pub handle: Option<String>,
}

impl DraggableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dropzone(mut self, enabled: bool) -> Self {
        self.dropzone = enabled;
        self
    }

    pub fn effect_allowed(mut self, effect: EffectAllowed) -> Self {
        self.effect_allowed = Some(effect);
        self
    }

    pub fn constrain(mut self, target: ConstrainTarget) -> Self {
        self.constrain = Some(target);
        self
    }

    pub fn emitter_name(mut self, name: impl Into<String>) -> Self {
        self.emitter_name = Some(name.into());
        self
    }

    pub fn handle(mut self, selector: impl Into<String>) -> Self {
        self.handle = Some(selector.into());
        self
    }

    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attrs = vec![(ATTR_DRAGGABLE, "true".to_string())];
        if self.dropzone {
            attrs.push((ATTR_DROPZONE_SPECIFIED, "true".to_string()));
        }
        if let Some(effect) = self.effect_allowed {
            attrs.push((ATTR_EFFECT_ALLOWED, effect.to_string()));
        }
        if let Some(target) = &self.constrain {
            attrs.push((ATTR_CONSTRAIN, target.to_string()));
        }
        if let Some(name) = &self.emitter_name {
            attrs.push((ATTR_EMITTER_NAME, name.clone()));
        }
        if let Some(handle) = &self.handle {
            attrs.push((ATTR_HANDLE, handle.clone()));
        }
        attrs
    }

    pub fn apply<D: VisualTree + ?Sized>(&self, doc: &mut D, element: ElementId) {
        for (name, value) in self.attributes() {
            doc.set_attr(element, name, &value);
        }
    }
}

/// Builder for the `dropzone` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DropzoneConfig {
    pub accept_copy: bool,
    pub accept_move: bool,
    pub emitter_name: Option<String>,
}

impl DropzoneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(mut self, accept: DropzoneAccept) -> Self {
        (self.accept_move, self.accept_copy) = match accept {
            DropzoneAccept::Move => (true, false),
            DropzoneAccept::Copy => (false, true),
            DropzoneAccept::All => (true, true),
        };
        self
    }

    pub fn emitter_name(mut self, name: impl Into<String>) -> Self {
        self.emitter_name = Some(name.into());
        self
    }

    pub fn value(&self) -> String {
        let accept = match (self.accept_move, self.accept_copy) {
            (true, false) => "move",
            (false, true) => "copy",
            _ => "true",
        };
        match &self.emitter_name {
            Some(name) => format!("{accept} {EMITTER_TOKEN}{name}"),
            None => accept.to_string(),
        }
    }

    pub fn apply<D: VisualTree + ?Sized>(&self, doc: &mut D, element: ElementId) {
        doc.set_attr(element, ATTR_DROPZONE, &self.value());
    }
}
