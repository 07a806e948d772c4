//! Effect policies of draggables and dropzones.

use std::fmt;
use std::str::FromStr;

use crate::error::DdError;

/// Effect of the current drag. `None` is used for pure repositioning, when the
/// draggable declares no dropzone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectMode {
    Move,
    Copy,
    None,
}

impl fmt::Display for EffectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EffectMode::Move => "move",
            EffectMode::Copy => "copy",
            EffectMode::None => "none",
        };
        write!(f, "{s}")
    }
}

/// `dd-effect-allowed` of a draggable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EffectAllowed {
    #[default]
    Move,
    Copy,
    All,
}

impl EffectAllowed {
    pub fn allows_copy(self) -> bool {
        matches!(self, EffectAllowed::Copy | EffectAllowed::All)
    }

    pub fn only_copy(self) -> bool {
        self == EffectAllowed::Copy
    }

    /// Whether the copy modifier may switch between move and copy mid-drag.
    pub fn allows_switch(self) -> bool {
        self == EffectAllowed::All
    }

    /// Effect a drag starts with, given the modifier state.
    pub fn initial_mode(self, modifier_pressed: bool) -> EffectMode {
        if self.only_copy() || (modifier_pressed && self.allows_copy()) {
            EffectMode::Copy
        } else {
            EffectMode::Move
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EffectAllowed::Move => "move",
            EffectAllowed::Copy => "copy",
            EffectAllowed::All => "all",
        }
    }
}

impl FromStr for EffectAllowed {
    type Err = DdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<String> = tokens(s).collect();
        let has = |word: &str| tokens.iter().any(|t| t == word);
        if has("all") || has("true") {
            Ok(EffectAllowed::All)
        } else if has("copy") {
            Ok(EffectAllowed::Copy)
        } else if has("move") {
            Ok(EffectAllowed::Move)
        } else {
            Err(DdError::InvalidEffect(s.to_string()))
        }
    }
}

impl fmt::Display for EffectAllowed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effects accepted by a dropzone. A dropzone that names neither `move` nor
/// `copy` accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DropzoneAccept {
    Move,
    Copy,
    #[default]
    All,
}

impl DropzoneAccept {
    pub fn parse(value: &str) -> Self {
        let mut accepts_move = false;
        let mut accepts_copy = false;
        for token in tokens(value) {
            match token.as_str() {
                "move" => accepts_move = true,
                "copy" => accepts_copy = true,
                _ => {}
            }
        }
        match (accepts_move, accepts_copy) {
            (true, false) => DropzoneAccept::Move,
            (false, true) => DropzoneAccept::Copy,
            _ => DropzoneAccept::All,
        }
    }

    pub fn accepts(self, effect: EffectMode) -> bool {
        match (self, effect) {
            (_, EffectMode::None) => false,
            (DropzoneAccept::All, _) => true,
            (DropzoneAccept::Move, EffectMode::Move) => true,
            (DropzoneAccept::Copy, EffectMode::Copy) => true,
            _ => false,
        }
    }
}

/// Lower-cased whitespace-separated words of a declarative value.
pub(crate) fn tokens(value: &str) -> impl Iterator<Item = String> + '_ {
    value.split_whitespace().map(str::to_ascii_lowercase)
}
