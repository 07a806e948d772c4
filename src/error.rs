use thiserror::Error;

use crate::document::ElementId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DdError {
    #[error("unknown effect policy `{0}` (expected move, copy or all)")]
    InvalidEffect(String),
    #[error("constrain target is empty")]
    EmptyConstraint,
    #[error("element {0} is not part of the document")]
    UnknownElement(ElementId),
}
