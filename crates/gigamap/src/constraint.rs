//! Entity constraints (spec §5).
//!
//! Constraints run before an insert or update is allowed to take effect.
//! Unlike indices, a failed constraint check aborts the whole operation —
//! nothing is left partially applied.

use crate::error::{GigaMapError, Result};

/// A check run against a candidate entity before it is committed to the
/// map.
pub trait Constraint<E>: Send + Sync {
    /// Name used in [`GigaMapError::ConstraintViolation`] messages.
    fn name(&self) -> &str;

    /// Validate `entity`. `existing` is `Some` when this is an update
    /// (the entity's previous value) and `None` for a fresh insert.
    fn check(&self, entity: &E, existing: Option<&E>) -> Result<()>;
}

/// A constraint backed by an arbitrary predicate closure.
pub struct CustomConstraint<E> {
    name: String,
    predicate: Box<dyn Fn(&E, Option<&E>) -> std::result::Result<(), String> + Send + Sync>,
}

impl<E> CustomConstraint<E> {
    /// Build a constraint named `name` whose predicate returns `Err(reason)`
    /// to reject a candidate entity.
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(&E, Option<&E>) -> std::result::Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        CustomConstraint { name: name.into(), predicate: Box::new(predicate) }
    }
}

impl<E> Constraint<E> for CustomConstraint<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, entity: &E, existing: Option<&E>) -> Result<()> {
        (self.predicate)(entity, existing).map_err(|message| GigaMapError::ConstraintViolation {
            constraint: self.name.clone(),
            message,
        })
    }
}
