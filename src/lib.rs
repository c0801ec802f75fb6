//! Palisade - attribute-aware permission rules for project secrets
//!
//! Given a rule set scoped to one role, a subject type, an action, and the
//! live attributes of the resource being touched, the engine produces an
//! ALLOW/DENY verdict. Explicit deny overrides allow, absence of a matching
//! allow rule is a deny, and evaluation never depends on rule order.

pub mod condition;
pub mod editor;
pub mod engine;
pub mod errors;
pub mod registry;
pub mod snapshot;
pub mod types;
pub mod validate;
