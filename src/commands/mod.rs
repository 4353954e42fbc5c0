//! Command definitions and their resolution
//!
//! Raw JSON definitions pass through two stages before anything runs:
//! structural validation ([`schema`]) over the unresolved list, then
//! `extends` resolution ([`inherit`]), which merges each child onto its
//! parent and re-validates the result. Only fully resolved, strictly
//! valid [`definition::CommandDefinition`]s leave this module.

pub mod definition;
pub mod inherit;
pub mod schema;
