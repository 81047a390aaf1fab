//! Text substitution back into the host document.

mod engine;

pub use engine::{ReplacementEngine, ReplacementOutcome, Substitution, plan_substitution};
