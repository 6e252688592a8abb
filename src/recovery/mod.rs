//! Failure classification and fallback planning
//!
//! - `classifier`: raw message → typed `ErrorPattern` via a versioned rule table
//! - `fallback`: static adjacency table of substitute tools
//! - `types`: the taxonomy and rule/suggestion types

pub mod classifier;
pub mod fallback;
pub mod types;

pub use classifier::{default_rules, ErrorClassifier};
pub use fallback::FallbackPlanner;
pub use types::{ClassifierRule, ErrorPattern, ErrorType, FallbackSuggestion, RuleSet};
