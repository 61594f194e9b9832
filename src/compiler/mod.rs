//! Compiler module: raw intent patterns -> executable matchers
pub mod pattern;
pub mod compiler;

pub use self::pattern::{CompiledIntentPattern, IntentPatternSet, Matcher, RejectedPattern};
pub use self::compiler::PatternCompiler;
