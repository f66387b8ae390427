//! Template expansion: splices evaluated `{expression}` fragments into
//! narrative text.

use std::collections::HashSet;

use tracing::warn;
use tw_core::WorldState;

use crate::eval::Evaluator;

/// Marker prefixed to the original text when expansion does not settle.
pub const DEPTH_EXCEEDED_MARKER: &str = "[expansion depth exceeded]";

/// Configuration for a [`TemplateExpander`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpanderConfig {
    /// Maximum number of splice steps before giving up.
    pub max_depth: usize,
    /// Stop as soon as a spliced text repeats an earlier one while the
    /// world is unchanged.
    pub detect_cycles: bool,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            detect_cycles: true,
        }
    }
}

impl ExpanderConfig {
    /// Create a config with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of splice steps (at least 1).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Enable or disable cycle detection.
    pub fn with_cycle_detection(mut self, detect_cycles: bool) -> Self {
        self.detect_cycles = detect_cycles;
        self
    }
}

/// Expands embedded expressions in narrative text.
///
/// Braces are matched positionally, not by nesting: the first `{` pairs
/// with the first `}` after it. One pair is replaced per step, left to
/// right, and text produced by an expression is itself expanded.
#[derive(Debug, Clone, Default)]
pub struct TemplateExpander {
    evaluator: Evaluator,
    config: ExpanderConfig,
}

impl TemplateExpander {
    /// Create an expander with the given evaluator and limits.
    pub fn new(evaluator: Evaluator, config: ExpanderConfig) -> Self {
        Self { evaluator, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ExpanderConfig {
        &self.config
    }

    /// Expand every embedded expression in `text`.
    ///
    /// Evaluation failures become `Invalid expression '…'` in place of the
    /// fragment. If expansion has not settled after `max_depth` steps, or a
    /// cycle is detected, the result is the original text prefixed with
    /// [`DEPTH_EXCEEDED_MARKER`].
    pub fn expand(&self, world: &mut WorldState, text: &str) -> String {
        let mut current = text.to_string();
        let mut seen = HashSet::new();

        for _ in 0..self.config.max_depth {
            let Some((open, close)) = next_fragment(&current) else {
                return current;
            };
            // A repeated text is only a loop if no expression changed the world since.
            if self.config.detect_cycles && !seen.insert((world.revision(), current.clone())) {
                warn!(text, "template expansion cycle detected");
                return depth_exceeded(text);
            }

            let value = self.evaluator.evaluate(world, &current[open + 1..close]);
            let rendered = world.describe_value(&value);

            let mut spliced = String::with_capacity(current.len() + rendered.len());
            spliced.push_str(&current[..open]);
            spliced.push_str(&rendered);
            spliced.push_str(&current[close + 1..]);
            current = spliced;
        }

        if next_fragment(&current).is_none() {
            return current;
        }
        warn!(text, max_depth = self.config.max_depth, "template expansion depth exceeded");
        depth_exceeded(text)
    }
}

/// Byte positions of the first `{` and the first `}` after it.
fn next_fragment(text: &str) -> Option<(usize, usize)> {
    let open = text.find('{')?;
    let close = text[open + 1..].find('}')? + open + 1;
    Some((open, close))
}

fn depth_exceeded(text: &str) -> String {
    format!("{DEPTH_EXCEEDED_MARKER} {text}")
}
