//! Detection of prompts that only the legacy host grammar understands.
//!
//! The host ships two schedule parsers. The optimized one is faster but
//! rejects nested step switches, curve names and elided boundaries, all of
//! which the interpolation tensor emits. [`requires_legacy`] finds prompts
//! that use any of them.

use std::{fmt, sync::LazyLock};

use log::debug;
use regex::{Regex, RegexBuilder};
use serde::Serialize;

static CURVE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\[[^\]]*:\s*(?::\s*)?(?:bezier|catmull|linear|mean)\b")
        .case_insensitive(true)
        .build()
        .expect("curve name pattern is valid")
});

static COLON_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*:\s*,").expect("colon comma pattern is valid"));

static COLON_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*:\s*]").expect("colon close pattern is valid"));

/// Returns `true` when any of `prompts` needs the legacy host grammar.
///
/// Only prompts containing `[` are inspected. A prompt needs the legacy
/// grammar when it holds `[[`, names a curve after a colon, or has a colon
/// directly followed by a comma or a closing bracket.
///
/// # Examples
///
/// ```
/// use prompt_fusion::legacy::requires_legacy;
///
/// assert!(requires_legacy(["[[a:b:1]:c:2]"]));
/// assert!(requires_legacy(["[a:b:,]"]));
/// assert!(!requires_legacy(["plain prompt", "[from:to:2]"]));
/// ```
pub fn requires_legacy<I, S>(prompts: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    prompts.into_iter().any(|prompt| {
        let prompt = prompt.as_ref();
        prompt.contains('[')
            && (prompt.contains("[[")
                || CURVE_NAME_RE.is_match(prompt)
                || COLON_COMMA_RE.is_match(prompt)
                || COLON_CLOSE_RE.is_match(prompt))
    })
}

/// The host schedule grammar a set of prompts is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostGrammar {
    /// The host's current, optimized parser.
    Optimized,
    /// The host's older parser, which accepts nested and elided switches.
    Legacy,
}

impl HostGrammar {
    /// Select the grammar for `prompts`.
    pub fn select<I, S>(prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let grammar = if requires_legacy(prompts) {
            HostGrammar::Legacy
        } else {
            HostGrammar::Optimized
        };
        debug!(grammar:% = grammar; "Host grammar selected");
        grammar
    }

    /// Returns `true` for [`HostGrammar::Legacy`].
    pub fn is_legacy(self) -> bool {
        matches!(self, HostGrammar::Legacy)
    }
}

impl fmt::Display for HostGrammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostGrammar::Optimized => write!(f, "optimized"),
            HostGrammar::Legacy => write!(f, "legacy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_switch_requires_legacy() {
        assert!(requires_legacy(["[[a:b:1]:c:2]"]));
    }

    #[test]
    fn test_curve_names_require_legacy() {
        assert!(requires_legacy(["[a:b:,:bezier]"]));
        assert!(requires_legacy(["[a:b:: Catmull]"]));
        assert!(requires_legacy(["[a:b:LINEAR]"]));
        assert!(requires_legacy(["[a:b:mean]"]));
        assert!(!requires_legacy(["[a:b:meanwhile]"]));
    }

    #[test]
    fn test_elided_boundaries_require_legacy() {
        assert!(requires_legacy(["[a:b: ,5]"]));
        assert!(requires_legacy(["[a:b:]"]));
        assert!(requires_legacy(["[a:b: ]"]));
    }

    #[test]
    fn test_plain_prompts() {
        assert!(!requires_legacy(["plain prompt"]));
        assert!(!requires_legacy(["[from:to:2]", "(a:1.2)", "[a|b]"]));
        assert!(!requires_legacy(Vec::<String>::new()));
    }

    #[test]
    fn test_any_prompt_decides() {
        let prompts = vec!["a cat".to_string(), "[[x:y:1]:z:2]".to_string()];
        assert!(requires_legacy(&prompts));
    }

    #[test]
    fn test_select() {
        assert_eq!(HostGrammar::select(["[a:b:,]"]), HostGrammar::Legacy);
        assert_eq!(HostGrammar::select(["a cat"]), HostGrammar::Optimized);
        assert!(HostGrammar::Legacy.is_legacy());
        assert_eq!(HostGrammar::Optimized.to_string(), "optimized");
    }
}
