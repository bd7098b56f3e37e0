//! Wiki markup normalization applied before the external converter runs.
//!
//! The pipeline is an ordered list of rewrite rules folded over the text. Each
//! rule is applied globally and its output feeds the next one, so the order of
//! [`rules`] is part of the contract: the catch-all template rule must come
//! after the short-description and `Use ...` rules, which it would otherwise
//! swallow.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// How a rule rewrites a match.
pub enum Replacement {
    /// Replacement string with `${n}` capture references.
    Template(&'static str),
    /// Replacement computed from the captures.
    Computed(fn(&Captures<'_>) -> String),
}

pub struct RewriteRule {
    name: &'static str,
    pattern: Regex,
    replacement: Replacement,
}

impl RewriteRule {
    fn new(name: &'static str, pattern: &str, replacement: Replacement) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("valid cleaner pattern"),
            replacement,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Rewrites every match of this rule; borrows the input when nothing matched.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match &self.replacement {
            Replacement::Template(template) => self.pattern.replace_all(text, *template),
            Replacement::Computed(compute) => self
                .pattern
                .replace_all(text, |caps: &Captures<'_>| compute(caps)),
        }
    }
}

static RULES: LazyLock<Vec<RewriteRule>> = LazyLock::new(|| {
    vec![
        RewriteRule::new(
            "wikitable_style",
            r#"\{\| class="wikitable sortable mw-collapsible" ; (text-align:[^"]+)""#,
            Replacement::Template(r#"{| class="wikitable sortable mw-collapsible" style="${1}""#),
        ),
        RewriteRule::new("row_separator", r"(?m)\|-[ \t]+$", Replacement::Template("|-")),
        RewriteRule::new(
            "vertical_align",
            r#"\| style="vertical-align: top; \|"#,
            Replacement::Template(r#"| style="vertical-align: top;" |"#),
        ),
        RewriteRule::new(
            "sheets_value",
            r#"data-sheets-value="\{"1":2,"2":"([^"]+)"\}""#,
            Replacement::Template(r#"data-sheets-value="${1}""#),
        ),
        RewriteRule::new(
            "short_description",
            r"\{\{[Ss]hort description\|([^}]+)\}\}",
            Replacement::Template("<!-- Short description: ${1} -->"),
        ),
        RewriteRule::new("use_template", r"\{\{Use [^}]+\}\}", Replacement::Template("")),
        RewriteRule::new(
            "named_ref_double",
            r#"<ref name="([^"]+)">\s*</ref>"#,
            Replacement::Template("<!--ref ${1}-->"),
        ),
        RewriteRule::new(
            "named_ref_single",
            r"<ref name='([^']+)'>\s*</ref>",
            Replacement::Template("<!--ref ${1}-->"),
        ),
        RewriteRule::new(
            "template",
            r"\{\{([^}]+)\}\}",
            Replacement::Template("<!-- ${1} -->"),
        ),
        RewriteRule::new(
            "internal_link",
            r"\[\[(.+?)\]\]",
            Replacement::Computed(|caps| wikilink(&caps[1])),
        ),
    ]
});

/// The cleaning rules in application order.
pub fn rules() -> &'static [RewriteRule] {
    &RULES
}

pub fn rule(name: &str) -> Option<&'static RewriteRule> {
    rules().iter().find(|rule| rule.name == name)
}

/// Normalizes raw wiki markup. Pure and deterministic.
pub fn clean(text: &str) -> String {
    rules().iter().fold(text.to_string(), |acc, rule| {
        let rewritten = match rule.apply(&acc) {
            Cow::Owned(out) => Some(out),
            Cow::Borrowed(_) => None,
        };
        rewritten.unwrap_or(acc)
    })
}

/// `target|label` becomes `[label](/target)`; a bare link labels itself.
/// Spaces in the target turn into underscores.
fn wikilink(inner: &str) -> String {
    match inner.split_once('|') {
        Some((target, label)) => format!("[{label}](/{})", target.replace(' ', "_")),
        None => format!("[{inner}](/{})", inner.replace(' ', "_")),
    }
}
