use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

use crate::config::SiteConfig;
use crate::disabled::{DisabledRegions, remove_disabled_parts};

static REF_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</ref>").expect("ref-close pattern"));
static SELF_CLOSING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<references.*?/>").expect("self-closing pattern"));
static TAG_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<references>.*?</references>").expect("tag-pair pattern"));
// Two opening tags, or an opening tag immediately followed by a self-closing
// one, that should have been a single references block.
static DOUBLE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)< *references *>(.*?)< */?\s*references */? *>").expect("double-tag pattern")
});
static UNCLOSED_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"< *references *>").expect("unclosed-tag pattern"));
// The run of templates and comments that may directly follow a section
// heading; the marker is injected after it so boilerplate notices stay first.
static LEADING_BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A(?:\s*(?:\{\{[^{}]*?\}\}|<!--.*?-->))*").expect("boilerplate pattern")
});
static INTERWIKI_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[[a-zA-Z\-]+\s?:[^\[\]\n]*\]\]").expect("interwiki pattern"));
// Bare template invocation on its own line. Single-level brace matching:
// nested templates are not recognized (known limitation inherited from the
// trailing-boilerplate heuristic).
static TRAILING_TEMPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n\{\{[^{}]*\}\}").expect("trailing-template pattern"));
static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern"));

/// Outcome of classifying one page, with the skip reason preserved for the
/// caller's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// Inline citations present but no references list: action required.
    LacksReferences,
    /// A references tag (self-closing or open/close pair) already exists.
    MarkerPresent,
    /// A configured equivalent template is already invoked.
    EquivalentTemplate,
    /// No closing citation tag anywhere: nothing to collect.
    NoInlineCitations,
}

impl Classification {
    pub fn needs_references(self) -> bool {
        self == Classification::LacksReferences
    }
}

/// Machine-readable reason attached to a produced edit, used by the caller
/// to build the edit summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReasonCode {
    FixTag,
    AddTag,
}

impl ReasonCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCode::FixTag => "fix-tag",
            ReasonCode::AddTag => "add-tag",
        }
    }
}

/// Replacement text for one page, built from slices of the input plus the
/// inserted marker; the input itself is never modified.
#[derive(Debug, Clone)]
pub struct Placement {
    pub text: String,
    pub reason: ReasonCode,
}

/// Decides whether a page needs an automatically generated references list
/// and, if so, produces the amended markup. Holds the per-site tables and
/// the patterns compiled from them; read-only after construction, safe to
/// share across threads.
#[derive(Debug)]
pub struct ReferenceSectionPlacer<'cfg> {
    site: &'cfg SiteConfig,
    template_equivalents: Option<Regex>,
    section_headings: Vec<Regex>,
    place_before_headings: Vec<Regex>,
    category_link: Regex,
}

impl<'cfg> ReferenceSectionPlacer<'cfg> {
    pub fn new(site: &'cfg SiteConfig) -> Result<Self> {
        let template_equivalents = if site.references_templates.is_empty() {
            None
        } else {
            let alternatives = site
                .references_templates
                .iter()
                .map(|name| regex::escape(name))
                .collect::<Vec<_>>()
                .join("|");
            Some(
                Regex::new(&format!(r"(?i)\{{\{{(?:{alternatives})"))
                    .context("failed to compile references-template pattern")?,
            )
        };

        let section_headings = compile_heading_patterns(&site.references_sections)?;
        let place_before_headings = compile_heading_patterns(&site.place_before_sections)?;

        let namespaces = site
            .category_namespaces()
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");
        let category_link = Regex::new(&format!(r"\[\[\s*(?:{namespaces})\s*:[^\n]*\]\]"))
            .context("failed to compile category-link pattern")?;

        Ok(Self {
            site,
            template_equivalents,
            section_headings,
            place_before_headings,
            category_link,
        })
    }

    /// Classify whether the page is lacking a references list. Disabled
    /// regions are stripped before any pattern is consulted. Pure; no side
    /// effects.
    pub fn classify(&self, text: &str) -> Classification {
        let cleaned = remove_disabled_parts(text);
        if SELF_CLOSING_TAG.is_match(&cleaned) || TAG_PAIR.is_match(&cleaned) {
            return Classification::MarkerPresent;
        }
        if let Some(pattern) = &self.template_equivalents
            && pattern.is_match(&cleaned)
        {
            return Classification::EquivalentTemplate;
        }
        if !REF_CLOSE.is_match(&cleaned) {
            return Classification::NoInlineCitations;
        }
        Classification::LacksReferences
    }

    pub fn lacks_references(&self, text: &str) -> bool {
        self.classify(text).needs_references()
    }

    /// Produce the amended page text. Must only be called when `classify`
    /// reported `LacksReferences`; under that contract it is total and never
    /// fails, falling through to the trailing-boilerplate rule at worst.
    pub fn add_references(&self, text: &str) -> Placement {
        if let Some(repaired) = repair_malformed_tag(text) {
            return Placement {
                text: repaired,
                reason: ReasonCode::FixTag,
            };
        }

        let disabled = DisabledRegions::compute(text);
        if let Some(updated) = self.insert_into_existing_section(text, &disabled) {
            return Placement {
                text: updated,
                reason: ReasonCode::AddTag,
            };
        }
        if let Some(updated) = self.create_before_later_section(text, &disabled) {
            return Placement {
                text: updated,
                reason: ReasonCode::AddTag,
            };
        }
        let index = self.trailing_boilerplate_start(text);
        Placement {
            text: self.create_reference_section(text, index, "=="),
            reason: ReasonCode::AddTag,
        }
    }

    /// Rule 3: add the marker inside the first acceptable existing section,
    /// scanning configured heading names in priority order. Matches inside
    /// disabled regions are skipped without aborting the scan.
    fn insert_into_existing_section(
        &self,
        text: &str,
        disabled: &DisabledRegions,
    ) -> Option<String> {
        for heading in &self.section_headings {
            let mut index = 0;
            while index < text.len() {
                let Some(caps) = heading.captures_at(text, index) else {
                    break;
                };
                let (Some(whole), Some(open), Some(close)) =
                    (caps.get(0), caps.get(1), caps.get(2))
                else {
                    break;
                };
                if open.len() != close.len() || disabled.contains(whole.start()) {
                    index = whole.end();
                    continue;
                }
                // Cut just before the heading's trailing newline so the
                // boilerplate scan sees the start of the section body.
                let cut = whole.end() - 1;
                let tail = &text[cut..];
                let boundary = LEADING_BOILERPLATE.find(tail).map_or(0, |found| found.end());
                return Some(format!(
                    "{}{}\n{}\n{}",
                    &text[..cut],
                    &tail[..boundary],
                    self.site.substitute(),
                    &tail[boundary..]
                ));
            }
        }
        None
    }

    /// Rule 4: create a brand-new section in front of the first configured
    /// place-before heading, reusing its wrapper length.
    fn create_before_later_section(
        &self,
        text: &str,
        disabled: &DisabledRegions,
    ) -> Option<String> {
        for heading in &self.place_before_headings {
            let mut index = 0;
            while index < text.len() {
                let Some(caps) = heading.captures_at(text, index) else {
                    break;
                };
                let (Some(whole), Some(open), Some(close)) =
                    (caps.get(0), caps.get(1), caps.get(2))
                else {
                    break;
                };
                if open.len() != close.len() || disabled.contains(whole.start()) {
                    index = whole.end();
                    continue;
                }
                return Some(self.create_reference_section(text, whole.start(), open.as_str()));
            }
        }
        None
    }

    /// Rule 5 support: offset just before the contiguous trailing run of
    /// category links, interwiki links, bare templates, and comments.
    /// Units are stripped from the end of a working copy until none match.
    fn trailing_boilerplate_start(&self, text: &str) -> usize {
        let mut end = text.len();
        loop {
            let Some(start) = self.last_trailing_unit_start(&text[..end]) else {
                break;
            };
            end = start;
        }
        end
    }

    fn last_trailing_unit_start(&self, tail: &str) -> Option<usize> {
        let units: [&Regex; 4] = [
            &self.category_link,
            &INTERWIKI_LINK,
            &TRAILING_TEMPLATE,
            &HTML_COMMENT,
        ];
        for unit in units {
            let Some(found) = unit.find_iter(tail).last() else {
                continue;
            };
            if !tail[found.end()..].trim().is_empty() {
                continue;
            }
            // The unit claims one preceding line break as well, so the
            // insertion point lands above the blank line, not inside it.
            let mut start = found.start();
            if tail[..start].ends_with('\n') {
                start -= 1;
                if tail[..start].ends_with('\r') {
                    start -= 1;
                }
            }
            return Some(start);
        }
        None
    }

    /// Build a new references section and splice it into the text at
    /// `index`. Sites flagged no-title-required get the bare substitute with
    /// blank-line padding instead of a heading.
    fn create_reference_section(&self, text: &str, index: usize, ident: &str) -> String {
        let section = if self.site.no_title_required {
            format!("\n\n{}\n", self.site.substitute())
        } else {
            format!(
                "\n\n{ident} {} {ident}\n{}\n",
                self.site.preferred_section_title(),
                self.site.substitute()
            )
        };
        format!("{}{section}{}", text[..index].trim_end(), &text[index..])
    }
}

/// Rules 1 and 2: collapse a doubled references tag into a single
/// open/close pair, or rewrite a lone unclosed tag as self-closing.
fn repair_malformed_tag(text: &str) -> Option<String> {
    if DOUBLE_TAG.is_match(text) {
        return Some(
            DOUBLE_TAG
                .replace_all(text, "<references>$1</references>")
                .into_owned(),
        );
    }
    if UNCLOSED_TAG.is_match(text) {
        return Some(UNCLOSED_TAG.replace_all(text, "<references />").into_owned());
    }
    None
}

fn compile_heading_patterns(names: &[String]) -> Result<Vec<Regex>> {
    names
        .iter()
        .map(|name| {
            Regex::new(&format!(
                r"\r?\n(=+) *{} *(=+) *\r?\n",
                regex::escape(name)
            ))
            .with_context(|| format!("failed to compile heading pattern for {name}"))
        })
        .collect()
}
