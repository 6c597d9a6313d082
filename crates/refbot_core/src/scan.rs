use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use similar::TextDiff;
use walkdir::WalkDir;

use crate::placer::{Classification, ReasonCode, ReferenceSectionPlacer};

const PAGE_EXTENSIONS: [&str; 2] = ["wiki", "wikitext"];

#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub path: String,
    pub classification: Classification,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub scanned_pages: usize,
    pub lacking_references: usize,
    pub pages: Vec<PageReport>,
}

/// One computed page edit, kept alongside the original text so the caller
/// can diff and roll back; nothing is written until the edit is applied.
#[derive(Debug, Clone, Serialize)]
pub struct ProposedEdit {
    pub path: String,
    pub reason: ReasonCode,
    #[serde(skip)]
    pub old_text: String,
    #[serde(skip)]
    pub new_text: String,
}

impl ProposedEdit {
    pub fn unified_diff(&self) -> String {
        TextDiff::from_lines(self.old_text.as_str(), self.new_text.as_str())
            .unified_diff()
            .header(&self.path, &self.path)
            .to_string()
    }

    /// Human-readable edit summary derived from the reason code.
    pub fn summary(&self) -> &'static str {
        match self.reason {
            ReasonCode::FixTag => "Fixing references tag",
            ReasonCode::AddTag => "Adding missing references tag",
        }
    }
}

/// Outcome of the wrapper-layer review loop over proposed edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Accept,
    Reject,
    AcceptAll,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ReviewReport {
    pub accepted: usize,
    pub rejected: usize,
}

/// Classify every page file under `root` (or the single file `root` names).
pub fn scan_pages(placer: &ReferenceSectionPlacer<'_>, root: &Path) -> Result<ScanReport> {
    let mut pages = Vec::new();
    let mut lacking = 0usize;
    for path in page_files(root)? {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let classification = placer.classify(&text);
        if classification.needs_references() {
            lacking += 1;
        }
        pages.push(PageReport {
            path: normalize_path(&path),
            classification,
        });
    }
    Ok(ScanReport {
        scanned_pages: pages.len(),
        lacking_references: lacking,
        pages,
    })
}

/// Compute a proposed edit for every page lacking a references list. Pages
/// that pass classification are left untouched.
pub fn collect_edits(placer: &ReferenceSectionPlacer<'_>, root: &Path) -> Result<Vec<ProposedEdit>> {
    let mut edits = Vec::new();
    for path in page_files(root)? {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if !placer.lacks_references(&text) {
            continue;
        }
        let placement = placer.add_references(&text);
        edits.push(ProposedEdit {
            path: normalize_path(&path),
            reason: placement.reason,
            old_text: text,
            new_text: placement.text,
        });
    }
    Ok(edits)
}

/// Run the accept/reject/accept-all decision loop and write accepted edits
/// back to disk. After an accept-all, the remaining edits are applied
/// without consulting the callback again.
pub fn review_edits<F>(edits: &[ProposedEdit], mut decide: F) -> Result<ReviewReport>
where
    F: FnMut(&ProposedEdit) -> ReviewDecision,
{
    let mut report = ReviewReport::default();
    let mut accept_all = false;
    for edit in edits {
        let decision = if accept_all {
            ReviewDecision::Accept
        } else {
            decide(edit)
        };
        match decision {
            ReviewDecision::Reject => report.rejected += 1,
            ReviewDecision::Accept => {
                apply_edit(edit)?;
                report.accepted += 1;
            }
            ReviewDecision::AcceptAll => {
                accept_all = true;
                apply_edit(edit)?;
                report.accepted += 1;
            }
        }
    }
    Ok(report)
}

pub fn apply_edit(edit: &ProposedEdit) -> Result<()> {
    fs::write(&edit.path, &edit.new_text)
        .with_context(|| format!("failed to write {}", edit.path))
}

fn page_files(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.exists() {
        anyhow::bail!("no such file or directory: {}", root.display());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_page = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| PAGE_EXTENSIONS.contains(&ext));
        if is_page {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SiteConfig, SiteRegistry};
    use tempfile::tempdir;

    fn en_site() -> SiteConfig {
        SiteRegistry::builtin().site("wikipedia", "en")
    }

    #[test]
    fn scan_counts_pages_lacking_references() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.wiki"), "Body<ref>x</ref>\n").expect("write");
        fs::write(temp.path().join("b.wiki"), "Body<ref>x</ref>\n<references />\n")
            .expect("write");
        fs::write(temp.path().join("c.wiki"), "No citations here.\n").expect("write");
        fs::write(temp.path().join("notes.txt"), "ignored<ref>x</ref>\n").expect("write");

        let site = en_site();
        let placer = ReferenceSectionPlacer::new(&site).expect("placer");
        let report = scan_pages(&placer, temp.path()).expect("scan");
        assert_eq!(report.scanned_pages, 3);
        assert_eq!(report.lacking_references, 1);
        assert_eq!(
            report.pages[0].classification,
            Classification::LacksReferences
        );
        assert_eq!(report.pages[1].classification, Classification::MarkerPresent);
        assert_eq!(
            report.pages[2].classification,
            Classification::NoInlineCitations
        );
    }

    #[test]
    fn collect_edits_skips_clean_pages() {
        let temp = tempdir().expect("tempdir");
        fs::write(
            temp.path().join("a.wiki"),
            "Intro text.<ref>cite</ref>\n\n[[Category:Test]]",
        )
        .expect("write");
        fs::write(temp.path().join("b.wiki"), "Done.<ref>x</ref>\n<references />\n")
            .expect("write");

        let site = en_site();
        let placer = ReferenceSectionPlacer::new(&site).expect("placer");
        let edits = collect_edits(&placer, temp.path()).expect("collect");
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].reason, ReasonCode::AddTag);
        assert!(edits[0].new_text.contains("== References =="));
        assert_eq!(edits[0].summary(), "Adding missing references tag");
    }

    #[test]
    fn unified_diff_shows_inserted_section() {
        let temp = tempdir().expect("tempdir");
        fs::write(
            temp.path().join("a.wiki"),
            "Intro.<ref>x</ref>\n\n[[Category:T]]\n",
        )
        .expect("write");

        let site = en_site();
        let placer = ReferenceSectionPlacer::new(&site).expect("placer");
        let edits = collect_edits(&placer, temp.path()).expect("collect");
        let diff = edits[0].unified_diff();
        assert!(diff.contains("+== References =="));
        assert!(diff.contains("+<references />"));
        assert!(!diff.contains("-Intro."));
    }

    #[test]
    fn review_applies_accepted_and_keeps_rejected() {
        let temp = tempdir().expect("tempdir");
        let accepted_path = temp.path().join("a.wiki");
        let rejected_path = temp.path().join("b.wiki");
        fs::write(&accepted_path, "One.<ref>x</ref>\n").expect("write");
        fs::write(&rejected_path, "Two.<ref>x</ref>\n").expect("write");

        let site = en_site();
        let placer = ReferenceSectionPlacer::new(&site).expect("placer");
        let edits = collect_edits(&placer, temp.path()).expect("collect");
        assert_eq!(edits.len(), 2);

        let report = review_edits(&edits, |edit| {
            if edit.path.ends_with("a.wiki") {
                ReviewDecision::Accept
            } else {
                ReviewDecision::Reject
            }
        })
        .expect("review");
        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected, 1);

        let accepted = fs::read_to_string(&accepted_path).expect("read");
        assert!(accepted.contains("<references />"));
        let rejected = fs::read_to_string(&rejected_path).expect("read");
        assert!(!rejected.contains("<references />"));
    }

    #[test]
    fn accept_all_stops_consulting_the_callback() {
        let temp = tempdir().expect("tempdir");
        for name in ["a.wiki", "b.wiki", "c.wiki"] {
            fs::write(temp.path().join(name), "Page.<ref>x</ref>\n").expect("write");
        }

        let site = en_site();
        let placer = ReferenceSectionPlacer::new(&site).expect("placer");
        let edits = collect_edits(&placer, temp.path()).expect("collect");

        let mut calls = 0usize;
        let report = review_edits(&edits, |_| {
            calls += 1;
            ReviewDecision::AcceptAll
        })
        .expect("review");
        assert_eq!(calls, 1);
        assert_eq!(report.accepted, 3);
    }

    #[test]
    fn scanning_a_single_file_works() {
        let temp = tempdir().expect("tempdir");
        let page = temp.path().join("only.wiki");
        fs::write(&page, "Text.<ref>x</ref>\n").expect("write");

        let site = en_site();
        let placer = ReferenceSectionPlacer::new(&site).expect("placer");
        let report = scan_pages(&placer, &page).expect("scan");
        assert_eq!(report.scanned_pages, 1);
        assert_eq!(report.lacking_references, 1);
    }

    #[test]
    fn missing_root_is_an_error() {
        let site = en_site();
        let placer = ReferenceSectionPlacer::new(&site).expect("placer");
        let error = scan_pages(&placer, Path::new("/nonexistent/pages")).expect_err("must fail");
        assert!(error.to_string().contains("no such file or directory"));
    }
}
