//! Allowlist matching.
//!
//! Matching is deliberately permissive: after normalization a candidate
//! matches an entry when they are equal or either contains the other. A
//! one-letter entry such as `"a"` therefore matches most program names,
//! and an entry that normalizes to nothing (`""`, `".exe"`) matches all.

use serde::{Deserialize, Serialize};

/// Platform executable suffix removed during normalization.
const EXECUTABLE_SUFFIX: &str = ".exe";

/// Normalize a program name: lower-case, strip a trailing `.exe`, trim.
///
/// The suffix is stripped before trimming, so `"Code.exe "` keeps its
/// suffix and normalizes to `"code.exe"`.
pub fn normalize(name: &str) -> String {
    let lower = name.to_lowercase();
    let stripped = lower.strip_suffix(EXECUTABLE_SUFFIX).unwrap_or(&lower);
    stripped.trim().to_string()
}

fn normalized_match(entry: &str, candidate: &str) -> bool {
    candidate == entry || candidate.contains(entry) || entry.contains(candidate)
}

/// Check one candidate against a list of raw entries.
pub fn allowlist_match<S: AsRef<str>>(entries: &[S], candidate: &str) -> bool {
    let candidate = normalize(candidate);
    entries.iter().any(|entry| {
        let entry = normalize(entry.as_ref());
        normalized_match(&entry, &candidate)
    })
}

/// The user's ordered allowlist with entries pre-normalized for matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Allowlist {
    entries: Vec<String>,
    normalized: Vec<String>,
}

impl Allowlist {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<String> = entries.into_iter().map(Into::into).collect();
        let normalized = entries.iter().map(|e| normalize(e)).collect();
        Self {
            entries,
            normalized,
        }
    }

    /// Entries as the user wrote them, in order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `candidate` matches any entry.
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = normalize(candidate);
        self.normalized
            .iter()
            .any(|entry| normalized_match(entry, &candidate))
    }

    /// Whether an entry normalizes to exactly the same name as `program`.
    pub fn contains_exact(&self, program: &str) -> bool {
        let program = normalize(program);
        self.normalized.iter().any(|entry| *entry == program)
    }
}

impl From<Vec<String>> for Allowlist {
    fn from(entries: Vec<String>) -> Self {
        Self::new(entries)
    }
}

impl From<Allowlist> for Vec<String> {
    fn from(allowlist: Allowlist) -> Self {
        allowlist.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Code.exe"), "code");
        assert_eq!(normalize("EXCEL.EXE"), "excel");
        assert_eq!(normalize("  Notion  "), "notion");
        assert_eq!(normalize("Google Chrome.app"), "google chrome.app");
        assert_eq!(normalize("Code.exe "), "code.exe");
    }

    #[test]
    fn test_match_is_symmetric() {
        assert!(allowlist_match(&["Code.exe"], "code"));
        assert!(allowlist_match(&["code"], "Code.exe"));
        assert!(!allowlist_match(&["chrome.exe"], "firefox"));
        assert!(!allowlist_match(&["firefox"], "chrome.exe"));
    }

    #[test]
    fn test_containment_both_ways() {
        // Candidate contains entry
        assert!(allowlist_match(&["code"], "Visual Studio Code"));
        // Entry contains candidate
        assert!(allowlist_match(&["Visual Studio Code.app"], "Code"));
    }

    #[test]
    fn test_short_entry_is_permissive() {
        // Known false positive: a one-letter entry matches most programs
        let allowlist = Allowlist::new(["a"]);
        assert!(allowlist.matches("Slack"));
        assert!(!allowlist.matches("Spotify.exe"));
        assert!(!allowlist.matches("Code"));
    }

    #[test]
    fn test_blank_entries_match_everything() {
        // Empty string is a substring of every name
        assert!(allowlist_match(&[".exe"], "Code"));
        assert!(allowlist_match(&[""], "Code"));
        assert!(Allowlist::new([""]).matches("Code"));
        assert!(Allowlist::new(["   "]).matches("Spotify.exe"));
        assert!(Allowlist::new(["firefox", ".EXE"]).matches("Notion"));
    }

    #[test]
    fn test_order_does_not_change_result() {
        let a = Allowlist::new(["firefox", "notion.exe"]);
        let b = Allowlist::new(["notion.exe", "firefox"]);
        assert_eq!(a.matches("Notion"), b.matches("Notion"));
        assert!(a.matches("Notion"));
        assert_eq!(a.matches("Slack"), b.matches("Slack"));
    }

    #[test]
    fn test_duplicates_are_harmless() {
        let allowlist = Allowlist::new(["Code.exe", "code", "CODE.EXE"]);
        assert!(allowlist.matches("code"));
        assert_eq!(allowlist.len(), 3);
    }

    #[test]
    fn test_serde_as_plain_list() {
        let allowlist = Allowlist::new(["Code.exe", "Notion"]);
        let json = serde_json::to_string(&allowlist).unwrap();
        assert_eq!(json, r#"["Code.exe","Notion"]"#);
        let back: Allowlist = serde_json::from_str(&json).unwrap();
        assert_eq!(back, allowlist);
    }

    #[test]
    fn test_contains_exact() {
        let allowlist = Allowlist::new(["Notion.exe"]);
        assert!(allowlist.contains_exact("notion"));
        assert!(!allowlist.contains_exact("Notion Calendar"));
    }
}
