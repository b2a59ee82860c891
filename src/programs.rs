//! Common programs offered when building an allowlist.

use crate::engine::Allowlist;

/// Frequently used desktop programs.
pub const SUGGESTED_PROGRAMS: &[&str] = &[
    "chrome.exe",
    "firefox.exe",
    "msedge.exe",
    "Code.exe",
    "notepad++.exe",
    "Notion.exe",
    "slack.exe",
    "discord.exe",
    "EXCEL.EXE",
    "WINWORD.EXE",
    "POWERPNT.EXE",
    "Photoshop.exe",
    "Illustrator.exe",
    "figma.exe",
    "obs64.exe",
    "Spotify.exe",
];

/// Suggested programs sorted case-insensitively.
pub fn suggested() -> Vec<&'static str> {
    let mut programs = SUGGESTED_PROGRAMS.to_vec();
    programs.sort_by_key(|p| p.to_lowercase());
    programs
}

/// Suggestions paired with whether the allowlist already names them.
pub fn suggested_with_status(allowlist: &Allowlist) -> Vec<(&'static str, bool)> {
    suggested()
        .into_iter()
        .map(|program| (program, allowlist.contains_exact(program)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggested_sorted() {
        let programs = suggested();
        assert_eq!(programs.len(), SUGGESTED_PROGRAMS.len());
        assert_eq!(programs[0], "chrome.exe");
        assert_eq!(programs.last(), Some(&"WINWORD.EXE"));
    }

    #[test]
    fn test_status_marks_allowlisted() {
        let allowlist = Allowlist::new(["notion", "code"]);
        let status = suggested_with_status(&allowlist);
        assert!(status.contains(&("Notion.exe", true)));
        assert!(status.contains(&("Code.exe", true)));
        assert!(status.contains(&("slack.exe", false)));
    }
}
