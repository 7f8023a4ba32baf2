//! In-process secret heuristic scanner.
//!
//! Walks the project's source files and reports every `(file, pattern)` pair
//! where a sensitive-value pattern occurs as a case-sensitive substring.
//! This is cheap triage, not proof: false positives and negatives are
//! expected. Unreadable files are skipped without failing the scan.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::domain::outcome::Finding;

/// What to scan and what to look for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanConfig {
    /// File extensions (without dot) that are scanned.
    pub extensions: Vec<String>,

    /// Case-sensitive substrings that indicate a committed secret.
    pub patterns: Vec<String>,

    /// Directory names that are never descended into.
    pub excluded_dirs: Vec<String>,

    /// Example/template markers; matching files are never reported.
    pub excluded_file_suffixes: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: strings(&["ts", "tsx", "js", "jsx"]),
            patterns: strings(&["DATABASE_URL=", "AUTH_SECRET=", "GOOGLE_CLIENT_SECRET="]),
            excluded_dirs: strings(&["node_modules", ".next", "dist", ".git"]),
            excluded_file_suffixes: strings(&[".example"]),
        }
    }
}

impl ScanConfig {
    /// Pattern set used by the pre-deploy profile.
    pub fn extended() -> Self {
        Self {
            patterns: strings(&[
                "DATABASE_URL=postgres://",
                "AUTH_SECRET=",
                "GOOGLE_CLIENT_SECRET=",
                "password=",
                "apiKey=",
            ]),
            excluded_file_suffixes: strings(&[".example", ".env"]),
            ..Self::default()
        }
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .map(|name| self.excluded_dirs.iter().any(|d| d == name))
                .unwrap_or(false)
    }

    fn has_scanned_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }

    /// Example/template files: the marker ends the name or precedes another
    /// extension (`config.example.ts`).
    fn is_template_file(&self, path: &Path) -> bool {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };
        self.excluded_file_suffixes
            .iter()
            .any(|marker| name.ends_with(marker.as_str()) || name.contains(&format!("{marker}.")))
    }
}

/// Result of one scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanReport {
    /// Findings in walk order (files sorted by name within each directory).
    pub findings: Vec<Finding>,
    pub files_scanned: usize,

    /// Files that could not be read.
    pub files_skipped: usize,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Human-readable listing, one finding per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for finding in &self.findings {
            out.push_str(&finding.to_string());
            out.push('\n');
        }
        out.push_str(&format!(
            "{} file(s) scanned, {} finding(s)\n",
            self.files_scanned,
            self.findings.len()
        ));
        out
    }
}

/// Scan `root` for sensitive-value patterns.
pub fn scan(root: &Path, config: &ScanConfig) -> ScanReport {
    let mut report = ScanReport::default();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !config.is_excluded_dir(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "Skipping unwalkable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !config.has_scanned_extension(entry.path()) {
            continue;
        }

        let bytes = match std::fs::read(entry.path()) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file = %entry.path().display(), error = %e, "Skipping unreadable file");
                report.files_skipped += 1;
                continue;
            }
        };
        report.files_scanned += 1;

        if config.is_template_file(entry.path()) {
            continue;
        }

        let content = String::from_utf8_lossy(&bytes);
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        for pattern in &config.patterns {
            if content.contains(pattern.as_str()) {
                report.findings.push(Finding {
                    file: relative.to_path_buf(),
                    pattern: pattern.clone(),
                });
            }
        }
    }

    debug!(
        root = %root.display(),
        scanned = report.files_scanned,
        findings = report.findings.len(),
        "Secret scan complete"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_clean_tree_has_no_findings() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/app.ts", "export const x = 1;");
        let report = scan(dir.path(), &ScanConfig::default());
        assert!(report.is_clean());
        assert_eq!(report.files_scanned, 1);
    }

    #[test]
    fn test_excluded_dirs_are_not_descended() {
        let dir = tempdir().unwrap();
        write(dir.path(), "node_modules/pkg/index.js", "AUTH_SECRET=abc");
        write(dir.path(), ".next/server.js", "AUTH_SECRET=abc");
        let report = scan(dir.path(), &ScanConfig::default());
        assert!(report.is_clean());
        assert_eq!(report.files_scanned, 0);
    }

    #[test]
    fn test_non_source_extensions_ignored() {
        let dir = tempdir().unwrap();
        write(dir.path(), "notes.md", "AUTH_SECRET=abc");
        assert!(scan(dir.path(), &ScanConfig::default()).is_clean());
    }

    #[test]
    fn test_one_finding_per_file_and_pattern() {
        let dir = tempdir().unwrap();
        write(dir.path(), "lib/db.ts", "DATABASE_URL=x\nAUTH_SECRET=y\nAUTH_SECRET=z");
        let report = scan(dir.path(), &ScanConfig::default());
        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.findings[0].file, PathBuf::from("lib/db.ts"));
        assert_eq!(report.findings[0].pattern, "DATABASE_URL=");
        assert_eq!(report.findings[1].pattern, "AUTH_SECRET=");
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.js", "auth_secret=abc");
        assert!(scan(dir.path(), &ScanConfig::default()).is_clean());
    }

    #[test]
    fn test_template_markers() {
        let config = ScanConfig::default();
        assert!(config.is_template_file(Path::new("config.example.ts")));
        assert!(config.is_template_file(Path::new("config.ts.example")));
        assert!(!config.is_template_file(Path::new("config.ts")));
        assert!(!config.is_template_file(Path::new("examples.ts")));
    }

    #[test]
    fn test_env_marker_matches_file_name_only() {
        let config = ScanConfig::extended();
        assert!(config.is_template_file(Path::new("keys.env.ts")));
        assert!(config.is_template_file(Path::new("src/config.env")));
        assert!(!config.is_template_file(Path::new(".envs/keys.ts")));
        assert!(!config.is_template_file(Path::new("app.environment.ts")));
    }

    #[test]
    fn test_invalid_utf8_is_scanned_lossily() {
        let dir = tempdir().unwrap();
        let mut bytes = vec![0xff, 0xfe];
        bytes.extend_from_slice(b"AUTH_SECRET=abc");
        std::fs::write(dir.path().join("bin.js"), bytes).unwrap();
        assert_eq!(scan(dir.path(), &ScanConfig::default()).findings.len(), 1);
    }

    #[test]
    fn test_extended_patterns() {
        let dir = tempdir().unwrap();
        write(dir.path(), "client.tsx", "const c = { apiKey= 'x' }");
        assert!(scan(dir.path(), &ScanConfig::default()).is_clean());
        assert_eq!(scan(dir.path(), &ScanConfig::extended()).findings.len(), 1);
    }
}
