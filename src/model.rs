use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SCHEMA_VERSION: u32 = 1;

/// Conventional-commit style category inferred from a subject prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Feat,
    Fix,
    Refactor,
    Chore,
    Docs,
    Test,
    Ci,
    Perf,
    Revert,
    Wip,
    Merge,
    Other,
}

impl CommitType {
    /// Prefix-matched types, in matching order.
    pub const PREFIXED: [CommitType; 11] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Refactor,
        CommitType::Chore,
        CommitType::Docs,
        CommitType::Test,
        CommitType::Ci,
        CommitType::Perf,
        CommitType::Revert,
        CommitType::Wip,
        CommitType::Merge,
    ];

    /// Order used when listing a repository's commits grouped by type.
    pub const REPORT_ORDER: [CommitType; 7] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Refactor,
        CommitType::Chore,
        CommitType::Test,
        CommitType::Docs,
        CommitType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Refactor => "refactor",
            CommitType::Chore => "chore",
            CommitType::Docs => "docs",
            CommitType::Test => "test",
            CommitType::Ci => "ci",
            CommitType::Perf => "perf",
            CommitType::Revert => "revert",
            CommitType::Wip => "wip",
            CommitType::Merge => "merge",
            CommitType::Other => "other",
        }
    }

    /// Case-insensitive textual prefix match, first declared type wins.
    ///
    /// This is not a tokenizer: `refactoring: x` is a `Refactor` and
    /// `updated docs` is `Other`.
    pub fn classify(subject: &str) -> CommitType {
        let lower = subject.to_lowercase();
        Self::PREFIXED
            .into_iter()
            .find(|t| lower.starts_with(t.as_str()))
            .unwrap_or(CommitType::Other)
    }

    pub fn title(&self) -> String {
        let s = self.as_str();
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Short hash, at most 7 characters.
    pub hash: Option<String>,
    pub author: String,
    pub email: Option<String>,
    /// Commit date as collected; `YYYY-MM-DD` is expected in the first 10 characters.
    pub date: String,
    pub subject: String,
    pub body: String,
    #[serde(rename = "type")]
    pub commit_type: CommitType,
    pub repo: String,
}

impl CommitRecord {
    pub fn is_merge(&self) -> bool {
        self.subject.to_lowercase().starts_with("merge")
    }

    pub fn day(&self) -> &str {
        match self.date.char_indices().nth(10) {
            Some((idx, _)) => &self.date[..idx],
            None => &self.date,
        }
    }

    pub fn short_hash(&self) -> &str {
        self.hash.as_deref().unwrap_or("-------")
    }

    /// First non-blank body line, if any.
    pub fn body_summary(&self) -> Option<&str> {
        self.body.lines().map(str::trim).find(|l| !l.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    Active,
    /// Section carries the explicit no-activity sentinel.
    NoActivity,
    /// Repository lookup failed upstream; no records are produced.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySegment<'a> {
    pub name: &'a str,
    pub content: &'a str,
    pub status: SegmentStatus,
}

impl RepositorySegment<'_> {
    pub fn is_excluded(&self) -> bool {
        self.status == SegmentStatus::NotFound
    }
}

/// Reporting week, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> crate::error::Result<Self> {
        if start > end {
            return Err(crate::error::DigestError::InvalidDate(format!(
                "Invalid range: start ({}) is after end ({})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }
}

impl fmt::Display for WeekRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportHeader {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub week: WeekRange,
}

impl ReportHeader {
    pub fn new(week: WeekRange) -> Self {
        Self {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            week,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_is_case_insensitive_prefix() {
        assert_eq!(CommitType::classify("FEAT: x"), CommitType::Feat);
        assert_eq!(CommitType::classify("Feat(api): x"), CommitType::Feat);
        assert_eq!(CommitType::classify("feat: x"), CommitType::Feat);
        assert_eq!(CommitType::classify("refactoring thing"), CommitType::Refactor);
        assert_eq!(CommitType::classify("updated docs"), CommitType::Other);
        assert_eq!(CommitType::classify("Merge branch 'x'"), CommitType::Merge);
        assert_eq!(CommitType::classify(""), CommitType::Other);
    }

    #[test]
    fn earlier_prefix_wins() {
        // "fix" precedes "ci" in matching order, "ci" is never reached here
        assert_eq!(CommitType::classify("fix ci job"), CommitType::Fix);
        assert_eq!(CommitType::classify("testing the waters"), CommitType::Test);
    }

    #[test]
    fn day_takes_first_ten_chars() {
        let r = CommitRecord {
            hash: None,
            author: "Al".into(),
            email: None,
            date: "2024-01-01T10:00:00+00:00".into(),
            subject: "x".into(),
            body: String::new(),
            commit_type: CommitType::Other,
            repo: "r".into(),
        };
        assert_eq!(r.day(), "2024-01-01");
        assert_eq!(r.short_hash(), "-------");
    }

    #[test]
    fn week_range_rejects_inverted_dates() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(WeekRange::new(a, b).is_err());
        assert!(WeekRange::new(b, a).is_ok());
    }

    #[test]
    fn commit_type_title() {
        assert_eq!(CommitType::Feat.title(), "Feat");
        assert_eq!(CommitType::Other.title(), "Other");
    }
}
