use crate::model::{CommitRecord, CommitType, SegmentStatus};
use crate::scan::{Lines, Token};
use crate::segment::Segmenter;
use serde::Serialize;
use tracing::debug;

const HEADER_FIELDS: usize = 5;
const SHORT_HASH_LEN: usize = 7;

/// Fields of a `hash|author|email|date|subject` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub hash: Option<String>,
    pub author: String,
    pub email: Option<String>,
    pub date: String,
    pub subject: String,
}

/// Returns `None` for headers without a pipe or with fewer than five fields.
/// The subject may itself contain pipes and is rebuilt from field 4 onward.
pub fn parse_header(line: &str) -> Option<Header> {
    if !line.contains('|') {
        return None;
    }
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < HEADER_FIELDS {
        return None;
    }

    let hash: String = parts[0].trim().chars().take(SHORT_HASH_LEN).collect();
    let email = parts[2].trim();

    Some(Header {
        hash: (!hash.is_empty()).then_some(hash),
        author: parts[1].trim().to_string(),
        email: (!email.is_empty()).then(|| email.to_string()),
        date: parts[3].trim().to_string(),
        subject: parts[4..].join("|").trim().to_string(),
    })
}

/// Builds a record from the text strictly between the start and end markers.
pub fn parse_record(repo: &str, raw: &str) -> Option<CommitRecord> {
    let raw = raw.trim();
    let mut lines = raw.lines();
    let header = parse_header(lines.next()?)?;
    let body = lines.collect::<Vec<_>>().join("\n");
    let body = body.trim();
    let commit_type = CommitType::classify(&header.subject);

    Some(CommitRecord {
        hash: header.hash,
        author: header.author,
        email: header.email,
        date: header.date,
        subject: header.subject,
        body: body.to_string(),
        commit_type,
        repo: repo.to_string(),
    })
}

#[derive(Clone, Copy)]
enum State {
    BetweenCommits,
    InsideCommit { body_start: usize },
}

/// Parses one repository's raw content into commit records.
///
/// Candidates without a closing `COMMIT_END` (a fresh `COMMIT_START`, a
/// repository marker, or end of input arrives first) are dropped, as are
/// candidates whose header is malformed.
pub struct CommitParser<'a> {
    repo: &'a str,
    src: &'a str,
    lines: Lines<'a>,
    state: State,
}

impl<'a> CommitParser<'a> {
    pub fn new(repo: &'a str, src: &'a str) -> Self {
        Self {
            repo,
            src,
            lines: Lines::new(src),
            state: State::BetweenCommits,
        }
    }
}

impl Iterator for CommitParser<'_> {
    type Item = CommitRecord;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            match (line.token(), self.state) {
                (Token::CommitStart, State::InsideCommit { .. }) => {
                    debug!(repo = self.repo, "dropping commit without end marker");
                    self.state = State::InsideCommit { body_start: line.next };
                }
                (Token::CommitStart, State::BetweenCommits) => {
                    self.state = State::InsideCommit { body_start: line.next };
                }
                (Token::CommitEnd, State::InsideCommit { body_start }) => {
                    let raw = &self.src[body_start..line.start];
                    self.state = State::BetweenCommits;
                    match parse_record(self.repo, raw) {
                        Some(record) => return Some(record),
                        None => debug!(repo = self.repo, "dropping commit with malformed header"),
                    }
                }
                (Token::RepoMarker(_), State::InsideCommit { .. }) => {
                    debug!(repo = self.repo, "dropping commit cut off by repository marker");
                    self.state = State::BetweenCommits;
                }
                _ => {}
            }
        }
        if let State::InsideCommit { .. } = self.state {
            debug!(repo = self.repo, "dropping truncated commit at end of input");
            self.state = State::BetweenCommits;
        }
        None
    }
}

/// Every record of a full dump, plus the repositories that contributed none.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedLog {
    pub records: Vec<CommitRecord>,
    /// Sections present but without commits, in input order.
    pub idle_repositories: Vec<String>,
    /// Sections whose repository lookup failed upstream.
    pub unreachable_repositories: Vec<String>,
}

pub fn parse_log(text: &str) -> ParsedLog {
    let mut log = ParsedLog::default();
    for segment in Segmenter::new(text) {
        if segment.status == SegmentStatus::NotFound {
            log.unreachable_repositories.push(segment.name.to_string());
            continue;
        }
        let before = log.records.len();
        log.records.extend(CommitParser::new(segment.name, segment.content));
        if log.records.len() == before {
            log.idle_repositories.push(segment.name.to_string());
        }
    }
    log
}
