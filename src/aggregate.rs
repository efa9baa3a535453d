use crate::model::{CommitRecord, CommitType};
use crate::parse::ParsedLog;
use std::collections::{BTreeMap, HashMap};

/// Keyed groups of record indices; bucket order is first-seen key order and
/// member order is arrival order.
#[derive(Debug, Clone, Default)]
pub struct OrderedBuckets {
    keys: Vec<String>,
    members: Vec<Vec<usize>>,
    index: HashMap<String, usize>,
}

impl OrderedBuckets {
    pub fn insert(&mut self, key: &str, record: usize) {
        let slot = match self.index.get(key) {
            Some(&slot) => slot,
            None => {
                let slot = self.keys.len();
                self.keys.push(key.to_string());
                self.members.push(Vec::new());
                self.index.insert(key.to_string(), slot);
                slot
            }
        };
        self.members[slot].push(record);
    }

    pub fn get(&self, key: &str) -> Option<&[usize]> {
        self.index.get(key).map(|&slot| self.members[slot].as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.keys
            .iter()
            .map(String::as_str)
            .zip(self.members.iter().map(Vec::as_slice))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.members.iter().map(Vec::len).sum()
    }
}

/// Derived views over one run's commit records, built by folding records in
/// arrival order.
#[derive(Debug, Clone, Default)]
pub struct AggregatedData {
    records: Vec<CommitRecord>,
    by_repo: OrderedBuckets,
    by_author: OrderedBuckets,
    type_counts: BTreeMap<CommitType, usize>,
    merge_requests: Vec<usize>,
    pub idle_repositories: Vec<String>,
    pub unreachable_repositories: Vec<String>,
}

impl AggregatedData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold<I: IntoIterator<Item = CommitRecord>>(records: I) -> Self {
        let mut data = Self::new();
        data.extend(records);
        data
    }

    pub fn from_parsed(log: ParsedLog) -> Self {
        let mut data = Self::fold(log.records);
        data.idle_repositories = log.idle_repositories;
        data.unreachable_repositories = log.unreachable_repositories;
        data
    }

    pub fn push(&mut self, record: CommitRecord) {
        let idx = self.records.len();
        self.by_repo.insert(&record.repo, idx);
        self.by_author.insert(&record.author, idx);
        *self.type_counts.entry(record.commit_type).or_insert(0) += 1;
        if record.is_merge() {
            self.merge_requests.push(idx);
        }
        self.records.push(record);
    }

    pub fn total_commits(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[CommitRecord] {
        &self.records
    }

    pub fn by_repo(&self) -> &OrderedBuckets {
        &self.by_repo
    }

    pub fn by_author(&self) -> &OrderedBuckets {
        &self.by_author
    }

    pub fn type_counts(&self) -> &BTreeMap<CommitType, usize> {
        &self.type_counts
    }

    pub fn count(&self, commit_type: CommitType) -> usize {
        self.type_counts.get(&commit_type).copied().unwrap_or(0)
    }

    pub fn resolve<'a>(
        &'a self,
        ids: &'a [usize],
    ) -> impl Iterator<Item = &'a CommitRecord> + 'a {
        ids.iter().map(move |&i| &self.records[i])
    }

    /// Merge/PR records in arrival order, whatever their inferred type.
    pub fn merge_requests(&self) -> impl Iterator<Item = &CommitRecord> {
        self.resolve(&self.merge_requests)
    }

    pub fn merge_request_count(&self) -> usize {
        self.merge_requests.len()
    }

    pub fn active_repositories(&self) -> usize {
        self.by_repo.len()
    }

    pub fn authors(&self) -> Vec<&str> {
        self.by_author.keys().collect()
    }

    /// Repository with the most commits; ties go to the first seen.
    pub fn most_active_repository(&self) -> Option<(&str, usize)> {
        self.by_repo
            .iter()
            .map(|(repo, ids)| (repo, ids.len()))
            .fold(None, |best, (repo, n)| match best {
                Some((_, m)) if m >= n => best,
                _ => Some((repo, n)),
            })
    }

    /// Type counts ordered by count descending, ties in declaration order.
    pub fn types_by_count(&self) -> Vec<(CommitType, usize)> {
        let mut counts: Vec<_> = self.type_counts.iter().map(|(t, n)| (*t, *n)).collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// (features, fixes) per author, busiest author first.
    pub fn author_contributions(&self) -> Vec<(&str, usize, usize)> {
        let mut rows: Vec<_> = self
            .by_author
            .iter()
            .map(|(author, ids)| {
                let commits: Vec<_> = self.resolve(ids).collect();
                let feats = commits.iter().filter(|c| c.commit_type == CommitType::Feat).count();
                let fixes = commits.iter().filter(|c| c.commit_type == CommitType::Fix).count();
                (author, ids.len(), feats, fixes)
            })
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows.into_iter().map(|(a, _, f, x)| (a, f, x)).collect()
    }

    /// Checks the bucket and counter totals all agree with the record count.
    pub fn is_consistent(&self) -> bool {
        let total = self.total_commits();
        self.by_repo.member_count() == total
            && self.by_author.member_count() == total
            && self.type_counts.values().sum::<usize>() == total
    }
}

impl FromIterator<CommitRecord> for AggregatedData {
    fn from_iter<T: IntoIterator<Item = CommitRecord>>(iter: T) -> Self {
        Self::fold(iter)
    }
}

impl Extend<CommitRecord> for AggregatedData {
    fn extend<T: IntoIterator<Item = CommitRecord>>(&mut self, iter: T) {
        for record in iter {
            self.push(record);
        }
    }
}
