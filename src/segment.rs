use crate::model::{RepositorySegment, SegmentStatus};
use crate::scan::{Lines, Token, NOT_FOUND};

enum State<'a> {
    OutsideRepo,
    InsideRepo {
        name: &'a str,
        content_start: usize,
        no_activity: bool,
    },
}

/// Splits a commit dump into per-repository segments in a single lazy pass.
///
/// Text before the first `=== REPO: <name> ===` line belongs to no segment,
/// and input without any well-formed marker yields nothing.
pub struct Segmenter<'a> {
    src: &'a str,
    lines: Lines<'a>,
    state: State<'a>,
}

impl<'a> Segmenter<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            lines: Lines::new(src),
            state: State::OutsideRepo,
        }
    }

    fn close(&mut self, content_end: usize) -> Option<RepositorySegment<'a>> {
        match std::mem::replace(&mut self.state, State::OutsideRepo) {
            State::OutsideRepo => None,
            State::InsideRepo {
                name,
                content_start,
                no_activity,
            } => {
                let status = if name.contains(NOT_FOUND) {
                    SegmentStatus::NotFound
                } else if no_activity {
                    SegmentStatus::NoActivity
                } else {
                    SegmentStatus::Active
                };
                Some(RepositorySegment {
                    name,
                    content: &self.src[content_start..content_end],
                    status,
                })
            }
        }
    }
}

impl<'a> Iterator for Segmenter<'a> {
    type Item = RepositorySegment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(line) = self.lines.next() {
            match line.token() {
                Token::RepoMarker(name) => {
                    let finished = self.close(line.start);
                    self.state = State::InsideRepo {
                        name,
                        content_start: line.next,
                        no_activity: false,
                    };
                    if finished.is_some() {
                        return finished;
                    }
                }
                Token::NoActivity => {
                    if let State::InsideRepo { no_activity, .. } = &mut self.state {
                        *no_activity = true;
                    }
                }
                _ => {}
            }
        }
        self.close(self.src.len())
    }
}
