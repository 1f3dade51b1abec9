use std::ops::Range;

use crate::ArcStr;

/// A successfully matched span of text and the sub-matches it was assembled from.
///
/// Offsets are byte offsets into the matched text, `start` inclusive and `next` exclusive.
/// A match with `start == next` is a zero-width success, which is distinct from failure.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Match {
    start: usize,
    next: usize,
    name: Option<ArcStr>,
    parts: Vec<Match>,
}

impl Match {
    pub fn new(start: usize, next: usize) -> Match {
        Match::with_parts(start, next, Vec::new())
    }
    pub fn empty(position: usize) -> Match {
        Match::new(position, position)
    }
    pub fn with_parts(start: usize, next: usize, parts: Vec<Match>) -> Match {
        debug_assert!(next >= start, "Match ends before it starts");
        debug_assert!(
            parts
                .iter()
                .all(|part| part.start >= start && part.next <= next),
            "Part outside of the parent match"
        );
        Match {
            start,
            next,
            name: None,
            parts,
        }
    }
    pub fn start(&self) -> usize {
        self.start
    }
    pub fn next(&self) -> usize {
        self.next
    }
    /// Name of the rule that produced this match, empty for anonymous matches.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
    pub fn is_anonymous(&self) -> bool {
        self.name.is_none()
    }
    pub fn parts(&self) -> &[Match] {
        &self.parts
    }
    pub fn into_parts(self) -> Vec<Match> {
        self.parts
    }
    pub fn len(&self) -> usize {
        self.next - self.start
    }
    pub fn is_empty(&self) -> bool {
        self.start == self.next
    }
    pub fn span(&self) -> Range<usize> {
        self.start..self.next
    }
    #[track_caller]
    pub fn as_str<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.next]
    }
    /// Attaches the name of a named rule.
    ///
    /// An anonymous match takes the name directly, a match already named by an inner rule is
    /// wrapped so that both names stay visible.
    pub(crate) fn named(self, name: ArcStr) -> Match {
        match self.name {
            None => Match {
                name: Some(name),
                ..self
            },
            Some(_) => Match {
                start: self.start,
                next: self.next,
                name: Some(name),
                parts: vec![self],
            },
        }
    }
    /// Depth-first iterator over this match and all of its parts.
    pub fn walk(&self) -> impl Iterator<Item = &Match> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.parts.iter().rev());
            Some(next)
        })
    }
}

#[test]
fn test_named_anonymous() {
    let m = Match::with_parts(0, 2, vec![Match::new(0, 1), Match::new(1, 2)]);
    let m = m.named("pair".into());

    assert_eq!(m.name(), "pair");
    assert_eq!(m.parts().len(), 2);
}

#[test]
fn test_named_wraps() {
    let inner = Match::new(3, 5).named("digit".into());
    let outer = inner.clone().named("number".into());

    assert_eq!(outer.name(), "number");
    assert_eq!(outer.span(), 3..5);
    assert_eq!(outer.parts(), &[inner]);
}

#[test]
fn test_walk_order() {
    let m = Match::with_parts(
        0,
        3,
        vec![
            Match::with_parts(0, 2, vec![Match::new(0, 1), Match::new(1, 2)]),
            Match::new(2, 3),
        ],
    );
    let spans: Vec<_> = m.walk().map(Match::span).collect();
    assert_eq!(spans, [0..3, 0..2, 0..1, 1..2, 2..3]);
}
