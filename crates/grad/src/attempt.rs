//! The matching contract.
//!
//! Every rule is a pure function of the text and a position: it either fails, or returns a
//! [`Match`] starting exactly at that position. Rules are not mutated while matching, so the same
//! resolved rules can be used for any number of texts at once.

use std::{cell::RefCell, collections::HashSet};

use crate::{
    config::ScanConfig,
    grammar::{Grammar, RuleHandle},
    matched::Match,
    rule::{Rule, RuleKind},
};

/// Remaining stack below which an attempt moves to a fresh segment.
const RED_ZONE: usize = 100 * 1024;
const STACK_PER_SEGMENT: usize = 1024 * 1024;

/// Everything an attempt can observe besides the rule itself.
pub(crate) struct MatchCx<'a> {
    pub grammar: &'a Grammar,
    pub text: &'a str,
    pub config: &'a ScanConfig,
    /// Named rules currently being attempted, with their positions.
    active: RefCell<HashSet<(RuleHandle, usize)>>,
}

impl<'a> MatchCx<'a> {
    pub fn new(grammar: &'a Grammar, text: &'a str, config: &'a ScanConfig) -> MatchCx<'a> {
        MatchCx {
            grammar,
            text,
            config,
            active: RefCell::new(HashSet::new()),
        }
    }

    fn char_at(&self, position: usize) -> Option<char> {
        self.text.get(position..)?.chars().next()
    }

    pub fn attempt_named(&self, handle: RuleHandle, position: usize, depth: u32) -> Option<Match> {
        let slot = self.grammar.slot(handle)?;
        // a forward declaration that never received a body
        let body = slot.body.as_ref()?;

        // only left recursion gets back to the same rule without consuming anything
        if !self.active.borrow_mut().insert((handle, position)) {
            log::trace!("Left recursion into `{}` at {position}", slot.name);
            return None;
        }
        let matched = self.attempt(body, position, depth);
        self.active.borrow_mut().remove(&(handle, position));

        Some(matched?.named(slot.name.clone()))
    }

    pub fn attempt(&self, rule: &Rule, position: usize, depth: u32) -> Option<Match> {
        if depth >= self.config.max_depth {
            log::debug!(
                "Rule nesting exceeded the depth limit of {} at offset {position}",
                self.config.max_depth
            );
            return None;
        }
        stacker::maybe_grow(RED_ZONE, STACK_PER_SEGMENT, || {
            self.attempt_kind(rule, position, depth + 1)
        })
    }

    fn attempt_kind(&self, rule: &Rule, position: usize, depth: u32) -> Option<Match> {
        match rule.kind() {
            RuleKind::Empty => Some(Match::empty(position)),
            RuleKind::BeginLine => self.begin_line(position),
            RuleKind::EndLine => self.end_line(position),
            RuleKind::CharSet(set) => {
                let c = self.char_at(position)?;
                set.contains(c)
                    .then(|| Match::new(position, position + c.len_utf8()))
            }
            RuleKind::AnyChar => {
                let c = self.char_at(position)?;
                Some(Match::new(position, position + c.len_utf8()))
            }
            &RuleKind::Range(low, high) => {
                let c = self.char_at(position)?;
                (low..=high)
                    .contains(&c)
                    .then(|| Match::new(position, position + c.len_utf8()))
            }
            RuleKind::Literal(literal) => {
                let rest = self.text.get(position..)?;
                rest.starts_with(&**literal)
                    .then(|| Match::new(position, position + literal.len()))
            }
            RuleKind::Optional => {
                let inner = &rule.children()[0];
                let matched = self.attempt(inner, position, depth);
                Some(matched.unwrap_or(Match::empty(position)))
            }
            RuleKind::Negation => {
                let [positive, negative] = rule.children() else {
                    unreachable!("Negation has exactly two children")
                };
                let matched = self.attempt(positive, position, depth)?;
                match self.attempt(negative, position, depth) {
                    Some(_) => None,
                    None => Some(matched),
                }
            }
            RuleKind::Alternation => rule
                .children()
                .iter()
                .find_map(|child| self.attempt(child, position, depth)),
            RuleKind::Concatenation => {
                let mut parts = Vec::with_capacity(rule.children().len());
                let mut next = position;
                for child in rule.children() {
                    let matched = self.attempt(child, next, depth)?;
                    next = matched.next();
                    parts.push(matched);
                }
                Some(Match::with_parts(position, next, parts))
            }
            &RuleKind::Repeat { min } => self.repeat(&rule.children()[0], min, position, depth),
            &RuleKind::Named(handle) => self.attempt_named(handle, position, depth),
            RuleKind::Shared(inner) => self.attempt(inner, position, depth),
            RuleKind::Reference(name)
            | RuleKind::PatternReference(name)
            | RuleKind::Parameter { name, .. } => {
                log::warn!("Attempted unresolved reference `{name}`, treating as a failed match");
                None
            }
        }
    }

    /// Greedy repetition without backtracking.
    ///
    /// An iteration that succeeds without consuming anything could be repeated forever, it is
    /// recorded once and satisfies any minimum.
    fn repeat(&self, inner: &Rule, min: u32, position: usize, depth: u32) -> Option<Match> {
        let mut parts = Vec::new();
        let mut next = position;
        let mut unbounded = false;

        while let Some(matched) = self.attempt(inner, next, depth) {
            let advanced = matched.next() != next;
            next = matched.next();
            parts.push(matched);
            if !advanced {
                unbounded = true;
                break;
            }
        }

        if unbounded || parts.len() >= min as usize {
            Some(Match::with_parts(position, next, parts))
        } else {
            None
        }
    }

    /// Zero width at the start of a line, or a newline directly under the cursor.
    fn begin_line(&self, position: usize) -> Option<Match> {
        let current = self.char_at(position)?;
        if position == 0 || self.text[..position].ends_with('\n') {
            Some(Match::empty(position))
        } else if current == '\n' {
            Some(Match::new(position, position + 1))
        } else {
            None
        }
    }

    /// Zero width on the last character, or a consumed newline.
    fn end_line(&self, position: usize) -> Option<Match> {
        let current = self.char_at(position)?;
        let next = position + current.len_utf8();
        if next == self.text.len() {
            Some(Match::empty(position))
        } else if current == '\n' {
            Some(Match::new(position, next))
        } else {
            None
        }
    }
}

impl Rule {
    /// Attempts this rule at `position`, following named rules through `grammar`.
    pub fn attempt(&self, grammar: &Grammar, text: &str, position: usize) -> Option<Match> {
        self.attempt_with(grammar, text, position, &ScanConfig::default())
    }

    pub fn attempt_with(
        &self,
        grammar: &Grammar,
        text: &str,
        position: usize,
        config: &ScanConfig,
    ) -> Option<Match> {
        MatchCx::new(grammar, text, config).attempt(self, position, 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::{rule::*, Grammar, Match, ScanConfig};

    fn attempt(rule: &Rule, text: &str, position: usize) -> Option<(usize, usize)> {
        rule.attempt(&Grammar::new(), text, position)
            .map(|m| (m.start(), m.next()))
    }

    #[test]
    fn test_primitives() {
        assert_eq!(attempt(&empty(), "", 0), Some((0, 0)));
        assert_eq!(attempt(&any_char(), "ab", 1), Some((1, 2)));
        assert_eq!(attempt(&any_char(), "ab", 2), None);
        assert_eq!(attempt(&char_set("xyz"), "ay", 1), Some((1, 2)));
        assert_eq!(attempt(&char_set("xyz"), "ay", 0), None);
        assert_eq!(attempt(&range('0', '9'), "a5", 1), Some((1, 2)));
        assert_eq!(attempt(&range('0', '9'), "a5", 0), None);
        assert_eq!(attempt(&range('a', 'z'), "", 0), None);
    }

    #[test]
    fn test_multibyte() {
        assert_eq!(attempt(&any_char(), "é!", 0), Some((0, 2)));
        assert_eq!(attempt(&range('à', 'ÿ'), "é", 0), Some((0, 2)));
        assert_eq!(attempt(&char_set("👍"), "a👍", 1), Some((1, 5)));
        // not a char boundary
        assert_eq!(attempt(&any_char(), "é", 1), None);
    }

    #[test]
    fn test_literal() {
        let rule = literal("def");
        assert_eq!(attempt(&rule, "def", 0), Some((0, 3)));
        assert_eq!(attempt(&rule, "a def", 2), Some((2, 5)));
        assert_eq!(attempt(&rule, "a de", 2), None);
        assert_eq!(attempt(&rule, "abc", 3), None);
        assert_eq!(attempt(&rule, "abc", 10), None);
        assert_eq!(attempt(&literal(""), "abc", 3), Some((3, 3)));
    }

    #[test]
    fn test_begin_line() {
        let text = "ab\ncd\n";
        let rule = begin_line();
        assert_eq!(attempt(&rule, text, 0), Some((0, 0)));
        assert_eq!(attempt(&rule, text, 1), None);
        // sitting on the newline consumes it
        assert_eq!(attempt(&rule, text, 2), Some((2, 3)));
        assert_eq!(attempt(&rule, text, 3), Some((3, 3)));
        // end of input after a newline still fails
        assert_eq!(attempt(&rule, text, 6), None);
        assert_eq!(attempt(&rule, "", 0), None);
    }

    #[test]
    fn test_end_line() {
        let text = "ab\ncd";
        let rule = end_line();
        assert_eq!(attempt(&rule, text, 0), None);
        assert_eq!(attempt(&rule, text, 2), Some((2, 3)));
        assert_eq!(attempt(&rule, text, 3), None);
        assert_eq!(attempt(&rule, text, 4), Some((4, 4)));
        assert_eq!(attempt(&rule, text, 5), None);
        // a trailing newline is the last character and stays unconsumed
        assert_eq!(attempt(&rule, "a\n", 1), Some((1, 1)));
    }

    #[test]
    fn test_optional_zero_width() {
        let rule = optional(literal("x"));
        for (text, position) in [("x", 0), ("y", 0), ("", 0), ("ax", 1), ("ab", 2)] {
            let m = rule.attempt(&Grammar::new(), text, position).unwrap();
            assert_eq!(m.start(), position);
        }
        assert_eq!(attempt(&rule, "y", 0), Some((0, 0)));
        assert_eq!(attempt(&rule, "x", 0), Some((0, 1)));
    }

    #[test]
    fn test_negation() {
        let rule = negation(any_char(), char_set("x"));
        let text = "axbx";
        assert_eq!(attempt(&rule, text, 0), Some((0, 1)));
        assert_eq!(attempt(&rule, text, 1), None);
        assert_eq!(attempt(&rule, text, 2), Some((2, 3)));
        assert_eq!(attempt(&rule, text, 3), None);
        assert_eq!(attempt(&rule, text, 4), None);
    }

    #[test]
    fn test_alternation_order() {
        let short_first = alternation([literal("a"), literal("abc")]);
        assert_eq!(attempt(&short_first, "abc", 0), Some((0, 1)));

        let long_first = alternation([literal("abc"), literal("a")]);
        assert_eq!(attempt(&long_first, "abc", 0), Some((0, 3)));

        // a zero width success still wins
        let rule = alternation([optional(literal("x")), literal("a")]);
        assert_eq!(attempt(&rule, "a", 0), Some((0, 0)));

        assert_eq!(attempt(&alternation([]), "a", 0), None);
    }

    #[test]
    fn test_concatenation() {
        let a = literal("ab");
        let b = repeat(range('0', '9'), 1);
        let rule = concatenation([a.clone(), b.clone()]);
        let text = "xab123y";

        let m = rule.attempt(&Grammar::new(), text, 1).unwrap();
        let after_a = a.attempt(&Grammar::new(), text, 1).unwrap().next();
        let after_b = b.attempt(&Grammar::new(), text, after_a).unwrap().next();
        assert_eq!((m.start(), m.next()), (1, after_b));
        assert_eq!(m.parts().len(), 2);
        assert_eq!(m.parts()[1].as_str(text), "123");

        assert_eq!(attempt(&rule, "ab", 0), None);
        assert_eq!(attempt(&concatenation([]), "ab", 1), Some((1, 1)));
    }

    #[test]
    fn test_repeat_min() {
        let rule = repeat(literal("a"), 2);
        assert_eq!(attempt(&rule, "ab", 0), None);
        assert_eq!(attempt(&rule, "", 0), None);

        let m = rule.attempt(&Grammar::new(), "aaab", 0).unwrap();
        assert_eq!(m.parts().len(), 3);
        assert_eq!(m.span(), 0..3);

        let m = rule.attempt(&Grammar::new(), "aab", 0).unwrap();
        assert_eq!(m.parts().len(), 2);

        assert_eq!(attempt(&zero_or_more(literal("a")), "b", 0), Some((0, 0)));
    }

    #[test]
    fn test_repeat_no_backtracking() {
        // the greedy repeat swallows the final 'a' the literal needs
        let rule = concatenation([zero_or_more(literal("a")), literal("a")]);
        assert_eq!(attempt(&rule, "aaa", 0), None);
    }

    #[test]
    fn test_repeat_zero_width_terminates() {
        let rule = repeat(optional(literal("x")), 3);
        let m = rule.attempt(&Grammar::new(), "xxy", 0).unwrap();
        assert_eq!(m.span(), 0..2);
        // two real iterations and the vacuous one that stopped the loop
        assert_eq!(m.parts().len(), 3);
        assert_eq!(m.parts()[2], Match::empty(2));

        let m = repeat(empty(), 5).attempt(&Grammar::new(), "", 0).unwrap();
        assert_eq!(m.parts().len(), 1);
    }

    #[test]
    fn test_unresolved_reference_fails() {
        assert_eq!(attempt(&reference("missing"), "abc", 0), None);
    }

    #[test]
    fn test_named_rule_through_grammar() {
        let mut grammar = Grammar::new();
        grammar
            .add(named_rule("digit", range('0', '9')))
            .unwrap();
        let rule = grammar.get_rule("digit").unwrap().clone();
        let wrapper = concatenation([literal("#"), reference("digit")]);

        let m = rule.attempt(&grammar, "7", 0).unwrap();
        assert!(m.is_anonymous());

        let m = grammar.attempt("digit", "7", 0).unwrap();
        assert_eq!(m.name(), "digit");

        // unresolved references in a standalone rule are not followed
        assert!(wrapper.attempt(&grammar, "#7", 0).is_none());
    }

    #[test]
    fn test_left_recursion_fails_over() {
        let mut grammar = Grammar::new();
        grammar
            .add(named_rule(
                "list",
                alternation([concatenation([reference("list"), literal(",")]), literal("x")]),
            ))
            .unwrap();

        // the recursive alternative fails on reentry, leaving only "x"
        let m = grammar.attempt("list", "x,,", 0).unwrap();
        assert_eq!(m.span(), 0..1);
        assert!(grammar.attempt("list", ",x", 0).is_none());
    }

    #[test]
    fn test_depth_limit() {
        let mut grammar = Grammar::new();
        grammar
            .add(named_rule(
                "list",
                concatenation([
                    range('0', '9'),
                    optional(concatenation([literal(","), reference("list")])),
                ]),
            ))
            .unwrap();

        let text = "1,2,3,4,5,6,7,8,9";
        let m = grammar.attempt("list", text, 0).unwrap();
        assert_eq!(m.span(), 0..text.len());

        let config = ScanConfig::new().max_depth(8);
        let m = grammar.attempt_with("list", text, 0, &config).unwrap();
        assert!(m.next() < text.len());
    }
}
