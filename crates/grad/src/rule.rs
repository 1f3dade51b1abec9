use std::sync::Arc;

use crate::{charset::CharSet, grammar::RuleHandle, ArcStr};

#[derive(Clone, Debug)]
pub enum RuleKind {
    // leaves
    Empty,
    BeginLine,
    EndLine,
    CharSet(Arc<CharSet>),
    AnyChar,
    Range(char, char),
    Literal(ArcStr),

    // groups
    Optional,
    /// Children are `[positive, negative]`.
    Negation,
    Alternation,
    Concatenation,
    Repeat { min: u32 },

    // placeholders, these only exist until the rule is added to a grammar
    Reference(ArcStr),
    /// Children are the arguments.
    PatternReference(ArcStr),
    /// A reference to a pattern parameter, bound when the pattern is registered.
    Parameter { index: usize, name: ArcStr },

    // resolved
    Named(RuleHandle),
    /// A pattern argument, every use of the same parameter shares it.
    Shared(Arc<Rule>),
}

impl RuleKind {
    pub(crate) fn to_rule(self) -> Rule {
        Rule::new_leaf(self)
    }
    pub fn is_group(&self) -> bool {
        matches!(
            self,
            RuleKind::Optional
                | RuleKind::Negation
                | RuleKind::Alternation
                | RuleKind::Concatenation
                | RuleKind::Repeat { .. }
        )
    }
    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            RuleKind::Reference(_) | RuleKind::PatternReference(_) | RuleKind::Parameter { .. }
        )
    }
    /// Whether the kind carries child rules, groups and pattern arguments.
    pub fn has_children(&self) -> bool {
        self.is_group() || matches!(self, RuleKind::PatternReference(_))
    }
}

/// A node in a rule graph.
///
/// Rules own their children. Sharing happens through [`RuleKind::Named`] handles into a grammar
/// and [`RuleKind::Shared`] pattern arguments.
///
/// Rules are built with the constructor functions of this module, which give every group the
/// children it expects. The kind of an existing rule cannot be changed from outside the crate:
///
/// ```compile_fail
/// use grad::{any_char, RuleKind};
///
/// let mut rule = any_char();
/// rule.set_kind(RuleKind::Optional);
/// ```
///
/// ```compile_fail
/// use grad::{any_char, Rule, RuleKind};
///
/// let rule = Rule::new_group(RuleKind::Negation, vec![any_char()]);
/// ```
#[derive(Clone, Debug)]
pub struct Rule {
    kind: RuleKind,
    children: Vec<Rule>,
}

impl Rule {
    pub(crate) fn new_leaf(kind: RuleKind) -> Rule {
        assert!(!kind.has_children());
        Rule {
            kind,
            children: vec![],
        }
    }
    pub(crate) fn new_group(kind: RuleKind, children: Vec<Rule>) -> Rule {
        assert!(kind.has_children());
        Rule { kind, children }
    }
    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }
    pub fn children(&self) -> &[Rule] {
        if !self.kind.has_children() {
            debug_assert!(self.children.is_empty());
        }
        &self.children
    }
    pub(crate) fn children_mut(&mut self) -> &mut [Rule] {
        &mut self.children
    }
    pub(crate) fn take_children(&mut self) -> Vec<Rule> {
        std::mem::take(&mut self.children)
    }
    /// Wraps the rule for sharing, reusing the allocation if it is already shared.
    pub(crate) fn into_shared(self) -> Arc<Rule> {
        match self.kind {
            RuleKind::Shared(inner) => inner,
            _ => Arc::new(self),
        }
    }
    pub(crate) fn set_kind(&mut self, kind: RuleKind) -> RuleKind {
        if !kind.has_children() {
            self.children = Vec::new();
        }
        std::mem::replace(&mut self.kind, kind)
    }
    /// Whether the rule still contains references that need a grammar to resolve.
    pub fn is_resolved(&self) -> bool {
        let mut resolved = true;
        self.visit(|rule| resolved &= !rule.kind.is_placeholder());
        resolved
    }
    fn visit_impl(&self, f: &mut dyn FnMut(&Rule)) {
        for child in &self.children {
            child.visit_impl(f);
        }
        f(self)
    }
    /// Post-order traversal, [`RuleKind::Shared`] arguments are not entered.
    pub fn visit(&self, mut f: impl FnMut(&Rule)) {
        self.visit_impl(&mut f)
    }
    fn visit_mut_impl(&mut self, f: &mut dyn FnMut(&mut Rule)) {
        for child in &mut self.children {
            child.visit_mut_impl(f);
        }
        f(self)
    }
    pub(crate) fn visit_mut(&mut self, mut f: impl FnMut(&mut Rule)) {
        self.visit_mut_impl(&mut f)
    }
    fn try_visit_mut_impl<E>(
        &mut self,
        f: &mut dyn FnMut(&mut Rule) -> Result<(), E>,
    ) -> Result<(), E> {
        for child in &mut self.children {
            child.try_visit_mut_impl(f)?;
        }
        f(self)
    }
    /// Like [`Rule::visit_mut`], stopping at the first error.
    pub(crate) fn try_visit_mut<E>(
        &mut self,
        mut f: impl FnMut(&mut Rule) -> Result<(), E>,
    ) -> Result<(), E> {
        self.try_visit_mut_impl(&mut f)
    }
}

/// A rule together with the name it is registered under.
#[derive(Clone, Debug)]
pub struct NamedRule {
    name: ArcStr,
    body: Rule,
}

impl NamedRule {
    pub fn name(&self) -> &ArcStr {
        &self.name
    }
    pub fn body(&self) -> &Rule {
        &self.body
    }
    pub fn into_parts(self) -> (ArcStr, Rule) {
        (self.name, self.body)
    }
}

pub fn empty() -> Rule {
    RuleKind::Empty.to_rule()
}

pub fn begin_line() -> Rule {
    RuleKind::BeginLine.to_rule()
}

pub fn end_line() -> Rule {
    RuleKind::EndLine.to_rule()
}

pub fn char_set(chars: &str) -> Rule {
    RuleKind::CharSet(Arc::new(CharSet::from(chars))).to_rule()
}

pub fn any_char() -> Rule {
    RuleKind::AnyChar.to_rule()
}

pub fn range(low: char, high: char) -> Rule {
    RuleKind::Range(low, high).to_rule()
}

pub fn literal(text: impl Into<ArcStr>) -> Rule {
    RuleKind::Literal(text.into()).to_rule()
}

pub fn optional(rule: Rule) -> Rule {
    Rule::new_group(RuleKind::Optional, vec![rule])
}

/// Matches `positive` wherever `negative` does not match.
pub fn negation(positive: Rule, negative: Rule) -> Rule {
    Rule::new_group(RuleKind::Negation, vec![positive, negative])
}

pub fn alternation(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::new_group(RuleKind::Alternation, rules.into_iter().collect())
}

pub fn concatenation(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::new_group(RuleKind::Concatenation, rules.into_iter().collect())
}

pub fn repeat(rule: Rule, min_matches: u32) -> Rule {
    Rule::new_group(RuleKind::Repeat { min: min_matches }, vec![rule])
}

pub fn zero_or_more(rule: Rule) -> Rule {
    repeat(rule, 0)
}

pub fn one_or_more(rule: Rule) -> Rule {
    repeat(rule, 1)
}

pub fn reference(name: impl Into<ArcStr>) -> Rule {
    RuleKind::Reference(name.into()).to_rule()
}

pub fn pattern_reference(name: impl Into<ArcStr>, args: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::new_group(
        RuleKind::PatternReference(name.into()),
        args.into_iter().collect(),
    )
}

pub fn named_rule(name: impl Into<ArcStr>, body: Rule) -> NamedRule {
    NamedRule {
        name: name.into(),
        body,
    }
}

#[test]
fn test_set_kind_drops_children() {
    let mut rule = pattern_reference("list", [reference("a"), literal(",")]);
    assert_eq!(rule.children().len(), 2);

    let old = rule.set_kind(RuleKind::Empty);
    assert!(matches!(old, RuleKind::PatternReference(_)));
    assert!(rule.children().is_empty());
}

#[test]
fn test_group_arity() {
    let arity = |rule: Rule| rule.children().len();
    assert_eq!(arity(optional(empty())), 1);
    assert_eq!(arity(negation(any_char(), literal("x"))), 2);
    assert_eq!(arity(repeat(any_char(), 3)), 1);
    assert_eq!(arity(zero_or_more(any_char())), 1);
    assert_eq!(arity(alternation([])), 0);
    assert_eq!(arity(pattern_reference("list", [literal("a")])), 1);
}

#[test]
fn test_is_resolved() {
    let rule = concatenation([literal("a"), optional(reference("b"))]);
    assert!(!rule.is_resolved());

    let rule = concatenation([literal("a"), optional(range('0', '9'))]);
    assert!(rule.is_resolved());
}

#[test]
fn test_visit_is_postorder() {
    let rule = concatenation([literal("a"), alternation([literal("b"), literal("c")])]);
    let mut seen = Vec::new();
    rule.visit(|rule| {
        seen.push(match rule.kind() {
            RuleKind::Literal(a) => a.to_string(),
            RuleKind::Alternation => "|".to_string(),
            RuleKind::Concatenation => "+".to_string(),
            _ => unreachable!(),
        })
    });
    assert_eq!(seen, ["a", "b", "c", "|", "+"]);
}
