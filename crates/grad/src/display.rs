use std::fmt::{self, Display, Write};

use crate::{
    grammar::Grammar,
    matched::Match,
    rule::{Rule, RuleKind},
};

impl RuleKind {
    pub fn display_into(&self, buf: &mut dyn Write, cx: &Grammar) -> fmt::Result {
        match self {
            RuleKind::Empty => write!(buf, "Empty"),
            RuleKind::BeginLine => write!(buf, "BeginLine"),
            RuleKind::EndLine => write!(buf, "EndLine"),
            RuleKind::CharSet(a) => write!(buf, "CharSet({a})"),
            RuleKind::AnyChar => write!(buf, "AnyChar"),
            RuleKind::Range(a, b) => write!(buf, "Range({a:?}, {b:?})"),
            RuleKind::Literal(a) => write!(buf, "Literal({a:?})"),
            RuleKind::Optional => write!(buf, "Optional"),
            RuleKind::Negation => write!(buf, "Negation"),
            RuleKind::Alternation => write!(buf, "Alternation"),
            RuleKind::Concatenation => write!(buf, "Concatenation"),
            RuleKind::Repeat { min } => write!(buf, "Repeat(min {min})"),
            RuleKind::Reference(a) => write!(buf, "Reference({a})"),
            RuleKind::PatternReference(a) => write!(buf, "PatternReference({a})"),
            RuleKind::Parameter { index, name } => write!(buf, "Parameter({index} {name})"),
            RuleKind::Named(handle) => match handle.name(cx) {
                Some(name) => write!(buf, "Named({name})"),
                None => write!(buf, "Named(#{})", handle.as_u32()),
            },
            RuleKind::Shared(_) => write!(buf, "Shared"),
        }
    }
}

impl Rule {
    pub fn display_into_indent(&self, buf: &mut dyn Write, cx: &Grammar, indent: u32) -> fmt::Result {
        for _ in 0..indent {
            write!(buf, "  ")?;
        }
        self.kind().display_into(buf, cx)?;
        writeln!(buf)?;
        if let RuleKind::Shared(inner) = self.kind() {
            inner.display_into_indent(buf, cx, indent + 1)?;
        }
        for child in self.children() {
            child.display_into_indent(buf, cx, indent + 1)?;
        }

        Ok(())
    }
    pub fn display_into(&self, buf: &mut dyn Write, cx: &Grammar) -> fmt::Result {
        self.display_into_indent(buf, cx, 0)
    }
}

impl Grammar {
    /// Writes every pattern and rule with its resolved body.
    pub fn display_into(&self, buf: &mut dyn Write) -> fmt::Result {
        for pattern in self.patterns() {
            writeln!(buf)?;
            writeln!(buf, "{}({}) =", pattern.name(), pattern.parameters().join(", "))?;
            pattern.body().display_into_indent(buf, self, 1)?;
        }
        for name in self.rule_names() {
            writeln!(buf)?;
            writeln!(buf, "{name} =")?;
            if let Some(body) = self.get_rule(name) {
                body.display_into_indent(buf, self, 1)?;
            }
        }
        for name in self.undefined() {
            writeln!(buf)?;
            writeln!(buf, "{name} =")?;
            writeln!(buf, "  ((undefined))")?;
        }
        Ok(())
    }
}

impl Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Match(")?;
        if !self.is_anonymous() {
            write!(f, "{} ", self.name())?;
        }
        write!(f, "{}:{}", self.start(), self.next())?;
        if !self.parts().is_empty() {
            write!(f, " [")?;
            for (i, part) in self.parts().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{part}")?;
            }
            write!(f, "]")?;
        }
        write!(f, ")")
    }
}

#[test]
fn test_display_match() {
    let m = Match::new(2, 4);
    assert_eq!(m.to_string(), "Match(2:4)");

    let m = Match::with_parts(0, 2, vec![Match::new(0, 1), Match::new(1, 2)]).named("num".into());
    assert_eq!(m.to_string(), "Match(num 0:2 [Match(0:1), Match(1:2)])");
}

#[test]
fn test_display_grammar() {
    use crate::{pattern::pattern, rule::*};

    let mut grammar = Grammar::new();
    grammar
        .add(pattern("twice", ["A"], concatenation([reference("A"), reference("A")])))
        .unwrap();
    grammar.add(named_rule("digit", range('0', '9'))).unwrap();
    grammar
        .add(named_rule(
            "number",
            concatenation([one_or_more(reference("digit")), optional(reference("suffix"))]),
        ))
        .unwrap();

    let mut out = String::new();
    grammar.display_into(&mut out).unwrap();
    assert_eq!(
        out,
        "
twice(A) =
  Concatenation
    Parameter(0 A)
    Parameter(0 A)

digit =
  Range('0', '9')

number =
  Concatenation
    Repeat(min 1)
      Named(digit)
    Optional
      Named(suffix)

suffix =
  ((undefined))
"
    );
}
