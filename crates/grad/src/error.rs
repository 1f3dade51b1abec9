use std::borrow::Cow;

use crate::ArcStr;

/// Configuration errors raised while building a [`Grammar`](crate::Grammar).
///
/// Matching itself never fails with an error, a rule that does not match simply returns `None`.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("unresolved reference `{0}`")]
    UnresolvedReference(ArcStr),
    #[error("pattern `{name}` takes at most {expected} arguments, {found} were given")]
    PatternArityError {
        name: ArcStr,
        expected: usize,
        found: usize,
    },
    #[error("invalid registration: {0}")]
    InvalidRegistration(Cow<'static, str>),
    #[error("pattern `{0}` recursively instantiates itself")]
    RecursivePattern(ArcStr),
}

impl GrammarError {
    /// The rule or pattern name the error is about, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            GrammarError::UnresolvedReference(name)
            | GrammarError::PatternArityError { name, .. }
            | GrammarError::RecursivePattern(name) => Some(name),
            GrammarError::InvalidRegistration(_) => None,
        }
    }
}

#[test]
fn test_error_display() {
    let err = GrammarError::PatternArityError {
        name: "list".into(),
        expected: 2,
        found: 3,
    };
    assert_eq!(
        err.to_string(),
        "pattern `list` takes at most 2 arguments, 3 were given"
    );
    assert_eq!(err.name(), Some("list"));

    let err = GrammarError::UnresolvedReference("digit".into());
    assert_eq!(err.to_string(), "unresolved reference `digit`");
}
