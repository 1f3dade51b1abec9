//! Parametrized rule templates.
//!
//! A pattern such as `list(A, B) = A (B A)*` is stored with its parameters bound to slots.
//! Every application of the pattern produces a fresh copy of the body with the parameters
//! replaced by the arguments of that call site.

use std::sync::Arc;

use crate::{
    error::GrammarError,
    rule::{Rule, RuleKind},
    ArcStr,
};

#[derive(Clone, Debug)]
pub struct Pattern {
    name: ArcStr,
    parameters: Vec<ArcStr>,
    body: Rule,
}

/// Creates a pattern, references to `parameters` inside `body` become its parameters.
pub fn pattern(
    name: impl Into<ArcStr>,
    parameters: impl IntoIterator<Item = impl Into<ArcStr>>,
    body: Rule,
) -> Pattern {
    Pattern {
        name: name.into(),
        parameters: parameters.into_iter().map(Into::into).collect(),
        body,
    }
}

impl Pattern {
    pub fn name(&self) -> &ArcStr {
        &self.name
    }
    pub fn parameters(&self) -> &[ArcStr] {
        &self.parameters
    }
    pub fn body(&self) -> &Rule {
        &self.body
    }

    /// Turns references to parameters into [`RuleKind::Parameter`] slots.
    pub(crate) fn bind_parameters(mut self) -> Result<Pattern, GrammarError> {
        if self.name.is_empty() {
            return Err(GrammarError::InvalidRegistration(
                "pattern name must not be empty".into(),
            ));
        }
        for (i, parameter) in self.parameters.iter().enumerate() {
            if self.parameters[..i].contains(parameter) {
                return Err(GrammarError::InvalidRegistration(
                    format!("duplicate parameter `{parameter}` in pattern `{}`", self.name).into(),
                ));
            }
        }

        let parameters = &self.parameters;
        self.body.visit_mut(|rule| {
            let bound = match rule.kind() {
                RuleKind::Reference(name) => parameters
                    .iter()
                    .position(|p| p == name)
                    .map(|index| RuleKind::Parameter {
                        index,
                        name: name.clone(),
                    }),
                _ => None,
            };
            if let Some(kind) = bound {
                rule.set_kind(kind);
            }
        });

        Ok(self)
    }

    /// Copies the body, substituting `args` for the parameters.
    ///
    /// Named rule handles are copied as handles. Each argument is allocated once and shared by
    /// every use of its parameter, a parameter without an argument becomes a plain reference to
    /// a grammar rule of the same name.
    pub(crate) fn instantiate(&self, args: Vec<Rule>) -> Result<Rule, GrammarError> {
        if args.len() > self.parameters.len() {
            return Err(GrammarError::PatternArityError {
                name: self.name.clone(),
                expected: self.parameters.len(),
                found: args.len(),
            });
        }

        let args: Vec<Arc<Rule>> = args.into_iter().map(Rule::into_shared).collect();
        let mut body = self.body.clone();
        body.visit_mut(|rule| {
            let kind = match rule.kind() {
                RuleKind::Parameter { index, name } => match args.get(*index) {
                    Some(arg) => RuleKind::Shared(Arc::clone(arg)),
                    None => RuleKind::Reference(name.clone()),
                },
                _ => return,
            };
            rule.set_kind(kind);
        });

        Ok(body)
    }
}
