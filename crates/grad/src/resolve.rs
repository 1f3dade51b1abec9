//! Resolve `Reference`s into rule handles and expand `PatternReference`s. There are no scopes,
//! every name resolves against the whole grammar.

use std::{collections::HashMap, sync::Arc};

use cranelift_entity::EntityRef;

use crate::{
    error::GrammarError,
    grammar::{Grammar, RuleHandle},
    rule::{Rule, RuleKind},
    ArcStr,
};

/// Resolution against a grammar that is not modified until the rule has fully resolved.
///
/// Names that are not in the grammar yet are given the handles they will occupy once declared.
pub(crate) struct ResolveCx<'a> {
    grammar: &'a Grammar,
    declared: Vec<ArcStr>,
    declared_lookup: HashMap<ArcStr, RuleHandle>,
    /// Patterns currently being expanded.
    expanding: Vec<ArcStr>,
}

impl<'a> ResolveCx<'a> {
    pub fn new(grammar: &'a Grammar) -> ResolveCx<'a> {
        ResolveCx {
            grammar,
            declared: Vec::new(),
            declared_lookup: HashMap::new(),
            expanding: Vec::new(),
        }
    }

    pub fn handle_for(&mut self, name: &ArcStr) -> RuleHandle {
        let existing = self
            .grammar
            .lookup
            .get(name)
            .or_else(|| self.declared_lookup.get(name));
        if let Some(&handle) = existing {
            return handle;
        }

        let handle = RuleHandle::new(self.grammar.rules.len() + self.declared.len());
        self.declared.push(name.clone());
        self.declared_lookup.insert(name.clone(), handle);
        handle
    }

    /// Names to declare, in the order their handles were handed out.
    pub fn into_declared(self) -> Vec<ArcStr> {
        self.declared
    }

    pub fn resolve(&mut self, rule: &mut Rule) -> Result<(), GrammarError> {
        // post-order, arguments of a pattern reference are resolved before it is expanded
        rule.try_visit_mut(|rule| self.resolve_node(rule))
    }

    fn resolve_node(&mut self, rule: &mut Rule) -> Result<(), GrammarError> {
        let kind = match rule.kind() {
            RuleKind::Reference(name) | RuleKind::Parameter { name, .. } => {
                let name = name.clone();
                if !self.grammar.has_rule(&name) {
                    log::debug!("Forward reference to `{name}`");
                }
                RuleKind::Named(self.handle_for(&name))
            }
            RuleKind::PatternReference(name) => {
                let name = name.clone();
                let args = rule.take_children();
                let expanded = self.expand(&name, args)?;
                *rule = expanded;
                return Ok(());
            }
            _ => return Ok(()),
        };
        rule.set_kind(kind);
        Ok(())
    }

    fn expand(&mut self, name: &ArcStr, args: Vec<Rule>) -> Result<Rule, GrammarError> {
        let grammar = self.grammar;
        let Some(pattern) = grammar.get_pattern(name) else {
            return Err(GrammarError::UnresolvedReference(name.clone()));
        };
        if self.expanding.contains(name) {
            return Err(GrammarError::RecursivePattern(name.clone()));
        }

        let mut expanded = pattern.instantiate(args)?;

        self.expanding.push(name.clone());
        let result = self.resolve(&mut expanded);
        self.expanding.pop();

        result.map(|()| expanded)
    }
}

/// Moves resolved rules from one grammar into another.
///
/// Handles are translated by name. Shared pattern arguments are translated once, so rules that
/// shared an argument in the source still share it afterwards.
pub(crate) struct Importer<'a> {
    source: &'a Grammar,
    shared: HashMap<*const Rule, Arc<Rule>>,
}

impl<'a> Importer<'a> {
    pub fn new(source: &'a Grammar) -> Importer<'a> {
        Importer {
            source,
            shared: HashMap::new(),
        }
    }

    pub fn remap(&mut self, target: &mut Grammar, rule: &mut Rule) {
        let kind = match rule.kind() {
            &RuleKind::Named(handle) => {
                let name = self.source.rules[handle].name.clone();
                RuleKind::Named(target.declare(name))
            }
            RuleKind::Shared(arg) => RuleKind::Shared(self.remap_shared(target, arg)),
            _ => {
                for child in rule.children_mut() {
                    self.remap(target, child);
                }
                return;
            }
        };
        rule.set_kind(kind);
    }

    fn remap_shared(&mut self, target: &mut Grammar, arg: &Arc<Rule>) -> Arc<Rule> {
        let key = Arc::as_ptr(arg);
        if let Some(shared) = self.shared.get(&key) {
            return Arc::clone(shared);
        }

        let mut inner = Rule::clone(arg);
        self.remap(target, &mut inner);
        let shared = Arc::new(inner);
        self.shared.insert(key, Arc::clone(&shared));
        shared
    }
}
