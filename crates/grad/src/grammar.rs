use std::collections::HashMap;

use cranelift_entity::{entity_impl, PrimaryMap};

use crate::{
    attempt::MatchCx,
    config::ScanConfig,
    error::GrammarError,
    matched::Match,
    pattern::Pattern,
    resolve::{Importer, ResolveCx},
    rule::{NamedRule, Rule},
    ArcStr,
};

/// Stable index of a named rule inside its [`Grammar`].
///
/// Every reference to a name resolves to the same handle, so replacing the rule behind a name
/// is observed by all of its users.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct RuleHandle(u32);

entity_impl! { RuleHandle }

impl RuleHandle {
    pub fn name(self, grammar: &Grammar) -> Option<&str> {
        grammar.rules.get(self).map(|slot| &*slot.name)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Slot {
    pub name: ArcStr,
    /// `None` for a name that has only been referenced so far.
    pub body: Option<Rule>,
}

/// Something that can be registered into a grammar.
#[derive(Clone, Debug)]
pub enum Item {
    Rule(NamedRule),
    Pattern(Pattern),
}

impl From<NamedRule> for Item {
    fn from(value: NamedRule) -> Self {
        Item::Rule(value)
    }
}

impl From<Pattern> for Item {
    fn from(value: Pattern) -> Self {
        Item::Pattern(value)
    }
}

/// A registry of named rules and patterns.
///
/// A grammar is built up with [`Grammar::add`] and [`Grammar::use_grammar`], after which it is
/// only read by [`Grammar::scan`]. Building requires `&mut self`, matching only `&self`.
#[derive(Clone, Debug)]
pub struct Grammar {
    pub(crate) rules: PrimaryMap<RuleHandle, Slot>,
    pub(crate) lookup: HashMap<ArcStr, RuleHandle>,
    /// Defined rules in registration order.
    pub(crate) order: Vec<RuleHandle>,
    pub(crate) patterns: Vec<Pattern>,
    pub(crate) pattern_lookup: HashMap<ArcStr, usize>,
}

impl Default for Grammar {
    fn default() -> Self {
        Grammar::new()
    }
}

impl Grammar {
    pub fn new() -> Grammar {
        Grammar {
            rules: PrimaryMap::new(),
            lookup: HashMap::new(),
            order: Vec::new(),
            patterns: Vec::new(),
            pattern_lookup: HashMap::new(),
        }
    }

    /// Registers a named rule or a pattern.
    ///
    /// On error the grammar is left unchanged.
    pub fn add(&mut self, item: impl Into<Item>) -> Result<(), GrammarError> {
        match item.into() {
            Item::Rule(rule) => self.add_rule(rule).map(|_| ()),
            Item::Pattern(pattern) => self.add_pattern(pattern),
        }
    }

    /// Registers a named rule, replacing any previous rule of the same name.
    ///
    /// A replaced rule keeps its handle, so existing references observe the new body, and moves
    /// to the end of the scan priority order.
    ///
    /// References to rules that are not registered yet are allowed and bind once the rule is
    /// added, [`Grammar::validate`] reports the ones that never were.
    pub fn add_rule(&mut self, rule: NamedRule) -> Result<RuleHandle, GrammarError> {
        let (name, mut body) = rule.into_parts();
        if name.is_empty() {
            return Err(GrammarError::InvalidRegistration(
                "rule name must not be empty".into(),
            ));
        }

        let mut cx = ResolveCx::new(self);
        let handle = cx.handle_for(&name);
        cx.resolve(&mut body)?;

        for declared in cx.into_declared() {
            self.declare(declared);
        }
        self.define(handle, body);

        Ok(handle)
    }

    /// Registers a pattern, replacing any previous pattern of the same name.
    ///
    /// Rules that already applied the old pattern keep their expansion.
    pub fn add_pattern(&mut self, pattern: Pattern) -> Result<(), GrammarError> {
        let pattern = pattern.bind_parameters()?;
        log::debug!("Adding pattern `{}`", pattern.name());

        match self.pattern_lookup.get(pattern.name()) {
            Some(&index) => self.patterns[index] = pattern,
            None => {
                self.pattern_lookup
                    .insert(pattern.name().clone(), self.patterns.len());
                self.patterns.push(pattern);
            }
        }
        Ok(())
    }

    /// Imports every pattern and rule of `other`, in its registration order.
    ///
    /// Names collide the same way as with [`Grammar::add`], the imported definition wins. Fails
    /// if `other` references a rule that neither grammar defines, the grammar is left unchanged
    /// in that case.
    pub fn use_grammar(&mut self, other: &Grammar) -> Result<(), GrammarError> {
        let mut merged = self.clone();
        merged.import(other)?;
        *self = merged;
        Ok(())
    }

    fn import(&mut self, other: &Grammar) -> Result<(), GrammarError> {
        for pattern in &other.patterns {
            self.add_pattern(pattern.clone())?;
        }

        let mut importer = Importer::new(other);
        for &handle in &other.order {
            let slot = &other.rules[handle];
            let Some(body) = &slot.body else {
                continue;
            };
            let target = self.declare(slot.name.clone());
            let mut body = body.clone();
            importer.remap(self, &mut body);
            self.define(target, body);
        }

        for slot in other.rules.values() {
            if slot.body.is_none() && self.get_rule(&slot.name).is_none() {
                return Err(GrammarError::UnresolvedReference(slot.name.clone()));
            }
        }

        log::debug!(
            "Imported {} rules and {} patterns",
            other.order.len(),
            other.patterns.len()
        );
        Ok(())
    }

    /// Checks that every referenced rule has been defined.
    pub fn validate(&self) -> Result<(), GrammarError> {
        match self.undefined().next() {
            Some(name) => Err(GrammarError::UnresolvedReference(name.into())),
            None => Ok(()),
        }
    }

    /// Names that are referenced but were never registered.
    pub fn undefined(&self) -> impl Iterator<Item = &str> {
        self.rules
            .values()
            .filter(|slot| slot.body.is_none())
            .map(|slot| &*slot.name)
    }

    pub(crate) fn declare(&mut self, name: ArcStr) -> RuleHandle {
        if let Some(&handle) = self.lookup.get(&name) {
            return handle;
        }
        let handle = self.rules.push(Slot {
            name: name.clone(),
            body: None,
        });
        self.lookup.insert(name, handle);
        handle
    }

    pub(crate) fn define(&mut self, handle: RuleHandle, body: Rule) {
        let slot = &mut self.rules[handle];
        match slot.body.replace(body) {
            Some(_) => {
                log::debug!("Replacing rule `{}`", slot.name);
                // the handle stays, its scan priority is that of the latest registration
                self.order.retain(|&other| other != handle);
            }
            None => log::debug!("Adding rule `{}`", slot.name),
        }
        self.order.push(handle);
    }

    pub(crate) fn slot(&self, handle: RuleHandle) -> Option<&Slot> {
        self.rules.get(handle)
    }

    pub fn handle(&self, name: &str) -> Option<RuleHandle> {
        self.lookup.get(name).copied()
    }

    /// The resolved body of a rule.
    pub fn get_rule(&self, name: &str) -> Option<&Rule> {
        let handle = self.handle(name)?;
        self.rules[handle].body.as_ref()
    }

    pub fn get_pattern(&self, name: &str) -> Option<&Pattern> {
        let &index = self.pattern_lookup.get(name)?;
        Some(&self.patterns[index])
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.get_rule(name).is_some()
    }

    pub fn has_pattern(&self, name: &str) -> bool {
        self.pattern_lookup.contains_key(name)
    }

    /// Defined rule names in registration order.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.order
            .iter()
            .map(move |&handle| &*self.rules[handle].name)
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Number of defined rules.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Attempts a single named rule at `position`.
    pub fn attempt(&self, name: &str, text: &str, position: usize) -> Option<Match> {
        self.attempt_with(name, text, position, &ScanConfig::default())
    }

    pub fn attempt_with(
        &self,
        name: &str,
        text: &str,
        position: usize,
        config: &ScanConfig,
    ) -> Option<Match> {
        let handle = self.handle(name)?;
        MatchCx::new(self, text, config).attempt_named(handle, position, 0)
    }
}
