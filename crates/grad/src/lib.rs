//! Grammar definition and matching engine.
//!
//! Rules are assembled from primitives ([`literal`], [`range`], [`char_set`], ...) and
//! combinators ([`concatenation`], [`alternation`], [`repeat`], ...), named with
//! [`named_rule`] and registered into a [`Grammar`] together with parametrized [`Pattern`]s.
//! The grammar resolves [`reference`]s and [`pattern_reference`]s into handles and can then
//! [`Grammar::scan`] a text into a flat sequence of top-level [`Match`]es.
//!
//! ```
//! use grad::{named_rule, range, repeat, Grammar};
//!
//! let mut grammar = Grammar::new();
//! grammar.add(named_rule("num", repeat(range('0', '9'), 1))).unwrap();
//!
//! let matches = grammar.scan("ab12c3", None);
//! assert_eq!(matches.len(), 2);
//! assert_eq!(matches[0].as_str("ab12c3"), "12");
//! ```

pub mod attempt;
pub mod charset;
pub mod config;
pub mod display;
pub mod error;
pub mod grammar;
pub mod matched;
pub mod pattern;
pub mod rule;
pub mod scan;

mod resolve;

use std::sync::Arc;

pub type ArcStr = Arc<str>;

pub use charset::CharSet;
pub use config::ScanConfig;
pub use error::GrammarError;
pub use grammar::{Grammar, Item, RuleHandle};
pub use matched::Match;
pub use pattern::{pattern, Pattern};
pub use rule::{
    alternation, any_char, begin_line, char_set, concatenation, empty, end_line, literal,
    named_rule, negation, one_or_more, optional, pattern_reference, range, reference, repeat,
    zero_or_more, NamedRule, Rule, RuleKind,
};
