use crate::{
    attempt::MatchCx,
    config::ScanConfig,
    grammar::{Grammar, RuleHandle},
    matched::Match,
};

impl Grammar {
    /// Scans `text` left to right into a flat sequence of top-level matches.
    ///
    /// At every position the selected rules are tried most recently registered first, the first
    /// one that consumes at least one character is accepted and scanning continues after it. If
    /// no rule does, one character is skipped without producing a match.
    ///
    /// `names` restricts the scan to the given rules, `Some(&[])` matches nothing.
    pub fn scan(&self, text: &str, names: Option<&[&str]>) -> Vec<Match> {
        self.scan_with(text, names, &ScanConfig::default())
    }

    pub fn scan_with(&self, text: &str, names: Option<&[&str]>, config: &ScanConfig) -> Vec<Match> {
        let targets: Vec<RuleHandle> = match names {
            None => self.order.clone(),
            Some(names) => self
                .order
                .iter()
                .copied()
                .filter(|&handle| names.contains(&&*self.rules[handle].name))
                .collect(),
        };
        if targets.is_empty() {
            return Vec::new();
        }

        let cx = MatchCx::new(self, text, config);
        let mut matches = Vec::new();
        let mut index = 0;
        let mut skipped_from = None;

        while index < text.len() {
            let found = targets.iter().rev().find_map(|&handle| {
                cx.attempt_named(handle, index, 0)
                    .filter(|matched| matched.next() != index)
            });

            match found {
                Some(matched) => {
                    if let Some(from) = skipped_from.take() {
                        log::trace!("Skipped {from}..{index}");
                    }
                    log::trace!("Matched `{}` at {}", matched.name(), matched.span().start);
                    index = matched.next();
                    matches.push(matched);
                }
                None => {
                    skipped_from.get_or_insert(index);
                    index += text[index..].chars().next().map_or(1, char::len_utf8);
                }
            }
        }

        if let Some(from) = skipped_from {
            log::trace!("Skipped {from}..{index}");
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use crate::{rule::*, Grammar, Match};

    fn spans<'a>(text: &'a str, matches: &'a [Match]) -> Vec<(usize, usize, &'a str)> {
        matches
            .iter()
            .map(|m| (m.start(), m.next(), m.as_str(text)))
            .collect()
    }

    fn numbers() -> Grammar {
        let mut grammar = Grammar::new();
        grammar
            .add(named_rule("num", one_or_more(range('0', '9'))))
            .unwrap();
        grammar
    }

    #[test]
    fn test_scan_skips_unmatched() {
        let text = "ab12c3";
        let matches = numbers().scan(text, None);
        assert_eq!(spans(text, &matches), [(2, 4, "12"), (5, 6, "3")]);
        assert!(matches.iter().all(|m| m.name() == "num"));
    }

    #[test]
    fn test_scan_multibyte_skip() {
        let text = "é12ü";
        let matches = numbers().scan(text, None);
        assert_eq!(spans(text, &matches), [(2, 4, "12")]);
    }

    #[test]
    fn test_scan_empty() {
        assert!(numbers().scan("", None).is_empty());
        assert!(Grammar::new().scan("123", None).is_empty());
        assert!(numbers().scan("123", Some(&[])).is_empty());
        assert!(numbers().scan("123", Some(&["other"])).is_empty());
    }

    #[test]
    fn test_scan_latest_rule_first() {
        let mut grammar = Grammar::new();
        grammar
            .add(named_rule("word", one_or_more(range('a', 'z'))))
            .unwrap();
        grammar.add(named_rule("keyword", literal("if"))).unwrap();

        let text = "if iffy";
        let matches = grammar.scan(text, None);
        let names: Vec<_> = matches.iter().map(Match::name).collect();
        assert_eq!(names, ["keyword", "keyword", "word"]);
        assert_eq!(
            spans(text, &matches),
            [(0, 2, "if"), (3, 5, "if"), (5, 7, "fy")]
        );

        // restricted to the general rule
        let matches = grammar.scan(text, Some(&["word"]));
        assert_eq!(spans(text, &matches), [(0, 2, "if"), (3, 7, "iffy")]);
    }

    #[test]
    fn test_scan_ignores_zero_width() {
        let mut grammar = numbers();
        grammar
            .add(named_rule("blank", zero_or_more(literal(" "))))
            .unwrap();

        let text = "1  2";
        let matches = grammar.scan(text, None);
        let names: Vec<_> = matches.iter().map(Match::name).collect();
        assert_eq!(names, ["num", "blank", "num"]);
        assert_eq!(spans(text, &matches)[1], (1, 3, "  "));
    }
}
