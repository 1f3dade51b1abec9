use std::fmt::{Debug, Display};

use cranelift_bitset::ScalarBitSet;

/// A set of characters.
///
/// ASCII members live in a 128 bit set, everything else in a sorted slice.
#[derive(Clone)]
pub struct CharSet {
    ascii: ScalarBitSet<u128>,
    other: Box<[char]>,
}

impl CharSet {
    pub fn new(chars: impl IntoIterator<Item = char>) -> CharSet {
        let mut ascii = ScalarBitSet::<u128>::new();
        let mut other = Vec::new();
        for c in chars {
            if c.is_ascii() {
                ascii.insert(c as u8);
            } else {
                other.push(c);
            }
        }
        other.sort_unstable();
        other.dedup();

        CharSet {
            ascii,
            other: other.into_boxed_slice(),
        }
    }
    pub fn contains(&self, c: char) -> bool {
        if c.is_ascii() {
            self.ascii.contains(c as u8)
        } else {
            self.other.binary_search(&c).is_ok()
        }
    }
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.ascii
            .iter()
            .map(char::from)
            .chain(self.other.iter().copied())
    }
    pub fn len(&self) -> usize {
        usize::from(self.ascii.len()) + self.other.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<char> for CharSet {
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        CharSet::new(iter)
    }
}

impl From<&str> for CharSet {
    fn from(value: &str) -> Self {
        CharSet::new(value.chars())
    }
}

impl PartialEq for CharSet {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for CharSet {}

impl Debug for CharSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Display for CharSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for c in self.iter() {
            write!(f, "{}", c.escape_debug())?;
        }
        write!(f, "]")
    }
}

#[test]
fn test_charset_contains() {
    let set = CharSet::from("ab\n\u{e9}\u{1F44D}");

    for c in ['a', 'b', '\n', 'é', '👍'] {
        assert!(set.contains(c), "{c:?} should be a member");
    }
    for c in ['c', ' ', 'É', '\u{7f}'] {
        assert!(!set.contains(c), "{c:?} should not be a member");
    }
    assert_eq!(set.len(), 5);
}

#[test]
fn test_charset_dedup() {
    let set = CharSet::from("xxyé é");
    assert_eq!(set.iter().collect::<String>(), " xyé");
    assert_eq!(set, CharSet::from("é yx"));
}
