//! Character sets for `CharacterSet` combinators
//!
//! A [`CharSet`] is a union of explicit character ranges and named classes
//! (Unicode general categories, whitespace). Classes are kept symbolic rather
//! than expanded into ranges so that the code generator can emit them as a
//! one-line constructor instead of thousands of ranges.

use std::fmt;
use unicode_general_category::{get_general_category, GeneralCategory};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RangeSet {
    /// Sorted, non-overlapping ranges stored as (start, end) inclusive
    ranges: Vec<(char, char)>,
}

impl Default for RangeSet {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeSet {
    pub fn new() -> Self {
        RangeSet { ranges: Vec::new() }
    }

    pub fn from_range(start: char, end: char) -> Self {
        let mut set = RangeSet::new();
        set.add_range(start, end);
        set
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn add_char(&mut self, ch: char) {
        self.add_range(ch, ch);
    }

    /// Add an inclusive range; a reversed range is ignored
    pub fn add_range(&mut self, start: char, end: char) {
        if start > end {
            return;
        }
        self.ranges.push((start, end));
        self.normalize();
    }

    /// Sort and merge overlapping/adjacent ranges
    fn normalize(&mut self) {
        if self.ranges.len() <= 1 {
            return;
        }
        self.ranges.sort_by_key(|r| r.0);
        let mut merged = Vec::with_capacity(self.ranges.len());
        let mut current = self.ranges[0];

        for &(start, end) in &self.ranges[1..] {
            if start as u32 <= current.1 as u32 + 1 {
                current.1 = current.1.max(end);
            } else {
                merged.push(current);
                current = (start, end);
            }
        }
        merged.push(current);
        self.ranges = merged;
    }

    pub fn union(&self, other: &RangeSet) -> RangeSet {
        let mut result = self.clone();
        for &(start, end) in &other.ranges {
            result.add_range(start, end);
        }
        result
    }

    pub fn contains(&self, ch: char) -> bool {
        self.ranges
            .iter()
            .any(|&(start, end)| ch >= start && ch <= end)
    }

    pub fn ranges(&self) -> &[(char, char)] {
        &self.ranges
    }
}

/// A named class of characters
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CharClass {
    /// Unicode general category, major (`"L"`) or minor (`"Lu"`)
    Category(String),
    /// Any character with the Unicode `White_Space` property
    WhiteSpace,
    /// White space other than line breaks
    SingleLineWhiteSpace,
}

impl CharClass {
    pub fn category(name: &str) -> CharClass {
        CharClass::Category(name.to_string())
    }

    pub fn contains(&self, ch: char) -> bool {
        match self {
            CharClass::Category(name) => category_matches(get_general_category(ch), name),
            CharClass::WhiteSpace => ch.is_whitespace(),
            CharClass::SingleLineWhiteSpace => ch.is_whitespace() && !is_line_break(ch),
        }
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharClass::Category(name) => write!(f, "{}", name),
            CharClass::WhiteSpace => write!(f, "whitespace"),
            CharClass::SingleLineWhiteSpace => write!(f, "single-line whitespace"),
        }
    }
}

fn is_line_break(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// The set half of a `CharacterSet` node; negation lives on the node
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CharSet {
    ranges: RangeSet,
    classes: Vec<CharClass>,
}

impl CharSet {
    pub fn new() -> Self {
        CharSet::default()
    }

    /// Set of exactly the given characters
    pub fn from_chars(chars: &[char]) -> Self {
        let mut set = CharSet::new();
        for &ch in chars {
            set.ranges.add_char(ch);
        }
        set
    }

    pub fn from_class(class: CharClass) -> Self {
        CharSet::new().with_class(class)
    }

    pub fn with_char(mut self, ch: char) -> Self {
        self.ranges.add_char(ch);
        self
    }

    pub fn with_range(mut self, start: char, end: char) -> Self {
        self.ranges.add_range(start, end);
        self
    }

    pub fn with_class(mut self, class: CharClass) -> Self {
        if !self.classes.contains(&class) {
            self.classes.push(class);
        }
        self
    }

    pub fn contains(&self, ch: char) -> bool {
        self.ranges.contains(ch) || self.classes.iter().any(|class| class.contains(ch))
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty() && self.classes.is_empty()
    }

    pub fn ranges(&self) -> &RangeSet {
        &self.ranges
    }

    pub fn classes(&self) -> &[CharClass] {
        &self.classes
    }
}

impl fmt::Display for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        for &(start, end) in self.ranges.ranges() {
            if start == end {
                parts.push(format!("{:?}", start));
            } else {
                parts.push(format!("{:?}-{:?}", start, end));
            }
        }
        for class in &self.classes {
            parts.push(class.to_string());
        }
        write!(f, "[{}]", parts.join("; "))
    }
}

/// Whether `cat` belongs to the category `name`: a major class (`L`), the
/// cased letters (`LC`), or a two-letter category (`Lu`). Unknown names match
/// nothing.
pub fn category_matches(cat: GeneralCategory, name: &str) -> bool {
    let code = abbreviation(cat);
    match name {
        "LC" => matches!(code, "Lu" | "Ll" | "Lt"),
        major if major.len() == 1 => code.starts_with(major),
        minor => code == minor,
    }
}

fn abbreviation(cat: GeneralCategory) -> &'static str {
    use GeneralCategory::*;

    #[allow(unreachable_patterns)]
    match cat {
        UppercaseLetter => "Lu",
        LowercaseLetter => "Ll",
        TitlecaseLetter => "Lt",
        ModifierLetter => "Lm",
        OtherLetter => "Lo",
        NonspacingMark => "Mn",
        SpacingMark => "Mc",
        EnclosingMark => "Me",
        DecimalNumber => "Nd",
        LetterNumber => "Nl",
        OtherNumber => "No",
        ConnectorPunctuation => "Pc",
        DashPunctuation => "Pd",
        OpenPunctuation => "Ps",
        ClosePunctuation => "Pe",
        InitialPunctuation => "Pi",
        FinalPunctuation => "Pf",
        OtherPunctuation => "Po",
        MathSymbol => "Sm",
        CurrencySymbol => "Sc",
        ModifierSymbol => "Sk",
        OtherSymbol => "So",
        SpaceSeparator => "Zs",
        LineSeparator => "Zl",
        ParagraphSeparator => "Zp",
        Control => "Cc",
        Format => "Cf",
        Surrogate => "Cs",
        PrivateUse => "Co",
        Unassigned => "Cn",
        _ => "Cn",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rangeset_merges_adjacent() {
        let mut set = RangeSet::from_range('a', 'c');
        set.add_range('d', 'f');
        set.add_char('z');
        assert_eq!(set.ranges(), &[('a', 'f'), ('z', 'z')]);
    }

    #[test]
    fn test_rangeset_reversed_range_ignored() {
        let set = RangeSet::from_range('z', 'a');
        assert!(set.is_empty());
    }

    #[test]
    fn test_rangeset_union() {
        let a = RangeSet::from_range('0', '4');
        let b = RangeSet::from_range('3', '9');
        assert_eq!(a.union(&b).ranges(), &[('0', '9')]);
    }

    #[test]
    fn test_category_classes() {
        let letters = CharClass::category("L");
        assert!(letters.contains('a'));
        assert!(letters.contains('Ж'));
        assert!(!letters.contains('1'));

        let digits = CharClass::category("Nd");
        assert!(digits.contains('7'));
        assert!(!digits.contains('x'));

        assert!(CharClass::category("LC").contains('A'));
        assert!(!CharClass::category("LC").contains('\u{02B0}'));
        assert!(CharClass::category("P").contains(','));
        assert!(!CharClass::category("Nope").contains('a'));
    }

    #[test]
    fn test_whitespace_classes() {
        assert!(CharClass::WhiteSpace.contains('\n'));
        assert!(CharClass::SingleLineWhiteSpace.contains('\t'));
        assert!(CharClass::SingleLineWhiteSpace.contains(' '));
        assert!(!CharClass::SingleLineWhiteSpace.contains('\n'));
        assert!(!CharClass::SingleLineWhiteSpace.contains('\r'));
    }

    #[test]
    fn test_charset_union_of_ranges_and_classes() {
        let set = CharSet::new()
            .with_range('a', 'f')
            .with_class(CharClass::category("Nd"));
        assert!(set.contains('c'));
        assert!(set.contains('5'));
        assert!(!set.contains('g'));
    }

    #[test]
    fn test_charset_display() {
        let set = CharSet::from_chars(&['>']).with_class(CharClass::WhiteSpace);
        assert_eq!(set.to_string(), "['>'; whitespace]");
    }
}
