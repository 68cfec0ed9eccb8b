//! String primitives shared by the scenario and interpolation grammars.

use smallvec::SmallVec;

pub const FIELD_SEPARATOR: char = ';';

/// Fields of one bracket group. Most scenarios carry only a handful of columns.
pub type Fields<'a> = SmallVec<&'a str, 8>;

/// Iterates over the contents of `[...]` groups, in order of appearance.
///
/// Text outside of groups is skipped. A `[` that is reopened before being closed is
/// abandoned in favor of the later one, and an unterminated trailing `[` yields nothing.
pub fn bracket_groups(input: &str) -> BracketGroups<'_> {
    BracketGroups { rest: input }
}

pub struct BracketGroups<'a> {
    rest: &'a str,
}

impl<'a> Iterator for BracketGroups<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let open = self.rest.find('[')?;
        let after_open = &self.rest[open + 1..];
        let Some(close) = after_open.find(']') else {
            self.rest = "";
            return None;
        };
        let content = &after_open[..close];
        self.rest = &after_open[close + 1..];
        match content.rfind('[') {
            Some(reopen) => Some(&content[reopen + 1..]),
            None => Some(content),
        }
    }
}

/// Splits a group on `;`. An empty group still has one (empty) field.
pub fn split_fields(group: &str) -> Fields<'_> {
    group.split(FIELD_SEPARATOR).collect()
}

/// Parses a decimal number with `.` as the separator, independent of locale.
///
/// Surrounding whitespace is ignored. Empty input and non-finite results are `None`.
pub fn parse_number(field: &str) -> Option<f64> {
    let field = field.trim();
    if field.is_empty() {
        return None;
    }
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Removes one pair of enclosing brackets, if present.
pub fn strip_brackets(input: &str) -> &str {
    let input = input.trim();
    let input = input.strip_prefix('[').unwrap_or(input);
    input.strip_suffix(']').unwrap_or(input)
}
