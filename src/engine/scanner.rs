//! Wildcard line scanner.
//!
//! Patterns are literal text with four special characters:
//!
//! - `*` matches the shortest run of characters that lets the rest of the
//!   pattern match; a trailing `*` takes the rest of the line
//! - `#` matches an optionally signed decimal integer
//! - `?` matches any single character
//! - a space matches one or more whitespace characters
//!
//! `*` and `#` capture what they matched. Matching is anchored at the start
//! of the text only: text after the pattern's end is left in
//! [`Captures::rest`].
//!
//! ```
//! use referee::engine::scanner::scan;
//!
//! let caps = scan("stat01: 1234 56789 7 2 30 Nf3", "stat01: # # # # # *").unwrap();
//! assert_eq!(caps.int(1), Some(56789));
//! assert_eq!(caps.get(5), Some("Nf3"));
//! ```

/// Substrings captured by a successful [`scan`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Captures<'a> {
    text: &'a str,
    groups: Vec<&'a str>,
    end: usize,
}

impl<'a> Captures<'a> {
    /// The `i`th capture, counting from 0
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&'a str> {
        self.groups.get(i).copied()
    }

    /// The `i`th capture as an integer
    #[must_use]
    pub fn int(&self, i: usize) -> Option<i64> {
        self.get(i)?.parse().ok()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Unmatched text after the pattern
    #[must_use]
    pub fn rest(&self) -> &'a str {
        &self.text[self.end..]
    }
}

/// Match `pattern` against the start of `text`.
#[must_use]
pub fn scan<'a>(text: &'a str, pattern: &str) -> Option<Captures<'a>> {
    let pat: Vec<char> = pattern.chars().collect();
    let mut groups = Vec::new();
    let end = match_at(text, 0, &pat, &mut groups)?;
    Some(Captures { text, groups, end })
}

/// Match `pattern` against all of `text`, ignoring trailing whitespace.
#[must_use]
pub fn scan_exact<'a>(text: &'a str, pattern: &str) -> Option<Captures<'a>> {
    scan(text, pattern).filter(|caps| caps.rest().trim().is_empty())
}

fn match_at<'a>(text: &'a str, t: usize, pat: &[char], groups: &mut Vec<&'a str>) -> Option<usize> {
    let Some((&head, tail)) = pat.split_first() else {
        return Some(t);
    };
    let rest = &text[t..];
    match head {
        '*' if tail.is_empty() => {
            groups.push(rest);
            Some(text.len())
        }
        '*' => {
            let ends = rest
                .char_indices()
                .map(|(i, _)| t + i)
                .chain(std::iter::once(text.len()));
            for end in ends {
                groups.push(&text[t..end]);
                if let Some(done) = match_at(text, end, tail, groups) {
                    return Some(done);
                }
                groups.pop();
            }
            None
        }
        '#' => {
            let sign = usize::from(rest.starts_with(['-', '+']));
            let digits = rest[sign..].bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 {
                return None;
            }
            let end = t + sign + digits;
            groups.push(&text[t..end]);
            let done = match_at(text, end, tail, groups);
            if done.is_none() {
                groups.pop();
            }
            done
        }
        '?' => {
            let c = rest.chars().next()?;
            match_at(text, t + c.len_utf8(), tail, groups)
        }
        ' ' => {
            let spaces: usize = rest
                .chars()
                .take_while(|c| c.is_whitespace())
                .map(char::len_utf8)
                .sum();
            if spaces == 0 {
                return None;
            }
            match_at(text, t + spaces, tail, groups)
        }
        literal => {
            let c = rest.chars().next()?;
            if c != literal {
                return None;
            }
            match_at(text, t + c.len_utf8(), tail, groups)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_prefix() {
        let caps = scan("pong 17 trailing", "pong #").unwrap();
        assert_eq!(caps.int(0), Some(17));
        assert_eq!(caps.rest(), " trailing");
        assert!(scan("ping 17", "pong #").is_none());
    }

    #[test]
    fn test_lazy_star_backtracks() {
        let caps = scan("Illegal move (no king): e2e5", "Illegal move *: *").unwrap();
        assert_eq!(caps.get(0), Some("(no king)"));
        assert_eq!(caps.get(1), Some("e2e5"));
    }

    #[test]
    fn test_signed_integers_and_spaces() {
        let caps = scan_exact("12  -35\t120 40000 e4 e5", "# # # # *").unwrap();
        assert_eq!(caps.int(0), Some(12));
        assert_eq!(caps.int(1), Some(-35));
        assert_eq!(caps.get(4), Some("e4 e5"));
        assert!(scan("x12", "#").is_none());
    }

    #[test]
    fn test_question_mark() {
        let caps = scan("9. 0 5 100 Nf3", "#? # # # *").unwrap();
        assert_eq!(caps.int(0), Some(9));
        assert_eq!(caps.len(), 5);
    }

    #[test]
    fn test_exact_rejects_leftovers() {
        assert!(scan_exact("pong 3 extra", "pong #").is_none());
        assert!(scan_exact("pong 3  ", "pong #").is_some());
    }

    #[test]
    fn test_independent_scanners() {
        let a = scan("telluser hello", "telluser *").unwrap();
        let b = scan("Hint: Nf3", "Hint: *").unwrap();
        assert_eq!(a.get(0), Some("hello"));
        assert_eq!(b.get(0), Some("Nf3"));
    }
}
