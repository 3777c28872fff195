// SPDX-License-Identifier: CC0-1.0

//! # Function-like Expression Language
//!
//! Descriptors are written as nested calls `name(arg,arg,...)`. This module
//! splits such text into a [`Tree`] without knowing anything about the
//! individual operators; [`crate::Descriptor`] gives the tree its meaning.
//!
//! Text between `{` and `}` (a taproot script tree) is opaque: its commas and
//! parentheses belong to the enclosing argument.

use std::fmt;
use std::str::FromStr;

use crate::{errstr, Error, MAX_RECURSION_DEPTH};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A token of the form `x(...)` or `x`
pub struct Tree<'a> {
    /// The name `x`
    pub name: &'a str,
    /// The comma-separated contents of the `(...)`, if any
    pub args: Vec<Tree<'a>>,
}

/// A trait for extracting a structure from a Tree representation in token form
pub trait FromTree: Sized {
    /// Extract a structure from Tree representation
    fn from_tree(top: &Tree<'_>) -> Result<Self, Error>;
}

impl<'a> fmt::Display for Tree<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        if self.args.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}

enum Found {
    Nothing,
    LBracket(usize),
    Comma(usize),
    RBracket(usize),
}

fn next_expr(sl: &str) -> Result<Found, Error> {
    let mut brace_depth = 0usize;
    for (n, ch) in sl.char_indices() {
        match ch {
            '{' => brace_depth += 1,
            '}' => {
                if brace_depth == 0 {
                    return Err(errstr(&sl[n..]));
                }
                brace_depth -= 1;
            }
            _ if brace_depth > 0 => {}
            '(' => return Ok(Found::LBracket(n)),
            ',' => return Ok(Found::Comma(n)),
            ')' => return Ok(Found::RBracket(n)),
            _ => {}
        }
    }
    if brace_depth > 0 {
        Err(Error::Grammar("expected «}»".to_owned()))
    } else {
        Ok(Found::Nothing)
    }
}

impl<'a> Tree<'a> {
    /// Parse an expression with round brackets
    pub fn from_slice(sl: &'a str) -> Result<(Tree<'a>, &'a str), Error> {
        Self::from_slice_depth(sl, 0u32)
    }

    fn from_slice_depth(mut sl: &'a str, depth: u32) -> Result<(Tree<'a>, &'a str), Error> {
        if depth >= MAX_RECURSION_DEPTH {
            return Err(Error::Grammar(format!(
                "nesting deeper than {} is not permitted",
                MAX_RECURSION_DEPTH
            )));
        }

        match next_expr(sl)? {
            // String-ending terminal
            Found::Nothing => Ok((
                Tree {
                    name: sl,
                    args: vec![],
                },
                "",
            )),
            // Terminal
            Found::Comma(n) | Found::RBracket(n) => Ok((
                Tree {
                    name: &sl[..n],
                    args: vec![],
                },
                &sl[n..],
            )),
            // Function call
            Found::LBracket(n) => {
                let mut ret = Tree {
                    name: &sl[..n],
                    args: vec![],
                };

                sl = &sl[n + 1..];
                loop {
                    let (arg, new_sl) = Tree::from_slice_depth(sl, depth + 1)?;
                    ret.args.push(arg);

                    if new_sl.is_empty() {
                        return Err(Error::Grammar("expected «)»".to_owned()));
                    }

                    sl = &new_sl[1..];
                    match new_sl.as_bytes()[0] {
                        b',' => {}
                        b')' => break,
                        _ => return Err(Error::Grammar("expected «)»".to_owned())),
                    }
                }
                Ok((ret, sl))
            }
        }
    }

    /// Parses a tree from a string
    pub fn from_str(s: &'a str) -> Result<Tree<'a>, Error> {
        // Filter out non-ASCII because we byte-index strings all over the
        // place and Rust gets very upset when you splinch a string.
        for ch in s.bytes() {
            if !ch.is_ascii() || ch.is_ascii_control() {
                return Err(Error::Grammar(format!(
                    "unprintable character 0x{:02x}",
                    ch
                )));
            }
        }

        let (top, rem) = Tree::from_slice(s)?;
        if rem.is_empty() {
            Ok(top)
        } else {
            Err(errstr(rem))
        }
    }

    /// Whether this token is a bare word, without a parenthesised argument list
    pub fn is_terminal(&self) -> bool {
        self.args.is_empty()
    }
}

/// Parse a string as a number, for thresholds
pub fn parse_num<T: FromStr>(s: &str) -> Result<T, Error> {
    if s.len() > 1 {
        let ch = s.chars().next().unwrap_or('0');
        if !('1'..='9').contains(&ch) {
            return Err(Error::Grammar(format!(
                "number «{}» must start with a digit 1-9",
                s
            )));
        }
    }
    T::from_str(s).map_err(|_| Error::Grammar(format!("«{}» is not a number", s)))
}

/// Attempts to parse a terminal expression
pub fn terminal<T, F, Err>(term: &Tree<'_>, convert: F) -> Result<T, Error>
where
    F: FnOnce(&str) -> Result<T, Err>,
    Err: Into<Error>,
{
    if term.is_terminal() {
        convert(term.name).map_err(Into::into)
    } else {
        Err(errstr(term.name))
    }
}

#[cfg(test)]
mod tests {

    use super::{parse_num, Tree};

    #[test]
    fn test_parse_num() {
        assert!(parse_num::<u32>("0").is_ok());
        assert!(parse_num::<u32>("16").is_ok());
        assert!(parse_num::<u32>("00").is_err());
        assert!(parse_num::<u32>("0000").is_err());
        assert!(parse_num::<u32>("06").is_err());
        assert!(parse_num::<u32>("+6").is_err());
        assert!(parse_num::<u32>("-6").is_err());
        assert!(parse_num::<u32>("").is_err());
    }

    #[test]
    fn nested_calls() {
        let tree = Tree::from_str("sh(wsh(multi(2,A,B)))").unwrap();
        assert_eq!(tree.name, "sh");
        assert_eq!(tree.args.len(), 1);
        let wsh = &tree.args[0];
        assert_eq!(wsh.name, "wsh");
        let multi = &wsh.args[0];
        assert_eq!(multi.name, "multi");
        let args: Vec<_> = multi.args.iter().map(|a| a.name).collect();
        assert_eq!(args, vec!["2", "A", "B"]);
        assert!(multi.args.iter().all(Tree::is_terminal));
        assert_eq!(tree.to_string(), "sh(wsh(multi(2,A,B)))");
    }

    #[test]
    fn braces_are_opaque() {
        let tree = Tree::from_str("tr(K,{pk(A),{pk(B),pk(C)}})").unwrap();
        assert_eq!(tree.args.len(), 2);
        assert_eq!(tree.args[0].name, "K");
        assert_eq!(tree.args[1].name, "{pk(A),{pk(B),pk(C)}}");
        assert!(tree.args[1].is_terminal());
    }

    #[test]
    fn unbalanced() {
        assert!(Tree::from_str("pkh(A").is_err());
        assert!(Tree::from_str("pkh(A))").is_err());
        assert!(Tree::from_str("tr(K,{pk(A)").is_err());
        assert!(Tree::from_str("tr(K,pk(A)})").is_err());
        assert!(Tree::from_str("pkh(A)x").is_err());
    }

    #[test]
    fn non_ascii() {
        assert!(Tree::from_str("pkh(é)").is_err());
        assert!(Tree::from_str("pkh(\u{7})").is_err());
    }
}
