// SPDX-License-Identifier: CC0-1.0

//! BIP32 derivation paths as written in descriptors.

use std::fmt;
use std::str::FromStr;

use bitcoin::bip32::ChildNumber;

use crate::Error;

/// Whether a path ends in a `*` placeholder, and of which kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Wildcard {
    /// No trailing placeholder
    None,
    /// Trailing `*`
    Unhardened,
    /// Trailing `*'`, `*h` or `*H`; the marker is kept for display only and
    /// substitution still uses a normal index
    Hardened,
}

/// An ordered sequence of child indices, optionally ending in a placeholder.
///
/// The textual form is `m/44'/0'/0'/0`; `'`, `h` and `H` all mark a hardened
/// step. A trailing `*` stands for an index supplied later, see
/// [`DerivationPath::child`]; until then it is skipped by derivation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    steps: Vec<ChildNumber>,
    wildcard: Wildcard,
}

impl DerivationPath {
    /// The empty path `m`
    pub fn master() -> DerivationPath {
        DerivationPath {
            steps: vec![],
            wildcard: Wildcard::None,
        }
    }

    /// Parses the segments following a leading `m`, e.g. the components of
    /// `0/1'/*` split on `/`.
    pub(crate) fn from_segments<'a, I>(segments: I) -> Result<DerivationPath, Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut path = DerivationPath::master();
        for segment in segments {
            if path.wildcard != Wildcard::None {
                return Err(Error::PathFormat(
                    "'*' may only appear as last element in a derivation path".to_owned(),
                ));
            }
            match segment {
                "*" => path.wildcard = Wildcard::Unhardened,
                "*'" | "*h" | "*H" => path.wildcard = Wildcard::Hardened,
                _ => path.steps.push(parse_child(segment)?),
            }
        }
        Ok(path)
    }

    /// The concrete steps, excluding any trailing placeholder
    pub fn steps(&self) -> &[ChildNumber] {
        &self.steps
    }

    /// The trailing placeholder, if any
    pub fn wildcard(&self) -> Wildcard {
        self.wildcard
    }

    /// Whether the path has no concrete steps
    pub fn is_master(&self) -> bool {
        self.steps.is_empty()
    }

    /// Appends `index`, substituting it for the trailing placeholder if
    /// there is one.
    pub fn child(&self, index: ChildNumber) -> DerivationPath {
        let mut steps = self.steps.clone();
        steps.push(index);
        DerivationPath {
            steps,
            wildcard: Wildcard::None,
        }
    }

    /// Concatenates `other` onto this path. A placeholder on `self` is
    /// dropped; the result keeps the placeholder of `other`.
    pub fn extend(&self, other: &DerivationPath) -> DerivationPath {
        let mut steps = self.steps.clone();
        steps.extend_from_slice(&other.steps);
        DerivationPath {
            steps,
            wildcard: other.wildcard,
        }
    }
}

fn parse_child(segment: &str) -> Result<ChildNumber, Error> {
    let marker = |c: char| c == '\'' || c == 'h' || c == 'H';
    let (digits, hardened) = match segment.strip_suffix(marker) {
        Some(digits) => (digits, true),
        None => (segment, false),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::PathFormat(format!("«{}» is not a child index", segment)));
    }
    let index = u32::from_str(digits)
        .map_err(|_| Error::PathFormat(format!("child index «{}» out of range", digits)))?;
    let child = if hardened {
        ChildNumber::from_hardened_idx(index)
    } else {
        ChildNumber::from_normal_idx(index)
    };
    child.map_err(|_| Error::PathFormat(format!("child index {} is not below 2^31", index)))
}

impl Default for DerivationPath {
    fn default() -> Self {
        DerivationPath::master()
    }
}

impl FromStr for DerivationPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("m/").ok_or_else(|| {
            Error::PathFormat(format!("path «{}» does not start with «m/»", s))
        })?;
        DerivationPath::from_segments(rest.split('/'))
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for child in &self.steps {
            write!(f, "/{}", child)?;
        }
        match self.wildcard {
            Wildcard::None => Ok(()),
            Wildcard::Unhardened => f.write_str("/*"),
            Wildcard::Hardened => f.write_str("/*'"),
        }
    }
}

serde_string_impl!(DerivationPath, "a BIP32 derivation path");
