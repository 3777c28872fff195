// SPDX-License-Identifier: CC0-1.0

use std::fmt;
use std::str::FromStr;

use bitcoin::taproot::TAPROOT_CONTROL_MAX_NODE_COUNT;

use super::key::DescriptorKey;
use crate::expression::{self, FromTree};
use crate::Error;

/// A taproot descriptor `tr(KEY[,TREE])`.
///
/// Only the internal key is interpreted. The script tree is kept as text;
/// output-key tweaking is not implemented, so a `tr()` descriptor evaluates
/// to an empty script without an address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tr {
    /// A taproot internal key
    internal_key: DescriptorKey,
    /// Optional script tree, in its textual form
    tree: Option<String>,
}

impl Tr {
    /// Create a new [`Tr`] descriptor from internal key and script tree
    pub fn new(internal_key: DescriptorKey, tree: Option<String>) -> Result<Self, Error> {
        if let Some(ref tree) = tree {
            if tree.is_empty() {
                return Err(Error::Grammar("empty taproot script tree".to_owned()));
            }
            let height = taptree_height(tree);
            if height > TAPROOT_CONTROL_MAX_NODE_COUNT {
                return Err(Error::Grammar(format!(
                    "taproot tree of height {} exceeds the maximum of {}",
                    height, TAPROOT_CONTROL_MAX_NODE_COUNT
                )));
            }
        }
        Ok(Tr { internal_key, tree })
    }

    /// Obtain the internal key of [`Tr`] descriptor
    pub fn internal_key(&self) -> &DescriptorKey {
        &self.internal_key
    }

    /// Obtain the script tree of [`Tr`] descriptor
    pub fn taptree(&self) -> Option<&str> {
        self.tree.as_deref()
    }
}

// Brace nesting of the tree text; tokenizing already checked the balance.
fn taptree_height(tree: &str) -> usize {
    let mut depth = 0usize;
    let mut height = 0usize;
    for ch in tree.chars() {
        match ch {
            '{' => {
                depth += 1;
                height = height.max(depth);
            }
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    height
}

impl FromTree for Tr {
    fn from_tree(top: &expression::Tree<'_>) -> Result<Self, Error> {
        if top.name != "tr" {
            return Err(Error::Grammar(format!("expected «tr», found «{}»", top.name)));
        }
        match top.args.len() {
            1 => {
                let key = expression::terminal(&top.args[0], DescriptorKey::from_str)?;
                Tr::new(key, None)
            }
            2 => {
                let key = expression::terminal(&top.args[0], DescriptorKey::from_str)?;
                Tr::new(key, Some(top.args[1].to_string()))
            }
            n => Err(Error::Grammar(format!(
                "tr() takes a key and an optional tree, {} arguments given",
                n
            ))),
        }
    }
}

impl fmt::Display for Tr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tree {
            Some(ref tree) => write!(f, "tr({},{})", self.internal_key, tree),
            None => write!(f, "tr({})", self.internal_key),
        }
    }
}
