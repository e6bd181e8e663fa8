//! Identity paths: stable string addresses for tree positions.
//!
//! A path is the sole key for persistent hook state and doubles as a hint for
//! instance reuse. Keyed children are addressed by key, so they keep their
//! path when siblings shift; keyless children are addressed by type name plus
//! the number of same-typed keyless siblings before them.

use crate::collections::map::HashMap;
use crate::vnode::{Key, VNode};

/// Path of the root position.
pub const ROOT_PATH: &str = "root";

/// Derives the path of the child at `index` under `parent`.
///
/// `type_name` falls back to the type of `siblings[index]`; when neither is
/// available the position itself is used.
pub fn child_path(
    parent: &str,
    key: Option<&Key>,
    index: usize,
    type_name: Option<&str>,
    siblings: &[VNode],
) -> String {
    if let Some(key) = key {
        return format!("{parent}.k{key}");
    }
    let type_name = type_name.or_else(|| siblings.get(index).map(VNode::type_name));
    match type_name {
        Some(type_name) => {
            let ordinal = siblings
                .iter()
                .take(index)
                .filter(|sibling| sibling.key().is_none() && sibling.type_name() == type_name)
                .count();
            format!("{parent}.c{type_name}_{ordinal}")
        }
        None => format!("{parent}.i{index}"),
    }
}

/// Path of `siblings[index]`.
pub fn path_of(parent: &str, siblings: &[VNode], index: usize) -> String {
    let node = &siblings[index];
    child_path(parent, node.key(), index, Some(node.type_name()), siblings)
}

/// Paths of every entry in `siblings`, in one pass.
pub fn child_paths(parent: &str, siblings: &[VNode]) -> Vec<String> {
    let mut ordinals: HashMap<&str, usize> = HashMap::default();
    siblings
        .iter()
        .map(|node| match node.key() {
            Some(key) => format!("{parent}.k{key}"),
            None => {
                let type_name = node.type_name();
                let ordinal = ordinals.entry(type_name).or_insert(0);
                let path = format!("{parent}.c{type_name}_{ordinal}");
                *ordinal += 1;
                path
            }
        })
        .collect()
}
