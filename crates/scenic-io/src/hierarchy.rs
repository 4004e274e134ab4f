//! Parent-to-child transform propagation over a flat node list.

use std::collections::VecDeque;

use scenic_core::math_utils::{multiply, Mat4};
use scenic_core::Node;

/// Replaces every node's local matrix with `local * parent_world`.
///
/// Roots are the nodes no other node lists as a child. The walk is
/// breadth-first from the roots, so a parent's matrix is final before any
/// of its children read it. Nodes reachable only through a cycle keep
/// their local matrix. Child indices must be in range.
pub(crate) fn propagate_transforms(nodes: &mut [Node]) {
    let mut referenced = vec![false; nodes.len()];
    for node in nodes.iter() {
        for &child in node.children.iter().flatten() {
            referenced[child] = true;
        }
    }

    let mut queue: VecDeque<(usize, Option<Mat4>)> = referenced
        .iter()
        .enumerate()
        .filter(|(_, &is_child)| !is_child)
        .map(|(index, _)| (index, None))
        .collect();
    let mut visited = vec![false; nodes.len()];

    while let Some((index, parent)) = queue.pop_front() {
        if std::mem::replace(&mut visited[index], true) {
            continue;
        }
        if let Some(parent) = parent {
            nodes[index].matrix = multiply(&nodes[index].matrix, &parent);
        }
        let matrix = nodes[index].matrix;
        for &child in nodes[index].children.iter().flatten() {
            queue.push_back((child, Some(matrix)));
        }
    }
}
