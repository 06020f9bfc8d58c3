//! `snode` (§4.5.1): per-surface trnode/bvnode chain.
//!
//! Walks from a surface up to the scene root, grouping ancestors into the
//! three phases the source describes: bvnodes below the trnode, the
//! trnode itself, bvnodes above the trnode. Represented as a plain `Vec`
//! rather than an `ELEM` chain — `top`/`trn` are consumed internally by
//! `insert` and never handed to the backend, so they don't need arena
//! allocation or the tagged-pointer shape real output lists use.

use crate::scene::handles::NodeHandle;
use crate::scene::node::ObjectData;
use slotmap::SlotMap;

/// Which box on the ancestor this chain entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    Trnode,
    Bvnode,
}

#[derive(Debug, Clone, Copy)]
pub struct ChainEntry {
    pub node: NodeHandle,
    pub kind: ChainKind,
}

/// `srf.top`/`srf.trn` (§4.5.1).
#[derive(Debug, Clone, Default)]
pub struct SnodeChain {
    /// Outermost-to-innermost: bvnodes above trnode, trnode, bvnodes below.
    pub top: Vec<ChainEntry>,
    /// One-element fallback used when bvnodes are forbidden for this
    /// surface (tiling, §4.5.4).
    pub trn: Option<NodeHandle>,
}

/// Builds the chain for `surface` by walking its ancestor `parent` links.
#[must_use]
pub fn snode(surface: NodeHandle, nodes: &SlotMap<NodeHandle, ObjectData>) -> SnodeChain {
    let Some(srf) = nodes.get(surface) else {
        return SnodeChain::default();
    };
    let trnode = srf.trnode;

    let mut below = Vec::new();
    let mut above = Vec::new();
    let mut seen_trnode = false;

    let mut cursor = srf.parent;
    while let Some(handle) = cursor {
        let Some(node) = nodes.get(handle) else { break };
        let is_trnode = trnode == Some(handle);
        if is_trnode {
            seen_trnode = true;
        } else if node.is_bv_container {
            let entry = ChainEntry {
                node: handle,
                kind: ChainKind::Bvnode,
            };
            if seen_trnode {
                above.push(entry);
            } else {
                below.push(entry);
            }
        }
        cursor = node.parent;
    }

    let mut top = below;
    if let Some(tr) = trnode {
        top.push(ChainEntry {
            node: tr,
            kind: ChainKind::Trnode,
        });
    }
    top.extend(above);

    SnodeChain { top, trn: trnode }
}
