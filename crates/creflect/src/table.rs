// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-capacity string-keyed hash table.
//!
//! Buckets hold the index of the first node of a chain; chain nodes live in
//! a flat arena and link to each other by index. The table never resizes:
//! callers size it up front (the loader uses twice the expected entry count).

use std::borrow::Cow;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// 32-bit FNV-1a hash of `key`.
pub fn fnv1a(key: &str) -> u32 {
    key.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

#[derive(Debug, Clone)]
struct Node<'a> {
    name: Cow<'a, str>,
    id: usize,
    next: Option<usize>,
}

/// Name to small-integer id map with chained buckets.
#[derive(Debug, Clone)]
pub struct NameTable<'a> {
    buckets: Vec<Option<usize>>,
    nodes: Vec<Node<'a>>,
}

impl<'a> NameTable<'a> {
    /// Create a table with `capacity` buckets (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buckets: vec![None; capacity.max(1)],
            nodes: Vec::with_capacity(capacity / 2),
        }
    }

    fn bucket_of(&self, name: &str) -> usize {
        fnv1a(name) as usize % self.buckets.len()
    }

    /// Map `name` to `id`, overwriting the id of an equal name.
    pub fn insert(&mut self, name: Cow<'a, str>, id: usize) {
        let bucket = self.bucket_of(&name);
        let new_node = self.nodes.len();

        let Some(mut cursor) = self.buckets[bucket] else {
            self.nodes.push(Node {
                name,
                id,
                next: None,
            });
            self.buckets[bucket] = Some(new_node);
            return;
        };

        loop {
            let node = &mut self.nodes[cursor];
            if node.name == name {
                node.id = id;
                return;
            }
            match node.next {
                Some(next) => cursor = next,
                None => {
                    node.next = Some(new_node);
                    break;
                }
            }
        }

        self.nodes.push(Node {
            name,
            id,
            next: None,
        });
    }

    /// Look up the id stored for `name`.
    pub fn get(&self, name: &str) -> Option<usize> {
        let mut cursor = self.buckets[self.bucket_of(name)];
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            if node.name == name {
                return Some(node.id);
            }
            cursor = node.next;
        }
        None
    }

    /// Number of distinct names stored.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Length of the longest chain.
    pub fn max_chain_len(&self) -> usize {
        self.buckets
            .iter()
            .map(|head| {
                let mut len = 0;
                let mut cursor = *head;
                while let Some(index) = cursor {
                    len += 1;
                    cursor = self.nodes[index].next;
                }
                len
            })
            .max()
            .unwrap_or(0)
    }

    /// Copy every borrowed key so the table outlives its source buffer.
    pub fn into_owned(self) -> NameTable<'static> {
        NameTable {
            buckets: self.buckets,
            nodes: self
                .nodes
                .into_iter()
                .map(|node| Node {
                    name: Cow::Owned(node.name.into_owned()),
                    id: node.id,
                    next: node.next,
                })
                .collect(),
        }
    }

    /// Iterate `(name, id)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.nodes.iter().map(|node| (node.name.as_ref(), node.id))
    }
}
