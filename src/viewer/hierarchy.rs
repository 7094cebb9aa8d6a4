//! Channel tree resolution and ordering.
//!
//! Channels form a tree through their `parent` links, but archived parent
//! data can be arbitrarily malformed: links may form cycles or point at ids
//! that were never exported. Resolution guarantees every channel appears
//! exactly once in the final ordering regardless:
//!
//! 1. Build a children-by-parent map keyed by parent id (`""` is the virtual
//!    root).
//! 2. Walk reachability from the root with an explicit stack and visited set
//!    (parent data is adversarial input, so no recursion).
//! 3. Every parent key the walk never reached is *flattened*: its children
//!    are reparented directly under the root and the group entry itself is
//!    discarded. The channel records stay valid metadata; only their place
//!    in the tree changes.
//! 4. A pre-order traversal with the sibling comparator below yields a
//!    single id→rank map used to sort any channel list consistently.
//!
//! Sibling ordering: owning server type (lexicographic), then server name
//! (case-insensitive, numeric-aware), then the channel's explicit position
//! (missing = -1), then channel name (case-insensitive, numeric-aware).

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::archive::{ArchiveMetadata, ChannelMeta, ServerMeta};

/// The resolved total order over all channels of an archive.
#[derive(Debug, Clone)]
pub struct ChannelHierarchy {
    rank: HashMap<String, usize>,
    order: Vec<String>,
}

impl ChannelHierarchy {
    /// Resolves the hierarchy of every channel in `metadata`.
    pub fn resolve(metadata: &ArchiveMetadata) -> Self {
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for (id, channel) in &metadata.channels {
            let parent = channel.parent.clone().unwrap_or_default();
            children.entry(parent).or_default().push(id.clone());
        }

        // Parent keys that own children but were never reached from the root
        // are part of a cycle or of a chain that never bottoms out.
        let mut unreachable: BTreeSet<String> = children.keys().cloned().collect();
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack: Vec<String> = vec![String::new()];
        while let Some(key) = stack.pop() {
            if !visited.insert(key.clone()) {
                continue;
            }
            unreachable.remove(&key);
            if let Some(kids) = children.get(&key) {
                stack.extend(kids.iter().cloned());
            }
        }

        // Flatten: reparent the orphaned groups under the root, discard the
        // group keys. BTreeSet iteration keeps this deterministic.
        for key in unreachable {
            if let Some(kids) = children.remove(&key) {
                children.entry(String::new()).or_default().extend(kids);
            }
        }

        // Pre-order traversal, sorting each sibling group on entry.
        let mut order = Vec::with_capacity(metadata.channels.len());
        let mut stack: Vec<String> = Vec::new();
        if let Some(mut roots) = children.remove("") {
            roots.sort_by(|a, b| compare_channels(metadata, a, b));
            stack.extend(roots.into_iter().rev());
        }
        while let Some(id) = stack.pop() {
            order.push(id.clone());
            if let Some(mut kids) = children.remove(&id) {
                kids.sort_by(|a, b| compare_channels(metadata, a, b));
                stack.extend(kids.into_iter().rev());
            }
        }

        let rank = order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        Self { rank, order }
    }

    /// The rank of a channel in the resolved order.
    pub fn rank_of(&self, id: &str) -> Option<usize> {
        self.rank.get(id).copied()
    }

    /// All channel ids in resolved order.
    pub fn ordered(&self) -> &[String] {
        &self.order
    }

    /// Sorts a list of channel ids by rank; ids missing from the hierarchy
    /// sort last.
    pub fn sort(&self, ids: &mut [String]) {
        ids.sort_by_key(|id| self.rank_of(id).unwrap_or(usize::MAX));
    }
}

fn unknown_server() -> ServerMeta {
    ServerMeta::new("<unknown>", "unknown")
}

fn compare_channels(metadata: &ArchiveMetadata, a: &str, b: &str) -> Ordering {
    let fallback_a;
    let fallback_b;
    let (Some(ca), Some(cb)) = (metadata.channels.get(a), metadata.channels.get(b)) else {
        return a.cmp(b);
    };
    let sa = match metadata.servers.get(&ca.server) {
        Some(s) => s,
        None => {
            fallback_a = unknown_server();
            &fallback_a
        }
    };
    let sb = match metadata.servers.get(&cb.server) {
        Some(s) => s,
        None => {
            fallback_b = unknown_server();
            &fallback_b
        }
    };

    sa.kind
        .cmp(&sb.kind)
        .then_with(|| natural_cmp(&sa.name, &sb.name))
        .then_with(|| position_of(ca).cmp(&position_of(cb)))
        .then_with(|| natural_cmp(&ca.name, &cb.name))
}

fn position_of(channel: &ChannelMeta) -> i64 {
    channel.position.unwrap_or(-1)
}

/// Case-insensitive comparison with numeric-aware collation: runs of digits
/// compare by value, so `"room2" < "room10"`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let ai = i;
            let bj = j;
            while i < a.len() && a[i].is_ascii_digit() {
                i += 1;
            }
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }
            // compare the digit runs as numbers: longer run (sans leading
            // zeros) wins, then digit-by-digit
            let run_a: String = a[ai..i].iter().collect();
            let run_b: String = b[bj..j].iter().collect();
            let trimmed_a = run_a.trim_start_matches('0');
            let trimmed_b = run_b.trim_start_matches('0');
            let ordering = trimmed_a
                .len()
                .cmp(&trimmed_b.len())
                .then_with(|| trimmed_a.cmp(trimmed_b));
            if ordering != Ordering::Equal {
                return ordering;
            }
        } else {
            let ca = a[i].to_lowercase().next().unwrap_or(a[i]);
            let cb = b[j].to_lowercase().next().unwrap_or(b[j]);
            if ca != cb {
                return ca.cmp(&cb);
            }
            i += 1;
            j += 1;
        }
    }

    (a.len() - i).cmp(&(b.len() - j))
}
