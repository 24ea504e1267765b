use crate::nav::grid::NodeId;

const ABSENT: u32 = u32::MAX;

#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    node: NodeId,
    f: u32,
    h: u32,
}

impl OpenEntry {
    /// Lower F first, then lower H; node id keeps ordering deterministic.
    #[inline]
    fn key(&self) -> (u32, u32, NodeId) {
        (self.f, self.h, self.node)
    }
}

/// A* frontier: binary min-heap with O(1) membership and in-place key updates.
///
/// Positions are tracked per node id, so capacity must cover the grid's
/// `max_size()`.
#[derive(Clone, Debug, Default)]
pub struct OpenList {
    heap: Vec<OpenEntry>,
    positions: Vec<u32>,
}

impl OpenList {
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            heap: Vec::with_capacity(max_size),
            positions: vec![ABSENT; max_size],
        }
    }

    /// Empty the list and make room for `max_size` node ids.
    pub fn reset(&mut self, max_size: usize) {
        self.heap.clear();
        self.positions.clear();
        self.positions.resize(max_size, ABSENT);
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        self.positions.get(node.index()).is_some_and(|&pos| pos != ABSENT)
    }

    /// Insert `node`, or re-key it if already present.
    pub fn push_or_update(&mut self, node: NodeId, f: u32, h: u32) {
        let entry = OpenEntry { node, f, h };
        match self.positions[node.index()] {
            ABSENT => {
                let pos = self.heap.len();
                self.heap.push(entry);
                self.positions[node.index()] = pos as u32;
                self.sift_up(pos);
            }
            pos => {
                let pos = pos as usize;
                self.heap[pos] = entry;
                let pos = self.sift_up(pos);
                self.sift_down(pos);
            }
        }
    }

    /// Remove and return the entry with the lowest (F, H).
    pub fn pop(&mut self) -> Option<NodeId> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap(0, last);
        let top = self.heap.pop()?;
        self.positions[top.node.index()] = ABSENT;
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some(top.node)
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions[self.heap[a].node.index()] = a as u32;
        self.positions[self.heap[b].node.index()] = b as u32;
    }

    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.heap[pos].key() < self.heap[parent].key() {
                self.swap(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
        pos
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = pos * 2 + 1;
            let right = left + 1;
            let mut smallest = pos;
            if left < len && self.heap[left].key() < self.heap[smallest].key() {
                smallest = left;
            }
            if right < len && self.heap[right].key() < self.heap[smallest].key() {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }
}
