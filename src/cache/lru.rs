//! LRU Recency List Module
//!
//! Arena-backed doubly linked list ordering entries from most recently used
//! (front) to least recently used (back).
//!
//! Nodes live in a `Vec` of slots and link to each other by `SlotId` instead of
//! pointers, so promotion and removal are O(1) without shared references.
//!
//! ```text
//!   slots
//!   ┌──────┬──────────────────────────────────────┐
//!   │ 0    │ Node { value: A, prev: None, next: 2 }│
//!   │ 1    │ (free)                               │
//!   │ 2    │ Node { value: B, prev: 0, next: None }│
//!   └──────┴──────────────────────────────────────┘
//!
//!   head ─► [0] ◄──► [2] ◄── tail
//! ```

// == Slot Id ==
/// Stable handle to a node in a [`RecencyList`].
///
/// A handle stays valid until its node is removed; the slot may then be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

impl SlotId {
    /// Returns the raw slot index.
    #[cfg(test)]
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

// == Recency List ==
/// Doubly linked recency list stored in a slot arena.
///
/// - Front = Most recently used
/// - Back = Least recently used
#[derive(Debug)]
pub struct RecencyList<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecencyList<T> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Creates an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    // == Length ==
    /// Returns the number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the arena, live or free. Upper bound for slot scans.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the handle stored at a raw slot index if that slot is live.
    pub fn id_at(&self, index: usize) -> Option<SlotId> {
        match self.slots.get(index) {
            Some(Some(_)) => Some(SlotId(index)),
            _ => None,
        }
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.node(id).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots
            .get_mut(id.0)
            .and_then(|slot| slot.as_mut())
            .map(|node| &mut node.value)
    }

    /// Returns the handle of the least recently used node.
    #[cfg(test)]
    pub(crate) fn back_id(&self) -> Option<SlotId> {
        self.tail
    }

    /// Returns the handle of the most recently used node.
    #[cfg(test)]
    pub(crate) fn front_id(&self) -> Option<SlotId> {
        self.head
    }

    // == Push Front ==
    /// Inserts a value as most recently used and returns its handle.
    pub fn push_front(&mut self, value: T) -> SlotId {
        let node = Node {
            value,
            prev: None,
            next: self.head,
        };
        let id = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                SlotId(index)
            }
            None => {
                self.slots.push(Some(node));
                SlotId(self.slots.len() - 1)
            }
        };

        if let Some(old_head) = self.head {
            if let Some(node) = self.node_mut(old_head) {
                node.prev = Some(id);
            }
        } else {
            self.tail = Some(id);
        }
        self.head = Some(id);
        self.len += 1;
        id
    }

    // == Move To Front ==
    /// Marks a node as most recently used. Returns false for a stale handle.
    pub fn move_to_front(&mut self, id: SlotId) -> bool {
        if self.node(id).is_none() {
            return false;
        }
        if self.head == Some(id) {
            return true;
        }

        self.detach(id);
        let old_head = self.head;
        if let Some(node) = self.node_mut(id) {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => {
                if let Some(node) = self.node_mut(h) {
                    node.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        true
    }

    // == Remove ==
    /// Unlinks a node and frees its slot, returning the value.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        self.node(id)?;
        self.detach(id);
        let node = self.slots[id.0].take()?;
        self.free.push(id.0);
        self.len -= 1;
        Some(node.value)
    }

    // == Pop Back ==
    /// Removes and returns the least recently used value.
    pub fn pop_back(&mut self) -> Option<T> {
        let tail = self.tail?;
        self.remove(tail)
    }

    // == Clear ==
    /// Drops every node and releases the arena.
    pub fn clear(&mut self) {
        self.slots = Vec::new();
        self.free = Vec::new();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Iterates values from most to least recently used.
    pub fn iter(&self) -> RecencyIter<'_, T> {
        RecencyIter {
            list: self,
            current: self.head,
        }
    }

    /// Iterates every live value in slot order, ignoring recency.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().flatten().map(|node| &node.value)
    }

    fn node(&self, id: SlotId) -> Option<&Node<T>> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    fn node_mut(&mut self, id: SlotId) -> Option<&mut Node<T>> {
        self.slots.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    /// Unlinks `id` from its neighbours, leaving its own links stale.
    fn detach(&mut self, id: SlotId) {
        let (prev, next) = match self.node(id) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(node) = self.node_mut(p) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.node_mut(n) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    /// Checks link symmetry and that forward/backward walks both see `len` nodes.
    ///
    /// Returns a description of the first violation found.
    pub fn check_links(&self) -> Result<(), String> {
        let mut count = 0usize;
        let mut prev: Option<SlotId> = None;
        let mut current = self.head;
        while let Some(id) = current {
            let node = self
                .node(id)
                .ok_or_else(|| format!("forward walk reached free slot {}", id.0))?;
            if node.prev != prev {
                return Err(format!("slot {} has prev {:?}, expected {:?}", id.0, node.prev, prev));
            }
            count += 1;
            if count > self.len {
                return Err("forward walk longer than len (cycle?)".to_string());
            }
            prev = Some(id);
            current = node.next;
        }
        if prev != self.tail {
            return Err(format!("tail is {:?}, walk ended at {:?}", self.tail, prev));
        }
        if count != self.len {
            return Err(format!("walked {} nodes, len is {}", count, self.len));
        }

        let live = self.slots.iter().filter(|slot| slot.is_some()).count();
        if live != self.len {
            return Err(format!("{} live slots, len is {}", live, self.len));
        }
        Ok(())
    }
}

// == Iterator ==
pub struct RecencyIter<'a, T> {
    list: &'a RecencyList<T>,
    current: Option<SlotId>,
}

impl<'a, T> Iterator for RecencyIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.node(id)?;
        self.current = node.next;
        Some(&node.value)
    }
}
