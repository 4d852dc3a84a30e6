//! Address-ordered partition list stored in an arena
//!
//! Partitions live in slots of a `Vec` and are linked to their address-order
//! neighbours by slot index, giving an intrusive doubly linked list whose
//! handles stay valid while other partitions are inserted or removed.
//!
//! A [`PartitionId`] pairs the slot index with the slot's generation. Removing
//! a partition bumps the generation, so a handle that outlives its partition
//! never resolves to whatever later reuses the slot.

use super::partition::Partition;
use std::ops::{Index, IndexMut};

/// Stable handle to a partition in a [`PartitionArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionId {
    index: u32,
    generation: u32,
}

impl PartitionId {
    /// Slot index, shown next to each partition in the viewer
    pub fn index(&self) -> u32 {
        self.index
    }
}

#[derive(Debug, Clone)]
struct Node {
    partition: Partition,
    prev: Option<u32>,
    next: Option<u32>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>, // None = vacant
}

/// Arena-backed doubly linked list of partitions in address order
#[derive(Debug, Clone, Default)]
pub struct PartitionArena {
    slots: Vec<Slot>,
    vacant: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

impl PartitionArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, id: PartitionId) -> bool {
        self.node(id).is_some()
    }

    pub fn get(&self, id: PartitionId) -> Option<&Partition> {
        self.node(id).map(|node| &node.partition)
    }

    pub fn get_mut(&mut self, id: PartitionId) -> Option<&mut Partition> {
        self.node_mut(id).map(|node| &mut node.partition)
    }

    /// Partition with the highest address
    pub fn last(&self) -> Option<PartitionId> {
        self.tail.map(|index| self.id_at(index))
    }

    pub fn next(&self, id: PartitionId) -> Option<PartitionId> {
        self.node(id)?.next.map(|index| self.id_at(index))
    }

    pub fn prev(&self, id: PartitionId) -> Option<PartitionId> {
        self.node(id)?.prev.map(|index| self.id_at(index))
    }

    /// Append a partition after the current tail
    pub fn push_back(&mut self, partition: Partition) -> PartitionId {
        let index = self.occupy(Node {
            partition,
            prev: self.tail,
            next: None,
        });

        match self.tail {
            Some(tail) => self.link_mut(tail).next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);

        self.id_at(index)
    }

    /// Insert a partition immediately before `before`.
    ///
    /// Returns `None` (and inserts nothing) if `before` is stale.
    pub fn insert_before(&mut self, before: PartitionId, partition: Partition) -> Option<PartitionId> {
        let prev = self.node(before)?.prev;
        let index = self.occupy(Node {
            partition,
            prev,
            next: Some(before.index),
        });

        self.link_mut(before.index).prev = Some(index);
        match prev {
            Some(prev) => self.link_mut(prev).next = Some(index),
            None => self.head = Some(index),
        }

        Some(self.id_at(index))
    }

    /// Unlink a partition and release its slot
    pub fn remove(&mut self, id: PartitionId) -> Option<Partition> {
        self.node(id)?;

        let slot = &mut self.slots[id.index as usize];
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant.push(id.index);
        self.len -= 1;

        match node.prev {
            Some(prev) => self.link_mut(prev).next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.link_mut(next).prev = node.prev,
            None => self.tail = node.prev,
        }

        Some(node.partition)
    }

    /// Iterate partitions in address order
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            arena: self,
            cursor: self.head,
        }
    }

    fn node(&self, id: PartitionId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: PartitionId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    fn id_at(&self, index: u32) -> PartitionId {
        PartitionId {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    // Links only ever point at live slots
    fn link_mut(&mut self, index: u32) -> &mut Node {
        match self.slots[index as usize].node.as_mut() {
            Some(node) => node,
            None => unreachable!("partition list links to vacant slot {}", index),
        }
    }

    fn occupy(&mut self, node: Node) -> u32 {
        self.len += 1;
        match self.vacant.pop() {
            Some(index) => {
                self.slots[index as usize].node = Some(node);
                index
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                index
            }
        }
    }
}

impl Index<PartitionId> for PartitionArena {
    type Output = Partition;

    fn index(&self, id: PartitionId) -> &Partition {
        match self.get(id) {
            Some(partition) => partition,
            None => panic!("stale partition handle {:?}", id),
        }
    }
}

impl IndexMut<PartitionId> for PartitionArena {
    fn index_mut(&mut self, id: PartitionId) -> &mut Partition {
        match self.get_mut(id) {
            Some(partition) => partition,
            None => panic!("stale partition handle {:?}", id),
        }
    }
}

/// Address-order iterator over a [`PartitionArena`]
pub struct Iter<'a> {
    arena: &'a PartitionArena,
    cursor: Option<u32>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (PartitionId, &'a Partition);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let node = self.arena.slots[index as usize].node.as_ref()?;
        self.cursor = node.next;
        Some((self.arena.id_at(index), &node.partition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addresses(arena: &PartitionArena) -> Vec<u64> {
        arena.iter().map(|(_, p)| p.address).collect()
    }

    fn first_id(arena: &PartitionArena) -> Option<PartitionId> {
        arena.iter().next().map(|(id, _)| id)
    }

    #[test]
    fn test_push_back_and_order() {
        let mut arena = PartitionArena::new();
        let a = arena.push_back(Partition::free(10, 0));
        let b = arena.push_back(Partition::occupied(1, 5, 10));

        assert_eq!(arena.len(), 2);
        assert_eq!(first_id(&arena), Some(a));
        assert_eq!(arena.last(), Some(b));
        assert_eq!(arena.next(a), Some(b));
        assert_eq!(arena.prev(b), Some(a));
        assert_eq!(arena.prev(a), None);
        assert_eq!(addresses(&arena), vec![0, 10]);
    }

    #[test]
    fn test_insert_before_head() {
        let mut arena = PartitionArena::new();
        let tail = arena.push_back(Partition::free(50, 50));
        let head = arena
            .insert_before(tail, Partition::occupied(1, 50, 0))
            .unwrap();

        assert_eq!(first_id(&arena), Some(head));
        assert_eq!(arena.next(head), Some(tail));
        assert_eq!(addresses(&arena), vec![0, 50]);
    }

    #[test]
    fn test_insert_before_middle() {
        let mut arena = PartitionArena::new();
        let a = arena.push_back(Partition::occupied(1, 10, 0));
        let c = arena.push_back(Partition::free(20, 20));
        let b = arena
            .insert_before(c, Partition::occupied(2, 10, 10))
            .unwrap();

        assert_eq!(arena.next(a), Some(b));
        assert_eq!(arena.prev(c), Some(b));
        assert_eq!(addresses(&arena), vec![0, 10, 20]);
    }

    #[test]
    fn test_remove_relinks_neighbours() {
        let mut arena = PartitionArena::new();
        let a = arena.push_back(Partition::free(10, 0));
        let b = arena.push_back(Partition::free(10, 10));
        let c = arena.push_back(Partition::free(10, 20));

        assert_eq!(arena.remove(b), Some(Partition::free(10, 10)));
        assert_eq!(arena.next(a), Some(c));
        assert_eq!(arena.prev(c), Some(a));

        arena.remove(c);
        assert_eq!(arena.last(), Some(a));
        arena.remove(a);
        assert!(arena.is_empty());
        assert_eq!(first_id(&arena), None);
        assert_eq!(arena.last(), None);
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let mut arena = PartitionArena::new();
        let old = arena.push_back(Partition::free(10, 0));
        arena.remove(old);

        let new = arena.push_back(Partition::occupied(9, 10, 0));
        assert_eq!(new.index(), old.index());
        assert_ne!(new, old);
        assert!(arena.get(old).is_none());
        assert!(arena.remove(old).is_none());
        assert!(arena.insert_before(old, Partition::free(1, 0)).is_none());
        assert_eq!(arena[new].tag, Some(9));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    #[should_panic(expected = "stale partition handle")]
    fn test_index_stale_handle_panics() {
        let mut arena = PartitionArena::new();
        let id = arena.push_back(Partition::free(10, 0));
        arena.remove(id);
        let _ = arena[id];
    }
}
