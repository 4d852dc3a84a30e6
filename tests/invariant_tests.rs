// Randomized request sequences checked against a linear-scan reference

use memsim::allocator::{Allocator, Tag};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

type Layout = Vec<(Option<Tag>, u64, u64)>; // (tag, address, size)

/// Straightforward vector model of the same policy: linear worst-fit scan,
/// growth in whole pages, coalescing after every free
struct Reference {
    page_size: u64,
    partitions: Layout,
    pages: u64,
}

impl Reference {
    fn new(page_size: u64) -> Self {
        Reference {
            page_size,
            partitions: vec![(None, 0, 0)],
            pages: 0,
        }
    }

    fn allocate(&mut self, tag: Tag, size: u64) {
        let mut best: Option<usize> = None;
        for (i, &(owner, _, free_size)) in self.partitions.iter().enumerate() {
            if owner.is_none() && best.map_or(true, |b| free_size > self.partitions[b].2) {
                best = Some(i);
            }
        }

        if let Some(i) = best.filter(|&i| self.partitions[i].2 >= size) {
            let (_, address, free_size) = self.partitions[i];
            self.partitions[i] = (None, address + size, free_size - size);
            self.partitions.insert(i, (Some(tag), address, size));
            return;
        }

        let &(owner, address, tail_size) = self.partitions.last().unwrap();
        let (start, needed) = if owner.is_none() {
            self.partitions.pop();
            (address, size - tail_size)
        } else {
            (address + tail_size, size)
        };
        let pages = needed.div_ceil(self.page_size);
        self.pages += pages;
        self.partitions.push((Some(tag), start, size));
        self.partitions
            .push((None, start + size, pages * self.page_size - needed));
    }

    fn deallocate(&mut self, tag: Tag) {
        for partition in &mut self.partitions {
            if partition.0 == Some(tag) {
                partition.0 = None;
            }
        }

        let mut merged: Layout = Vec::with_capacity(self.partitions.len());
        for &(owner, address, size) in &self.partitions {
            match merged.last_mut() {
                Some(last) if last.0.is_none() && owner.is_none() => last.2 += size,
                _ => merged.push((owner, address, size)),
            }
        }
        self.partitions = merged;
    }

    fn largest_free(&self) -> (u64, u64) {
        self.partitions
            .iter()
            .filter(|p| p.0.is_none())
            .fold(None, |best: Option<(u64, u64)>, &(_, address, size)| match best {
                Some((_, best_size)) if best_size >= size => best,
                _ => Some((address, size)),
            })
            .unwrap_or((0, 0))
    }
}

fn layout(allocator: &Allocator) -> Layout {
    allocator
        .partitions()
        .map(|(_, p)| (p.tag, p.address, p.size))
        .collect()
}

fn run_random(seed: u64, page_size: u64, steps: usize, max_tag: Tag, max_size: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut allocator = Allocator::new(page_size).unwrap();
    let mut reference = Reference::new(page_size);

    let mut heap_size = 0;
    let mut pages = 0;

    for step in 0..steps {
        let tag = rng.gen_range(1..=max_tag);
        if rng.gen_bool(0.6) {
            let size = rng.gen_range(1..=max_size);
            allocator.allocate(tag, size).unwrap();
            reference.allocate(tag, size);
        } else {
            allocator.deallocate(tag);
            reference.deallocate(tag);
        }

        if let Err(violation) = allocator.check_invariants() {
            panic!("seed {} step {}: {}", seed, step, violation);
        }
        assert_eq!(
            layout(&allocator),
            reference.partitions,
            "seed {} step {}",
            seed,
            step
        );

        let stats = allocator.stats();
        assert_eq!(
            (stats.max_free_partition_address, stats.max_free_partition_size),
            reference.largest_free(),
            "seed {} step {}",
            seed,
            step
        );
        assert_eq!(stats.n_pages_requested, reference.pages);
        assert_eq!(allocator.stats(), stats);

        assert!(allocator.total_heap_size() >= heap_size);
        assert!(stats.n_pages_requested >= pages);
        assert_eq!(
            allocator.total_heap_size(),
            stats.n_pages_requested * page_size
        );
        heap_size = allocator.total_heap_size();
        pages = stats.n_pages_requested;
    }
}

#[test]
fn test_random_small_pages() {
    for seed in 0..20 {
        run_random(seed, 7, 400, 12, 60);
    }
}

#[test]
fn test_random_large_pages() {
    for seed in 100..110 {
        run_random(seed, 4096, 600, 40, 9000);
    }
}

#[test]
fn test_random_page_size_one() {
    run_random(7, 1, 500, 8, 20);
}

#[test]
fn test_random_many_tags() {
    run_random(42, 100, 2000, 300, 250);
}

#[test]
fn test_reference_model_matches_known_layout() {
    let mut reference = Reference::new(100);
    reference.allocate(1, 50);
    reference.allocate(2, 10);
    reference.deallocate(1);
    assert_eq!(
        reference.partitions,
        vec![(None, 0, 50), (Some(2), 50, 10), (None, 60, 40)]
    );
    assert_eq!(reference.largest_free(), (0, 50));
}
