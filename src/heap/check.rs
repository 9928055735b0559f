//! A test-only auditor for the whole heap structure.
//!
//! The checker walks the block sequence and the free index independently
//! and panics on the first violated invariant, naming the offending offset.
//! Tests call it after every interesting mutation; it has no place in
//! production builds, where the invariants are maintained by construction.

use super::bins::{bin_index, BIN_COUNT};
use super::tag::{State, Tag, DWORD, MIN_BLOCK, WORD};
use super::{Heap, FIRST_BLOCK, PROLOGUE};

use std::collections::BTreeSet;

impl<const N: usize> Heap<N> {
    /// Assert every structural invariant of the heap.
    pub(crate) fn check(&self) {
        assert_eq!(
            self.tag_at(PROLOGUE - WORD),
            Tag::used(DWORD),
            "prologue header damaged"
        );
        assert_eq!(
            self.tag_at(PROLOGUE),
            Tag::used(DWORD),
            "prologue footer damaged"
        );

        // the block sequence must tile the region seamlessly up to an
        // allocated epilogue sitting exactly at the break
        let mut free_blocks = BTreeSet::new();
        let mut max_free = 0;
        let mut prev_was_free = false;
        let mut bp = FIRST_BLOCK;
        loop {
            let tag = self.header(bp);
            if tag.size() == 0 {
                assert_eq!(tag.state(), State::Used, "epilogue not allocated");
                assert_eq!(bp, self.region.size(), "epilogue not at the break");
                break;
            }
            assert_eq!(bp % DWORD, 0, "misaligned block at {bp}");
            assert!(
                tag.size() % DWORD == 0 && tag.size() >= MIN_BLOCK,
                "bad size {} at {bp}",
                tag.size()
            );
            assert!(
                bp + tag.size() <= self.region.size(),
                "block at {bp} overruns the break"
            );
            assert_eq!(
                tag,
                self.tag_at(bp + tag.size() - DWORD),
                "header/footer mismatch at {bp}"
            );
            if tag.state() == State::Free {
                assert!(!prev_was_free, "adjacent free blocks at {bp}");
                free_blocks.insert(bp);
                max_free = max_free.max(tag.size());
            }
            prev_was_free = tag.state() == State::Free;
            bp += tag.size();
        }

        // the free index must list exactly the free blocks, each in the bin
        // of its class, with symmetric links
        let mut indexed = BTreeSet::new();
        for bin in 0..BIN_COUNT {
            let mut prev = 0;
            let mut bp = self.bin_head(bin);
            while bp != 0 {
                assert!(indexed.insert(bp), "block {bp} on more than one list");
                assert!(
                    free_blocks.contains(&bp),
                    "bin {bin} lists non-free block {bp}"
                );
                let size = self.header(bp).size();
                assert_eq!(
                    bin_index(size),
                    bin,
                    "block {bp} of size {size} filed in bin {bin}"
                );
                assert_eq!(self.prev_free(bp), prev, "broken prev link at {bp}");
                prev = bp;
                bp = self.next_free(bp);
            }
        }
        assert_eq!(
            indexed, free_blocks,
            "free index disagrees with the block sequence"
        );

        // the hint may go stale upwards only
        assert!(
            self.largest_free == 0 || self.largest_free >= max_free,
            "largest_free hint underestimates {max_free}"
        );
    }
}
