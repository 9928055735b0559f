#![no_std]

const HEAP_SIZE: usize = 4 * 1024 * 1024;

#[global_allocator]
static ALLOCATOR: segalloc::Allocator<HEAP_SIZE> = segalloc::Allocator::new();

extern crate alloc;

#[test]
fn growing_vec() {
    // repeated pushes go through `realloc` and exercise the in-place
    // extension paths
    let mut v = alloc::vec::Vec::new();
    for i in 0..10_000_u32 {
        v.push(i);
    }
    assert_eq!(v.len(), 10_000);
    assert!(v.iter().copied().eq(0..10_000));
}

#[test]
fn shrinking_vec_keeps_its_elements() {
    let mut v: alloc::vec::Vec<u32> = (0..4096).collect();
    v.truncate(10);
    v.shrink_to_fit();
    assert_eq!(v, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
}

#[test]
fn map_and_formatting() {
    let mut map = alloc::collections::BTreeMap::new();
    map.insert(10, "Hello");
    map.insert(11, "world");
    map.insert(-1, "english");

    let english = alloc::format!("[{}]: {}, {}!", map[&-1], map[&10], map[&11]);
    assert_eq!(english, "[english]: Hello, world!");
}

#[test]
fn interleaved_lifetimes() {
    // drop and reallocate in an order that leaves holes of different size
    // classes behind and forces their reuse
    let boxes: alloc::vec::Vec<_> = (0..64_usize)
        .map(|i| alloc::vec![i as u8; 24 + i * 8])
        .collect();
    let survivors: alloc::vec::Vec<_> = boxes.into_iter().step_by(2).collect();
    let refilled: alloc::vec::Vec<_> = (0..32_usize).map(|i| alloc::vec![0xff_u8; 24 + i]).collect();

    for (i, v) in survivors.iter().enumerate() {
        assert!(v.iter().all(|&b| b == (i * 2) as u8));
    }
    for v in &refilled {
        assert!(v.iter().all(|&b| b == 0xff));
    }
}
