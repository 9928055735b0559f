#[test]
fn is_usable_in_const_contexts() {
    const _ALLOCATOR1: segalloc::Allocator<64> = segalloc::Allocator::new();
    static _ALLOCATOR2: segalloc::Allocator<64> = segalloc::Allocator::new();
}

#[test]
fn supports_global_alloc() {
    fn assert<T: core::alloc::GlobalAlloc>(_: T) {}
    assert(segalloc::Allocator::<64>::new())
}

#[test]
#[should_panic(expected = "too small heap memory")]
fn min_heap_size_of_at_least_64() {
    let _allocator = segalloc::Allocator::<32>::new(); // panic here
}

#[test]
#[should_panic(expected = "divisible by 8")]
fn heap_size_must_be_a_multiple_of_8() {
    let _allocator = segalloc::Allocator::<100>::new(); // panic here
}
