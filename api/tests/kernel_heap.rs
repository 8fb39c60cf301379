//! Runs against the real `/dev/dma_heap` devices. Every test returns early
//! when the machine has no usable heap.

use std::os::fd::AsRawFd;

use dmaheap_api::dma_heap::{
    DMA_BUF_NAME_LEN, DMA_HEAP_DIR, DmaHeap, DmaHeapError, HeapConfig, list_heaps,
};

fn heap() -> Option<DmaHeap> {
    let heap = DmaHeap::new();
    heap.is_valid().then_some(heap)
}

#[test]
fn missing_candidates_make_inert_heap() {
    let config = HeapConfig::empty()
        .candidate("/dev/dma_heap/does-not-exist")
        .candidate("/nonexistent/reserved");
    let heap = DmaHeap::with_config(&config);
    assert!(!heap.is_valid());
    assert_eq!(
        heap.allocate("frame", 4096).unwrap_err(),
        DmaHeapError::DeviceUnavailable
    );
}

#[test]
fn opened_heap_is_listed() {
    let Some(heap) = heap() else { return };
    let heaps = list_heaps(DMA_HEAP_DIR).unwrap();
    assert!(heaps.iter().any(|p| Some(p.as_path()) == heap.path()));
}

#[test]
fn allocates_named_buffer() {
    let Some(heap) = heap() else { return };
    let buf = heap.allocate("frame", 4096).unwrap();
    let info = buf.info().unwrap();
    assert!(info.size >= 4096);
    assert_eq!(info.name.as_deref(), Some("frame"));
}

#[test]
fn buffers_do_not_alias() {
    let Some(heap) = heap() else { return };
    let a = heap.allocate("a", 4096).unwrap();
    let b = heap.allocate("b", 4096).unwrap();
    assert_ne!(a.as_raw_fd(), b.as_raw_fd());
    assert_eq!(a.info().unwrap().name.as_deref(), Some("a"));
    assert_eq!(b.info().unwrap().name.as_deref(), Some("b"));
}

#[test]
fn longest_name_is_accepted() {
    let Some(heap) = heap() else { return };
    let name = "x".repeat(DMA_BUF_NAME_LEN - 1);
    let buf = heap.allocate(&name, 4096).unwrap();
    assert_eq!(buf.info().unwrap().name, Some(name));
}

#[test]
fn oversized_name_is_rejected_by_kernel() {
    let Some(heap) = heap() else { return };
    let name = "x".repeat(DMA_BUF_NAME_LEN);
    assert!(matches!(
        heap.allocate(&name, 4096),
        Err(DmaHeapError::NamingFailed(_))
    ));
}
