//! User space helpers for Linux DMA heaps.

#[macro_use]
extern crate log;

pub mod dma_heap;
