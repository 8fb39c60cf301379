//! Linux DMA heap 分配器
//!
//! DMA heap 是内核提供的内存池，分配出的 dma-buf 可以在不同的硬件组件
//! （摄像头、视频编解码器、显示器等）之间零拷贝共享。
//!
//! 这个实现只负责打开 heap 设备并分配命名的 dma-buf，
//! 缓冲区的导入、映射和同步由使用者处理。
//!
//! ## 特性
//!
//! - 按优先级探测 `/dev/dma_heap/linux,cma` 和 `/dev/dma_heap/reserved`
//! - 分配的缓冲区带有名称，可以通过 `/proc/<pid>/fdinfo` 查看
//! - 所有文件描述符由 `OwnedFd` 持有，任何失败路径都不会泄漏
//!
//! ## IOCTL 命令
//!
//! - `DMA_HEAP_IOCTL_ALLOC`: 分配缓冲区
//! - `DMA_BUF_SET_NAME`: 设置缓冲区名称
//!
//! ## 使用示例
//!
//! ```no_run
//! use dmaheap_api::dma_heap::DmaHeap;
//!
//! let heap = DmaHeap::new();
//! let buf = heap.allocate("frame", 4096)?;
//! println!("fd={:?}", buf);
//! # Ok::<(), dmaheap_api::dma_heap::DmaHeapError>(())
//! ```

mod buffer;
mod device;
mod error;
mod sys;
mod types;

use std::sync::Arc;

use spin::Once;

pub use buffer::{DmaBuf, DmaBufInfo};
pub use device::{DmaHeap, list_heaps};
pub use error::{DmaHeapError, DmaHeapResult};
pub use sys::{HeapOps, LinuxHeapOps};
pub use types::{
    DMA_BUF_NAME_LEN, DMA_HEAP_CANDIDATES, DMA_HEAP_DIR, DmaHeapAllocationData, FdFlags,
    HeapConfig, ioctl,
};

/// 进程内共享的 DMA heap
static GLOBAL_DMA_HEAP: Once<Arc<DmaHeap>> = Once::new();

/// 获取进程内共享的 DMA heap，首次调用时探测默认候选设备
pub fn global_dma_heap() -> Arc<DmaHeap> {
    GLOBAL_DMA_HEAP
        .call_once(|| Arc::new(DmaHeap::new()))
        .clone()
}
