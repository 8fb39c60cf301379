//! DMA heap 数据结构定义

use std::path::{Path, PathBuf};

use bitflags::bitflags;
use linux_raw_sys::general::{O_CLOEXEC, O_RDWR};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// heap 设备目录
pub const DMA_HEAP_DIR: &str = "/dev/dma_heap";

/// 默认候选 heap 设备，按优先级排列
///
/// 当 CMA 大小通过内核命令行而不是设备树指定时，heap 名为 `reserved`。
pub const DMA_HEAP_CANDIDATES: [&str; 2] = ["/dev/dma_heap/linux,cma", "/dev/dma_heap/reserved"];

/// 内核保存的缓冲区名称最大长度（包含结尾的 NUL）
pub const DMA_BUF_NAME_LEN: usize = 32;

bitflags! {
    /// 文件描述符标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FdFlags: u32 {
        /// 读写
        const RDWR = O_RDWR;
        /// exec 时关闭
        const CLOEXEC = O_CLOEXEC;
    }
}

impl FdFlags {
    /// 打开 heap 设备以及新分配缓冲区使用的标志
    pub const HEAP: Self = Self::RDWR.union(Self::CLOEXEC);
}

/// heap 配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapConfig {
    candidates: Vec<PathBuf>,
}

impl HeapConfig {
    /// 创建不含任何候选设备的配置，默认候选见 [`HeapConfig::default`]
    pub fn empty() -> Self {
        Self {
            candidates: Vec::new(),
        }
    }

    /// 追加一个候选设备
    pub fn candidate(mut self, path: impl Into<PathBuf>) -> Self {
        self.candidates.push(path.into());
        self
    }

    pub fn candidates(&self) -> impl Iterator<Item = &Path> {
        self.candidates.iter().map(PathBuf::as_path)
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        DMA_HEAP_CANDIDATES.into_iter().collect()
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for HeapConfig {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            candidates: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// DMA heap 分配请求 (`struct dma_heap_allocation_data`)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct DmaHeapAllocationData {
    /// 请求的大小
    pub len: u64,
    /// 返回的文件描述符
    pub fd: u32,
    /// 新文件描述符的标志
    pub fd_flags: u32,
    /// heap 标志，目前必须为 0
    pub heap_flags: u64,
}

const _: () = assert!(size_of::<DmaHeapAllocationData>() == 24);

/// IOCTL 宏定义
macro_rules! ioctl_iowr {
    ($magic:expr, $nr:expr, $ty:ty) => {
        (3u32 << 30) | (($magic as u32) << 8) | ($nr as u32) | ((core::mem::size_of::<$ty>() as u32) << 16)
    };
}

macro_rules! ioctl_iow {
    ($magic:expr, $nr:expr, $ty:ty) => {
        (1u32 << 30) | (($magic as u32) << 8) | ($nr as u32) | ((core::mem::size_of::<$ty>() as u32) << 16)
    };
}

/// DMA heap / DMA buf IOCTL 命令
pub mod ioctl {
    use super::DmaHeapAllocationData;

    /// heap 魔数
    pub const DMA_HEAP_IOC_MAGIC: u8 = b'H';
    /// dma-buf 魔数
    pub const DMA_BUF_BASE: u8 = b'b';

    /// 分配内存
    pub const DMA_HEAP_IOCTL_ALLOC: u32 = ioctl_iowr!(DMA_HEAP_IOC_MAGIC, 0, DmaHeapAllocationData);

    /// 设置缓冲区名称（32 位用户空间）
    pub const DMA_BUF_SET_NAME_A: u32 = ioctl_iow!(DMA_BUF_BASE, 1, u32);
    /// 设置缓冲区名称（64 位用户空间）
    pub const DMA_BUF_SET_NAME_B: u32 = ioctl_iow!(DMA_BUF_BASE, 1, u64);

    cfg_if::cfg_if! {
        if #[cfg(target_pointer_width = "64")] {
            /// 设置缓冲区名称
            pub const DMA_BUF_SET_NAME: u32 = DMA_BUF_SET_NAME_B;
        } else {
            /// 设置缓冲区名称
            pub const DMA_BUF_SET_NAME: u32 = DMA_BUF_SET_NAME_A;
        }
    }
}
