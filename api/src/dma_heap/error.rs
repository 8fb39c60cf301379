//! DMA heap 错误类型定义

use core::fmt;

use axerrno::AxError;
use syscalls::Errno;

/// DMA heap 错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaHeapError {
    /// 没有可用的 heap 设备
    DeviceUnavailable,
    /// 无效的分配请求（缺少名称）
    InvalidRequest,
    /// 内核拒绝了分配请求
    AllocationFailed(Errno),
    /// 分配成功但命名失败，缓冲区已被释放
    NamingFailed(Errno),
    /// 无法读取缓冲区的 fdinfo
    InfoUnavailable,
}

impl DmaHeapError {
    /// 获取错误码 (兼容 Linux errno 风格)
    pub fn as_errno(&self) -> i32 {
        match self {
            Self::DeviceUnavailable => -19, // ENODEV
            Self::InvalidRequest => -22,    // EINVAL
            Self::AllocationFailed(e) | Self::NamingFailed(e) => -e.into_raw(),
            Self::InfoUnavailable => -5, // EIO
        }
    }
}

impl fmt::Display for DmaHeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceUnavailable => write!(f, "No dma heap device available"),
            Self::InvalidRequest => write!(f, "Invalid allocation request"),
            Self::AllocationFailed(e) => write!(f, "dma heap allocation failed: {e}"),
            Self::NamingFailed(e) => write!(f, "dma buf naming failed: {e}"),
            Self::InfoUnavailable => write!(f, "dma buf info unavailable"),
        }
    }
}

impl core::error::Error for DmaHeapError {}

impl From<DmaHeapError> for AxError {
    fn from(err: DmaHeapError) -> Self {
        match err {
            DmaHeapError::DeviceUnavailable => AxError::NotFound,
            DmaHeapError::InvalidRequest | DmaHeapError::NamingFailed(_) => AxError::InvalidInput,
            DmaHeapError::AllocationFailed(e) if e == Errno::ENOMEM => AxError::NoMemory,
            DmaHeapError::AllocationFailed(e) if e == Errno::EBADF => AxError::BadFileDescriptor,
            DmaHeapError::AllocationFailed(_) => AxError::InvalidInput,
            DmaHeapError::InfoUnavailable => AxError::Unsupported,
        }
    }
}

pub type DmaHeapResult<T> = Result<T, DmaHeapError>;
