//! DMA heap 设备实现

use std::{
    ffi::CString,
    fs,
    os::fd::{AsFd, FromRawFd, OwnedFd, RawFd},
    path::{Path, PathBuf},
};

use zerocopy::FromZeros;

use super::{
    buffer::DmaBuf,
    error::{DmaHeapError, DmaHeapResult},
    sys::{HeapOps, LinuxHeapOps},
    types::{DmaHeapAllocationData, FdFlags, HeapConfig},
};

/// DMA heap 分配器
///
/// 构造时按顺序探测候选 heap 设备，持有第一个成功打开的设备直到 drop。
/// 所有候选都失败时对象仍然构造成功，但之后的每次分配都会失败。
#[derive(Debug)]
pub struct DmaHeap<O: HeapOps = LinuxHeapOps> {
    ops: O,
    /// 打开的 heap 设备及其路径，构造后不再改变
    device: Option<(PathBuf, OwnedFd)>,
}

impl DmaHeap {
    /// 使用默认候选设备创建
    pub fn new() -> Self {
        Self::with_config(&HeapConfig::default())
    }

    /// 使用自定义候选设备创建
    pub fn with_config(config: &HeapConfig) -> Self {
        Self::with_ops(config, LinuxHeapOps)
    }
}

impl Default for DmaHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: HeapOps> DmaHeap<O> {
    /// 使用指定的内核接口创建
    pub fn with_ops(config: &HeapConfig, ops: O) -> Self {
        let device = Self::probe(&ops, config);
        Self { ops, device }
    }

    fn probe(ops: &O, config: &HeapConfig) -> Option<(PathBuf, OwnedFd)> {
        for path in config.candidates() {
            match ops.open(path, FdFlags::HEAP) {
                Ok(fd) => {
                    debug!("Opened dma heap {}", path.display());
                    return Some((path.to_path_buf(), fd));
                }
                Err(e) => debug!("Failed to open {}: {}", path.display(), e),
            }
        }

        error!("Could not open any dma heap device");
        None
    }

    /// 是否持有可用的 heap 设备
    pub fn is_valid(&self) -> bool {
        self.device.is_some()
    }

    /// 打开的 heap 设备路径
    pub fn path(&self) -> Option<&Path> {
        self.device.as_ref().map(|(path, _)| path.as_path())
    }

    /// 分配一个命名的 DMA buffer
    ///
    /// `name` 写入内核元数据，可以在 `/proc/<pid>/fdinfo` 中看到。
    /// 任何失败都不会影响之后的分配。
    pub fn allocate(&self, name: &str, size: usize) -> DmaHeapResult<DmaBuf> {
        if name.is_empty() {
            return Err(DmaHeapError::InvalidRequest);
        }
        let c_name = CString::new(name).map_err(|_| DmaHeapError::InvalidRequest)?;

        let Some((_, heap)) = &self.device else {
            error!("No dma heap device for {}", name);
            return Err(DmaHeapError::DeviceUnavailable);
        };

        let mut alloc = DmaHeapAllocationData::new_zeroed();
        alloc.len = size as u64;
        alloc.fd_flags = FdFlags::HEAP.bits();

        if let Err(e) = self.ops.alloc(heap.as_fd(), &mut alloc) {
            error!("dmaHeap allocation failure for {}: {}", name, e);
            return Err(DmaHeapError::AllocationFailed(e));
        }

        // SAFETY: on success the kernel hands us a new descriptor in `alloc.fd`
        let fd = unsafe { OwnedFd::from_raw_fd(alloc.fd as RawFd) };
        if let Err(e) = self.ops.set_name(fd.as_fd(), &c_name) {
            error!("dmaHeap naming failure for {}: {}", name, e);
            return Err(DmaHeapError::NamingFailed(e));
        }

        debug!(
            "Allocated dma buf: name={}, size={}, fd={}",
            name, size, alloc.fd
        );
        Ok(DmaBuf::new(fd, name, size))
    }
}

/// 列出 `dir` 下的 heap 设备，按路径排序
pub fn list_heaps(dir: impl AsRef<Path>) -> DmaHeapResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| {
        warn!("Failed to read {}: {}", dir.display(), e);
        DmaHeapError::DeviceUnavailable
    })?;

    let mut heaps: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|ty| !ty.is_dir()))
        .map(|entry| entry.path())
        .collect();
    heaps.sort();
    Ok(heaps)
}
