//! heap 设备的内核接口

use std::{
    ffi::{CStr, CString},
    os::{
        fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd},
        unix::ffi::OsStrExt,
    },
    path::Path,
};

use linux_raw_sys::general::AT_FDCWD;
use syscalls::{Errno, Sysno, syscall};

use super::types::{
    DmaHeapAllocationData, FdFlags,
    ioctl::{DMA_BUF_SET_NAME, DMA_HEAP_IOCTL_ALLOC},
};

/// `DmaHeap` 用到的全部内核操作
pub trait HeapOps: Send + Sync {
    /// 打开 heap 设备
    fn open(&self, path: &Path, flags: FdFlags) -> Result<OwnedFd, Errno>;

    /// `DMA_HEAP_IOCTL_ALLOC`，成功时内核写回 `data.fd`
    fn alloc(&self, heap: BorrowedFd<'_>, data: &mut DmaHeapAllocationData) -> Result<(), Errno>;

    /// `DMA_BUF_SET_NAME`
    fn set_name(&self, buf: BorrowedFd<'_>, name: &CStr) -> Result<(), Errno>;
}

/// 直接发起 Linux 系统调用
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxHeapOps;

impl HeapOps for LinuxHeapOps {
    fn open(&self, path: &Path, flags: FdFlags) -> Result<OwnedFd, Errno> {
        let path = CString::new(path.as_os_str().as_bytes()).map_err(|_| Errno::EINVAL)?;
        // SAFETY: `path` is NUL terminated and outlives the call
        let fd = unsafe { syscall!(Sysno::openat, AT_FDCWD, path.as_ptr(), flags.bits(), 0)? };
        // SAFETY: openat returned a new descriptor nobody else owns
        Ok(unsafe { OwnedFd::from_raw_fd(fd as RawFd) })
    }

    fn alloc(&self, heap: BorrowedFd<'_>, data: &mut DmaHeapAllocationData) -> Result<(), Errno> {
        // SAFETY: `data` is a valid `dma_heap_allocation_data` for the whole call
        unsafe {
            syscall!(
                Sysno::ioctl,
                heap.as_raw_fd(),
                DMA_HEAP_IOCTL_ALLOC,
                data as *mut DmaHeapAllocationData
            )?
        };
        Ok(())
    }

    fn set_name(&self, buf: BorrowedFd<'_>, name: &CStr) -> Result<(), Errno> {
        // SAFETY: the kernel only reads the NUL terminated string
        unsafe { syscall!(Sysno::ioctl, buf.as_raw_fd(), DMA_BUF_SET_NAME, name.as_ptr())? };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::os::fd::AsFd;

    use super::*;

    #[test]
    fn open_missing_device() {
        let err = LinuxHeapOps
            .open(Path::new("/dev/dma_heap/does-not-exist"), FdFlags::HEAP)
            .unwrap_err();
        assert_eq!(err, Errno::ENOENT);
    }

    #[test]
    fn open_rejects_interior_nul() {
        let err = LinuxHeapOps
            .open(Path::new("/dev/null\0x"), FdFlags::HEAP)
            .unwrap_err();
        assert_eq!(err, Errno::EINVAL);
    }

    #[test]
    fn alloc_on_non_heap_fails() {
        let null = LinuxHeapOps
            .open(Path::new("/dev/null"), FdFlags::HEAP)
            .unwrap();
        let mut data = DmaHeapAllocationData {
            len: 4096,
            fd: 0,
            fd_flags: FdFlags::HEAP.bits(),
            heap_flags: 0,
        };
        assert!(LinuxHeapOps.alloc(null.as_fd(), &mut data).is_err());
        assert!(LinuxHeapOps.set_name(null.as_fd(), c"frame").is_err());
    }
}
