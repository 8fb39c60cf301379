//! DMA buffer 句柄

use std::{
    fs,
    os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd},
};

use super::error::{DmaHeapError, DmaHeapResult};

/// 从 heap 分配得到的 DMA buffer
///
/// 持有缓冲区的文件描述符，drop 时自动关闭。
#[derive(Debug)]
pub struct DmaBuf {
    fd: OwnedFd,
    name: String,
    len: usize,
}

impl DmaBuf {
    pub(crate) fn new(fd: OwnedFd, name: &str, len: usize) -> Self {
        Self {
            fd,
            name: name.into(),
            len,
        }
    }

    /// 分配时给定的名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 请求的大小，内核实际分配的大小可能按页对齐
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 交出文件描述符的所有权
    pub fn into_owned_fd(self) -> OwnedFd {
        self.fd
    }

    /// 读取 `/proc/self/fdinfo` 中内核记录的缓冲区信息
    pub fn info(&self) -> DmaHeapResult<DmaBufInfo> {
        let path = format!("/proc/self/fdinfo/{}", self.fd.as_raw_fd());
        let text = fs::read_to_string(&path).map_err(|e| {
            warn!("Failed to read {}: {}", path, e);
            DmaHeapError::InfoUnavailable
        })?;
        DmaBufInfo::parse(&text)
    }
}

impl AsFd for DmaBuf {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for DmaBuf {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl From<DmaBuf> for OwnedFd {
    fn from(buf: DmaBuf) -> Self {
        buf.into_owned_fd()
    }
}

/// 内核报告的 dma-buf 信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmaBufInfo {
    /// 实际大小
    pub size: u64,
    /// 导出者名称，对 heap 缓冲区来说是 heap 名
    pub exp_name: String,
    /// 缓冲区名称，未命名时为 `None`
    pub name: Option<String>,
}

impl DmaBufInfo {
    /// 解析 fdinfo 文本
    pub fn parse(text: &str) -> DmaHeapResult<Self> {
        let mut size = None;
        let mut exp_name = None;
        let mut name = None;

        for line in text.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            // 名称里可能有空格，只去掉内核输出的分隔 tab
            let text = value.strip_prefix('\t').unwrap_or(value);
            match key {
                "size" => size = value.trim().parse().ok(),
                "exp_name" => exp_name = Some(text.to_owned()),
                "name" => name = Some(text.to_owned()),
                _ => {}
            }
        }

        // 非 dma-buf 的文件没有 size/exp_name
        match (size, exp_name) {
            (Some(size), Some(exp_name)) => Ok(Self {
                size,
                exp_name,
                name,
            }),
            _ => Err(DmaHeapError::InfoUnavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_named_buffer() {
        let text = "pos:\t0\nflags:\t02000002\nmnt_id:\t15\nino:\t1057\n\
                    size:\t8192\ncount:\t1\nexp_name:\tlinux,cma\nname:\tframe\n";
        let info = DmaBufInfo::parse(text).unwrap();
        assert_eq!(info.size, 8192);
        assert_eq!(info.exp_name, "linux,cma");
        assert_eq!(info.name.as_deref(), Some("frame"));
    }

    #[test]
    fn parse_unnamed_buffer() {
        let text = "pos:\t0\nsize:\t4096\ncount:\t1\nexp_name:\treserved\n";
        let info = DmaBufInfo::parse(text).unwrap();
        assert_eq!(info.size, 4096);
        assert_eq!(info.name, None);
    }

    #[test]
    fn parse_keeps_spaces_in_name() {
        let text = "size:\t4096\nexp_name:\tlinux,cma\nname:\t frame 0 \n";
        let info = DmaBufInfo::parse(text).unwrap();
        assert_eq!(info.name.as_deref(), Some(" frame 0 "));
        assert_eq!(info.exp_name, "linux,cma");
    }

    #[test]
    fn parse_plain_file() {
        let text = "pos:\t0\nflags:\t0100000\nmnt_id:\t26\nino:\t42\n";
        assert_eq!(
            DmaBufInfo::parse(text),
            Err(DmaHeapError::InfoUnavailable)
        );
    }

    #[test]
    fn info_of_non_dmabuf() {
        let file = fs::File::open("/proc/self/status").unwrap();
        let buf = DmaBuf::new(OwnedFd::from(file), "status", 0);
        assert_eq!(buf.info(), Err(DmaHeapError::InfoUnavailable));
        assert!(buf.is_empty());
    }
}
