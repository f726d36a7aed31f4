//! 通用节点驱动
//!
//! 挂载图中没有驱动的中间节点（例如只挂了 `/dev/uart0` 时的 `/dev`）
//! 由这个驱动处理：打开后只能用 `readdir` 列出子节点。
//! 读写和 ioctl 都不支持。

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::Any;

use sync::SpinLock;

use crate::mount::MountTable;
use crate::{FileHandle, FsError, OpenFlags, ReadDir, VfsDriver};

/// 目录游标，记住上一次返回的子节点名称
///
/// 每次 `readdir` 都重新在挂载锁下查找目录节点，
/// 因此两次调用之间挂载图发生变化也不会访问到已经删除的节点。
#[derive(Debug)]
enum Cursor {
    Start,
    After(String),
    Done,
}

/// 打开的中间节点
#[derive(Debug)]
struct NodeDir {
    /// 节点的完整路径（清理后）
    path: String,
    cursor: SpinLock<Cursor>,
}

/// 通用节点驱动
pub struct GenericNodeDriver {
    mounts: Arc<MountTable>,
}

impl GenericNodeDriver {
    /// 创建服务于 `mounts` 的通用节点驱动
    pub fn new(mounts: Arc<MountTable>) -> Self {
        Self { mounts }
    }
}

impl VfsDriver for GenericNodeDriver {
    fn name(&self) -> &str {
        "generic-node"
    }

    /// `path` 是节点的完整路径
    fn open(&self, path: &str, _flags: OpenFlags, _mode: u32) -> Result<FileHandle, FsError> {
        if !self.mounts.has_node(path) {
            return Err(FsError::NotFound);
        }
        let mut owned = String::new();
        owned.try_reserve_exact(path.len())?;
        owned.push_str(path);
        Ok(Box::new(NodeDir {
            path: owned,
            cursor: SpinLock::new(Cursor::Start),
        }))
    }

    fn readdir(&self, handle: &dyn Any) -> Result<ReadDir, FsError> {
        let dir = handle
            .downcast_ref::<NodeDir>()
            .ok_or(FsError::InvalidArgument)?;
        let mut cursor = dir.cursor.lock();

        let next = match &*cursor {
            Cursor::Start => self.mounts.next_child(&dir.path, None)?,
            Cursor::After(last) => self.mounts.next_child(&dir.path, Some(last.as_str()))?,
            // 读完之后再调用视为错误
            Cursor::Done => return Err(FsError::InvalidArgument),
        };

        match next {
            Some(entry) => {
                let mut last = String::new();
                last.try_reserve_exact(entry.name.len())?;
                last.push_str(&entry.name);
                *cursor = Cursor::After(last);
                Ok(ReadDir::Entry(entry))
            }
            None => {
                *cursor = Cursor::Done;
                Ok(ReadDir::End)
            }
        }
    }
}
