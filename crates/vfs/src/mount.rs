//! 挂载表
//!
//! [`MountTable`] 是挂载图加上全局挂载锁。所有对挂载图的修改（注册/注销驱动）
//! 以及 open/mount/unmount 中的路径解析都在这把锁下完成；
//! 驱动钩子的调用一律发生在锁外。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use log::{debug, info};
use sync::SpinLock;

use crate::driver::{DirEntry, DriverHandle, DriverRecord, FileType};
use crate::mount_graph::{Lookup, MountGraph, NodeId};
use crate::path::{clean_path, is_absolute};
use crate::FsError;

/// 路径解析结果
#[derive(Debug, Clone)]
pub enum Resolution {
    /// 由某个已挂载的驱动处理
    Driver {
        /// 驱动记录
        record: Arc<DriverRecord>,
        /// 驱动所见相对路径在清理后路径中的起点
        offset: usize,
    },
    /// 路径恰好是一个没有驱动的中间节点，由通用节点驱动处理
    Node,
}

impl Resolution {
    /// 从清理后的路径中截出驱动所见的相对路径
    pub fn relative_path<'a>(&self, clean: &'a str) -> &'a str {
        match self {
            Resolution::Driver { offset, .. } => clean.get(*offset..).unwrap_or(""),
            Resolution::Node => clean,
        }
    }
}

/// 挂载表：受全局挂载锁保护的挂载图
pub struct MountTable {
    graph: SpinLock<MountGraph>,
}

impl MountTable {
    /// 创建只有根节点的挂载表
    pub fn new() -> Self {
        Self {
            graph: SpinLock::new(MountGraph::new()),
        }
    }

    /// 创建节点数有上限的挂载表
    pub fn with_node_limit(limit: usize) -> Self {
        Self {
            graph: SpinLock::new(MountGraph::with_node_limit(limit)),
        }
    }

    fn clean_absolute(path: &str) -> Result<String, FsError> {
        if path.is_empty() {
            return Err(FsError::InvalidArgument);
        }
        let clean = clean_path(path)?;
        if !is_absolute(&clean) {
            return Err(FsError::InvalidArgument);
        }
        Ok(clean)
    }

    /// 在 `path` 上注册驱动
    ///
    /// 同一路径上已经注册了驱动时失败，挂载图不变。
    pub fn register(&self, path: &str, record: DriverRecord) -> Result<DriverHandle, FsError> {
        let clean = Self::clean_absolute(path)?;
        let record = Arc::new(record);

        let node = {
            let mut graph = self.graph.lock();
            let occupied = graph
                .find(&clean, Lookup::Exact)
                .and_then(|id| graph.node(id))
                .is_some_and(|n| n.driver().is_some());
            if occupied {
                return Err(FsError::AlreadyExists);
            }
            graph.add_driver(&clean, record.clone())?
        };

        info!(
            "vfs: registered driver {} at {}",
            record.driver().name(),
            if clean.is_empty() { "/" } else { &clean }
        );
        Ok(DriverHandle { node, record })
    }

    /// 注销驱动
    pub fn unregister(&self, handle: DriverHandle) -> Result<(), FsError> {
        self.remove(handle.node, &handle.record)?;
        Ok(())
    }

    pub(crate) fn remove(
        &self,
        node: NodeId,
        record: &Arc<DriverRecord>,
    ) -> Result<Arc<DriverRecord>, FsError> {
        let removed = self.graph.lock().remove_driver(node, record)?;
        info!("vfs: unregistered driver {}", removed.driver().name());
        Ok(removed)
    }

    /// 解析一个清理过的绝对路径
    ///
    /// 优先交给最深的挂载了驱动的前缀节点；没有驱动可用但路径恰好是一个节点时，
    /// 返回 [`Resolution::Node`]。
    pub fn resolve(&self, clean: &str) -> Result<Resolution, FsError> {
        let graph = self.graph.lock();

        let driver_node = graph
            .find(clean, Lookup::Driver)
            .and_then(|id| graph.node(id))
            .and_then(|n| n.driver().map(|d| (d.clone(), n.offset())));
        if let Some((record, offset)) = driver_node {
            return Ok(Resolution::Driver { record, offset });
        }

        if graph.find(clean, Lookup::Exact).is_some() {
            return Ok(Resolution::Node);
        }
        Err(FsError::NotFound)
    }

    /// 查找恰好挂在 `path` 上的驱动
    pub(crate) fn find_mounted(
        &self,
        path: &str,
    ) -> Result<(NodeId, Arc<DriverRecord>), FsError> {
        let clean = Self::clean_absolute(path)?;
        let graph = self.graph.lock();
        graph
            .find(&clean, Lookup::Exact)
            .and_then(|id| graph.node(id).and_then(|n| n.driver()).map(|d| (id, d.clone())))
            .ok_or(FsError::NotFound)
    }

    /// 把恰好挂在 `path` 上的驱动从挂载图中摘下
    ///
    /// 查找和摘除在同一次持锁内完成，同一路径的并发卸载只有一个能拿到驱动。
    pub(crate) fn detach(&self, path: &str) -> Result<Arc<DriverRecord>, FsError> {
        let clean = Self::clean_absolute(path)?;
        let removed = {
            let mut graph = self.graph.lock();
            let id = graph.find(&clean, Lookup::Exact).ok_or(FsError::NotFound)?;
            let record = graph
                .node(id)
                .and_then(|n| n.driver())
                .cloned()
                .ok_or(FsError::NotFound)?;
            graph.remove_driver(id, &record)?
        };
        debug!("vfs: detached {} from {}", removed.driver().name(), clean);
        Ok(removed)
    }

    /// 把 [`MountTable::detach`] 摘下的驱动重新挂回 `path`
    pub(crate) fn reattach(&self, path: &str, record: Arc<DriverRecord>) -> Result<(), FsError> {
        let clean = Self::clean_absolute(path)?;
        self.graph.lock().add_driver(&clean, record)?;
        Ok(())
    }

    /// `path` 是否对应挂载图中的一个节点（无论是否挂载了驱动）
    pub fn contains(&self, path: &str) -> bool {
        Self::clean_absolute(path).is_ok_and(|clean| self.has_node(&clean))
    }

    /// 清理过的路径是否恰好是一个节点
    pub(crate) fn has_node(&self, clean: &str) -> bool {
        self.graph.lock().find(clean, Lookup::Exact).is_some()
    }

    /// `path` 上是否恰好挂载了驱动
    pub fn is_mounted(&self, path: &str) -> bool {
        self.find_mounted(path).is_ok()
    }

    /// 列出所有挂载了驱动的路径
    pub fn list_mounts(&self) -> Vec<String> {
        self.graph.lock().list_mounts()
    }

    /// 当前节点数（含根节点）
    pub fn node_count(&self) -> usize {
        self.graph.lock().node_count()
    }

    /// 读取目录节点 `dir` 下排在 `after` 之后的子节点
    ///
    /// 目录节点已经不存在时返回 [`FsError::NotFound`]；没有更多子节点时返回 `Ok(None)`。
    pub(crate) fn next_child(
        &self,
        dir: &str,
        after: Option<&str>,
    ) -> Result<Option<DirEntry>, FsError> {
        let graph = self.graph.lock();
        let id = graph.find(dir, Lookup::Exact).ok_or(FsError::NotFound)?;
        let Some(child) = graph.next_child(id, after) else {
            return Ok(None);
        };

        // 段长度在注册时已限制在 MAX_FILENAME_LEN 以内
        let name = child.segment();
        let mut entry_name = String::new();
        entry_name.try_reserve_exact(name.len())?;
        entry_name.push_str(name);

        let file_type = if child.children().is_empty() {
            FileType::File
        } else {
            FileType::Directory
        };
        Ok(Some(DirEntry {
            name: entry_name,
            file_type,
        }))
    }
}

impl Default for MountTable {
    fn default() -> Self {
        Self::new()
    }
}
