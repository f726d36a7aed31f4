//! 挂载点图
//!
//! 挂载图是一棵以 `/` 为根的树，每个节点对应路径中的一段（segment），
//! 可以挂载一个驱动，也可以只是通往更深挂载点的中间节点。
//!
//! 节点存放在 arena 中，通过 [`NodeId`] 互相引用。同一父节点下的子节点
//! 按“先比较长度，再按字节比较内容”的顺序排列，查找时可以据此提前结束。
//!
//! 查找有三种模式（见 [`Lookup`]）：
//!
//! - `Driver`：返回路径上最深的、拥有驱动的整段前缀节点。挂在 `/dev` 的驱动
//!   因此可以透明地服务 `/dev/uart0`，但不会服务 `/device`。
//! - `Exact`：返回与路径完全一致的节点，不要求其拥有驱动。
//! - `Deepest`：返回路径上已经存在的最深节点，添加驱动时从这里开始补齐中间节点。
//!
//! 此模块不做任何加锁，调用者（[`crate::MountTable`]）负责串行化访问。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp::Ordering;

use log::debug;

use crate::FsError;
use crate::config::{MAX_FILENAME_LEN, PATH_DELIMITER};
use crate::driver::DriverRecord;
use crate::path::split_first;

/// 挂载节点在 arena 中的编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// 根节点，永远存在
    pub const ROOT: NodeId = NodeId(0);
}

/// 查找模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// 查找应当处理该路径的驱动节点
    Driver,
    /// 精确匹配路径对应的节点
    Exact,
    /// 已存在的最深节点
    Deepest,
}

/// 挂载节点
#[derive(Debug)]
pub struct MountNode {
    /// 本节点对应的路径段，不含分隔符；根节点为空串
    segment: String,
    /// 从根开始到本节点路径末尾的偏移量 + 1，即本节点之下相对路径的起点
    offset: usize,
    /// 挂载在本节点上的驱动
    driver: Option<Arc<DriverRecord>>,
    /// 子节点，按 [`segment_order`] 排序
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl MountNode {
    /// 路径段
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// 相对路径起点（见字段说明）
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 挂载的驱动
    pub fn driver(&self) -> Option<&Arc<DriverRecord>> {
        self.driver.as_ref()
    }

    /// 按序排列的子节点
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// 父节点，根节点为 None
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// 兄弟节点的排列顺序：先按长度，再按字节序
pub fn segment_order(a: &str, b: &str) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

/// 挂载图
#[derive(Debug)]
pub struct MountGraph {
    nodes: Vec<Option<MountNode>>,
    /// 可复用的 arena 槽位
    free: Vec<usize>,
    /// 节点数上限，超过时按内存不足处理
    node_limit: usize,
    live: usize,
}

impl MountGraph {
    /// 创建只有根节点的挂载图
    pub fn new() -> Self {
        Self::with_node_limit(usize::MAX)
    }

    /// 创建节点数量有上限的挂载图
    pub fn with_node_limit(node_limit: usize) -> Self {
        let root = MountNode {
            segment: String::new(),
            offset: 1,
            driver: None,
            children: Vec::new(),
            parent: None,
        };
        let mut nodes = Vec::new();
        nodes.push(Some(root));
        Self {
            nodes,
            free: Vec::new(),
            node_limit: node_limit.max(1),
            live: 1,
        }
    }

    /// 当前存活的节点数（含根节点）
    pub fn node_count(&self) -> usize {
        self.live
    }

    /// 获取节点
    pub fn node(&self, id: NodeId) -> Option<&MountNode> {
        self.nodes.get(id.0).and_then(|slot| slot.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> &mut MountNode {
        match self.nodes.get_mut(id.0).and_then(|slot| slot.as_mut()) {
            Some(node) => node,
            None => panic!("vfs: dangling mount node {:?}", id),
        }
    }

    fn segment_of(&self, id: NodeId) -> &str {
        self.node(id).map(|n| n.segment.as_str()).unwrap_or("")
    }

    /// 在 `parent` 的子节点中查找名为 `token` 的节点
    fn child_by_segment(&self, parent: &MountNode, token: &str) -> Option<NodeId> {
        parent
            .children
            .binary_search_by(|&c| segment_order(self.segment_of(c), token))
            .ok()
            .map(|pos| parent.children[pos])
    }

    /// 按给定模式查找清理过的绝对路径
    ///
    /// 相对路径永远不会匹配。
    pub fn find(&self, path: &str, mode: Lookup) -> Option<NodeId> {
        let mut rest = if path.is_empty() {
            path
        } else {
            path.strip_prefix(PATH_DELIMITER)?
        };

        let mut id = NodeId::ROOT;
        let mut best = None;
        loop {
            let node = self.node(id)?;
            match mode {
                Lookup::Driver if node.driver.is_some() => best = Some(id),
                Lookup::Deepest => best = Some(id),
                _ => {}
            }

            let Some((token, remainder)) = split_first(rest) else {
                // 路径已耗尽
                return match mode {
                    Lookup::Exact => Some(id),
                    _ => best,
                };
            };

            match self.child_by_segment(node, token) {
                Some(child) => {
                    id = child;
                    rest = remainder;
                }
                None => {
                    return match mode {
                        Lookup::Exact => None,
                        _ => best,
                    };
                }
            }
        }
    }

    /// 在 `parent` 下按序插入一个新的空节点
    fn add_node(&mut self, parent: NodeId, segment: &str) -> Result<NodeId, FsError> {
        if self.live >= self.node_limit {
            return Err(FsError::NoMemory);
        }

        self.node_mut(parent).children.try_reserve(1)?;
        let pos = {
            let p = self.node(parent).ok_or(FsError::NotFound)?;
            match p
                .children
                .binary_search_by(|&c| segment_order(self.segment_of(c), segment))
            {
                Ok(_) => panic!("vfs: mount node {} already exists", segment),
                Err(pos) => pos,
            }
        };

        let mut name = String::new();
        name.try_reserve_exact(segment.len())?;
        name.push_str(segment);

        let offset = self.node_mut(parent).offset + segment.len() + 1;
        let node = MountNode {
            segment: name,
            offset,
            driver: None,
            children: Vec::new(),
            parent: Some(parent),
        };

        let id = match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                NodeId(index)
            }
            None => {
                self.nodes.try_reserve(1)?;
                // 保证 unlink 时归还槽位不需要再分配
                let want = (self.nodes.len() + 1).saturating_sub(self.free.len());
                self.free.try_reserve(want)?;
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        };

        self.node_mut(parent).children.insert(pos, id);
        self.live += 1;
        debug!("vfs: add mount node {} ({:?})", segment, id);
        Ok(id)
    }

    /// 把节点从父节点上摘下并归还 arena 槽位
    fn unlink(&mut self, id: NodeId) {
        let parent = self.node_mut(id).parent;
        if let Some(parent) = parent {
            let siblings = &mut self.node_mut(parent).children;
            if let Some(pos) = siblings.iter().position(|&c| c == id) {
                siblings.remove(pos);
            }
        }
        if let Some(node) = self.nodes[id.0].take() {
            assert!(node.driver.is_none(), "vfs: pruning a node that owns a driver");
            debug!("vfs: remove mount node {} ({:?})", node.segment, id);
        }
        self.free.push(id.0);
        self.live -= 1;
    }

    /// 清理一棵子树：删除所有既没有驱动、子孙中也没有驱动的节点
    ///
    /// 返回 `id` 本身是否保留。根节点总是保留。
    pub fn clean_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        if node.driver.is_some() {
            return true;
        }

        let mut keep = false;
        let mut i = 0;
        while let Some(&child) = self.node(id).and_then(|n| n.children.get(i)) {
            if self.clean_node(child) {
                keep = true;
                i += 1;
            }
            // 被删除的子节点已从列表中移除，下标不变
        }

        if id == NodeId::ROOT {
            return true;
        }
        if !keep {
            self.unlink(id);
        }
        keep
    }

    /// 把驱动挂到路径上，必要时补齐中间节点
    ///
    /// 路径上已有驱动时返回 [`FsError::AlreadyExists`]，挂载图保持不变；
    /// 补齐中间节点中途失败时，已经新建的节点会被全部回收。
    pub fn add_driver(&mut self, path: &str, record: Arc<DriverRecord>) -> Result<NodeId, FsError> {
        let rest = if path.is_empty() {
            path
        } else {
            path.strip_prefix(PATH_DELIMITER)
                .ok_or(FsError::InvalidArgument)?
        };
        if rest.split(PATH_DELIMITER).any(|s| s.len() > MAX_FILENAME_LEN) {
            return Err(FsError::NameTooLong);
        }

        let deepest = self
            .find(path, Lookup::Deepest)
            .ok_or(FsError::InvalidArgument)?;
        let offset = self.node_mut(deepest).offset;
        let mut remaining = path.get(offset..).unwrap_or("");

        let mut current = deepest;
        let mut first_new = None;
        while let Some((token, next)) = split_first(remaining) {
            match self.add_node(current, token) {
                Ok(id) => {
                    first_new.get_or_insert(id);
                    current = id;
                }
                Err(err) => {
                    if let Some(first) = first_new {
                        self.clean_node(first);
                    }
                    return Err(err);
                }
            }
            remaining = next;
        }

        let node = self.node_mut(current);
        if node.driver.is_some() {
            return Err(FsError::AlreadyExists);
        }
        node.driver = Some(record);
        debug!("vfs: driver attached at {}", path);
        Ok(current)
    }

    /// 从节点上摘下指定的驱动，并自底向上清理不再需要的节点
    ///
    /// 节点上挂的不是 `record` 时返回 [`FsError::NotFound`]。
    pub fn remove_driver(
        &mut self,
        id: NodeId,
        record: &Arc<DriverRecord>,
    ) -> Result<Arc<DriverRecord>, FsError> {
        let attached = self
            .node(id)
            .and_then(|n| n.driver.as_ref())
            .is_some_and(|d| Arc::ptr_eq(d, record));
        if !attached {
            return Err(FsError::NotFound);
        }

        let removed = self.node_mut(id).driver.take().ok_or(FsError::NotFound)?;

        let mut current = id;
        while current != NodeId::ROOT {
            let parent = self.node(current).and_then(|n| n.parent);
            if self.clean_node(current) {
                break;
            }
            match parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Ok(removed)
    }

    /// 节点的完整路径，根节点为 `/`
    pub fn full_path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(cid) = current {
            let Some(node) = self.node(cid) else { break };
            if cid != NodeId::ROOT {
                segments.push(node.segment.as_str());
            }
            current = node.parent;
        }

        if segments.is_empty() {
            return String::from("/");
        }
        let mut path = String::new();
        for segment in segments.iter().rev() {
            path.push(PATH_DELIMITER);
            path.push_str(segment);
        }
        path
    }

    /// 深度优先、按兄弟顺序列出所有挂载了驱动的路径
    pub fn list_mounts(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        stack.push(NodeId::ROOT);
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else { continue };
            if node.driver.is_some() {
                out.push(self.full_path(id));
            }
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// `dir` 下排在 `after` 之后的第一个子节点
    ///
    /// `after` 为 None 时返回第一个子节点。
    pub fn next_child(&self, dir: NodeId, after: Option<&str>) -> Option<&MountNode> {
        let node = self.node(dir)?;
        let start = match after {
            None => 0,
            Some(after) => node
                .children
                .partition_point(|&c| segment_order(self.segment_of(c), after) != Ordering::Greater),
        };
        node.children.get(start).and_then(|&c| self.node(c))
    }
}

impl Default for MountGraph {
    fn default() -> Self {
        Self::new()
    }
}
