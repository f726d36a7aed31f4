//! VFS 配置常量

/// 路径分隔符
pub const PATH_DELIMITER: char = '/';

/// 每个进程文件描述符表的默认容量
///
/// 表创建时一次性分配全部槽位，之后不会自动扩容。
pub const DEFAULT_MAX_FDS: usize = 128;

/// 目录项名称的最大长度（字节）
pub const MAX_FILENAME_LEN: usize = 256;
