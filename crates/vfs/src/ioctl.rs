//! 常用 ioctl 操作号
//!
//! VFS 本身不解释这些值，只把它们原样转发给驱动。
//! 控制台和图形驱动约定使用以下编号。

/// 恢复之前保存的光标位置
pub const CONS_IOCTL_RESTORE_CURSOR: u32 = 0;
/// 保存当前光标位置
pub const CONS_IOCTL_SAVE_CURSOR: u32 = 1;
/// 滚动屏幕
pub const CONS_IOCTL_SCROLL: u32 = 2;
/// 设置配色
pub const CONS_IOCTL_SET_COLORSCHEME: u32 = 3;
/// 保存当前配色
pub const CONS_IOCTL_SAVE_COLORSCHEME: u32 = 4;
/// 清屏
pub const CONS_IOCTL_CLEAR: u32 = 5;
/// 刷新输出缓冲
pub const CONS_IOCTL_FLUSH: u32 = 6;

/// 画一个像素
pub const GRAPH_IOCTL_DRAWPIXEL: u32 = 7;
