//! VFS 自带的驱动实现

mod generic_node;

pub use generic_node::GenericNodeDriver;
