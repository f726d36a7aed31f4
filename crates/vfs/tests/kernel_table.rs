mod common;

use std::sync::Arc;

use common::{MemDriver, init};
use vfs::config::DEFAULT_MAX_FDS;
use vfs::{OpenFlags, VFS, syscall, try_vfs_ops};

#[test]
fn test_kernel_table_without_process() {
    init();
    assert!(try_vfs_ops().is_none());

    let table = syscall::current_fd_table();
    assert!(Arc::ptr_eq(&table, &*syscall::KERNEL_FD_TABLE));
    assert_eq!(table.capacity(), DEFAULT_MAX_FDS);

    let mem = MemDriver::new().with_file("console", b"boot");
    VFS.register("/dev", mem.clone()).unwrap();

    let fd = syscall::open("/dev/console", OpenFlags::O_RDONLY.bits(), 0);
    assert!(fd >= 0);
    assert_eq!(table.used(), 1);

    let mut buf = [0u8; 4];
    assert_eq!(syscall::read(fd, &mut buf), 4);
    assert_eq!(&buf, b"boot");
    assert_eq!(syscall::close(fd), 0);
    assert_eq!(mem.closes(), 1);
}
