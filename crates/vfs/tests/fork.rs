mod common;

use std::sync::Arc;
use std::thread;

use common::{MemDriver, init};
use vfs::{FDTable, FsError, OpenFlags, Vfs};

fn setup() -> (Vfs, Arc<MemDriver>) {
    init();
    let vfs = Vfs::new();
    let mem = MemDriver::new().with_file("f", b"shared");
    vfs.register("/tmp", mem.clone()).unwrap();
    (vfs, mem)
}

#[test]
fn test_close_fires_once_after_n_copies() {
    let (vfs, mem) = setup();
    let parent = vfs.create_table().unwrap();
    let fd = vfs.open(&parent, "/tmp/f", OpenFlags::O_RDONLY, 0).unwrap();

    const COPIES: usize = 5;
    let children: Vec<Arc<FDTable>> = (0..COPIES)
        .map(|_| vfs.copy_table(&parent).unwrap())
        .collect();
    assert_eq!(parent.get(fd).unwrap().shared.ref_count(), COPIES + 1);

    for child in &children {
        vfs.close(child, fd).unwrap();
        assert_eq!(mem.closes(), 0);
    }
    vfs.close(&parent, fd).unwrap();
    assert_eq!(mem.closes(), 1);
}

#[test]
fn test_copies_close_concurrently() {
    let (vfs, mem) = setup();
    let parent = vfs.create_table().unwrap();
    let fd = vfs.open(&parent, "/tmp/f", OpenFlags::O_RDONLY, 0).unwrap();

    let children: Vec<Arc<FDTable>> = (0..8).map(|_| vfs.copy_table(&parent).unwrap()).collect();
    let vfs = Arc::new(vfs);
    let workers: Vec<_> = children
        .into_iter()
        .map(|child| {
            let vfs = vfs.clone();
            thread::spawn(move || vfs.close(&child, fd).unwrap())
        })
        .collect();
    vfs.close(&parent, fd).unwrap();
    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(mem.closes(), 1);
}

#[test]
fn test_copy_keeps_layout() {
    let (vfs, _mem) = setup();
    let parent = vfs.create_table().unwrap();
    let a = vfs.open(&parent, "/tmp/f", OpenFlags::O_RDONLY, 0).unwrap();
    let b = vfs.open(&parent, "/tmp/f", OpenFlags::O_RDWR, 0).unwrap();
    vfs.close(&parent, a).unwrap();

    let child = vfs.copy_table(&parent).unwrap();
    assert_eq!(child.capacity(), parent.capacity());
    assert_eq!(child.used(), 1);
    assert_eq!(child.get(a).map(|_| ()), Err(FsError::BadFileDescriptor));
    assert_eq!(child.get(b).unwrap().flags, OpenFlags::O_RDWR);

    // 子进程新打开的文件不影响父进程
    let c = vfs.open(&child, "/tmp/f", OpenFlags::O_RDONLY, 0).unwrap();
    assert_eq!(child.used(), 2);
    assert_eq!(parent.used(), 1);
    assert!(!Arc::ptr_eq(
        &child.get(c).unwrap().shared,
        &parent.get(b).unwrap().shared
    ));
}

#[test]
fn test_shared_descriptor_shares_position() {
    let (vfs, _mem) = setup();
    let parent = vfs.create_table().unwrap();
    let fd = vfs.open(&parent, "/tmp/f", OpenFlags::O_RDONLY, 0).unwrap();
    let child = vfs.copy_table(&parent).unwrap();

    let mut buf = [0u8; 3];
    vfs.read(&parent, fd, &mut buf).unwrap();
    assert_eq!(&buf, b"sha");
    vfs.read(&child, fd, &mut buf).unwrap();
    assert_eq!(&buf, b"red");
}

#[test]
fn test_destroy_table() {
    let (vfs, mem) = setup();
    let parent = vfs.create_table().unwrap();
    let a = vfs.open(&parent, "/tmp/f", OpenFlags::O_RDONLY, 0).unwrap();
    vfs.open(&parent, "/tmp/g", OpenFlags::O_RDWR, 0).unwrap();
    let child = vfs.copy_table(&parent).unwrap();

    vfs.destroy_table(parent);
    assert_eq!(mem.closes(), 0);
    vfs.close(&child, a).unwrap();
    assert_eq!(mem.closes(), 1);

    vfs.destroy_table(child);
    assert_eq!(mem.closes(), 2);
}

#[test]
fn test_destroy_ignores_close_errors() {
    let (vfs, mem) = setup();
    let table = vfs.create_table().unwrap();
    vfs.open(&table, "/tmp/f", OpenFlags::O_RDONLY, 0).unwrap();

    mem.set_fail_close(true);
    vfs.destroy_table(table.clone());
    assert_eq!(table.used(), 0);
    assert_eq!(mem.closes(), 0);
}
