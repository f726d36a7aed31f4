//! Shared fixtures for the VFS integration tests.

#![allow(dead_code)]

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use std::sync::{Arc, Mutex, Once};

use sync::{ArchOps, register_arch_ops};
use test_support::mock::arch::MOCK_ARCH_OPS;
use vfs::{FileHandle, FileSystem, FsError, OpenFlags, VfsDriver};

struct TestArch;

impl ArchOps for TestArch {
    unsafe fn read_and_disable_interrupts(&self) -> usize {
        unsafe { MOCK_ARCH_OPS.read_and_disable_interrupts() }
    }

    unsafe fn restore_interrupts(&self, flags: usize) {
        unsafe { MOCK_ARCH_OPS.restore_interrupts(flags) }
    }

    fn interrupt_enable_mask(&self) -> usize {
        1
    }
}

static TEST_ARCH: TestArch = TestArch;
static INIT: Once = Once::new();

pub fn init() {
    INIT.call_once(|| unsafe { register_arch_ops(&TEST_ARCH) });
}

/// 打开的内存文件
struct MemFile {
    name: String,
    pos: Mutex<usize>,
}

/// 内存文件驱动：按相对路径保存文件内容，记录每次 open 看到的路径
#[derive(Default)]
pub struct MemDriver {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    opened: Mutex<Vec<String>>,
    closes: AtomicUsize,
    fail_close: AtomicBool,
}

impl MemDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_file(self: Arc<Self>, name: &str, data: &[u8]) -> Arc<Self> {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), data.to_vec());
        self
    }

    /// 每次 open 收到的相对路径
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(name).cloned()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn set_fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    fn file(handle: &dyn Any) -> Result<&MemFile, FsError> {
        handle.downcast_ref::<MemFile>().ok_or(FsError::InvalidArgument)
    }
}

impl VfsDriver for MemDriver {
    fn name(&self) -> &str {
        "mem"
    }

    fn open(&self, path: &str, flags: OpenFlags, _mode: u32) -> Result<FileHandle, FsError> {
        self.opened.lock().unwrap().push(path.to_string());
        let mut files = self.files.lock().unwrap();
        if !files.contains_key(path) {
            if !flags.writable() {
                return Err(FsError::NotFound);
            }
            files.insert(path.to_string(), Vec::new());
        }
        Ok(Box::new(MemFile {
            name: path.to_string(),
            pos: Mutex::new(0),
        }))
    }

    fn close(&self, _handle: &dyn Any) -> Result<(), FsError> {
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(FsError::IoError);
        }
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read(&self, handle: &dyn Any, buf: &mut [u8]) -> Result<usize, FsError> {
        let file = Self::file(handle)?;
        let files = self.files.lock().unwrap();
        let data = files.get(&file.name).ok_or(FsError::IoError)?;
        let mut pos = file.pos.lock().unwrap();
        let n = buf.len().min(data.len().saturating_sub(*pos));
        buf[..n].copy_from_slice(&data[*pos..*pos + n]);
        *pos += n;
        Ok(n)
    }

    fn write(&self, handle: &dyn Any, buf: &[u8]) -> Result<usize, FsError> {
        let file = Self::file(handle)?;
        let mut files = self.files.lock().unwrap();
        let data = files.get_mut(&file.name).ok_or(FsError::IoError)?;
        let mut pos = file.pos.lock().unwrap();
        let end = *pos + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[*pos..end].copy_from_slice(buf);
        *pos = end;
        Ok(buf.len())
    }

    fn ioctl(&self, _handle: &dyn Any, op: u32, arg: usize) -> Result<isize, FsError> {
        Ok(op as isize * 1000 + arg as isize)
    }
}

/// 只实现 open 的驱动，其它操作都不支持
pub struct OpenOnlyDriver;

impl VfsDriver for OpenOnlyDriver {
    fn open(&self, _path: &str, _flags: OpenFlags, _mode: u32) -> Result<FileHandle, FsError> {
        Ok(Box::new(()))
    }
}

/// 内存文件系统：接受以 `/dev/ram` 开头的设备
#[derive(Default)]
pub struct RamFs {
    mounts: AtomicUsize,
    umounts: AtomicUsize,
    busy: AtomicBool,
    umount_delay_ms: AtomicU64,
}

impl RamFs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn mounts(&self) -> usize {
        self.mounts.load(Ordering::SeqCst)
    }

    pub fn umounts(&self) -> usize {
        self.umounts.load(Ordering::SeqCst)
    }

    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::SeqCst);
    }

    /// 让 umount 先睡眠一段时间，拉长卸载窗口
    pub fn set_umount_delay(&self, ms: u64) {
        self.umount_delay_ms.store(ms, Ordering::SeqCst);
    }
}

impl FileSystem for RamFs {
    fn fs_type(&self) -> &'static str {
        "ramfs"
    }

    fn mount(&self, _mount_path: &str, dev_path: &str) -> Result<Arc<dyn VfsDriver>, FsError> {
        if !dev_path.starts_with("/dev/ram") {
            return Err(FsError::NotSupported);
        }
        self.mounts.fetch_add(1, Ordering::SeqCst);
        Ok(MemDriver::new().with_file("hello", b"hello from ramfs"))
    }

    fn umount(&self, _mounted: &Arc<dyn VfsDriver>) -> Result<(), FsError> {
        let delay = self.umount_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }
        if self.busy.load(Ordering::SeqCst) {
            return Err(FsError::Busy);
        }
        self.umounts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 不认识任何设备的文件系统
pub struct RejectFs;

impl FileSystem for RejectFs {
    fn fs_type(&self) -> &'static str {
        "rejectfs"
    }

    fn mount(&self, _mount_path: &str, _dev_path: &str) -> Result<Arc<dyn VfsDriver>, FsError> {
        Err(FsError::NotSupported)
    }
}
