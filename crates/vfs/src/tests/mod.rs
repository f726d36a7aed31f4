// Unit tests for the mount graph and the fd table.
//
// These run on the host with `cargo test`; the sync primitives are backed by the
// mock arch ops from `test-support`.

extern crate std;

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Once;

use sync::{ArchOps, register_arch_ops};
use test_support::mock::arch::MOCK_ARCH_OPS;

use crate::driver::DriverRecord;
use crate::{FileHandle, FsError, OpenFlags, VfsDriver};


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

fn init() {
    INIT.call_once(|| unsafe { register_arch_ops(&TEST_ARCH) });
}

/// 只统计 close 次数的驱动，可以让 close 失败
#[derive(Default)]
struct CountingDriver {
    closes: AtomicUsize,
    fail_close: AtomicBool,
}

impl CountingDriver {
    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn set_fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }
}

impl VfsDriver for CountingDriver {
    fn name(&self) -> &str {
        "counting"
    }

    fn open(&self, _path: &str, _flags: OpenFlags, _mode: u32) -> Result<FileHandle, FsError> {
        Ok(Box::new(()))
    }

    fn close(&self, _handle: &dyn Any) -> Result<(), FsError> {
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(FsError::IoError);
        }
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn record(driver: Arc<dyn VfsDriver>) -> Arc<DriverRecord> {
    Arc::new(DriverRecord::new(driver))
}

fn null_record() -> Arc<DriverRecord> {
    record(Arc::new(CountingDriver::default()))
}
