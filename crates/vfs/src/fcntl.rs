//! 打开标志

bitflags::bitflags! {
    /// `open` 使用的权限标志
    ///
    /// `read`/`readdir`/`ioctl` 需要 [`OpenFlags::PERM_READ`]，
    /// `write` 需要 [`OpenFlags::PERM_WRITE`]。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        /// 允许写
        const PERM_WRITE = 0b010;
        /// 允许读
        const PERM_READ = 0b100;

        /// 只读打开
        const O_RDONLY = Self::PERM_READ.bits();
        /// 读写打开
        const O_RDWR = Self::PERM_READ.bits() | Self::PERM_WRITE.bits();
    }
}

impl OpenFlags {
    /// 是否允许读
    pub fn readable(&self) -> bool {
        self.contains(OpenFlags::PERM_READ)
    }

    /// 是否允许写
    pub fn writable(&self) -> bool {
        self.contains(OpenFlags::PERM_WRITE)
    }
}
