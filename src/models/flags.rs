//! 位掩码标志
//!
//! 角色权限与项目分类都以整数位掩码存储，两者共用 [`FlagSet`] 的
//! 增删查逻辑。每个标志占用独立的位，可以按位或组合。

use bitflags::{Flags, bitflags};

bitflags! {
    /// 角色权限
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permission: i32 {
        const MODERATE = 0x01;
        const ADMIN = 0x02;
    }
}

bitflags! {
    /// 项目分类
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CategoryKind: i32 {
        const DESIGN = 0x01;
        const DEV_WEB = 0x02;
        const FORMATION = 0x04;
        const DEV_MOBILE = 0x08;
        const DEV_LOGICIEL = 0x10;
    }
}

/// 持有整数位掩码的实体
pub trait FlagSet {
    type Flag: Flags<Bits = i32> + Copy;

    fn bits(&self) -> i32;

    fn bits_mut(&mut self) -> &mut i32;

    fn has(&self, flag: Self::Flag) -> bool {
        let bits = flag.bits();
        self.bits() & bits == bits
    }

    fn add(&mut self, flag: Self::Flag) {
        *self.bits_mut() |= flag.bits();
    }

    fn remove(&mut self, flag: Self::Flag) {
        *self.bits_mut() &= !flag.bits();
    }

    fn reset(&mut self) {
        *self.bits_mut() = 0;
    }

    fn flags(&self) -> Self::Flag {
        Self::Flag::from_bits_retain(self.bits())
    }
}

/// 种子表中的实体：按名称唯一，带默认标记
pub trait Seeded: FlagSet {
    fn is_default(&self) -> bool;

    fn set_default(&mut self, is_default: bool);

    /// 清空后重新写入种子表中的标志，并设置默认标记；重复执行结果不变
    fn apply_seed(&mut self, flags: &[Self::Flag], is_default: bool) {
        self.reset();
        for flag in flags {
            self.add(*flag);
        }
        self.set_default(is_default);
    }
}
