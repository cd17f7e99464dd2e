//! 通道（lane）抽象：匹配器在其上滑动窗口的定宽整数寄存器。
//!
//! 每种宽度只改变一次装载覆盖多少碱基，比较语义完全相同。

use std::ops::{BitAnd, BitOr, BitXor, Shl};

pub trait Lane:
    Copy
    + Eq
    + From<u8>
    + From<u16>
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Shl<u32, Output = Self>
{
    const BITS: u32;
    const ZERO: Self;

    /// 取左对齐 128 位值的最高 `BITS` 位。
    fn from_top(v: u128) -> Self;
}

macro_rules! impl_lane {
    ($($t:ty),*) => {$(
        impl Lane for $t {
            const BITS: u32 = <$t>::BITS;
            const ZERO: Self = 0;

            #[inline(always)]
            fn from_top(v: u128) -> Self {
                (v >> (128 - Self::BITS)) as $t
            }
        }
    )*};
}

impl_lane!(u32, u64, u128);
