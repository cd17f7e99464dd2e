//! 滑动窗口匹配器。
//!
//! 缓冲区始终是 2na 打包序列。窗口从起始字节开始装载一个通道宽度的数据，
//! 之后每次移入一个源字节（4 个碱基）；在每个字节位置按 0→3 的顺序检查 4 个相位，
//! 第一个满足的（位置，相位）即为最左匹配。
//!
//! - 2na：`(window ^ pattern) & mask == 0`
//! - 4na：源字节先展开为 4na 半字节，`(window & mask) ^ (window & pattern) == 0`，
//!   即窗口中的碱基位必须包含在模式编码内，简并编码由此自然生效。
//!
//! 宽度与字母表的每种组合都由同一个泛型 [`scan`] 实例化。

use super::alphabet::EXPAND_2NA;
use super::expr::MatchResult;
use super::lane::Lane;
use super::pattern::{Alphabet, LaneWidth, Pattern, PHASES};

/// 窗口编码策略：如何把源字节移入窗口，以及如何判定一个相位命中。
trait Encoding {
    /// 一个源字节在窗口中占用的位数
    const BYTE_BITS: u32;

    fn shift_in<L: Lane>(window: L, byte: u8) -> L;

    fn matches<L: Lane>(window: L, value: L, mask: L) -> bool;

    /// 越过窗口末端时补零
    #[inline(always)]
    fn pad<L: Lane>(window: L) -> L {
        window << Self::BYTE_BITS
    }
}

struct TwoNa;
struct FourNa;

impl Encoding for TwoNa {
    const BYTE_BITS: u32 = 8;

    #[inline(always)]
    fn shift_in<L: Lane>(window: L, byte: u8) -> L {
        (window << 8) | L::from(byte)
    }

    #[inline(always)]
    fn matches<L: Lane>(window: L, value: L, mask: L) -> bool {
        (window ^ value) & mask == L::ZERO
    }
}

impl Encoding for FourNa {
    const BYTE_BITS: u32 = 16;

    #[inline(always)]
    fn shift_in<L: Lane>(window: L, byte: u8) -> L {
        (window << 16) | L::from(EXPAND_2NA[byte as usize])
    }

    #[inline(always)]
    fn matches<L: Lane>(window: L, value: L, mask: L) -> bool {
        (window & mask) ^ (window & value) == L::ZERO
    }
}

/// 在 `[pos, pos + len)`（以碱基计）内查找 `pattern`。
///
/// 窗口会被截断到 `ncbi2na` 实际包含的碱基数。
/// `positional` 为真时返回 1 起始的相对位置，否则只返回是否找到。
pub fn match_in_window(
    pattern: &Pattern,
    ncbi2na: &[u8],
    pos: usize,
    len: usize,
    positional: bool,
) -> MatchResult {
    match (pattern.alphabet(), pattern.width()) {
        (Alphabet::TwoBit, LaneWidth::W32) => scan::<u32, TwoNa>(pattern, ncbi2na, pos, len, positional),
        (Alphabet::TwoBit, LaneWidth::W64) => scan::<u64, TwoNa>(pattern, ncbi2na, pos, len, positional),
        (Alphabet::TwoBit, LaneWidth::W128) => scan::<u128, TwoNa>(pattern, ncbi2na, pos, len, positional),
        (Alphabet::FourBit, LaneWidth::W32) => scan::<u32, FourNa>(pattern, ncbi2na, pos, len, positional),
        (Alphabet::FourBit, LaneWidth::W64) => scan::<u64, FourNa>(pattern, ncbi2na, pos, len, positional),
        (Alphabet::FourBit, LaneWidth::W128) => scan::<u128, FourNa>(pattern, ncbi2na, pos, len, positional),
    }
}

fn scan<L: Lane, E: Encoding>(
    pattern: &Pattern,
    ncbi2na: &[u8],
    pos: usize,
    len: usize,
    positional: bool,
) -> MatchResult {
    let size = pattern.len() as usize;
    let avail = ncbi2na.len() << 2;
    if pos >= avail {
        return MatchResult::NotFound;
    }
    let len = len.min(avail - pos);
    if size == 0 || len < size {
        return MatchResult::NotFound;
    }

    let mut values = [L::ZERO; PHASES];
    let mut masks = [L::ZERO; PHASES];
    for (k, ph) in pattern.phases().iter().enumerate() {
        values[k] = L::from_top(ph.value);
        masks[k] = L::from_top(ph.mask);
    }

    // 最后一个可能的匹配起点（含）
    let last_start = pos + len - size;
    // 窗口覆盖的源字节 [first, end)
    let first = pos >> 2;
    let end = ((pos + len + 3) >> 2).min(ncbi2na.len());
    let lane_bytes = (L::BITS / E::BYTE_BITS) as usize;

    let mut window = L::ZERO;
    let mut next = first;
    for _ in 0..lane_bytes {
        window = if next < end { E::shift_in(window, ncbi2na[next]) } else { E::pad(window) };
        next += 1;
    }

    let mut base = first << 2;
    loop {
        for k in 0..PHASES {
            let start = base + k;
            if start < pos {
                continue;
            }
            if start > last_start {
                return MatchResult::NotFound;
            }
            if E::matches(window, values[k], masks[k]) {
                return if positional {
                    MatchResult::FoundAt((start - pos + 1) as u32)
                } else {
                    MatchResult::Found
                };
            }
        }

        window = if next < end { E::shift_in(window, ncbi2na[next]) } else { E::pad(window) };
        next += 1;
        base += 4;
    }
}
