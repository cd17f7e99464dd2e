//! 模式编译：把一个 FASTA 字面量编译为打包后的比较模式。
//!
//! 字面量按字母表编码后从最高位开始紧密排列（2na 每字节 4 个碱基，4na 每字节 2 个），
//! 末尾不足部分补零；掩码在有效碱基处全 1。随后把模式与掩码各右移 1..3 个碱基，
//! 得到 4 个相位，分别对应模式起点落在一个 2na 源字节内的第 0..3 个碱基。
//! 匹配时窗口总是按字节推进，因此每个字节位置只需依次检查这 4 个相位。

use std::fmt;

use super::alphabet::{code_2na, code_4na, NCBI2NA, NCBI4NA};
use super::error::{CompileError, Result};

/// 2na 字面量的最大碱基数（128 位通道减去 3 个碱基的相位余量）
pub const MAX_2NA_BASES: usize = 61;
/// 4na 字面量的最大碱基数
pub const MAX_4NA_BASES: usize = 29;

/// 相位数：一个 2na 源字节内的碱基起点个数
pub const PHASES: usize = 4;

/// 模式所用的碱基编码。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alphabet {
    /// 2 位编码，仅 `ACGT`
    TwoBit,
    /// 4 位编码，支持简并碱基
    FourBit,
}

impl Alphabet {
    #[inline]
    pub const fn bits_per_base(self) -> u32 {
        match self {
            Alphabet::TwoBit => 2,
            Alphabet::FourBit => 4,
        }
    }

    #[inline]
    pub const fn max_len(self) -> usize {
        match self {
            Alphabet::TwoBit => MAX_2NA_BASES,
            Alphabet::FourBit => MAX_4NA_BASES,
        }
    }

    #[inline]
    pub fn code(self, ch: u8) -> Option<u8> {
        match self {
            Alphabet::TwoBit => code_2na(ch),
            Alphabet::FourBit => code_4na(ch),
        }
    }

    fn symbols(self) -> &'static [u8] {
        match self {
            Alphabet::TwoBit => NCBI2NA,
            Alphabet::FourBit => NCBI4NA,
        }
    }

    /// 为整个字面量选择字母表：能用 2na 表示就用 2na，否则尝试 4na。
    /// 空串或含有两种字母表都不接受的字符时返回 `None`。
    pub fn classify(literal: &[u8]) -> Option<Alphabet> {
        if literal.is_empty() {
            return None;
        }
        if literal.iter().all(|&c| code_2na(c).is_some()) {
            Some(Alphabet::TwoBit)
        } else if literal.iter().all(|&c| code_4na(c).is_some()) {
            Some(Alphabet::FourBit)
        } else {
            None
        }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alphabet::TwoBit => f.write_str("2na"),
            Alphabet::FourBit => f.write_str("4na"),
        }
    }
}

/// 匹配器每次比较处理的位数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LaneWidth {
    W32,
    W64,
    W128,
}

impl LaneWidth {
    #[inline]
    pub const fn bits(self) -> u32 {
        match self {
            LaneWidth::W32 => 32,
            LaneWidth::W64 => 64,
            LaneWidth::W128 => 128,
        }
    }

    /// 能容纳 `len` 个碱基外加 3 个碱基相位偏移的最窄通道。
    pub fn select(alphabet: Alphabet, len: usize) -> Option<LaneWidth> {
        [LaneWidth::W32, LaneWidth::W64, LaneWidth::W128]
            .into_iter()
            .find(|w| len + PHASES - 1 <= (w.bits() / alphabet.bits_per_base()) as usize)
    }
}

impl fmt::Display for LaneWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// 一个相位的模式值与掩码，左对齐到 bit 127。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase {
    pub value: u128,
    pub mask: u128,
}

/// 编译完成的字面量模式。构造后不可变，4 个相位总是由同一个字面量一起生成。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    alphabet: Alphabet,
    len: u32,
    width: LaneWidth,
    phases: [Phase; PHASES],
}

impl Pattern {
    /// 按给定字母表编译字面量。
    ///
    /// 超过字母表上限时返回 [`CompileError::PatternTooLong`]，从不截断。
    pub fn compile(literal: &[u8], alphabet: Alphabet) -> Result<Self> {
        let len = literal.len();
        if len == 0 {
            return Err(CompileError::Syntax { offset: 0, msg: "empty nucleotide literal" });
        }
        let too_long = CompileError::PatternTooLong { len, max: alphabet.max_len(), alphabet };
        if len > alphabet.max_len() {
            return Err(too_long);
        }
        let width = LaneWidth::select(alphabet, len).ok_or(too_long)?;

        let bits = alphabet.bits_per_base();
        let base_mask: u128 = (1 << bits) - 1;
        let mut value = 0u128;
        let mut mask = 0u128;
        for (i, &ch) in literal.iter().enumerate() {
            let code = alphabet.code(ch).ok_or(CompileError::InvalidBase {
                base: char::from(ch),
                offset: i,
                alphabet,
            })?;
            let shift = 128 - bits * (i as u32 + 1);
            value |= u128::from(code) << shift;
            mask |= base_mask << shift;
        }

        let phases = std::array::from_fn(|k| {
            let shift = bits * k as u32;
            Phase { value: value >> shift, mask: mask >> shift }
        });

        Ok(Self { alphabet, len: len as u32, width, phases })
    }

    #[inline]
    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    /// 碱基长度
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn width(&self) -> LaneWidth {
        self.width
    }

    #[inline]
    pub fn phase(&self, k: usize) -> Phase {
        self.phases[k]
    }

    #[inline]
    pub fn phases(&self) -> &[Phase; PHASES] {
        &self.phases
    }

    /// 从相位 0 解码出规范化（大写）的字面量。
    pub fn bases(&self) -> String {
        let bits = self.alphabet.bits_per_base();
        let base_mask: u128 = (1 << bits) - 1;
        let symbols = self.alphabet.symbols();
        (0..self.len)
            .map(|i| {
                let code = (self.phases[0].value >> (128 - bits * (i + 1))) & base_mask;
                char::from(symbols[code as usize])
            })
            .collect()
    }
}
