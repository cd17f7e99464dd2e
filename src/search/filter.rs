//! 对 ASCII 读段逐条求值的过滤器。
//!
//! 编译好的树在线程间共享，每个工作线程各自持有一个 [`SeqFilter`]，
//! 其中的打包缓冲区在读段之间重复使用，只增不减。

use super::expr::MatchResult;
use super::NucStrstr;
use crate::util::dna;

/// 一次命中：位置（1 起始，仅位置模式下存在）以及最近执行的叶子长度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub position: Option<u32>,
    pub len: Option<u32>,
}

#[derive(Debug)]
pub struct SeqFilter<'a> {
    query: &'a NucStrstr,
    buf: Vec<u8>,
    /// 最近一次打包的读段长度
    seq_len: usize,
}

impl<'a> SeqFilter<'a> {
    pub fn new(query: &'a NucStrstr) -> Self {
        Self { query, buf: Vec::new(), seq_len: 0 }
    }

    /// 读段是否满足查询。非 ACGT 字符按 A 处理。
    #[inline]
    pub fn matches(&mut self, seq: &[u8]) -> bool {
        self.locate(seq).is_some()
    }

    /// 在整条读段 `[0, len)` 上求值，未命中返回 `None`。
    pub fn locate(&mut self, seq: &[u8]) -> Option<Hit> {
        if seq.is_empty() {
            return None;
        }
        dna::pack_2na(seq, &mut self.buf);
        self.seq_len = seq.len();
        let len = u32::try_from(seq.len()).unwrap_or(u32::MAX);
        match self.query.search_with_len(&self.buf, 0, len) {
            (MatchResult::NotFound, _) => None,
            (res, len) => Some(Hit { position: res.position(), len }),
        }
    }

    /// 最近一次求值的读段中 `hit` 覆盖的碱基，按参与比较的 2na 编码解出，
    /// 因此非 ACGT 字符显示为 `A`。没有位置或长度时返回 `None`。
    pub fn span(&self, hit: Hit) -> Option<Vec<u8>> {
        let start = hit.position?.checked_sub(1)? as usize;
        let len = (hit.len? as usize).min(self.seq_len.saturating_sub(start));
        Some(dna::unpack_2na(&self.buf, start, len))
    }
}
