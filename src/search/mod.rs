//! 核酸模式搜索引擎。
//!
//! 查询串先被解析并编译为一棵不可变的表达式树（[`NucStrstr`]），
//! 之后可对任意 2na 打包缓冲区反复求值，求值过程不分配内存、不修改树。
//!
//! ```rust
//! use nucstrstr::search::{MatchResult, NucStrstr};
//! use nucstrstr::util::dna;
//!
//! let nss = NucStrstr::compile("ACGT", true).unwrap();
//! let mut buf = Vec::new();
//! dna::pack_2na(b"TTACGTTT", &mut buf);
//! assert_eq!(nss.search(&buf, 0, 8), MatchResult::FoundAt(3));
//! ```

pub mod alphabet;
pub mod error;
pub mod expr;
pub mod filter;
pub mod lane;
pub mod matcher;
pub mod parser;
pub mod pattern;

use std::str::FromStr;

pub use error::{CompileError, Result};
pub use expr::{BinaryOp, Expr, MatchResult, UnaryOp};
pub use filter::{Hit, SeqFilter};
pub use pattern::{Alphabet, LaneWidth, Pattern};

use expr::Window;

/// 编译完成的查询。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NucStrstr {
    root: Expr,
    positional: bool,
}

impl NucStrstr {
    /// 解析并编译查询。
    ///
    /// `positional` 为真时每个叶子都返回命中位置，此时不允许布尔运算和 `!`。
    pub fn compile(query: &str, positional: bool) -> Result<Self> {
        let root = parser::parse(query, positional)?;
        log::debug!("compiled query {:?} as {}", query, root);
        Ok(Self { root, positional })
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    pub fn is_positional(&self) -> bool {
        self.positional
    }

    pub fn leaves(&self) -> Vec<&Pattern> {
        let mut out = Vec::new();
        self.root.collect_leaves(&mut out);
        out
    }

    /// 在 `ncbi2na` 的 `[pos, pos + len)` 碱基范围内求值。
    ///
    /// 返回的位置相对于 `pos`，从 1 开始。
    #[inline]
    pub fn search(&self, ncbi2na: &[u8], pos: u32, len: u32) -> MatchResult {
        self.search_with_len(ncbi2na, pos, len).0
    }

    /// 同 [`search`](Self::search)，另外返回最近一次执行匹配的叶子的碱基长度，
    /// 用于标出命中片段。
    pub fn search_with_len(&self, ncbi2na: &[u8], pos: u32, len: u32) -> (MatchResult, Option<u32>) {
        let mut last_len = None;
        let avail = ncbi2na.len() << 2;
        let pos = pos as usize;
        if pos >= avail || len == 0 {
            return (MatchResult::NotFound, None);
        }
        let w = Window { pos, len: (len as usize).min(avail - pos) };
        let res = self.root.eval(ncbi2na, w, &mut last_len);
        (res, last_len)
    }
}

impl FromStr for NucStrstr {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self> {
        Self::compile(s, false)
    }
}
