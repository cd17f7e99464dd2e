//! # nucstrstr
//!
//! 面向 2-bit 打包 DNA 的编译式核酸模式匹配。
//!
//! 查询是一段小型表达式语言：FASTA 字面量（含 IUPAC 简并碱基）通过
//! `&`、`|`、`!`、`^`、`$`、`@` 与括号组合。本 crate 包括：
//!
//! - **查询解析**：递归下降解析，字面量在解析时即编译
//! - **模式编译**：2na / 4na 编码、四个相位变体、按长度选择通道宽度
//! - **匹配器**：在 2na 缓冲区上滑动的定宽整数窗口比较
//! - **表达式求值**：AND / OR 短路、NOT、首尾锚定，可多线程共享
//!
//! ## 快速示例
//!
//! ```rust
//! use nucstrstr::search::{MatchResult, NucStrstr, SeqFilter};
//! use nucstrstr::util::dna;
//!
//! // 位置模式：返回 1 起始的命中位置
//! let nss = NucStrstr::compile("ACGT", true).unwrap();
//! let mut buf = Vec::new();
//! dna::pack_2na(b"GGGGACGTGG", &mut buf);
//! assert_eq!(nss.search(&buf, 0, 10), MatchResult::FoundAt(5));
//!
//! // 布尔查询 + 逐条读段过滤
//! let nss: NucStrstr = "^GG & !'NNNNNNNNNNNN'".parse().unwrap();
//! let mut filter = SeqFilter::new(&nss);
//! assert!(filter.matches(b"GGATTACA"));
//! ```
//!
//! ## 模块说明
//!
//! - [`search`]：查询编译与求值（解析、模式、匹配器、表达式树、读段过滤）
//! - [`io`]：FASTA / FASTQ 文件解析
//! - [`util`]：2na 打包 / 解包 / 反向互补等工具函数

pub mod io;
pub mod search;
pub mod util;
