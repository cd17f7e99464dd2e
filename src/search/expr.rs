//! 表达式树与求值。
//!
//! 树在编译后不可变；求值只读取节点，结果写入调用方的局部状态，
//! 因此同一棵树可以被任意多个线程同时求值。

use std::fmt;

use super::matcher::match_in_window;
use super::pattern::Pattern;

/// 一次查找的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchResult {
    NotFound,
    Found,
    /// 相对窗口起点的 1 起始碱基位置
    FoundAt(u32),
}

impl MatchResult {
    #[inline]
    pub fn is_found(self) -> bool {
        !matches!(self, MatchResult::NotFound)
    }

    #[inline]
    pub fn position(self) -> Option<u32> {
        match self {
            MatchResult::FoundAt(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    /// 锚定在窗口开头
    Head,
    /// 锚定在窗口结尾
    Tail,
    /// 括号分组，不改变语义
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    And,
    Or,
}

/// 编译后的表达式节点。每个子节点由父节点独占持有。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Leaf { pattern: Box<Pattern>, positional: bool },
    Unary { op: UnaryOp, child: Box<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
}

/// 以碱基计的搜索窗口
#[derive(Debug, Clone, Copy)]
pub(crate) struct Window {
    pub pos: usize,
    pub len: usize,
}

impl Expr {
    pub fn leaf(pattern: Pattern, positional: bool) -> Self {
        Expr::Leaf { pattern: Box::new(pattern), positional }
    }

    pub fn unary(op: UnaryOp, child: Expr) -> Self {
        Expr::Unary { op, child: Box::new(child) }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    /// 锚点需要的固定碱基长度：叶子本身，或括号内的叶子。
    fn anchor_len(&self) -> Option<usize> {
        match self {
            Expr::Leaf { pattern, .. } => Some(pattern.len() as usize),
            Expr::Unary { op: UnaryOp::Group, child } => child.anchor_len(),
            _ => None,
        }
    }

    /// 先序收集所有叶子模式。
    pub fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Pattern>) {
        match self {
            Expr::Leaf { pattern, .. } => out.push(pattern),
            Expr::Unary { child, .. } => child.collect_leaves(out),
            Expr::Binary { left, right, .. } => {
                left.collect_leaves(out);
                right.collect_leaves(out);
            }
        }
    }

    /// 在窗口内求值。
    ///
    /// `last_len` 记录最近一次实际执行匹配的叶子的长度；
    /// 短路前已经执行过的叶子同样会覆盖它。
    pub(crate) fn eval(&self, ncbi2na: &[u8], w: Window, last_len: &mut Option<u32>) -> MatchResult {
        if w.len == 0 {
            return MatchResult::NotFound;
        }
        match self {
            Expr::Leaf { pattern, positional } => {
                if w.len < pattern.len() as usize {
                    return MatchResult::NotFound;
                }
                *last_len = Some(pattern.len());
                match_in_window(pattern, ncbi2na, w.pos, w.len, *positional)
            }
            Expr::Binary { op, left, right } => {
                let found = left.eval(ncbi2na, w, last_len);
                match (*op, found.is_found()) {
                    (BinaryOp::Or, true) | (BinaryOp::And, false) => found,
                    _ => right.eval(ncbi2na, w, last_len),
                }
            }
            Expr::Unary { op: UnaryOp::Group, child } => child.eval(ncbi2na, w, last_len),
            Expr::Unary { op: UnaryOp::Not, child } => {
                if child.eval(ncbi2na, w, last_len).is_found() {
                    MatchResult::NotFound
                } else {
                    MatchResult::Found
                }
            }
            Expr::Unary { op: UnaryOp::Head, child } => match child.anchor_len() {
                Some(n) if n <= w.len => child.eval(ncbi2na, Window { pos: w.pos, len: n }, last_len),
                _ => MatchResult::NotFound,
            },
            Expr::Unary { op: UnaryOp::Tail, child } => match child.anchor_len() {
                Some(n) if n <= w.len => {
                    let skip = w.len - n;
                    let sub = Window { pos: w.pos + skip, len: n };
                    match child.eval(ncbi2na, sub, last_len) {
                        MatchResult::NotFound => MatchResult::NotFound,
                        MatchResult::Found => MatchResult::FoundAt(skip as u32 + 1),
                        MatchResult::FoundAt(p) => MatchResult::FoundAt(skip as u32 + p),
                    }
                }
                _ => MatchResult::NotFound,
            },
        }
    }
}

struct Quoted<'a>(&'a Pattern);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.0.bases())
    }
}

/// 作为操作数时，二元节点需要加括号才能按原结构重新解析（布尔运算右结合）。
struct Operand<'a>(&'a Expr);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::Binary { .. } => write!(f, "({})", self.0),
            e => write!(f, "{}", e),
        }
    }
}

/// 输出规范化的查询文本，重新解析后得到等价的树。
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Leaf { pattern, positional: true } => write!(f, "@{}", Quoted(pattern)),
            Expr::Leaf { pattern, positional: false } => write!(f, "{}", Quoted(pattern)),
            Expr::Unary { op: UnaryOp::Not, child } => write!(f, "!{}", Operand(child)),
            Expr::Unary { op: UnaryOp::Head, child } => write!(f, "^{}", Operand(child)),
            Expr::Unary { op: UnaryOp::Tail, child } => write!(f, "{}$", Operand(child)),
            Expr::Unary { op: UnaryOp::Group, child } => write!(f, "({})", child),
            Expr::Binary { op, left, right } => {
                let sym = match op {
                    BinaryOp::And => '&',
                    BinaryOp::Or => '|',
                };
                write!(f, "{} {} {}", Operand(left), sym, right)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::pattern::Alphabet;
    use crate::util::dna;

    fn lit(s: &str) -> Expr {
        let alphabet = Alphabet::classify(s.as_bytes()).unwrap();
        Expr::leaf(Pattern::compile(s.as_bytes(), alphabet).unwrap(), false)
    }

    fn at(s: &str) -> Expr {
        let alphabet = Alphabet::classify(s.as_bytes()).unwrap();
        Expr::leaf(Pattern::compile(s.as_bytes(), alphabet).unwrap(), true)
    }

    fn run(e: &Expr, seq: &[u8]) -> (MatchResult, Option<u32>) {
        let mut buf = Vec::new();
        dna::pack_2na(seq, &mut buf);
        let mut last = None;
        let r = e.eval(&buf, Window { pos: 0, len: seq.len() }, &mut last);
        (r, last)
    }

    #[test]
    fn not_inverts() {
        let e = Expr::unary(UnaryOp::Not, lit("ACGT"));
        assert_eq!(run(&e, b"TTACGTTT").0, MatchResult::NotFound);
        assert_eq!(run(&e, b"TTTTTTTT").0, MatchResult::Found);
    }

    #[test]
    fn and_short_circuits() {
        let e = Expr::binary(BinaryOp::And, lit("ACGTA"), lit("GG"));
        // 左边不匹配，右边不会执行，长度来自左边
        assert_eq!(run(&e, b"GGGGGGGG"), (MatchResult::NotFound, Some(5)));
        assert_eq!(run(&e, b"ACGTAGG").0, MatchResult::Found);
    }

    #[test]
    fn or_returns_first_hit() {
        let e = Expr::binary(BinaryOp::Or, at("TTT"), at("GG"));
        assert_eq!(run(&e, b"GGTTT"), (MatchResult::FoundAt(3), Some(3)));
        // 左边执行过但未命中，长度被右边覆盖
        assert_eq!(run(&e, b"AAGGA"), (MatchResult::FoundAt(3), Some(2)));
    }

    #[test]
    fn short_circuited_leaf_length_is_kept() {
        // NOT 的子叶执行后短路，长度仍是该叶子的
        let e = Expr::binary(BinaryOp::And, Expr::unary(UnaryOp::Not, lit("ACG")), lit("TTTTT"));
        assert_eq!(run(&e, b"ACGTT"), (MatchResult::NotFound, Some(3)));
    }

    #[test]
    fn head_anchors_to_start() {
        let e = Expr::unary(UnaryOp::Head, lit("ACGT"));
        assert_eq!(run(&e, b"ACGTTTTT").0, MatchResult::Found);
        assert_eq!(run(&e, b"TACGTTTT").0, MatchResult::NotFound);
        assert_eq!(run(&e, b"ACG").0, MatchResult::NotFound);
    }

    #[test]
    fn tail_reports_translated_offset() {
        let e = Expr::unary(UnaryOp::Tail, lit("ACGT"));
        assert_eq!(run(&e, b"TTTTACGT").0, MatchResult::FoundAt(5));
        assert_eq!(run(&e, b"TTTACGTT").0, MatchResult::NotFound);
        let e = Expr::unary(UnaryOp::Tail, at("ACGT"));
        assert_eq!(run(&e, b"TTTTTTACGT").0, MatchResult::FoundAt(7));
    }

    #[test]
    fn anchors_inside_offset_window() {
        let mut buf = Vec::new();
        dna::pack_2na(b"CCCACGTTTTACGT", &mut buf);
        let eval = |e: &Expr, pos: usize, len: usize| e.eval(&buf, Window { pos, len }, &mut None);

        let head = Expr::unary(UnaryOp::Head, lit("ACGT"));
        assert_eq!(eval(&head, 3, 11), MatchResult::Found);
        assert_eq!(eval(&head, 2, 12), MatchResult::NotFound);

        // 尾部偏移相对于窗口起点，而不是缓冲区起点
        let tail = Expr::unary(UnaryOp::Tail, lit("ACGT"));
        assert_eq!(eval(&tail, 3, 11), MatchResult::FoundAt(8));
        assert_eq!(eval(&tail, 3, 10), MatchResult::NotFound);
        let tail = Expr::unary(UnaryOp::Tail, at("ACGT"));
        assert_eq!(eval(&tail, 6, 8), MatchResult::FoundAt(5));
        assert_eq!(eval(&tail, 3, 3), MatchResult::NotFound);
    }

    #[test]
    fn anchors_need_fixed_length_child() {
        let e = Expr::unary(UnaryOp::Head, Expr::unary(UnaryOp::Not, lit("A")));
        assert_eq!(run(&e, b"CCCC").0, MatchResult::NotFound);
        let e = Expr::unary(UnaryOp::Head, Expr::unary(UnaryOp::Group, lit("CC")));
        assert_eq!(run(&e, b"CCCC").0, MatchResult::Found);
    }

    #[test]
    fn empty_window_is_not_found() {
        let e = Expr::unary(UnaryOp::Not, lit("A"));
        assert_eq!(run(&e, b"").0, MatchResult::NotFound);
    }

    #[test]
    fn display_renders_query() {
        let e = Expr::binary(
            BinaryOp::Or,
            Expr::unary(UnaryOp::Head, lit("acgt")),
            Expr::unary(UnaryOp::Group, Expr::unary(UnaryOp::Not, lit("NN"))),
        );
        assert_eq!(e.to_string(), "^'ACGT' | (!'NN')");
        assert_eq!(Expr::unary(UnaryOp::Tail, at("GG")).to_string(), "@'GG'$");
        let nested = Expr::binary(BinaryOp::And, Expr::binary(BinaryOp::Or, lit("A"), lit("C")), lit("G"));
        assert_eq!(nested.to_string(), "('A' | 'C') & 'G'");
    }

    #[test]
    fn leaves_in_order() {
        let e = Expr::binary(BinaryOp::And, lit("AA"), Expr::unary(UnaryOp::Not, lit("CCC")));
        let mut out = Vec::new();
        e.collect_leaves(&mut out);
        let lens: Vec<u32> = out.iter().map(|p| p.len()).collect();
        assert_eq!(lens, vec![2, 3]);
    }
}
