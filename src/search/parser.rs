//! 查询表达式的递归下降解析。
//!
//! ```text
//! expr          := unary_expr (boolean_op expr)?
//! boolean_op    := '&' | '&&' | '|' | '||'
//! unary_expr    := '!' unary_expr | primary_expr
//! primary_expr  := '^' position_expr
//!                | position_expr '$'?
//!                | '(' expr ')'
//! position_expr := '@'? fasta_expr
//! fasta_expr    := "'" FASTA "'" | '"' FASTA '"' | FASTA
//! ```
//!
//! 布尔运算同级且右结合。每个字面量在解析时立即编译；任何错误都会丢弃已构建的部分。

use super::alphabet::code_4na;
use super::error::{CompileError, Result};
use super::expr::{BinaryOp, Expr, UnaryOp};
use super::pattern::{Alphabet, Pattern};

/// 最大嵌套深度
pub const MAX_DEPTH: usize = 1000;

pub fn parse(query: &str, positional: bool) -> Result<Expr> {
    let mut p = Parser { src: query.as_bytes(), pos: 0, depth: 0, positional };
    let expr = p.expr()?;
    if p.pos != p.src.len() {
        // 只有多余的 ')' 会让 expr 提前返回
        return Err(p.error("unbalanced ')'"));
    }
    Ok(expr)
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    depth: usize,
    /// 整棵树为位置模式时禁止布尔运算和 NOT
    positional: bool,
}

impl Parser<'_> {
    fn error(&self, msg: &'static str) -> CompileError {
        CompileError::Syntax { offset: self.pos, msg }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CompileError::NestingTooDeep { max: MAX_DEPTH });
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Expr> {
        self.enter()?;
        self.skip_ws();
        if self.peek().is_none() {
            return Err(self.error("expected expression"));
        }
        let left = self.unary_expr()?;
        self.skip_ws();

        let op = match self.peek() {
            None | Some(b')') => {
                self.depth -= 1;
                return Ok(left);
            }
            Some(b'&') => BinaryOp::And,
            Some(b'|') => BinaryOp::Or,
            Some(_) => return Err(self.error("expected '&', '|' or end of query")),
        };
        if self.positional {
            return Err(self.error("boolean operators are not allowed in positional mode"));
        }
        let sym = self.src[self.pos];
        self.pos += 1;
        if self.peek() == Some(sym) {
            self.pos += 1;
        }

        let right = self.expr()?;
        self.depth -= 1;
        Ok(Expr::binary(op, left, right))
    }

    fn unary_expr(&mut self) -> Result<Expr> {
        if self.peek() != Some(b'!') {
            return self.primary_expr();
        }
        if self.positional {
            return Err(self.error("'!' is not allowed in positional mode"));
        }
        self.enter()?;
        self.pos += 1;
        self.skip_ws();
        if self.peek().is_none() {
            return Err(self.error("expected operand after '!'"));
        }
        let child = self.unary_expr()?;
        self.depth -= 1;
        Ok(Expr::unary(UnaryOp::Not, child))
    }

    fn primary_expr(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(b'^') => {
                self.pos += 1;
                self.skip_ws();
                let leaf = self.position_expr()?;
                Ok(Expr::unary(UnaryOp::Head, leaf))
            }
            Some(b'(') => {
                let open = self.pos;
                self.pos += 1;
                let inner = self.expr()?;
                if self.peek() != Some(b')') {
                    return Err(CompileError::Syntax { offset: open, msg: "unterminated group" });
                }
                self.pos += 1;
                Ok(Expr::unary(UnaryOp::Group, inner))
            }
            _ => {
                let leaf = self.position_expr()?;
                self.skip_ws();
                if self.peek() == Some(b'$') {
                    self.pos += 1;
                    return Ok(Expr::unary(UnaryOp::Tail, leaf));
                }
                Ok(leaf)
            }
        }
    }

    fn position_expr(&mut self) -> Result<Expr> {
        let mut positional = self.positional;
        if self.peek() == Some(b'@') {
            self.pos += 1;
            self.skip_ws();
            positional = true;
        }
        self.fasta_expr(positional)
    }

    fn fasta_expr(&mut self, positional: bool) -> Result<Expr> {
        match self.peek() {
            Some(q @ (b'\'' | b'"')) => {
                let open = self.pos;
                self.pos += 1;
                let leaf = self.literal(positional)?;
                if self.peek() != Some(q) {
                    return Err(CompileError::Syntax { offset: open, msg: "unterminated quote" });
                }
                self.pos += 1;
                Ok(leaf)
            }
            _ => self.literal(positional),
        }
    }

    /// 贪婪读取一段能用同一字母表表示的碱基；优先 2na，
    /// 出现 2na 以外但 4na 可表示的字符时整段改用 4na。
    fn literal(&mut self, positional: bool) -> Result<Expr> {
        let start = self.pos;
        let mut alphabet = Alphabet::TwoBit;
        while let Some(c) = self.peek() {
            if alphabet.code(c).is_none() {
                if alphabet == Alphabet::FourBit || code_4na(c).is_none() {
                    break;
                }
                alphabet = Alphabet::FourBit;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected nucleotide literal"));
        }

        let text = &self.src[start..self.pos];
        let pattern = Pattern::compile(text, alphabet)?;
        log::trace!(
            "compiled {} literal '{}' ({} bases, {}-bit lanes, positional={})",
            alphabet,
            pattern.bases(),
            pattern.len(),
            pattern.width(),
            positional
        );
        Ok(Expr::leaf(pattern, positional))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syntax_offset(q: &str, positional: bool) -> usize {
        match parse(q, positional) {
            Err(CompileError::Syntax { offset, .. }) => offset,
            other => panic!("expected syntax error for {:?}, got {:?}", q, other),
        }
    }

    #[test]
    fn parses_single_literal() {
        let e = parse("ACGT", false).unwrap();
        assert!(matches!(e, Expr::Leaf { positional: false, .. }));
        assert_eq!(e.to_string(), "'ACGT'");
    }

    #[test]
    fn quoted_literals() {
        assert_eq!(parse("'acgt'", false).unwrap().to_string(), "'ACGT'");
        assert_eq!(parse("\"ACGN\"", false).unwrap().to_string(), "'ACGN'");
        assert_eq!(syntax_offset("'ACGT", false), 0);
        assert_eq!(syntax_offset("'ACGT\"", false), 0);
        assert_eq!(syntax_offset("''", false), 1);
    }

    #[test]
    fn literal_falls_back_to_four_na() {
        for q in ["ACGTN", "NACGT", "ANNA", "RYACN"] {
            match parse(q, false).unwrap() {
                Expr::Leaf { pattern, .. } => {
                    assert_eq!(pattern.alphabet(), Alphabet::FourBit);
                    assert_eq!(pattern.bases(), q);
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn operators_are_right_associative() {
        let e = parse("A & C | G", false).unwrap();
        assert_eq!(e.to_string(), "'A' & 'C' | 'G'");
        match e {
            Expr::Binary { op: BinaryOp::And, right, .. } => {
                assert!(matches!(*right, Expr::Binary { op: BinaryOp::Or, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn doubled_operators_and_whitespace() {
        let a = parse("  ACGT&&TTTT  ", false).unwrap();
        let b = parse("ACGT & TTTT", false).unwrap();
        assert_eq!(a, b);
        let c = parse("ACGT||TTTT", false).unwrap();
        assert_eq!(c.to_string(), "'ACGT' | 'TTTT'");
    }

    #[test]
    fn anchors_and_groups() {
        assert_eq!(parse("^ ACGT", false).unwrap().to_string(), "^'ACGT'");
        assert_eq!(parse("ACGT $", false).unwrap().to_string(), "'ACGT'$");
        assert_eq!(parse("!(A | C)", false).unwrap().to_string(), "!('A' | 'C')");
        assert_eq!(parse("^@GG", false).unwrap().to_string(), "^@'GG'");
        assert_eq!(parse("@ 'AC'$", false).unwrap().to_string(), "@'AC'$");
    }

    #[test]
    fn positional_mode_marks_leaves() {
        let e = parse("ACGT", true).unwrap();
        assert!(matches!(e, Expr::Leaf { positional: true, .. }));
        assert!(parse("^ACGT", true).is_ok());
        assert!(parse("(ACGT)$", true).is_err());
    }

    #[test]
    fn positional_mode_rejects_boolean_and_not() {
        assert_eq!(syntax_offset("ACGT & TTTT", true), 5);
        assert_eq!(syntax_offset("!ACGT", true), 0);
        assert_eq!(syntax_offset("(A | C)", true), 3);
    }

    #[test]
    fn syntax_errors() {
        assert_eq!(syntax_offset("", false), 0);
        assert_eq!(syntax_offset("   ", false), 3);
        assert_eq!(syntax_offset("()", false), 1);
        assert_eq!(syntax_offset("(ACGT", false), 0);
        assert_eq!(syntax_offset("ACGT)", false), 4);
        assert_eq!(syntax_offset("ACGT &", false), 6);
        assert_eq!(syntax_offset("ACGT XX", false), 5);
        assert_eq!(syntax_offset("!", false), 1);
        assert_eq!(syntax_offset("^ACGT$", false), 5);
        assert_eq!(syntax_offset("@", false), 1);
    }

    #[test]
    fn too_long_literal_is_capacity_error() {
        let q = "A".repeat(62);
        assert!(matches!(parse(&q, false), Err(CompileError::PatternTooLong { len: 62, .. })));
        let q = format!("ACGT | '{}'", "N".repeat(30));
        assert!(matches!(parse(&q, false), Err(CompileError::PatternTooLong { len: 30, .. })));
    }

    #[test]
    fn nesting_is_bounded() {
        let q = format!("{}A{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert_eq!(parse(&q, false), Err(CompileError::NestingTooDeep { max: MAX_DEPTH }));
        let q = format!("{}A{}", "(".repeat(100), ")".repeat(100));
        assert!(parse(&q, false).is_ok());
    }
}
