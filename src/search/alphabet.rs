//! 碱基字母表查找表。
//!
//! 所有表都在编译期由 `const fn` 生成，进程内只读共享，无需运行时初始化。
//!
//! - 2na：`ACGT` → 0..3，每字节 4 个碱基，高位在前。
//! - 4na：`-ACMGRSVTWYHKDBN` → 0..15，每个编码是 A=1、C=2、G=4、T=8 的位掩码，
//!   因此简并碱基（如 `N` = 15）可以匹配它覆盖的任意具体碱基。

/// 2na 编码对应的字符。
pub const NCBI2NA: &[u8; 4] = b"ACGT";

/// 4na 编码对应的字符（下标即编码）。
pub const NCBI4NA: &[u8; 16] = b"-ACMGRSVTWYHKDBN";

const fn build_map(alphabet: &[u8]) -> [i8; 128] {
    let mut map = [-1i8; 128];
    let mut i = 0;
    while i < alphabet.len() {
        let ch = alphabet[i];
        map[ch as usize] = i as i8;
        map[ch.to_ascii_lowercase() as usize] = i as i8;
        i += 1;
    }
    map
}

/// 一个 2na 字节展开为 4 个 4na 半字节，第一个碱基位于最高半字节。
const fn build_expand_2na() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut b = 0;
    while b < 256 {
        let mut v = 0u16;
        let mut i = 0;
        while i < 4 {
            let code = (b >> (6 - 2 * i)) & 3;
            v |= (1u16 << code) << (12 - 4 * i);
            i += 1;
        }
        table[b] = v;
        b += 1;
    }
    table
}

static FASTA_2NA: [i8; 128] = build_map(NCBI2NA);
static FASTA_4NA: [i8; 128] = build_map(NCBI4NA);

/// 2na 字节 → 4na 展开表。
pub static EXPAND_2NA: [u16; 256] = build_expand_2na();

#[inline]
fn lookup(map: &[i8; 128], ch: u8) -> Option<u8> {
    match map.get(ch as usize) {
        Some(&code) if code >= 0 => Some(code as u8),
        _ => None,
    }
}

/// FASTA 字符的 2na 编码；非 `ACGT`（大小写不敏感）返回 `None`。
#[inline]
pub fn code_2na(ch: u8) -> Option<u8> {
    lookup(&FASTA_2NA, ch)
}

/// FASTA 字符的 4na 编码；不在 4na 字母表中返回 `None`。
#[inline]
pub fn code_4na(ch: u8) -> Option<u8> {
    lookup(&FASTA_4NA, ch)
}
