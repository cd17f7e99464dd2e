//! ASCII 序列与 2na 打包缓冲区之间的转换。
//!
//! 2na 布局：每字节 4 个碱基，第一个碱基占最高两位（A=0, C=1, G=2, T=3）。

/// 每字节容纳的碱基数
pub const BASES_PER_BYTE: usize = 4;

/// ASCII 碱基转 2na 编码。A/C/G/T 不区分大小写，U 视为 T；其他字符一律映射为 A。
#[inline]
pub fn to_2na(b: u8) -> u8 {
    match b.to_ascii_uppercase() {
        b'C' => 1,
        b'G' => 2,
        b'T' | b'U' => 3,
        _ => 0,
    }
}

#[inline]
pub fn from_2na(code: u8) -> u8 {
    b"ACGT"[(code & 3) as usize]
}

/// `n` 个碱基打包后的字节数
#[inline]
pub fn packed_len(n: usize) -> usize {
    (n + BASES_PER_BYTE - 1) / BASES_PER_BYTE
}

/// 把 `seq` 打包写入 `out`，末尾不足 4 个碱基的字节低位补零。
///
/// `out` 会被清空后重用，容量足够时不会重新分配。
pub fn pack_2na(seq: &[u8], out: &mut Vec<u8>) {
    out.clear();
    out.reserve(packed_len(seq.len()));
    for chunk in seq.chunks(BASES_PER_BYTE) {
        let mut byte = 0u8;
        for (i, &b) in chunk.iter().enumerate() {
            byte |= to_2na(b) << (6 - 2 * i);
        }
        out.push(byte);
    }
}

/// 从打包缓冲区取出 `[offset, offset + len)` 的碱基，超出缓冲区的部分被截掉。
pub fn unpack_2na(packed: &[u8], offset: usize, len: usize) -> Vec<u8> {
    let avail = packed.len() * BASES_PER_BYTE;
    let end = offset.saturating_add(len).min(avail);
    (offset.min(end)..end)
        .map(|i| {
            let shift = 6 - 2 * (i % BASES_PER_BYTE);
            from_2na(packed[i / BASES_PER_BYTE] >> shift)
        })
        .collect()
}

#[inline]
pub fn complement(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' | b'U' => b'A',
        _ => b'N',
    }
}

pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq.iter().rev() {
        out.push(complement(b));
    }
    out
}
