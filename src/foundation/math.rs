use crate::foundation::error::{KasuError, KasuResult};

#[derive(Clone, Copy, Debug)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    pub(crate) const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new_default() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(Self::PRIME);
        }
        self.0 = h;
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Source-over of one premultiplied RGBA8 pixel `s` onto `d`.
pub(crate) fn premul_over_px(d: &mut [u8], s: [u8; 4]) {
    let sa = u16::from(s[3]);
    if sa == 0 {
        return;
    }
    if sa == 255 {
        d.copy_from_slice(&s);
        return;
    }
    let inv = 255u16 - sa;
    d[3] = s[3].saturating_add(mul_div255_u8(u16::from(d[3]), inv));
    for c in 0..3 {
        let dc = mul_div255_u8(u16::from(d[c]), inv);
        d[c] = s[c].saturating_add(dc);
    }
}

/// Source-over composite of premultiplied RGBA8 `src` onto `dst`.
pub(crate) fn premul_over_in_place(dst: &mut [u8], src: &[u8]) -> KasuResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(KasuError::surface(
            "premul_over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        premul_over_px(d, [s[0], s[1], s[2], s[3]]);
    }
    Ok(())
}
