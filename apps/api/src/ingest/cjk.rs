//! CJK boundary oracle used when stitching PDF text runs back together.
//!
//! Only the CJK Unified Ideographs block U+4E00..=U+9FA5 is recognized. Kana, Hangul
//! and other scripts without word spacing (Thai, Lao) are treated as spaced text.

const CJK_IDEOGRAPH_START: char = '\u{4E00}';
const CJK_IDEOGRAPH_END: char = '\u{9FA5}';

/// Returns true if `c` is a CJK unified ideograph.
pub fn is_cjk(c: char) -> bool {
    (CJK_IDEOGRAPH_START..=CJK_IDEOGRAPH_END).contains(&c)
}
