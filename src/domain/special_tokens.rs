// ============================================================
// Layer 3 — Special Tokens
// ============================================================
// Reserved ids at the bottom of every vocabulary. The word
// vocabulary starts right after them, so ids stay contiguous
// and `vocab_size` bounds every id the model can see.
//
//   0 [PAD] — batch padding, and the all-zero prediction buffer
//   1 [UNK] — out-of-vocabulary words
//   2 [BOS] — first decoder input during teacher forcing
//   3 [EOS] — appended to every target sentence

pub const PAD_TOKEN: &str = "[PAD]";
pub const UNK_TOKEN: &str = "[UNK]";
pub const BOS_TOKEN: &str = "[BOS]";
pub const EOS_TOKEN: &str = "[EOS]";

pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;
pub const BOS_ID: u32 = 2;
pub const EOS_ID: u32 = 3;

/// (token, id) pairs in id order
pub const SPECIAL_TOKENS: [(&str, u32); 4] = [
    (PAD_TOKEN, PAD_ID),
    (UNK_TOKEN, UNK_ID),
    (BOS_TOKEN, BOS_ID),
    (EOS_TOKEN, EOS_ID),
];
