/// Snippet generation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcerptOptions {
    pub before_match: String,
    pub after_match: String,
    pub chunk_separator: String,
    /// Maximum snippet size, in characters.
    pub limit: u32,
    /// Words to keep around each matching keyword.
    pub around: u32,
    pub exact_phrase: bool,
    pub single_passage: bool,
    pub use_boundaries: bool,
    pub weight_order: bool,
}

impl Default for ExcerptOptions {
    fn default() -> Self {
        Self {
            before_match: "<b>".to_string(),
            after_match: "</b>".to_string(),
            chunk_separator: "...".to_string(),
            limit: 256,
            around: 5,
            exact_phrase: false,
            single_passage: false,
            use_boundaries: false,
            weight_order: false,
        }
    }
}

const FLAG_REMOVE_SPACES: u32 = 1;
const FLAG_EXACT_PHRASE: u32 = 2;
const FLAG_SINGLE_PASSAGE: u32 = 4;
const FLAG_USE_BOUNDARIES: u32 = 8;
const FLAG_WEIGHT_ORDER: u32 = 16;

impl ExcerptOptions {
    pub fn flags(&self) -> u32 {
        let mut flags = FLAG_REMOVE_SPACES;
        if self.exact_phrase {
            flags |= FLAG_EXACT_PHRASE;
        }
        if self.single_passage {
            flags |= FLAG_SINGLE_PASSAGE;
        }
        if self.use_boundaries {
            flags |= FLAG_USE_BOUNDARIES;
        }
        if self.weight_order {
            flags |= FLAG_WEIGHT_ORDER;
        }
        flags
    }
}
