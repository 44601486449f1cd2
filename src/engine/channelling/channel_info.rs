use crate::containers::StorageKey;

/// Identifies a literaliser registered with the synchroniser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LiteraliserId {
    index: u32,
}

impl StorageKey for LiteraliserId {
    fn index(&self) -> usize {
        self.index as usize
    }

    fn create_from_index(index: usize) -> Self {
        LiteraliserId {
            index: index as u32,
        }
    }
}

impl std::fmt::Display for LiteraliserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ltz{}", self.index)
    }
}

/// The immutable link from a channelled SAT variable back to the literaliser that owns it.
///
/// The `reliable` flag states whether literals of this variable are directly explainable by
/// their own reason; unreliable literals (produced by lazily materialised domain facts) must
/// be expanded through their reasons before they may appear in a learnt clause.
#[derive(Debug, Clone, Copy)]
pub struct ChannelInfo {
    literaliser: LiteraliserId,
    reliable: bool,
}

impl ChannelInfo {
    pub fn new(literaliser: LiteraliserId, reliable: bool) -> ChannelInfo {
        ChannelInfo {
            literaliser,
            reliable,
        }
    }

    pub fn literaliser(&self) -> LiteraliserId {
        self.literaliser
    }

    pub fn is_reliable(&self) -> bool {
        self.reliable
    }
}
