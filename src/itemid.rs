use core::fmt;

use binread::BinRead;
use getset::Getters;

/// The raw framing of one element of a stored IDList: a 16-bit size
/// (including the size field itself) followed by the shell-data payload.
/// Interpretation of the payload happens one layer up.
#[derive(Clone, BinRead, Default, Getters)]
#[getset(get = "pub")]
pub struct ItemID {
    /// The size, in bytes, of the ItemID structure, including this field.
    /// Zero marks the list terminator.
    #[br(assert(size == 0 || size > 2))]
    size: u16,

    /// The shell data source-defined data that specifies an item.
    #[br(if(size > 0), count = if size > 0 { size - 2 } else { 0 })]
    data: Vec<u8>,
}

impl fmt::Debug for ItemID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemID (raw data size {})", self.size)
    }
}
