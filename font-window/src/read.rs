//! Traits for interpreting font data

use types::{BigEndian, Scalar, Tag};

/// A structure that can be viewed in place over font data.
///
/// Implementors are plain-old-data views (`#[repr(C, packed)]` structs made
/// of [`BigEndian`] fields and bytes) so any bit pattern is valid and the
/// alignment is always 1.
///
/// `MIN_BYTE_LEN` is the number of bytes that must be present before a
/// [`TableRef`](crate::TableRef) or [`ArrayRef`](crate::ArrayRef) will accept
/// the structure. It defaults to the full size of the type. Types whose last
/// member is a variable-length array (declared with a single placeholder
/// element) override it to exclude that member, since its real length is not
/// known until the header has been read:
///
/// ```
/// use font_window::{FontStruct, types::BigEndian};
///
/// #[derive(Clone, Copy, bytemuck::AnyBitPattern)]
/// #[repr(C, packed)]
/// struct AttachPoint {
///     point_count: BigEndian<u16>,
///     point_indices: [BigEndian<u16>; 1],
/// }
///
/// impl FontStruct for AttachPoint {
///     const MIN_BYTE_LEN: usize = 2;
/// }
/// ```
pub trait FontStruct: bytemuck::AnyBitPattern {
    /// The minimum number of bytes required to hold this structure.
    const MIN_BYTE_LEN: usize = std::mem::size_of::<Self>();
}

impl FontStruct for u8 {}

impl<T: Scalar + Copy + 'static> FontStruct for BigEndian<T> {}

/// An error that occurs when reading font data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    /// An offset or length would reach outside a validated region.
    OutOfBounds,
    /// A cross-reference was not contained in the window it claims to belong to.
    IllegalArgument,
    /// A required table was not present.
    TableIsMissing(Tag),
    /// An allocation failed in a collaborator; never produced by this crate.
    OutOfMemory,
    /// An array's byte length is not compatible with its element type.
    InvalidArrayLen,
    /// The sfnt version of a font was not recognized.
    InvalidSfnt(u32),
    /// An offset was unexpectedly null.
    NullOffset,
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::OutOfBounds => write!(f, "An offset was out of bounds"),
            ReadError::IllegalArgument => {
                write!(f, "A reference was not contained in its parent table")
            }
            ReadError::TableIsMissing(tag) => write!(f, "the {tag} table is missing"),
            ReadError::OutOfMemory => write!(f, "Out of memory"),
            ReadError::InvalidArrayLen => {
                write!(f, "Specified array length not a multiple of item size")
            }
            ReadError::InvalidSfnt(ver) => write!(f, "Invalid sfnt version 0x{ver:08X}"),
            ReadError::NullOffset => write!(f, "An offset was unexpectedly null"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ReadError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, bytemuck::AnyBitPattern)]
    #[repr(C, packed)]
    struct Header {
        count: BigEndian<u16>,
        items: [BigEndian<u32>; 1],
    }

    impl FontStruct for Header {
        const MIN_BYTE_LEN: usize = 2;
    }

    #[derive(Clone, Copy, bytemuck::AnyBitPattern)]
    #[repr(C, packed)]
    struct Record {
        tag: BigEndian<Tag>,
        value: BigEndian<i16>,
    }

    impl FontStruct for Record {}

    #[test]
    fn default_size_is_natural_size() {
        assert_eq!(Record::MIN_BYTE_LEN, 6);
        assert_eq!(<BigEndian<u32>>::MIN_BYTE_LEN, 4);
        assert_eq!(u8::MIN_BYTE_LEN, 1);
    }

    #[test]
    fn override_excludes_trailing_array() {
        assert_eq!(std::mem::size_of::<Header>(), 6);
        assert_eq!(Header::MIN_BYTE_LEN, 2);
    }

    #[test]
    #[cfg(feature = "std")]
    fn display() {
        assert_eq!(
            ReadError::TableIsMissing(Tag::new(b"GSUB")).to_string(),
            "the GSUB table is missing"
        );
        assert_eq!(
            ReadError::InvalidSfnt(0xdead_beef).to_string(),
            "Invalid sfnt version 0xDEADBEEF"
        );
    }
}
