//! Bounds-checked windows over raw font bytes

use types::{FixedSize, Scalar, Tag};

use crate::read::{FontStruct, ReadError};

/// The tag given to windows that were not loaded from a font.
pub const UNKNOWN_TABLE_TAG: Tag = Tag::new(b"????");

/// A tag marking a window that has been torn down.
///
/// Windows are plain values without a destructor, so nothing in this crate
/// assigns this tag; diagnostic tooling that recycles windows may use it.
pub const DESTROYED_TABLE_TAG: Tag = Tag::new(b"~~~~");

/// The length of a [`Window`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Length {
    /// The window covers exactly this many bytes.
    Bounded(usize),
    /// The extent of the window is not known.
    ///
    /// Bounds checks that would need the length pass, and all reads are
    /// limited by the backing buffer alone.
    Unbounded,
}

impl Length {
    /// The length in bytes, if it is known.
    pub const fn bounded(self) -> Option<usize> {
        match self {
            Length::Bounded(len) => Some(len),
            Length::Unbounded => None,
        }
    }

    /// `true` if the length is known.
    pub const fn is_bounded(self) -> bool {
        matches!(self, Length::Bounded(_))
    }
}

impl From<usize> for Length {
    fn from(src: usize) -> Self {
        Length::Bounded(src)
    }
}

/// An opaque identity for the font (or other owner) backing a window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OriginId(usize);

impl OriginId {
    /// Create an identity from an arbitrary value.
    pub const fn new(raw: usize) -> Self {
        OriginId(raw)
    }

    /// Create an identity from the address of `owner`.
    pub fn of<T: ?Sized>(owner: &T) -> Self {
        OriginId(owner as *const T as *const u8 as usize)
    }

    /// The raw identity value.
    pub const fn to_usize(self) -> usize {
        self.0
    }
}

/// A bounds-checked view of a range of font data.
///
/// A window is a start position in some backing buffer plus a
/// [`Length`], which may be unbounded. Windows are derived from one another
/// by offset (see [`Window::subset`]); every derivation is validated against
/// the immediate parent, so a chain of derivations can never escape the
/// root's bounds.
///
/// A derived window borrows its parent (`'p`), and every window borrows the
/// backing data (`'a`): a child cannot outlive its parent, and no window can
/// outlive the data. Windows without a parent are `Window<'a, 'a>`, which
/// coerces to any shorter parent lifetime.
///
/// Independently of the declared length, every byte access is also limited
/// by the physical extent of the backing buffer.
#[derive(Clone, Copy)]
pub struct Window<'a, 'p> {
    origin: Option<OriginId>,
    tag: Tag,
    parent: Option<&'p Window<'a, 'p>>,
    data: &'a [u8],
    // position of the window in `data`; `None` is a cleared window
    start: Option<usize>,
    len: Length,
}

impl<'a> Window<'a, 'a> {
    /// Create a window over `bytes`, with a length equal to the slice.
    ///
    /// No validation is performed, and the window has no parent or origin.
    pub const fn raw(bytes: &'a [u8]) -> Self {
        Self::raw_with_len(bytes, Length::Bounded(bytes.len()))
    }

    /// Create an unbounded window over `bytes`.
    ///
    /// The declared length is unknown, but reads are still limited to `bytes`.
    pub const fn raw_unbounded(bytes: &'a [u8]) -> Self {
        Self::raw_with_len(bytes, Length::Unbounded)
    }

    const fn raw_with_len(bytes: &'a [u8], len: Length) -> Self {
        Window {
            origin: None,
            tag: UNKNOWN_TABLE_TAG,
            parent: None,
            data: bytes,
            start: Some(0),
            len,
        }
    }

    /// Create a root window for a table supplied by a font.
    ///
    /// A missing table (`None`) produces an empty window; this is not an error.
    pub fn from_table(origin: Option<OriginId>, tag: Tag, table: Option<TableData<'a>>) -> Self {
        let (data, start, len) = match table {
            Some(table) => (table.data, Some(0), table.len),
            None => (&[][..], None, Length::Bounded(0)),
        };
        log::trace!("root window for '{tag}', {len:?}");
        Window {
            origin,
            tag,
            parent: None,
            data,
            start,
            len,
        }
    }
}

impl<'a, 'p> Window<'a, 'p> {
    /// Derive a window covering `len` bytes at `offset` from the start of this one.
    ///
    /// - An unbounded `len` shrinks to the rest of a bounded parent.
    /// - A zero length, offset zero in a cleared parent, or an offset landing
    ///   exactly at the end of a bounded parent produce an empty window (not
    ///   an error).
    /// - An offset past the end of a bounded parent, or a bounded range that
    ///   would end past it, is `OutOfBounds`. A cleared parent has a length
    ///   of zero, so any non-zero offset into it is out of bounds.
    /// - An unbounded parent accepts any offset that does not overflow.
    pub fn subset<'c>(&'c self, offset: usize, len: Length) -> Result<Window<'a, 'c>, ReadError> {
        let mut child = self.derive();
        child.len = len;
        if len == Length::Bounded(0) || (self.start.is_none() && offset == 0) {
            child.clear();
            return Ok(child);
        }
        let Some(parent_start) = self.start else {
            return Err(self.bounds_error("offset into cleared window", offset, len));
        };
        let start = parent_start
            .checked_add(offset)
            .ok_or_else(|| self.bounds_error("offset overflows", offset, len))?;
        if let Length::Bounded(parent_len) = self.len {
            if offset > parent_len {
                return Err(self.bounds_error("offset out of range", offset, len));
            }
            child.len = match len {
                Length::Unbounded => Length::Bounded(parent_len - offset),
                Length::Bounded(len) => match offset.checked_add(len) {
                    Some(end) if end <= parent_len => Length::Bounded(len),
                    _ => {
                        let what = "offset+length out of range";
                        return Err(self.bounds_error(what, offset, Length::Bounded(len)));
                    }
                },
            };
        }
        self.check_address(start, child.len)
            .ok_or_else(|| self.bounds_error("range wraps the address space", offset, len))?;
        child.start = Some(start);
        Ok(child)
    }

    /// Derive an unbounded window at `offset`, which shrinks to fit a bounded parent.
    pub fn split_off<'c>(&'c self, offset: usize) -> Result<Window<'a, 'c>, ReadError> {
        self.subset(offset, Length::Unbounded)
    }

    /// A copy of this window whose parent is this window.
    pub fn derive<'c>(&'c self) -> Window<'a, 'c> {
        Window {
            origin: self.origin,
            tag: self.tag,
            parent: Some(self),
            data: self.data,
            start: self.start,
            len: self.len,
        }
    }

    /// `true` if this window has no start, or a length of zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start.is_none() || self.len == Length::Bounded(0)
    }

    /// `true` if the window is not empty.
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.is_empty()
    }

    /// `true` if the length of this window is known.
    #[inline]
    pub fn has_bounds(&self) -> bool {
        self.len.is_bounded()
    }

    /// The declared length of this window.
    #[inline]
    pub fn len(&self) -> Length {
        self.len
    }

    /// The tag of the table this window belongs to.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The identity of the font this window was loaded from, if any.
    pub fn origin(&self) -> Option<OriginId> {
        self.origin
    }

    /// The window this one was derived from.
    pub fn parent(&self) -> Option<&'p Window<'a, 'p>> {
        self.parent
    }

    /// The position of this window in its backing buffer.
    pub fn start_offset(&self) -> Option<usize> {
        self.start
    }

    /// The address of the first byte of the window, for comparing positions.
    ///
    /// The address is not necessarily dereferencable: an unbounded window may
    /// start beyond the end of its backing buffer.
    pub fn address(&self) -> Option<usize> {
        // construction checked that this does not wrap
        self.start
            .map(|start| (self.data.as_ptr() as usize).wrapping_add(start))
    }

    /// The bytes of this window that are physically present.
    ///
    /// This is limited both by the declared length and by the backing buffer,
    /// and is empty for a cleared window.
    pub fn as_bytes(&self) -> &'a [u8] {
        let Some(start) = self.start else {
            return &[];
        };
        let available = self.data.get(start..).unwrap_or_default();
        match self.len {
            Length::Bounded(len) => available.get(..len).unwrap_or(available),
            Length::Unbounded => available,
        }
    }

    /// Advance the start of the window by `offset` bytes.
    ///
    /// A bounded window shrinks accordingly; it is `OutOfBounds` to advance
    /// past its end, in which case the window is unchanged.
    pub fn add_offset(&mut self, offset: usize) -> Result<(), ReadError> {
        let len = match self.len {
            Length::Bounded(len) if offset > len => {
                return Err(self.bounds_error("add_offset off end", offset, Length::Unbounded))
            }
            Length::Bounded(len) => Length::Bounded(len - offset),
            Length::Unbounded => Length::Unbounded,
        };
        if let Some(start) = self.start {
            let start = start
                .checked_add(offset)
                .and_then(|start| self.check_address(start, len).map(|_| start))
                .ok_or_else(|| self.bounds_error("add_offset overflows", offset, len))?;
            self.start = Some(start);
        }
        self.len = len;
        Ok(())
    }

    /// Convert a reference into this window's data back into an offset.
    ///
    /// `None` (an absent optional field) maps to offset zero. Otherwise the
    /// referenced location must be in `start..=start + len`; the end position
    /// itself is accepted.
    pub fn pointer_to_offset<T: ?Sized>(&self, ptr: Option<&T>) -> Result<usize, ReadError> {
        match ptr {
            None => Ok(0),
            Some(ptr) => self.address_to_offset(ptr as *const T as *const u8 as usize),
        }
    }

    pub(crate) fn address_to_offset(&self, address: usize) -> Result<usize, ReadError> {
        let start = self.address().ok_or(ReadError::OutOfBounds)?;
        let offset = address
            .checked_sub(start)
            .ok_or_else(|| self.bounds_error("pointer before start", 0, self.len))?;
        match self.len {
            Length::Bounded(len) if offset > len => {
                Err(self.bounds_error("pointer past end", offset, self.len))
            }
            _ => Ok(offset),
        }
    }

    /// Shrink the declared length of the window.
    ///
    /// This has no effect if `new_len` is zero, is larger than the current
    /// length, or if the window is unbounded. Returns the resulting length.
    pub fn contract_length(&mut self, new_len: usize) -> Length {
        if let Length::Bounded(len) = self.len {
            if new_len > 0 && new_len <= len {
                self.len = Length::Bounded(new_len);
            }
        }
        self.len
    }

    /// Check that `len` bytes at `offset` are within the window.
    ///
    /// Only a failure that can be proven is reported: a cleared window, an
    /// unbounded window, or an unbounded `len` all pass.
    pub fn verify_length(&self, offset: usize, len: Length) -> Result<(), ReadError> {
        let Length::Bounded(len) = len else {
            return Ok(());
        };
        match (self.start, self.len) {
            (Some(_), Length::Bounded(window_len)) => match offset.checked_add(len) {
                Some(end) if end <= window_len => Ok(()),
                _ => Err(self.bounds_error("verify_length failed", offset, len.into())),
            },
            _ => Ok(()),
        }
    }

    /// `true` if this window lies within `other`.
    ///
    /// This compares addresses, so it works for windows derived independently
    /// from the same data. A window is always a subset of itself. Otherwise
    /// this window must start at or after `other`, and, if `other` is bounded,
    /// start before its end and (when this window is bounded too) end no
    /// later than it.
    pub fn is_subset_of(&self, other: &Window<'a, '_>) -> bool {
        if std::ptr::eq(self as *const _ as *const u8, other as *const _ as *const u8) {
            return true;
        }
        let (Some(start), Some(base_start)) = (self.address(), other.address()) else {
            return false;
        };
        if start < base_start {
            return false;
        }
        if let Length::Bounded(base_len) = other.len {
            let base_end = base_start.saturating_add(base_len);
            if start >= base_end {
                return false;
            }
            if let Length::Bounded(len) = self.len {
                if start.saturating_add(len) > base_end {
                    return false;
                }
            }
        }
        true
    }

    /// Change the parent link, without changing the bounds.
    pub fn reparent(&mut self, parent: &'p Window<'a, 'p>) -> &mut Self {
        self.parent = Some(parent);
        self
    }

    /// Remove the parent link.
    ///
    /// Constructors that derive from a temporary window use this so the
    /// result does not borrow the temporary.
    pub fn orphan(self) -> Window<'a, 'a> {
        Window {
            origin: self.origin,
            tag: self.tag,
            parent: None,
            data: self.data,
            start: self.start,
            len: self.len,
        }
    }

    /// Read a scalar at `offset` from the start of the window.
    pub fn read_at<T: Scalar>(&self, offset: usize) -> Result<T, ReadError> {
        let end = offset
            .checked_add(T::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        self.as_bytes()
            .get(offset..end)
            .and_then(T::read)
            .ok_or_else(|| self.bounds_error("read out of range", offset, T::RAW_BYTE_LEN.into()))
    }

    /// Interpret the bytes at `offset` as a reference to `T`.
    ///
    /// All of `size_of::<T>()` bytes must be present in the window.
    pub fn read_ref_at<T: FontStruct>(&self, offset: usize) -> Result<&'a T, ReadError> {
        let len = std::mem::size_of::<T>();
        let end = offset.checked_add(len).ok_or(ReadError::OutOfBounds)?;
        let bytes = self
            .as_bytes()
            .get(offset..end)
            .ok_or_else(|| self.bounds_error("reference out of range", offset, len.into()))?;
        bytemuck::try_from_bytes(bytes).map_err(|_| ReadError::OutOfBounds)
    }

    /// Interpret `count` items of `T` at `offset` as a slice.
    pub fn read_array<T: FontStruct>(
        &self,
        offset: usize,
        count: usize,
    ) -> Result<&'a [T], ReadError> {
        let mut cursor = self.cursor();
        cursor.advance_by(offset);
        cursor.read_array(count)
    }

    /// A cursor for reading sequential fields from the start of the window.
    pub fn cursor(&self) -> Cursor<'a> {
        Cursor {
            pos: 0,
            bytes: self.as_bytes(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.start = None;
        self.len = Length::Bounded(0);
    }

    pub(crate) fn set_bounds(&mut self, data: &'a [u8], start: usize, len: Length) {
        self.data = data;
        self.start = Some(start);
        self.len = len;
    }

    pub(crate) fn data(&self) -> &'a [u8] {
        self.data
    }

    // the window [start, start + len) must be addressable without wrapping
    pub(crate) fn check_address(&self, start: usize, len: Length) -> Option<()> {
        let address = (self.data.as_ptr() as usize).checked_add(start)?;
        match len {
            Length::Bounded(len) => address.checked_add(len).map(|_| ()),
            Length::Unbounded => Some(()),
        }
    }

    pub(crate) fn bounds_error(&self, what: &str, offset: usize, len: Length) -> ReadError {
        log::debug!(
            "'{}' {what}: offset {offset}, length {len:?} in window of {:?}",
            self.tag,
            self.len
        );
        ReadError::OutOfBounds
    }
}

impl Default for Window<'_, '_> {
    fn default() -> Self {
        Window {
            origin: None,
            tag: UNKNOWN_TABLE_TAG,
            parent: None,
            data: &[],
            start: None,
            len: Length::Bounded(0),
        }
    }
}

impl std::fmt::Debug for Window<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("tag", &self.tag)
            .field("start", &self.start)
            .field("len", &self.len)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

impl AsRef<[u8]> for Window<'_, '_> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// The bytes and declared length of a table, as supplied by a font.
#[derive(Clone, Copy, Debug)]
pub struct TableData<'a> {
    data: &'a [u8],
    len: Length,
}

impl<'a> TableData<'a> {
    /// A table covering exactly `data`.
    pub const fn new(data: &'a [u8]) -> Self {
        TableData {
            data,
            len: Length::Bounded(data.len()),
        }
    }

    /// A table starting at `data` whose length is not known.
    ///
    /// Windows over this table can never read past the end of `data`.
    pub const fn unbounded(data: &'a [u8]) -> Self {
        TableData {
            data,
            len: Length::Unbounded,
        }
    }

    /// A table starting at `data` with a declared length of `len`.
    ///
    /// The declared length may exceed `data`, as for a table truncated by the
    /// end of the file; windows over it are still limited to `data` when
    /// reading.
    pub const fn with_len(data: &'a [u8], len: usize) -> Self {
        TableData {
            data,
            len: Length::Bounded(len),
        }
    }

    /// The bytes available for this table.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The declared length of the table.
    pub fn len(&self) -> Length {
        self.len
    }
}

/// A cursor for validating bytes during parsing.
///
/// Reads advance the position even when they fail, so a run of reads can
/// be checked once with [`Cursor::finish`].
pub struct Cursor<'a> {
    pos: usize,
    bytes: &'a [u8],
}

impl<'a> Cursor<'a> {
    /// Skip over a field of type `T`.
    pub fn advance<T: FixedSize>(&mut self) {
        self.pos = self.pos.saturating_add(T::RAW_BYTE_LEN);
    }

    /// Skip `n_bytes` bytes.
    pub fn advance_by(&mut self, n_bytes: usize) {
        self.pos = self.pos.saturating_add(n_bytes);
    }

    /// Read a scalar and advance past it.
    pub fn read<T: Scalar>(&mut self) -> Result<T, ReadError> {
        let start = self.pos;
        self.advance::<T>();
        self.bytes
            .get(start..self.pos)
            .and_then(T::read)
            .ok_or(ReadError::OutOfBounds)
    }

    /// Read `count` items of `T` and advance past them.
    pub fn read_array<T: FontStruct>(&mut self, count: usize) -> Result<&'a [T], ReadError> {
        let start = self.pos;
        let len = count
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(ReadError::OutOfBounds)?;
        self.advance_by(len);
        let bytes = self
            .bytes
            .get(start..self.pos)
            .ok_or(ReadError::OutOfBounds)?;
        bytemuck::try_cast_slice(bytes).map_err(|_| ReadError::InvalidArrayLen)
    }

    /// The current position, or an error if we are out of bounds.
    pub fn position(&self) -> Result<usize, ReadError> {
        if self.pos <= self.bytes.len() {
            Ok(self.pos)
        } else {
            Err(ReadError::OutOfBounds)
        }
    }

    /// The number of bytes after the current position.
    pub fn remaining_bytes(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    /// Check that every read so far was in bounds.
    pub fn finish(self) -> Result<usize, ReadError> {
        self.position()
    }
}
