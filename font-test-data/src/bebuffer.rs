//! small utilities for building test fixtures

use std::collections::HashMap;

use font_types::Scalar;

/// A convenience type for generating a buffer of big-endian bytes.
#[derive(Debug, Clone, Default)]
pub struct BeBuffer {
    data: Vec<u8>,
    tagged_locations: HashMap<String, usize>,
}

impl BeBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    /// The current length of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the buffer contains zero bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Return a reference to the contents of the buffer
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Write any scalar to this buffer.
    pub fn push(mut self, item: impl Scalar) -> Self {
        self.data.extend(item.to_raw().as_ref());
        self
    }

    /// Write a scalar, remembering its position as `tag`.
    pub fn push_with_tag(mut self, item: impl Scalar, tag: &str) -> Self {
        self.tagged_locations
            .insert(tag.to_string(), self.data.len());
        self.data.extend(item.to_raw().as_ref());
        self
    }

    /// Write multiple scalars into the buffer
    pub fn extend<T: Scalar>(mut self, iter: impl IntoIterator<Item = T>) -> Self {
        for item in iter {
            self.data.extend(item.to_raw().as_ref());
        }
        self
    }

    /// The position of the item pushed with `tag`.
    ///
    /// Panics if no item was pushed with this tag.
    pub fn offset_for(&self, tag: &str) -> usize {
        // panic on unrecognized tags
        self.tagged_locations.get(tag).copied().unwrap()
    }

    /// Overwrite the bytes at the position of `tag` with `item`.
    ///
    /// This is used to patch in offsets that aren't known until later
    /// parts of the buffer have been written.
    pub fn write_at(&mut self, tag: &str, item: impl Scalar) {
        let offset = self.offset_for(tag);
        let raw = item.to_raw();
        let new_data: &[u8] = raw.as_ref();
        let data = &mut self.data[offset..];

        if data.len() < new_data.len() {
            panic!("not enough room left in buffer for the requested write.");
        }

        for (left, right) in data.iter_mut().zip(new_data) {
            *left = *right
        }
    }

    /// Return the contents of the buffer, truncated to `len` bytes.
    pub fn truncated(mut self, len: usize) -> Self {
        self.data.truncate(len);
        self
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.data.clone()
    }
}

impl std::ops::Deref for BeBuffer {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl AsRef<[u8]> for BeBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Build a [`BeBuffer`] from a list of items.
///
/// Each item is one of:
/// - a scalar literal or a parenthesized expression, which is pushed;
/// - a bracketed list of scalars, which are all pushed;
/// - `{value: "tag"}`, which pushes `value` and records its position, for
///   later use with [`BeBuffer::offset_for`] or [`BeBuffer::write_at`].
///
/// ```
/// use font_test_data::be_buffer;
///
/// let buf = be_buffer! {
///     1u16,
///     {0u16: "offset"},
///     [3u8, 4, 5]
/// };
/// assert_eq!(buf.as_slice(), &[0, 1, 0, 0, 3, 4, 5]);
/// assert_eq!(buf.offset_for("offset"), 2);
/// ```
#[macro_export]
macro_rules! be_buffer {
    ( $( $item:tt ),* $(,)? ) => {{
        let builder = $crate::bebuffer::BeBuffer::new();
        $(
            let builder = $crate::be_buffer_add!(builder, $item);
        )*
        builder
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! be_buffer_add {
    ($b:ident, { $value:tt : $tag:literal }) => {
        $b.push_with_tag($value, $tag)
    };
    ($b:ident, [ $( $value:expr ),* $(,)? ]) => {
        $b.extend([ $( $value ),* ])
    };
    ($b:ident, $value:tt) => {
        $b.push($value)
    };
}
