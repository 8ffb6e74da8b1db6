//! Bounds-checked arrays of structures in font data

use std::marker::PhantomData;

use crate::{
    read::{FontStruct, ReadError},
    status::Status,
    table_ref::TableRef,
    window::{Length, Window},
};

/// The number of elements in an [`ArrayRef`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Count {
    /// Exactly this many elements, usually read from a count field.
    Exact(u32),
    /// As many whole elements as fit in the window.
    ///
    /// For an unbounded window this is as many as are physically present.
    Unbounded,
}

impl From<u32> for Count {
    fn from(src: u32) -> Self {
        Count::Exact(src)
    }
}

impl From<u16> for Count {
    fn from(src: u16) -> Self {
        Count::Exact(src.into())
    }
}

/// A [`Window`] holding `count` consecutive `T`s.
///
/// Elements are `T::MIN_BYTE_LEN` bytes apart. Construction verifies that the
/// whole array fits in the window, so per-index access only needs to check
/// the index.
pub struct ArrayRef<'a, 'p, T> {
    window: Window<'a, 'p>,
    count: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, 'p, T: FontStruct> ArrayRef<'a, 'p, T> {
    /// An array of `count` elements at `offset` in `parent`.
    pub fn new(
        parent: &'p Window<'a, '_>,
        offset: usize,
        count: Count,
    ) -> Result<Self, ReadError> {
        parent
            .split_off(offset)
            .and_then(|window| Self::from_window(window, count))
    }

    /// An array of `count` elements at `ptr`, which must point into `parent`.
    pub fn at_pointer<U: ?Sized>(
        parent: &'p Window<'a, '_>,
        ptr: Option<&U>,
        count: Count,
    ) -> Result<Self, ReadError> {
        Self::new(parent, parent.pointer_to_offset(ptr)?, count)
    }

    /// An array of `count` elements `extra` bytes past `ptr` in `parent`.
    pub fn at_pointer_offset<U: ?Sized>(
        parent: &'p Window<'a, '_>,
        ptr: Option<&U>,
        extra: usize,
        count: Count,
    ) -> Result<Self, ReadError> {
        let offset = parent
            .pointer_to_offset(ptr)?
            .checked_add(extra)
            .ok_or(ReadError::OutOfBounds)?;
        Self::new(parent, offset, count)
    }

    /// Treat an existing window as an array.
    ///
    /// A cleared window, such as the root of a missing table, holds no
    /// elements whatever `count` says.
    pub fn from_window(window: Window<'a, 'p>, count: Count) -> Result<Self, ReadError> {
        if window.start_offset().is_none() {
            return Ok(ArrayRef {
                window,
                count: 0,
                _marker: PhantomData,
            });
        }
        let count = match count {
            Count::Exact(count) => count,
            Count::Unbounded => {
                let available = match window.len() {
                    Length::Bounded(len) => len,
                    Length::Unbounded => window.as_bytes().len(),
                };
                let count = available.checked_div(T::MIN_BYTE_LEN).unwrap_or(0);
                u32::try_from(count).unwrap_or(u32::MAX)
            }
        };
        let byte_len = (count as usize)
            .checked_mul(T::MIN_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        window.verify_length(0, Length::Bounded(byte_len))?;
        Ok(ArrayRef {
            window,
            count,
            _marker: PhantomData,
        })
    }

    /// The number of bytes between consecutive elements.
    pub fn element_len(&self) -> usize {
        T::MIN_BYTE_LEN
    }

    /// The number of bytes covered by the elements.
    pub fn byte_len(&self) -> usize {
        self.count as usize * T::MIN_BYTE_LEN
    }

    /// The offset of the element at `index` from the start of the array.
    pub fn get_offset_for(&self, index: u32) -> Result<usize, ReadError> {
        if index >= self.count {
            log::debug!("index {index} out of range for {} elements", self.count);
            return Err(ReadError::OutOfBounds);
        }
        (index as usize)
            .checked_mul(T::MIN_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)
    }

    /// The element at `index`.
    ///
    /// This views all `size_of::<T>()` bytes of the element. For types with
    /// a shorter [`FontStruct::MIN_BYTE_LEN`] the last elements may be in the
    /// array but not fully present, which is `OutOfBounds`; use
    /// [`ArrayRef::element`] to read their fixed fields.
    pub fn get(&self, index: u32) -> Result<&'a T, ReadError> {
        let offset = self.get_offset_for(index)?;
        self.window.read_ref_at(offset)
    }

    /// A reference to the element at `index`.
    ///
    /// Unlike [`ArrayRef::get`] this only requires the `T::MIN_BYTE_LEN`
    /// bytes validated at construction.
    pub fn element(&self, index: u32) -> Result<TableRef<'a, '_, T>, ReadError> {
        let offset = self.get_offset_for(index)?;
        TableRef::new(&self.window, offset)
    }

    /// The element at `index`, falling back to the first element.
    ///
    /// An out-of-range index records [`ReadError::OutOfBounds`] in `status`
    /// and returns element 0 instead, which is wrong data but always a valid
    /// reference. Callers that use the result must check `status`. Prefer
    /// [`ArrayRef::get`], which reports the failure directly.
    ///
    /// Returns `None` only when element 0 is not physically present. If
    /// `status` already holds an error, this always returns element 0.
    pub fn alias_or_first(&self, index: u32, status: &mut Status) -> Option<&'a T> {
        if status.is_ok() {
            if let Some(element) = status.record(self.get(index)) {
                return Some(element);
            }
        }
        self.window.read_ref_at(0).ok()
    }

    /// The offset of the element at `index`, or 0 on failure.
    ///
    /// Failures are recorded in `status`.
    pub fn offset_or_zero(&self, index: u32, status: &mut Status) -> usize {
        status.check(|| self.get_offset_for(index))
    }

    /// Iterate over the elements of the array.
    ///
    /// Every element is verified to be in the window, but in an unbounded
    /// window an element may not be physically present; such elements are
    /// errors. Items are produced by [`ArrayRef::get`], with the same
    /// caveat for types with a shorter `MIN_BYTE_LEN`.
    pub fn iter(&self) -> impl Iterator<Item = Result<&'a T, ReadError>> + '_ {
        (0..self.count).map(move |i| self.get(i))
    }

    /// The elements of the array as a slice.
    ///
    /// This requires that elements are exactly `size_of::<T>()` bytes apart,
    /// and is [`ReadError::InvalidArrayLen`] for types that override
    /// [`FontStruct::MIN_BYTE_LEN`].
    pub fn as_slice(&self) -> Result<&'a [T], ReadError> {
        if T::MIN_BYTE_LEN != std::mem::size_of::<T>() {
            return Err(ReadError::InvalidArrayLen);
        }
        self.window.read_array(0, self.count as usize)
    }

    /// Re-anchor the array at `offset` past the start of `base`.
    ///
    /// `base` must lie within this array's parent; the new position is
    /// validated against the parent, and the array's window becomes the rest
    /// of the parent from the new start. This resolves arrays addressed
    /// relative to some other subtable of the same parent.
    ///
    /// On any failure the array is cleared. A missing parent, or a `base`
    /// outside it, is [`ReadError::IllegalArgument`]; any other failure is
    /// [`ReadError::OutOfBounds`].
    pub fn set_to_offset_in_parent(
        &mut self,
        base: &Window<'a, '_>,
        offset: usize,
        count: u32,
    ) -> Result<(), ReadError> {
        let result = self.reanchor(base, offset, count);
        if result.is_err() {
            self.window.clear();
            self.count = 0;
        }
        result
    }

    fn reanchor(
        &mut self,
        base: &Window<'a, '_>,
        offset: usize,
        count: u32,
    ) -> Result<(), ReadError> {
        let parent = self.window.parent().ok_or(ReadError::IllegalArgument)?;
        if !base.is_subset_of(parent) {
            log::debug!("'{}' base window is not within the parent", parent.tag());
            return Err(ReadError::IllegalArgument);
        }
        let target = base
            .address()
            .and_then(|address| address.checked_add(offset))
            .ok_or(ReadError::OutOfBounds)?;
        let new_offset = parent.address_to_offset(target)?;
        let span = (count as usize)
            .checked_mul(T::MIN_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        let len = match parent.len() {
            Length::Bounded(parent_len) => {
                let fits = new_offset < parent_len
                    && new_offset
                        .checked_add(span)
                        .is_some_and(|end| end <= parent_len);
                if !fits {
                    let what = "set_to_offset_in_parent bad length";
                    return Err(parent.bounds_error(what, new_offset, Length::Bounded(span)));
                }
                Length::Bounded(parent_len - new_offset)
            }
            Length::Unbounded => Length::Unbounded,
        };
        let start = parent
            .start_offset()
            .and_then(|start| start.checked_add(new_offset))
            .ok_or(ReadError::OutOfBounds)?;
        parent
            .check_address(start, len)
            .ok_or(ReadError::OutOfBounds)?;
        self.window.set_bounds(parent.data(), start, len);
        self.count = count;
        Ok(())
    }
}

impl<'a, 'p, T> ArrayRef<'a, 'p, T> {
    /// The number of elements.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The number of elements, as a `usize`.
    pub fn len(&self) -> usize {
        self.count as usize
    }

    /// `true` if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The underlying window.
    pub fn window(&self) -> &Window<'a, 'p> {
        &self.window
    }

    /// Change the parent link of the underlying window.
    pub fn reparent(&mut self, parent: &'p Window<'a, 'p>) -> &mut Self {
        self.window.reparent(parent);
        self
    }

    /// Remove the parent link of the underlying window.
    pub fn orphan(self) -> ArrayRef<'a, 'a, T> {
        ArrayRef {
            window: self.window.orphan(),
            count: self.count,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for ArrayRef<'_, '_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArrayRef<'_, '_, T> {}

impl<T> Default for ArrayRef<'_, '_, T> {
    fn default() -> Self {
        ArrayRef {
            window: Window::default(),
            count: 0,
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for ArrayRef<'_, '_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayRef")
            .field("type", &std::any::type_name::<T>())
            .field("count", &self.count)
            .field("window", &self.window)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use font_test_data::bebuffer::BeBuffer;
    use rstest::rstest;
    use types::BigEndian;

    use super::*;

    #[derive(Clone, Copy, bytemuck::AnyBitPattern)]
    #[repr(C, packed)]
    struct Range {
        start: BigEndian<u16>,
        end: BigEndian<u16>,
        value: BigEndian<u16>,
    }

    impl FontStruct for Range {}

    #[derive(Clone, Copy, bytemuck::AnyBitPattern)]
    #[repr(C, packed)]
    struct Short {
        value: BigEndian<u16>,
        padding: [u8; 2],
    }

    impl FontStruct for Short {
        const MIN_BYTE_LEN: usize = 2;
    }

    fn twenty_bytes() -> BeBuffer {
        BeBuffer::new().extend([10u32, 11, 12, 13, 14])
    }

    #[test]
    fn unbounded_count_fits_window() {
        let data = twenty_bytes();
        let root = Window::raw(&data);
        let array = ArrayRef::<BigEndian<u32>>::new(&root, 0, Count::Unbounded).unwrap();
        assert_eq!(array.count(), 5);
        assert_eq!(array.get_offset_for(4), Ok(16));
        assert_eq!(array.get(4).unwrap().get(), 14);
        assert_eq!(array.get(5).unwrap_err(), ReadError::OutOfBounds);

        let mut status = Status::new();
        let fallback = array.alias_or_first(5, &mut status).unwrap();
        assert_eq!(fallback.get(), 10);
        assert_eq!(status.error(), Some(ReadError::OutOfBounds));
        assert_eq!(array.offset_or_zero(5, &mut Status::new()), 0);
    }

    #[rstest]
    #[case(0, 3)]
    #[case(2, 3)]
    #[case(3, 2)]
    #[case(14, 1)]
    #[case(15, 0)]
    #[case(20, 0)]
    fn unbounded_count_rounds_down(#[case] offset: usize, #[case] expected: u32) {
        let data = BeBuffer::new().extend([0u8; 20]);
        let root = Window::raw(&data);
        let array = ArrayRef::<Range>::new(&root, offset, Count::Unbounded).unwrap();
        assert_eq!(array.count(), expected);
    }

    #[test]
    fn exact_count_must_fit() {
        let data = twenty_bytes();
        let root = Window::raw(&data);
        let array = ArrayRef::<BigEndian<u32>>::new(&root, 4, Count::Exact(4)).unwrap();
        assert_eq!(array.byte_len(), 16);
        assert_eq!(
            ArrayRef::<BigEndian<u32>>::new(&root, 4, Count::Exact(5)).unwrap_err(),
            ReadError::OutOfBounds
        );
        assert_eq!(
            ArrayRef::<Range>::new(&root, 0, Count::Exact(u32::MAX)).unwrap_err(),
            ReadError::OutOfBounds
        );
    }

    #[test]
    fn empty_array_falls_back_to_first_element() {
        let data = twenty_bytes();
        let root = Window::raw(&data);
        let array = ArrayRef::<BigEndian<u32>>::new(&root, 8, Count::Exact(0)).unwrap();
        assert!(array.is_empty());
        let mut status = Status::new();
        assert_eq!(array.alias_or_first(0, &mut status).unwrap().get(), 12);
        assert_eq!(status.error(), Some(ReadError::OutOfBounds));

        // nothing to fall back to
        let end = ArrayRef::<BigEndian<u32>>::new(&root, 20, Count::Exact(0)).unwrap();
        assert!(end.alias_or_first(0, &mut Status::new()).is_none());
    }

    #[test]
    fn failed_status_short_circuits() {
        let data = twenty_bytes();
        let root = Window::raw(&data);
        let array = ArrayRef::<BigEndian<u32>>::new(&root, 0, Count::Unbounded).unwrap();
        let mut status = Status::new();
        status.fail(ReadError::IllegalArgument);
        assert_eq!(array.alias_or_first(3, &mut status).unwrap().get(), 10);
        assert_eq!(array.offset_or_zero(3, &mut status), 0);
        assert_eq!(status.error(), Some(ReadError::IllegalArgument));
    }

    #[test]
    fn missing_table_has_no_elements() {
        let root = Window::from_table(None, types::Tag::new(b"kern"), None);
        let array = ArrayRef::<BigEndian<u16>>::new(&root, 0, Count::Exact(12)).unwrap();
        assert!(array.is_empty());
        assert!(array.get(0).is_err());
        assert_eq!(array.iter().count(), 0);
    }

    #[test]
    fn unbounded_window_counts_physical_elements() {
        let data = BeBuffer::new().extend([1u16, 2, 3]).push(4u8);
        let root = Window::raw_unbounded(&data);
        let array = ArrayRef::<BigEndian<u16>>::new(&root, 0, Count::Unbounded).unwrap();
        assert_eq!(array.count(), 3);
        // an unbounded window can't prove that an exact count is wrong
        let trusted = ArrayRef::<BigEndian<u16>>::new(&root, 0, Count::Exact(5)).unwrap();
        let values = trusted.iter().collect::<Vec<_>>();
        assert_eq!(values.len(), 5);
        assert_eq!(values[2].unwrap().get(), 3);
        assert_eq!(values[3].unwrap_err(), ReadError::OutOfBounds);
    }

    #[test]
    fn slices_and_strides() {
        let data = BeBuffer::new().extend([1u16, 0, 2, 0, 3, 0]);
        let root = Window::raw(&data);
        let array = ArrayRef::<BigEndian<u16>>::new(&root, 0, Count::Unbounded).unwrap();
        let slice = array.as_slice().unwrap();
        assert_eq!(slice.len(), 6);
        assert_eq!(slice[4].get(), 3);

        let short = ArrayRef::<Short>::new(&root, 0, Count::Exact(3)).unwrap();
        assert_eq!(short.element_len(), 2);
        assert_eq!(short.get(1).unwrap().value.get(), 0);
        assert_eq!(short.as_slice().err(), Some(ReadError::InvalidArrayLen));
    }

    #[test]
    fn short_elements_at_the_end() {
        let data = BeBuffer::new().extend([1u16, 2, 3]);
        let root = Window::raw(&data);
        let array = ArrayRef::<Short>::new(&root, 0, Count::Exact(3)).unwrap();
        assert_eq!(array.byte_len(), 6);
        assert_eq!(array.get(1).unwrap().value.get(), 2);
        // the last element's padding is past the end of the data
        assert!(array.get(2).is_err());

        let last = array.element(2).unwrap();
        assert_eq!(last.read_at::<u16>(0), Ok(3));
        assert!(last.alias().is_none());
        assert_eq!(array.element(3).unwrap_err(), ReadError::OutOfBounds);
    }

    #[test]
    fn iterate_records() {
        let data = BeBuffer::new().extend([1u16, 5, 100, 6, 9, 200]);
        let root = Window::raw(&data);
        let ranges = ArrayRef::<Range>::new(&root, 0, Count::Exact(2)).unwrap();
        let values = ranges
            .iter()
            .map(|range| range.map(|r| (r.start.get(), r.end.get(), r.value.get())))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(values, vec![(1, 5, 100), (6, 9, 200)]);
    }

    #[test]
    fn reanchor_within_parent() {
        let data = BeBuffer::new().extend([0u16, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let table = Window::raw(&data);
        let base = table.subset(8, Length::Bounded(8)).unwrap();
        let mut array = ArrayRef::<BigEndian<u16>>::new(&table, 0, Count::Exact(1)).unwrap();

        array.set_to_offset_in_parent(&base, 2, 3).unwrap();
        assert_eq!(array.count(), 3);
        // rest of the parent from the new start
        assert_eq!(array.window().len(), Length::Bounded(10));
        assert_eq!(array.get(0).unwrap().get(), 5);
        assert_eq!(array.get(2).unwrap().get(), 7);
    }

    #[test]
    fn reanchor_past_parent_end() {
        let data = BeBuffer::new().extend([0u16, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let table = Window::raw(&data);
        let base = table.subset(8, Length::Bounded(8)).unwrap();
        let mut array = ArrayRef::<BigEndian<u16>>::new(&table, 0, Count::Exact(1)).unwrap();
        // ten bytes remain after offset 10, six elements need twelve
        assert_eq!(
            array.set_to_offset_in_parent(&base, 2, 6),
            Err(ReadError::OutOfBounds)
        );
        assert!(array.is_empty());
        assert!(array.window().is_empty());

        let mut array = ArrayRef::<BigEndian<u16>>::new(&table, 0, Count::Exact(1)).unwrap();
        assert_eq!(
            array.set_to_offset_in_parent(&base, 30, 1),
            Err(ReadError::OutOfBounds)
        );

        let mut array = ArrayRef::<BigEndian<u16>>::new(&table, 0, Count::Exact(1)).unwrap();
        assert_eq!(
            array.set_to_offset_in_parent(&base, 2, u32::MAX),
            Err(ReadError::OutOfBounds)
        );
    }

    #[test]
    fn reanchor_requires_contained_base() {
        let data = BeBuffer::new().extend([0u16, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let table = Window::raw(&data);
        let elsewhere = [0u8; 8];
        let foreign = Window::raw(&elsewhere);
        let mut array = ArrayRef::<BigEndian<u16>>::new(&table, 0, Count::Exact(1)).unwrap();
        assert_eq!(
            array.set_to_offset_in_parent(&foreign, 0, 1),
            Err(ReadError::IllegalArgument)
        );
        assert_eq!(array.count(), 0);

        let mut orphan = ArrayRef::<BigEndian<u16>>::from_window(table, Count::Unbounded).unwrap();
        assert_eq!(
            orphan.set_to_offset_in_parent(&table, 0, 1),
            Err(ReadError::IllegalArgument)
        );
    }

    #[test]
    fn reanchor_in_unbounded_parent() {
        let data = BeBuffer::new().extend([0u16, 1, 2, 3, 4, 5]);
        let table = Window::raw_unbounded(&data);
        let base = table.split_off(4).unwrap();
        let mut array = ArrayRef::<BigEndian<u16>>::new(&table, 0, Count::Exact(1)).unwrap();
        array.set_to_offset_in_parent(&base, 2, 2).unwrap();
        assert_eq!(array.window().len(), Length::Unbounded);
        assert_eq!(array.get(1).unwrap().get(), 4);
    }
}
