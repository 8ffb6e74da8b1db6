//! Typed references to structures in font data

use std::marker::PhantomData;

use types::{Scalar, Tag};

use crate::{
    array::{ArrayRef, Count},
    read::{FontStruct, ReadError},
    table_provider::TableProvider,
    window::{Length, Window},
};

/// A [`Window`] known to hold at least one `T`.
///
/// Construction establishes the window (validated against its parent) and
/// then checks that `T::MIN_BYTE_LEN` bytes fit in it. A reference to a
/// missing table is empty rather than an error; check [`TableRef::is_valid`]
/// or use [`TableRef::alias`], which returns `None` for empty references.
pub struct TableRef<'a, 'p, T> {
    window: Window<'a, 'p>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, 'p, T: FontStruct> TableRef<'a, 'p, T> {
    /// A reference to the `T` at `offset` in `parent`.
    pub fn new(parent: &'p Window<'a, '_>, offset: usize) -> Result<Self, ReadError> {
        parent.split_off(offset).and_then(Self::from_window)
    }

    /// A reference to the `T` at `ptr`, which must point into `parent`.
    ///
    /// `None` refers to the start of `parent`.
    pub fn at_pointer<U: ?Sized>(
        parent: &'p Window<'a, '_>,
        ptr: Option<&U>,
    ) -> Result<Self, ReadError> {
        Self::new(parent, parent.pointer_to_offset(ptr)?)
    }

    /// A reference to the `T` at `extra` bytes past `ptr` in `parent`.
    pub fn at_pointer_offset<U: ?Sized>(
        parent: &'p Window<'a, '_>,
        ptr: Option<&U>,
        extra: usize,
    ) -> Result<Self, ReadError> {
        let offset = parent
            .pointer_to_offset(ptr)?
            .checked_add(extra)
            .ok_or(ReadError::OutOfBounds)?;
        Self::new(parent, offset)
    }

    /// Treat an existing window as a reference to `T`.
    pub fn from_window(window: Window<'a, 'p>) -> Result<Self, ReadError> {
        window.verify_length(0, Length::Bounded(T::MIN_BYTE_LEN))?;
        Ok(TableRef {
            window,
            _marker: PhantomData,
        })
    }

    /// The current `T`, if the window holds all of its bytes.
    ///
    /// Types that override [`FontStruct::MIN_BYTE_LEN`] may be valid without
    /// being fully present; read their fixed fields with
    /// [`TableRef::read_at`] instead.
    pub fn alias(&self) -> Option<&'a T> {
        self.window.read_ref_at(0).ok()
    }

    /// Read a scalar field at `offset` from the start of the structure.
    pub fn read_at<S: Scalar>(&self, offset: usize) -> Result<S, ReadError> {
        self.window.read_at(offset)
    }

    /// Advance the reference by `count` instances of `T`.
    pub fn add_object(&mut self, count: usize) -> Result<(), ReadError> {
        let len = count
            .checked_mul(T::MIN_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        self.window.add_offset(len)
    }

    /// The variable-length array that follows the fixed part of `T`.
    pub fn trailing_array<U: FontStruct>(
        &self,
        count: Count,
    ) -> Result<ArrayRef<'a, '_, U>, ReadError> {
        ArrayRef::new(&self.window, T::MIN_BYTE_LEN, count)
    }
}

impl<'a, T: FontStruct> TableRef<'a, 'a, T> {
    /// A reference to the start of the table `tag` in `provider`.
    ///
    /// A missing table produces an empty reference, not an error.
    pub fn root(provider: &impl TableProvider<'a>, tag: Tag) -> Result<Self, ReadError> {
        Self::from_window(provider.root(tag))
    }

    /// An unvalidated reference over `bytes`.
    ///
    /// This skips the size check performed by every other constructor, and
    /// should only be used for data that has already been validated.
    pub fn from_raw(bytes: &'a [u8]) -> Self {
        TableRef {
            window: Window::raw(bytes),
            _marker: PhantomData,
        }
    }
}

impl<'a, 'p, T> TableRef<'a, 'p, T> {
    /// The underlying window.
    pub fn window(&self) -> &Window<'a, 'p> {
        &self.window
    }

    /// Convert into the underlying window.
    pub fn into_window(self) -> Window<'a, 'p> {
        self.window
    }

    /// `true` if the reference has no data.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// `true` if the reference has data.
    pub fn is_valid(&self) -> bool {
        self.window.is_valid()
    }

    /// Change the parent link of the underlying window.
    pub fn reparent(&mut self, parent: &'p Window<'a, 'p>) -> &mut Self {
        self.window.reparent(parent);
        self
    }

    /// Remove the parent link of the underlying window.
    pub fn orphan(self) -> TableRef<'a, 'a, T> {
        TableRef {
            window: self.window.orphan(),
            _marker: PhantomData,
        }
    }
}

// manual impls so that `T` needn't be `Clone`
impl<T> Clone for TableRef<'_, '_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TableRef<'_, '_, T> {}

impl<T> Default for TableRef<'_, '_, T> {
    fn default() -> Self {
        TableRef {
            window: Window::default(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for TableRef<'_, '_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableRef")
            .field("type", &std::any::type_name::<T>())
            .field("window", &self.window)
            .finish()
    }
}
