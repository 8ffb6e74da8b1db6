//! a trait for things that can serve font tables

use types::Tag;

use crate::{
    read::{FontStruct, ReadError},
    table_ref::TableRef,
    window::{OriginId, TableData, Window},
};

/// An interface for accessing tables from a font (or font-like object).
///
/// Implementors only locate tables; they don't validate their contents.
/// The declared length they report becomes the bound of the root window.
pub trait TableProvider<'a> {
    /// The bytes and declared length of the table `tag`, if present.
    fn table_data(&self, tag: Tag) -> Option<TableData<'a>>;

    /// The identity of this font, attached to every root window.
    fn origin(&self) -> Option<OriginId> {
        None
    }

    /// A root window over the table `tag`.
    ///
    /// A missing table produces an empty window; this is not an error.
    fn root(&self, tag: Tag) -> Window<'a, 'a> {
        Window::from_table(self.origin(), tag, self.table_data(tag))
    }

    /// A root window over the table `tag`, which must be present.
    fn expect_root(&self, tag: Tag) -> Result<Window<'a, 'a>, ReadError> {
        let table = self
            .table_data(tag)
            .ok_or(ReadError::TableIsMissing(tag))?;
        Ok(Window::from_table(self.origin(), tag, Some(table)))
    }

    /// A reference to the header of the table `tag`.
    fn table_ref<T: FontStruct>(&self, tag: Tag) -> Result<TableRef<'a, 'a, T>, ReadError>
    where
        Self: Sized,
    {
        TableRef::root(self, tag)
    }
}
