//! Bounds-checked references into font data
//!
//! This crate provides a small, memory safe layer for walking the nested,
//! offset-linked structures of OpenType and TrueType fonts. It does not
//! interpret any table; it only proves that each byte range a parser asks
//! for lies inside a region that was validated before it.
//!
//! The layer has three parts:
//!
//! - a [`Window`] is a start position plus a [`Length`] (which may be
//!   unbounded). Windows are derived from one another by offset, and each
//!   derivation is checked against its parent.
//! - a [`TableRef`] is a window known to hold at least one structure of some
//!   [`FontStruct`] type.
//! - an [`ArrayRef`] is a window holding a counted run of structures, with
//!   checked access by index.
//!
//! Root windows come from a [`TableProvider`], such as [`FontRef`]. Every
//! fallible operation returns a `Result`; to check for errors only at the
//! end of a parse, run operations through a [`Status`], which records the
//! first failure and makes every later operation a no-op.
//!
//! # Example
//!
//! ```
//! use font_window::{types::Tag, Count, FontRef, Length, Status, TableProvider};
//! # let font_bytes = font_test_data::MINI_FONT;
//! let font = FontRef::new(font_bytes).unwrap();
//! let gsub = font.root(Tag::new(b"GSUB"));
//!
//! let mut status = Status::new();
//! let feature_list_offset: u16 = status.check(|| gsub.read_at(6));
//! let feature_list = status.check(|| gsub.split_off(feature_list_offset as usize));
//! let count: u16 = status.check(|| feature_list.read_at(0));
//! let records = status.check(|| feature_list.subset(2, Length::Bounded(count as usize * 6)));
//! assert_eq!(records.as_bytes().len(), 12);
//! assert!(status.into_result().is_ok());
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[cfg(all(not(feature = "std"), not(test)))]
#[macro_use]
extern crate core as std;

mod array;
mod font_ref;
mod read;
mod status;
mod table_provider;
mod table_ref;
mod window;

pub use array::{ArrayRef, Count};
pub use font_ref::{FontRef, TableDirectory, TableRecord};
pub use read::{FontStruct, ReadError};
pub use status::Status;
pub use table_provider::TableProvider;
pub use table_ref::TableRef;
pub use window::{
    Cursor, Length, OriginId, TableData, Window, DESTROYED_TABLE_TAG, UNKNOWN_TABLE_TAG,
};

/// Public re-export of the font-types crate.
pub extern crate font_types as types;
