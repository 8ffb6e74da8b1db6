//! Serving tables from an in-memory font

use types::{BigEndian, Offset32, Tag, CFF_SFNT_VERSION, TRUE_SFNT_VERSION, TT_SFNT_VERSION};

use crate::{
    array::{ArrayRef, Count},
    read::{FontStruct, ReadError},
    table_provider::TableProvider,
    table_ref::TableRef,
    window::{OriginId, TableData, Window},
};

/// The [table directory] at the start of a font file.
///
/// [table directory]: https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory
#[derive(Clone, Copy, bytemuck::AnyBitPattern)]
#[repr(C, packed)]
pub struct TableDirectory {
    /// 0x00010000, 'OTTO' or 'true'
    pub sfnt_version: BigEndian<u32>,
    /// Number of tables.
    pub num_tables: BigEndian<u16>,
    /// Largest power of two not above `num_tables`, times 16.
    pub search_range: BigEndian<u16>,
    /// Log2 of the largest power of two not above `num_tables`.
    pub entry_selector: BigEndian<u16>,
    /// `num_tables` times 16, minus `search_range`.
    pub range_shift: BigEndian<u16>,
    /// Table records, `num_tables` long.
    pub table_records: [TableRecord; 1],
}

impl FontStruct for TableDirectory {
    const MIN_BYTE_LEN: usize = 12;
}

/// A record locating one table in the font.
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C, packed)]
pub struct TableRecord {
    /// Table identifier.
    pub tag: BigEndian<Tag>,
    /// Checksum for the table.
    pub checksum: BigEndian<u32>,
    /// Offset from the beginning of the font data.
    pub offset: BigEndian<Offset32>,
    /// Length of the table.
    pub length: BigEndian<u32>,
}

impl FontStruct for TableRecord {}

impl std::fmt::Debug for TableRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableRecord")
            .field("tag", &self.tag.get())
            .field("offset", &self.offset.get().to_usize())
            .field("length", &self.length.get())
            .finish()
    }
}

/// Reference to an in-memory font.
///
/// This is a simple implementation of the [`TableProvider`] trait backed
/// by a borrowed slice containing font data. The table directory is read
/// through the window layer, so a font whose directory claims more records
/// than the data holds is rejected.
#[derive(Clone, Copy)]
pub struct FontRef<'a> {
    data: &'a [u8],
    sfnt_version: u32,
    records: ArrayRef<'a, 'a, TableRecord>,
    // fonts are required to have a sorted table directory, but some don't
    table_directory_sorted: bool,
}

impl<'a> FontRef<'a> {
    /// Creates a new reference to an in-memory font backed by the given data.
    ///
    /// The data must be a single font (not a font collection) and must begin
    /// with a table directory.
    pub fn new(data: &'a [u8]) -> Result<Self, ReadError> {
        let root = Window::raw(data);
        let directory = TableRef::<TableDirectory>::new(&root, 0)?;
        let sfnt_version = directory.read_at::<u32>(0)?;
        if ![TT_SFNT_VERSION, CFF_SFNT_VERSION, TRUE_SFNT_VERSION].contains(&sfnt_version) {
            return Err(ReadError::InvalidSfnt(sfnt_version));
        }
        let num_tables = directory.read_at::<u16>(4)?;
        let records = directory
            .trailing_array::<TableRecord>(Count::from(num_tables))?
            .orphan();
        let table_directory_sorted = records
            .as_slice()?
            .windows(2)
            .all(|pair| pair[0].tag.get() < pair[1].tag.get());
        if !table_directory_sorted {
            log::debug!("table directory is not sorted, falling back to linear search");
        }
        Ok(FontRef {
            data,
            sfnt_version,
            records,
            table_directory_sorted,
        })
    }

    /// Returns the underlying font data.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The sfnt version from the table directory.
    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    /// The records of the table directory.
    pub fn table_records(&self) -> &'a [TableRecord] {
        // checked in `new`
        self.records.as_slice().unwrap_or_default()
    }

    /// Returns the record for the table with the specified tag, if present.
    pub fn table_record(&self, tag: Tag) -> Option<&'a TableRecord> {
        let records = self.table_records();
        let idx = if self.table_directory_sorted {
            records
                .binary_search_by(|rec| rec.tag.get().cmp(&tag))
                .ok()
        } else {
            records.iter().position(|rec| rec.tag.get() == tag)
        };
        idx.and_then(|idx| records.get(idx))
    }
}

impl<'a> TableProvider<'a> for FontRef<'a> {
    /// Returns the data for the table with the specified tag, if present.
    ///
    /// A table that runs past the end of the font keeps its declared length;
    /// windows over it can read only the bytes that are actually present.
    fn table_data(&self, tag: Tag) -> Option<TableData<'a>> {
        let record = self.table_record(tag)?;
        let start = record.offset.get().non_null()?;
        let len = record.length.get() as usize;
        let Some(data) = self.data.get(start..) else {
            log::warn!("'{tag}' table starts at {start}, past the end of the font");
            return None;
        };
        if len > data.len() {
            log::warn!(
                "'{tag}' table is {len} bytes, but only {} are present",
                data.len()
            );
        }
        Some(TableData::with_len(&data[..len.min(data.len())], len))
    }

    fn origin(&self) -> Option<OriginId> {
        Some(OriginId::of(self.data))
    }
}

impl std::fmt::Debug for FontRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRef")
            .field("sfnt_version", &format_args!("0x{:08X}", self.sfnt_version))
            .field("num_tables", &self.records.count())
            .field("len", &self.data.len())
            .finish()
    }
}
