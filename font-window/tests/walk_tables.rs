//! Walking nested tables through the window layer.

use font_test_data::{bebuffer::BeBuffer, maxp, MINI_FONT};
use font_window::{
    types::{BigEndian, Offset16, Tag},
    ArrayRef, Count, FontRef, FontStruct, Length, ReadError, Status, TableProvider, TableRef,
    Window,
};
use pretty_assertions::assert_eq;

const GSUB: Tag = Tag::new(b"GSUB");
const MAXP: Tag = Tag::new(b"maxp");

#[derive(Clone, Copy, bytemuck::AnyBitPattern)]
#[repr(C, packed)]
struct LayoutHeader {
    major_version: BigEndian<u16>,
    minor_version: BigEndian<u16>,
    script_list_offset: BigEndian<Offset16>,
    feature_list_offset: BigEndian<Offset16>,
    lookup_list_offset: BigEndian<Offset16>,
}

impl FontStruct for LayoutHeader {}

#[derive(Clone, Copy, bytemuck::AnyBitPattern)]
#[repr(C, packed)]
struct FeatureList {
    feature_count: BigEndian<u16>,
    feature_records: [FeatureRecord; 1],
}

impl FontStruct for FeatureList {
    const MIN_BYTE_LEN: usize = 2;
}

#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C, packed)]
struct FeatureRecord {
    feature_tag: BigEndian<Tag>,
    feature_offset: BigEndian<Offset16>,
}

impl FontStruct for FeatureRecord {}

#[derive(Clone, Copy, bytemuck::AnyBitPattern)]
#[repr(C, packed)]
struct Feature {
    feature_params_offset: BigEndian<Offset16>,
    lookup_index_count: BigEndian<u16>,
    lookup_list_indices: [BigEndian<u16>; 1],
}

impl FontStruct for Feature {
    const MIN_BYTE_LEN: usize = 4;
}

/// Collect each feature's tag and lookup indices, checking errors once at the end.
fn features(gsub: &Window) -> Result<Vec<(Tag, Vec<u16>)>, ReadError> {
    let mut status = Status::new();
    let mut result = Vec::new();

    let header = status.check(|| TableRef::<LayoutHeader>::new(gsub, 0));
    let list_offset = header
        .alias()
        .and_then(|header| header.feature_list_offset.get().non_null())
        .unwrap_or_default();
    let list = status.check(|| TableRef::<FeatureList>::new(gsub, list_offset));
    let count: u16 = status.check(|| list.read_at(0));
    let records = status.check(|| list.trailing_array::<FeatureRecord>(count.into()));

    for i in 0..records.count() {
        let Some(record) = records.alias_or_first(i, &mut status) else {
            break;
        };
        let offset = record.feature_offset.get().to_usize();
        let feature = status.check(|| TableRef::<Feature>::new(list.window(), offset));
        let lookup_count: u16 = status.check(|| feature.read_at(2));
        let indices = status.check(|| {
            feature.trailing_array::<BigEndian<u16>>(Count::Exact(lookup_count.into()))
        });
        let indices = indices
            .iter()
            .filter_map(|index| status.record(index))
            .map(|index| index.get())
            .collect::<Vec<_>>();
        result.push((record.feature_tag.get(), indices));
    }
    status.finish(result)
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn walk_feature_list() {
    init_logging();
    let font = FontRef::new(MINI_FONT).unwrap();
    let gsub = font.expect_root(GSUB).unwrap();
    let features = features(&gsub).unwrap();
    assert_eq!(
        features,
        vec![
            (Tag::new(b"liga"), vec![0, 1]),
            (Tag::new(b"smcp"), vec![2]),
        ]
    );
}

#[test]
fn truncated_table_fails_once() {
    init_logging();
    let font = FontRef::new(MINI_FONT).unwrap();
    let gsub = font.root(GSUB);
    // cut the table off inside the second Feature
    let truncated = Window::raw(&gsub.as_bytes()[..34]);
    assert_eq!(features(&truncated), Err(ReadError::OutOfBounds));

    // while the full table is still fine
    assert!(features(&gsub).is_ok());
}

#[test]
fn bad_feature_offset() {
    init_logging();
    let mut data = BeBuffer::new()
        .extend([1u16, 0, 0, 10, 0])
        .push(1u16)
        .push(Tag::new(b"kern"))
        .push_with_tag(0u16, "feature_offset")
        .extend([0u16, 1, 7]);
    // point the feature past the end of the list
    data.write_at("feature_offset", 0x200u16);
    let gsub = Window::raw(&data);
    assert_eq!(features(&gsub), Err(ReadError::OutOfBounds));
}

#[test]
fn missing_table_is_empty_not_error() {
    let font = FontRef::new(MINI_FONT).unwrap();
    let kern = font.root(Tag::new(b"kern"));
    assert!(kern.is_empty());
    let table = TableRef::<LayoutHeader>::root(&font, Tag::new(b"kern")).unwrap();
    assert!(table.alias().is_none());
    assert_eq!(
        font.expect_root(Tag::new(b"kern")).unwrap_err(),
        ReadError::TableIsMissing(Tag::new(b"kern"))
    );
}

#[derive(Clone, Copy, bytemuck::AnyBitPattern)]
#[repr(C, packed)]
struct Maxp {
    version: BigEndian<u32>,
    num_glyphs: BigEndian<u16>,
    max_points: BigEndian<u16>,
    max_contours: BigEndian<u16>,
}

// version 0.5 tables end after num_glyphs
impl FontStruct for Maxp {
    const MIN_BYTE_LEN: usize = 6;
}

#[test]
fn versioned_table() {
    let font = FontRef::new(MINI_FONT).unwrap();
    let table = font.table_ref::<Maxp>(MAXP).unwrap();
    assert_eq!(table.read_at::<u16>(4), Ok(5));
    assert!(table.alias().is_none());

    let short = Window::raw(maxp::VERSION_0_5);
    let table = TableRef::<Maxp>::new(&short, 0).unwrap();
    assert_eq!(table.read_at::<u16>(4), Ok(258));

    // a 1.0 table needs its full size, which a truncated one doesn't have
    let truncated = Window::raw(maxp::TRUNCATED_1_0);
    let table = TableRef::<Maxp>::new(&truncated, 0).unwrap();
    assert_eq!(table.read_at::<u32>(0), Ok(0x0001_0000));
    assert!(table.alias().is_none());
    assert_eq!(table.read_at::<u16>(8), Err(ReadError::OutOfBounds));
}

#[test]
fn twenty_byte_array() {
    let data = BeBuffer::new().extend([1u32, 2, 3, 4, 5]);
    let root = Window::raw(&data);
    let array = ArrayRef::<BigEndian<u32>>::new(&root, 0, Count::Unbounded).unwrap();
    assert_eq!(array.count(), 5);

    let mut status = Status::new();
    assert_eq!(array.offset_or_zero(4, &mut status), 16);
    assert!(status.is_ok());
    assert_eq!(array.offset_or_zero(5, &mut status), 0);
    assert_eq!(status.error(), Some(ReadError::OutOfBounds));

    let mut status = Status::new();
    let fallback = array.alias_or_first(5, &mut status).unwrap();
    assert_eq!(fallback.get(), 1);
    assert_eq!(status.into_result(), Err(ReadError::OutOfBounds));
}

#[test]
fn failed_subset_poisons_status() {
    let data = [0u8; 10];
    let root = Window::raw(&data);
    let mut status = Status::new();
    let bad = status.check(|| root.subset(8, Length::Bounded(5)));
    assert!(bad.is_empty());

    // siblings derived directly are unaffected
    assert!(root.subset(0, Length::Bounded(4)).unwrap().is_valid());
    // but everything run through the failed status is skipped
    let skipped = status.check(|| root.subset(0, Length::Bounded(4)));
    assert!(skipped.is_empty());
    assert_eq!(status.into_result(), Err(ReadError::OutOfBounds));
}

// the records outlive the window they were read from, but not the data
fn feature_records<'a>(data: &'a [u8]) -> Result<ArrayRef<'a, 'a, FeatureRecord>, ReadError> {
    let font = FontRef::new(data)?;
    let gsub = font.expect_root(GSUB)?;
    let header = TableRef::<LayoutHeader>::new(&gsub, 0)?;
    let list_offset: u16 = header.read_at(6)?;
    let list = TableRef::<FeatureList>::new(&gsub, list_offset as usize)?;
    let count: u16 = list.read_at(0)?;
    Ok(list.trailing_array(count.into())?.orphan())
}

#[test]
fn windows_over_owned_buffer() {
    let data = MINI_FONT.to_vec();
    let records = feature_records(&data).unwrap();
    assert_eq!(records.count(), 2);
    let tags = records
        .iter()
        .map(|record| record.map(|r| r.feature_tag.get()))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(tags, vec![Tag::new(b"liga"), Tag::new(b"smcp")]);

    let root = Window::raw(&data);
    let gsub = root.split_off(font_test_data::MINI_FONT_GSUB_OFFSET).unwrap();
    assert!(gsub.is_subset_of(&root));
    assert!(records.window().is_subset_of(&gsub));
}

#[test]
fn cleared_root_rejects_nonzero_offsets() {
    let font = FontRef::new(MINI_FONT).unwrap();
    let kern = font.root(Tag::new(b"kern"));
    // at offset zero a missing table is empty, past it nothing is in range
    assert!(TableRef::<LayoutHeader>::new(&kern, 0).unwrap().is_empty());
    assert_eq!(
        TableRef::<LayoutHeader>::new(&kern, 4).unwrap_err(),
        ReadError::OutOfBounds
    );
    let mut status = Status::new();
    let array = status.check(|| ArrayRef::<BigEndian<u16>>::new(&kern, 2, Count::Exact(3)));
    assert!(array.is_empty());
    assert_eq!(status.into_result(), Err(ReadError::OutOfBounds));
}

#[test]
fn unbounded_root_far_offset() {
    let data = [0u8; 32];
    let root = Window::raw_unbounded(&data);
    let far = root.split_off(1_000_000).unwrap();
    assert!(far.is_valid());
    assert!(!far.has_bounds());
    assert!(far.as_bytes().is_empty());
    let array = ArrayRef::<BigEndian<u16>>::new(&far, 0, Count::Unbounded).unwrap();
    assert_eq!(array.count(), 0);
}
