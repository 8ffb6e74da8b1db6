#![no_main]

use font_types::BigEndian;
use font_window::{ArrayRef, Count, FontRef, Length, Status, TableProvider, TableRef};
use libfuzzer_sys::{fuzz_target, Corpus};

// every byte a window hands out must come from the input
fn assert_within(data: &[u8], bytes: &[u8]) {
    let start = data.as_ptr() as usize;
    let ptr = bytes.as_ptr() as usize;
    assert!(bytes.is_empty() || (ptr >= start && ptr + bytes.len() <= start + data.len()));
}

fuzz_target!(|data: &[u8]| -> Corpus {
    let Ok(font) = FontRef::new(data) else {
        return Corpus::Reject;
    };
    for record in font.table_records() {
        let root = font.root(record.tag.get());
        assert_within(data, root.as_bytes());

        let mut status = Status::new();
        let header = status.check(|| TableRef::<BigEndian<u32>>::new(&root, 0));
        let _ = header.alias();
        let offset: u16 = status.check(|| root.read_at(4));
        let child = status.check(|| root.subset(offset as usize, Length::Bounded(8)));
        assert_within(data, child.as_bytes());

        let words = status.check(|| ArrayRef::<BigEndian<u16>>::new(&root, 0, Count::Unbounded));
        for word in words.iter().flatten() {
            assert_within(data, word.be_bytes());
        }
        // past the end: falls back to the first element
        if let Some(first) = words.alias_or_first(words.count(), &mut status) {
            assert_within(data, first.be_bytes());
        }
        assert!(status.is_err());
    }
    Corpus::Keep
});
