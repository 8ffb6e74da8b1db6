#![no_main]

use font_types::BigEndian;
use font_window::{ArrayRef, Count, Length, Status, Window};
use libfuzzer_sys::{
    arbitrary::{self, Arbitrary},
    fuzz_target,
};

#[derive(Debug, Arbitrary)]
enum Op {
    Subset { offset: u16, len: Option<u16> },
    AddOffset(u16),
    Contract(u16),
    Read(u16),
    Array { offset: u16, count: Option<u16>, index: u16 },
    Reanchor { base_offset: u16, offset: u16, count: u16 },
}

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    unbounded: bool,
    ops: Vec<Op>,
    data: &'a [u8],
}

fn length(len: Option<u16>) -> Length {
    len.map_or(Length::Unbounded, |len| Length::Bounded(len as usize))
}

fuzz_target!(|input: Input| {
    let data = input.data;
    let root = if input.unbounded {
        Window::raw_unbounded(data)
    } else {
        Window::raw(data)
    };
    let mut current = root;
    let mut status = Status::new();
    for op in input.ops {
        match op {
            Op::Subset { offset, len } => {
                let before = current;
                match before.subset(offset as usize, length(len)) {
                    Ok(child) => {
                        if before.has_bounds() && child.is_valid() {
                            assert!(child.is_subset_of(&before));
                        }
                        current = child.orphan();
                    }
                    Err(e) => status.fail(e),
                }
            }
            Op::AddOffset(offset) => {
                let before = current.len();
                if current.add_offset(offset as usize).is_err() {
                    assert_eq!(current.len(), before);
                }
            }
            Op::Contract(len) => {
                current.contract_length(len as usize);
            }
            Op::Read(offset) => {
                let _ = current.read_at::<u32>(offset as usize);
            }
            Op::Array {
                offset,
                count,
                index,
            } => {
                let count = count.map_or(Count::Unbounded, Count::from);
                if let Ok(array) = ArrayRef::<BigEndian<u16>>::new(&current, offset as usize, count)
                {
                    let _ = array.get(index.into());
                    if let Ok(element) = array.element(index.into()) {
                        assert!(element.window().is_subset_of(array.window()));
                    }
                    let _ = array.alias_or_first(index.into(), &mut status);
                    let _ = array.offset_or_zero(index.into(), &mut status);
                }
            }
            Op::Reanchor {
                base_offset,
                offset,
                count,
            } => {
                let Ok(base) = current.split_off(base_offset as usize) else {
                    continue;
                };
                if let Ok(mut array) =
                    ArrayRef::<BigEndian<u16>>::new(&current, 0, Count::Exact(0))
                {
                    if array
                        .set_to_offset_in_parent(&base, offset as usize, count.into())
                        .is_ok()
                    {
                        assert!(array.window().is_subset_of(&current));
                        let _ = array.get(0);
                    }
                }
            }
        }
        // the backing buffer bounds every window, whatever its length
        let bytes = current.as_bytes();
        assert!(bytes.is_empty() || current.start_offset().unwrap() + bytes.len() <= data.len());
    }
    let _ = status.into_result();
});
