//! test data shared between the font-window crates.

pub mod bebuffer;

/// A minimal font with a sorted table directory and two tables.
///
/// The `GSUB` table holds only a feature list: `liga` (lookups 0 and 1)
/// and `smcp` (lookup 2).
#[rustfmt::skip]
pub static MINI_FONT: &[u8] = &[
    0x00, 0x01, 0x00, 0x00, // sfnt version 1.0
    0x00, 0x02,             // numTables 2
    0x00, 0x20,             // searchRange 32
    0x00, 0x01,             // entrySelector 1
    0x00, 0x00,             // rangeShift 0
                            // table records:
    b'G', b'S', b'U', b'B',
    0xCF, 0xEA, 0xDA, 0xF4, // checksum
    0x00, 0x00, 0x00, 0x2C, // offset 44
    0x00, 0x00, 0x00, 0x26, // length 38
    b'm', b'a', b'x', b'p',
    0x00, 0x05, 0x50, 0x00, // checksum
    0x00, 0x00, 0x00, 0x54, // offset 84
    0x00, 0x00, 0x00, 0x06, // length 6
                            // GSUB, offset 44:
    0x00, 0x01, 0x00, 0x00, // version 1.0
    0x00, 0x00,             // scriptListOffset (null)
    0x00, 0x0A,             // featureListOffset 10
    0x00, 0x00,             // lookupListOffset (null)
                            // FeatureList:
    0x00, 0x02,             // featureCount 2
    b'l', b'i', b'g', b'a',
    0x00, 0x0E,             // featureOffset 14
    b's', b'm', b'c', b'p',
    0x00, 0x16,             // featureOffset 22
                            // liga Feature:
    0x00, 0x00,             // featureParamsOffset (null)
    0x00, 0x02,             // lookupIndexCount 2
    0x00, 0x00, 0x00, 0x01, // lookupListIndices [0, 1]
                            // smcp Feature:
    0x00, 0x00,             // featureParamsOffset (null)
    0x00, 0x01,             // lookupIndexCount 1
    0x00, 0x02,             // lookupListIndices [2]
    0x00, 0x00,             // padding
                            // maxp, offset 84:
    0x00, 0x00, 0x50, 0x00, // version 0.5
    0x00, 0x05,             // numGlyphs 5
    0x00, 0x00,             // padding
];

/// The offset of the `GSUB` table in [`MINI_FONT`].
pub const MINI_FONT_GSUB_OFFSET: usize = 44;

pub mod maxp {
    /// A version 0.5 `maxp` table, which has no fields after `numGlyphs`.
    #[rustfmt::skip]
    pub static VERSION_0_5: &[u8] = &[
        0x00, 0x00, 0x50, 0x00, // version 0.5
        0x01, 0x02,             // numGlyphs 258
    ];

    /// The start of a version 1.0 `maxp` table, cut off after `maxPoints`.
    #[rustfmt::skip]
    pub static TRUNCATED_1_0: &[u8] = &[
        0x00, 0x01, 0x00, 0x00, // version 1.0
        0x01, 0x02,             // numGlyphs 258
        0x00, 0x40,             // maxPoints 64
    ];
}
