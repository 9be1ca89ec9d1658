//! 8×12 glyph tables.

/// Scan rows stored per glyph.
pub const GLYPH_ROWS: usize = 12;

/// A read-only table of 8-pixel-wide, 12-row glyphs.
///
/// Each glyph is twelve consecutive bytes, top row first, most significant
/// bit leftmost. Glyph data is supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Font {
    data: Box<[u8]>,
}

impl Font {
    /// Wrap raw glyph bytes.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is not a whole number of glyphs.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert!(
            bytes.len() % GLYPH_ROWS == 0,
            "font table length {} is not a multiple of {GLYPH_ROWS}",
            bytes.len()
        );
        Self {
            data: bytes.into(),
        }
    }

    /// An all-blank font with room for `glyph_count` glyphs.
    #[must_use]
    pub fn blank(glyph_count: usize) -> Self {
        Self {
            data: vec![0; glyph_count * GLYPH_ROWS].into_boxed_slice(),
        }
    }

    #[must_use]
    pub fn glyph_count(&self) -> usize {
        self.data.len() / GLYPH_ROWS
    }

    /// One scan row of a glyph. Glyphs or rows outside the table read as 0.
    #[must_use]
    pub fn row(&self, glyph: usize, row: usize) -> u8 {
        if row >= GLYPH_ROWS {
            return 0;
        }
        self.data
            .get(glyph * GLYPH_ROWS + row)
            .copied()
            .unwrap_or(0)
    }

    /// Replace one glyph.
    ///
    /// # Panics
    ///
    /// Panics if `glyph` is outside the table.
    pub fn set_glyph(&mut self, glyph: usize, rows: [u8; GLYPH_ROWS]) {
        let start = glyph * GLYPH_ROWS;
        self.data[start..start + GLYPH_ROWS].copy_from_slice(&rows);
    }
}
