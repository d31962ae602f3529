//! Synthetic TrueType fonts for integration tests.
//!
//! Real fonts are large and their glyph ids arbitrary, so the tests build
//! tiny fonts whose layout is known exactly.

#![allow(dead_code)]

// ─── Glyph Records ──────────────────────────────────────────────

/// A one-point simple glyph. `mark` lands in xMax so records are
/// distinguishable after remapping.
pub fn simple_glyph(mark: i16) -> Vec<u8> {
    let mut g = Vec::new();
    push_i16(&mut g, 1); // numberOfContours
    push_i16(&mut g, 0); // xMin
    push_i16(&mut g, 0); // yMin
    push_i16(&mut g, mark); // xMax
    push_i16(&mut g, 700); // yMax
    push_u16(&mut g, 0); // endPtsOfContours[0]
    push_u16(&mut g, 0); // instructionLength
    g.push(0x31); // ON_CURVE | X_SAME | Y_SAME: no coordinate bytes
    g
}

pub const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
pub const ARGS_ARE_XY_VALUES: u16 = 0x0002;
pub const WE_HAVE_A_SCALE: u16 = 0x0008;
pub const MORE_COMPONENTS: u16 = 0x0020;

/// A composite glyph referencing `components` in order. The second
/// component, if any, carries a uniform scale so variable-length
/// component records are exercised.
pub fn composite_glyph(components: &[u16]) -> Vec<u8> {
    let mut g = Vec::new();
    push_i16(&mut g, -1);
    push_i16(&mut g, 0);
    push_i16(&mut g, 0);
    push_i16(&mut g, 600);
    push_i16(&mut g, 900);
    for (i, &gid) in components.iter().enumerate() {
        let mut flags = ARG_1_AND_2_ARE_WORDS | ARGS_ARE_XY_VALUES;
        if i + 1 < components.len() {
            flags |= MORE_COMPONENTS;
        }
        if i == 1 {
            flags |= WE_HAVE_A_SCALE;
        }
        push_u16(&mut g, flags);
        push_u16(&mut g, gid);
        push_i16(&mut g, 10 * i as i16); // dx
        push_i16(&mut g, 200 * i as i16); // dy
        if flags & WE_HAVE_A_SCALE != 0 {
            push_u16(&mut g, 0x4000); // 1.0 in F2Dot14
        }
    }
    g
}

/// Component glyph ids of a composite record, read independently of the
/// crate's own parser.
pub fn component_ids(glyph: &[u8]) -> Vec<u16> {
    let mut ids = Vec::new();
    if glyph.len() < 10 || i16::from_be_bytes([glyph[0], glyph[1]]) != -1 {
        return ids;
    }
    let mut pos = 10;
    loop {
        let flags = u16::from_be_bytes([glyph[pos], glyph[pos + 1]]);
        ids.push(u16::from_be_bytes([glyph[pos + 2], glyph[pos + 3]]));
        pos += 4 + if flags & ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };
        if flags & WE_HAVE_A_SCALE != 0 {
            pos += 2;
        }
        if flags & MORE_COMPONENTS == 0 {
            return ids;
        }
    }
}

// ─── Font Builder ───────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TestFont {
    pub family: String,
    pub subfamily: String,
    pub units_per_em: u16,
    /// One `glyf` record per glyph; empty for glyphs without outlines.
    pub glyphs: Vec<Vec<u8>>,
    /// (advance, lsb) per glyph.
    pub metrics: Vec<(u16, i16)>,
    pub number_of_h_metrics: u16,
    /// (code point, glyph id).
    pub chars: Vec<(u32, u16)>,
    /// Emit a (3,0) Symbol cmap keyed at 0xF000 + code instead of (3,1).
    pub symbol: bool,
    pub kern_pairs: Vec<(u16, u16, i16)>,
    pub long_loca: bool,
    pub weight_class: u16,
    pub italic_angle: i32,
    pub with_hinting: bool,
}

impl TestFont {
    /// The font shared by most tests:
    ///
    /// | gid | char | glyph                          | advance |
    /// |-----|------|--------------------------------|---------|
    /// | 0   |      | .notdef                        | 500     |
    /// | 1   | ' '  | empty                          | 250     |
    /// | 2-3 |      | unmapped                       | 300/350 |
    /// | 4   | '☺'  | simple, outside WinAnsi        | 400     |
    /// | 5   | 'A'  | simple                         | 600     |
    /// | 6   | 'B'  | simple                         | 550     |
    /// | 7   | 'V'  | simple                         | 500     |
    /// | 8   | 'W'  | simple                         | 500     |
    /// | 9   | 'Ã'  | composite of 5 + 12            | 500     |
    /// | 10  | 'T'  | simple (advance from last slot)| 500     |
    /// | 11  |      | composite of 10 + 13, unmapped | 500     |
    /// | 12  | '˜'  | simple                         | 500     |
    /// | 13  | '€'  | simple                         | 500     |
    ///
    /// numberOfHMetrics is 10, 1000 units/em, and the kern table holds
    /// A→Ã −30, A→V −80 and T→A −40.
    pub fn standard() -> Self {
        let mut glyphs: Vec<Vec<u8>> = (0..14).map(|gid| simple_glyph(100 + gid)).collect();
        glyphs[1] = Vec::new();
        glyphs[9] = composite_glyph(&[5, 12]);
        glyphs[11] = composite_glyph(&[10, 13]);

        let advances = [500u16, 250, 300, 350, 400, 600, 550, 500, 500, 500];
        let metrics = (0..14u16)
            .map(|gid| {
                let advance = advances[(gid as usize).min(advances.len() - 1)];
                (advance, 10 + gid as i16)
            })
            .collect();

        Self {
            family: "Synthetic Sans".to_string(),
            subfamily: "Regular".to_string(),
            units_per_em: 1000,
            glyphs,
            metrics,
            number_of_h_metrics: 10,
            chars: vec![
                (0x20, 1),
                (0x41, 5),
                (0x42, 6),
                (0x54, 10),
                (0x56, 7),
                (0x57, 8),
                (0xC3, 9),
                (0x02DC, 12),
                (0x20AC, 13),
                (0x263A, 4),
            ],
            symbol: false,
            kern_pairs: vec![(5, 9, -30), (5, 7, -80), (10, 5, -40)],
            long_loca: false,
            weight_class: 400,
            italic_angle: 0,
            with_hinting: true,
        }
    }

    pub fn family(mut self, family: &str) -> Self {
        self.family = family.to_string();
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.family, self.subfamily)
    }

    pub fn postscript_name(&self) -> String {
        let family: String = self.family.chars().filter(|c| !c.is_whitespace()).collect();
        format!("{}-{}", family, self.subfamily)
    }

    pub fn build(&self) -> Vec<u8> {
        let (glyf, loca) = self.glyf_and_loca();
        let mut tables: Vec<([u8; 4], Vec<u8>)> = vec![
            (*b"OS/2", self.os2()),
            (*b"cmap", self.cmap()),
            (*b"glyf", glyf),
            (*b"head", self.head()),
            (*b"hhea", self.hhea()),
            (*b"hmtx", self.hmtx()),
            (*b"loca", loca),
            (*b"maxp", self.maxp()),
            (*b"name", self.name()),
            (*b"post", self.post()),
        ];
        if !self.kern_pairs.is_empty() {
            tables.push((*b"kern", self.kern()));
        }
        if self.with_hinting {
            tables.push((*b"cvt ", vec![0, 20, 0, 40]));
            tables.push((*b"fpgm", vec![0xB0, 0x00, 0x2C]));
            tables.push((*b"prep", vec![0xB8, 0x01, 0xFF, 0x85]));
        }
        tables.sort_by(|a, b| a.0.cmp(&b.0));
        write_sfnt(&tables)
    }

    fn glyf_and_loca(&self) -> (Vec<u8>, Vec<u8>) {
        let mut glyf = Vec::new();
        let mut offsets = Vec::new();
        for g in &self.glyphs {
            offsets.push(glyf.len() as u32);
            glyf.extend_from_slice(g);
            // Short loca stores offset / 2.
            if glyf.len() % 2 != 0 {
                glyf.push(0);
            }
        }
        offsets.push(glyf.len() as u32);

        let mut loca = Vec::new();
        for o in offsets {
            if self.long_loca {
                push_u32(&mut loca, o);
            } else {
                push_u16(&mut loca, (o / 2) as u16);
            }
        }
        (glyf, loca)
    }

    fn head(&self) -> Vec<u8> {
        let mut h = Vec::new();
        push_u32(&mut h, 0x0001_0000); // version
        push_u32(&mut h, 0x0001_0000); // fontRevision
        push_u32(&mut h, 0); // checkSumAdjustment
        push_u32(&mut h, 0x5F0F_3CF5); // magicNumber
        push_u16(&mut h, 0x000B); // flags
        push_u16(&mut h, self.units_per_em);
        h.extend_from_slice(&[0u8; 16]); // created, modified
        push_i16(&mut h, -50); // xMin
        push_i16(&mut h, -250); // yMin
        push_i16(&mut h, 1200); // xMax
        push_i16(&mut h, 950); // yMax
        push_u16(&mut h, 0); // macStyle
        push_u16(&mut h, 8); // lowestRecPPEM
        push_i16(&mut h, 2); // fontDirectionHint
        push_i16(&mut h, if self.long_loca { 1 } else { 0 });
        push_i16(&mut h, 0); // glyphDataFormat
        h
    }

    fn hhea(&self) -> Vec<u8> {
        let mut h = Vec::new();
        push_u32(&mut h, 0x0001_0000);
        push_i16(&mut h, 900); // ascender
        push_i16(&mut h, -200); // descender
        push_i16(&mut h, 50); // lineGap
        push_u16(&mut h, self.metrics.iter().map(|m| m.0).max().unwrap_or(0));
        push_i16(&mut h, 0); // minLeftSideBearing
        push_i16(&mut h, 0); // minRightSideBearing
        push_i16(&mut h, 1200); // xMaxExtent
        push_i16(&mut h, 1); // caretSlopeRise
        push_i16(&mut h, 0); // caretSlopeRun
        push_i16(&mut h, 0); // caretOffset
        h.extend_from_slice(&[0u8; 8]); // reserved
        push_i16(&mut h, 0); // metricDataFormat
        push_u16(&mut h, self.number_of_h_metrics);
        h
    }

    fn maxp(&self) -> Vec<u8> {
        let mut m = Vec::new();
        push_u32(&mut m, 0x0001_0000);
        push_u16(&mut m, self.glyphs.len() as u16);
        // maxPoints .. maxComponentDepth
        for value in [1u16, 1, 2, 1, 2, 0, 0, 0, 0, 0, 2, 1, 1] {
            push_u16(&mut m, value);
        }
        m
    }

    fn hmtx(&self) -> Vec<u8> {
        let mut h = Vec::new();
        for (gid, &(advance, lsb)) in self.metrics.iter().enumerate() {
            if gid < self.number_of_h_metrics as usize {
                push_u16(&mut h, advance);
            }
            push_i16(&mut h, lsb);
        }
        h
    }

    fn cmap(&self) -> Vec<u8> {
        let mut entries: Vec<(u16, u16)> = self
            .chars
            .iter()
            .filter_map(|&(code, gid)| {
                let code = if self.symbol { 0xF000 | code } else { code };
                u16::try_from(code).ok().map(|c| (c, gid))
            })
            .collect();
        entries.sort();

        let seg_count = entries.len() as u16 + 1;
        let entry_selector = 15 - seg_count.leading_zeros() as u16;
        let search_range = 2 * (1u16 << entry_selector);

        let mut sub = Vec::new();
        push_u16(&mut sub, 4);
        push_u16(&mut sub, 16 + 8 * seg_count);
        push_u16(&mut sub, 0);
        push_u16(&mut sub, seg_count * 2);
        push_u16(&mut sub, search_range);
        push_u16(&mut sub, entry_selector);
        push_u16(&mut sub, seg_count * 2 - search_range);
        for &(code, _) in &entries {
            push_u16(&mut sub, code);
        }
        push_u16(&mut sub, 0xFFFF);
        push_u16(&mut sub, 0);
        for &(code, _) in &entries {
            push_u16(&mut sub, code);
        }
        push_u16(&mut sub, 0xFFFF);
        for &(code, gid) in &entries {
            push_u16(&mut sub, gid.wrapping_sub(code));
        }
        push_u16(&mut sub, 1);
        for _ in 0..seg_count {
            push_u16(&mut sub, 0);
        }

        let mut cmap = Vec::new();
        push_u16(&mut cmap, 0);
        push_u16(&mut cmap, 1);
        push_u16(&mut cmap, 3);
        push_u16(&mut cmap, if self.symbol { 0 } else { 1 });
        push_u32(&mut cmap, 12);
        cmap.extend_from_slice(&sub);
        cmap
    }

    fn kern(&self) -> Vec<u8> {
        let mut pairs = self.kern_pairs.clone();
        pairs.sort_by_key(|&(l, r, _)| ((l as u32) << 16) | r as u32);
        let n = pairs.len() as u16;
        let entry_selector = 15 - n.max(1).leading_zeros() as u16;
        let search_range = 6 * (1u16 << entry_selector);

        let mut k = Vec::new();
        push_u16(&mut k, 0); // version
        push_u16(&mut k, 1); // nTables
        push_u16(&mut k, 0); // subtable version
        push_u16(&mut k, 14 + 6 * n); // length
        push_u16(&mut k, 0x0001); // coverage: horizontal, format 0
        push_u16(&mut k, n);
        push_u16(&mut k, search_range);
        push_u16(&mut k, entry_selector);
        push_u16(&mut k, (6 * n).saturating_sub(search_range));
        for (left, right, value) in pairs {
            push_u16(&mut k, left);
            push_u16(&mut k, right);
            push_i16(&mut k, value);
        }
        k
    }

    fn name(&self) -> Vec<u8> {
        let strings = [
            (1u16, self.family.clone()),
            (2, self.subfamily.clone()),
            (4, self.full_name()),
            (6, self.postscript_name()),
        ];
        let mut storage = Vec::new();
        let mut records = Vec::new();
        for (name_id, value) in &strings {
            let encoded: Vec<u8> = value.encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
            records.push((*name_id, encoded.len() as u16, storage.len() as u16));
            storage.extend_from_slice(&encoded);
        }

        let mut n = Vec::new();
        push_u16(&mut n, 0);
        push_u16(&mut n, records.len() as u16);
        push_u16(&mut n, 6 + 12 * records.len() as u16);
        for (name_id, length, offset) in records {
            push_u16(&mut n, 3);
            push_u16(&mut n, 1);
            push_u16(&mut n, 0x409);
            push_u16(&mut n, name_id);
            push_u16(&mut n, length);
            push_u16(&mut n, offset);
        }
        n.extend_from_slice(&storage);
        n
    }

    fn os2(&self) -> Vec<u8> {
        let mut o = vec![0u8; 96];
        o[0..2].copy_from_slice(&2u16.to_be_bytes()); // version
        o[4..6].copy_from_slice(&self.weight_class.to_be_bytes());
        o[68..70].copy_from_slice(&800i16.to_be_bytes()); // sTypoAscender
        o[70..72].copy_from_slice(&(-200i16).to_be_bytes()); // sTypoDescender
        o[72..74].copy_from_slice(&90i16.to_be_bytes()); // sTypoLineGap
        o[88..90].copy_from_slice(&700i16.to_be_bytes()); // sCapHeight
        o
    }

    fn post(&self) -> Vec<u8> {
        let mut p = Vec::new();
        push_u32(&mut p, 0x0003_0000);
        p.extend_from_slice(&self.italic_angle.to_be_bytes());
        push_i16(&mut p, -100); // underlinePosition
        push_i16(&mut p, 50); // underlineThickness
        push_u32(&mut p, 0); // isFixedPitch
        p.extend_from_slice(&[0u8; 16]);
        p
    }
}

// ─── sfnt Assembly ──────────────────────────────────────────────

/// Write tables (already in tag order) as a plain sfnt. Checksums are left
/// zero; the parser doesn't verify them.
pub fn write_sfnt(tables: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let entry_selector = 15 - num_tables.leading_zeros() as u16;
    let search_range = 16 * (1u16 << entry_selector);

    let mut out = Vec::new();
    push_u32(&mut out, 0x0001_0000);
    push_u16(&mut out, num_tables);
    push_u16(&mut out, search_range);
    push_u16(&mut out, entry_selector);
    push_u16(&mut out, num_tables * 16 - search_range);

    let mut offset = 12 + 16 * tables.len();
    let mut body = Vec::new();
    for (tag, data) in tables {
        out.extend_from_slice(tag);
        push_u32(&mut out, 0);
        push_u32(&mut out, offset as u32);
        push_u32(&mut out, data.len() as u32);
        body.extend_from_slice(data);
        while body.len() % 4 != 0 {
            body.push(0);
        }
        offset = 12 + 16 * tables.len() + body.len();
    }
    out.extend_from_slice(&body);
    out
}

/// Pack complete sfnt files into a `ttcf` collection, rebasing each font's
/// table offsets.
pub fn write_collection(fonts: &[Vec<u8>]) -> Vec<u8> {
    let header_len = 12 + 4 * fonts.len();
    let mut out = Vec::new();
    out.extend_from_slice(b"ttcf");
    push_u32(&mut out, 0x0001_0000);
    push_u32(&mut out, fonts.len() as u32);

    let mut base = header_len;
    let mut bases = Vec::new();
    for font in fonts {
        push_u32(&mut out, base as u32);
        bases.push(base);
        base += font.len();
    }

    for (font, base) in fonts.iter().zip(bases) {
        let mut font = font.clone();
        let num_tables = u16::from_be_bytes([font[4], font[5]]) as usize;
        for i in 0..num_tables {
            let pos = 12 + i * 16 + 8;
            let offset = u32::from_be_bytes([font[pos], font[pos + 1], font[pos + 2], font[pos + 3]]);
            font[pos..pos + 4].copy_from_slice(&(offset + base as u32).to_be_bytes());
        }
        out.extend_from_slice(&font);
    }
    out
}

// ─── Reading Back ───────────────────────────────────────────────

/// (offset, length) of `tag` in a plain sfnt.
pub fn find_table(font: &[u8], tag: &[u8; 4]) -> Option<(usize, usize)> {
    let num_tables = read_u16(font, 4) as usize;
    (0..num_tables).find_map(|i| {
        let rec = 12 + i * 16;
        (&font[rec..rec + 4] == tag)
            .then(|| (read_u32(font, rec + 8) as usize, read_u32(font, rec + 12) as usize))
    })
}

pub fn table<'a>(font: &'a [u8], tag: &[u8; 4]) -> &'a [u8] {
    let (offset, length) = find_table(font, tag).expect("table present");
    &font[offset..offset + length]
}

/// The raw glyf record of `gid`, assuming a long-format loca.
pub fn glyph_record(font: &[u8], gid: u16) -> &[u8] {
    let loca = table(font, b"loca");
    let glyf = table(font, b"glyf");
    let start = read_u32(loca, gid as usize * 4) as usize;
    let end = read_u32(loca, gid as usize * 4 + 4) as usize;
    &glyf[start..end]
}

pub fn read_u16(data: &[u8], pos: usize) -> u16 {
    u16::from_be_bytes([data[pos], data[pos + 1]])
}

pub fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

pub fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

pub fn push_i16(out: &mut Vec<u8>, v: i16) {
    out.extend_from_slice(&v.to_be_bytes());
}

pub fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}
