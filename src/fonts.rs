use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::OnceLock;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::pdf::TextMeasure;

/// Advance widths and ascent of one face, in 1000 units per em.
#[derive(Clone, Debug)]
pub(crate) struct FontMetrics {
    widths_1000: Vec<f32>,
    pub(crate) ascender_ratio: f32,
    char_widths_1000: Option<HashMap<char, f32>>,
}

impl FontMetrics {
    /// Width of a single character in 1000-units. Embedded fonts use the per-char
    /// table built from the document's characters, Helvetica the WinAnsi table.
    fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(w) = self.char_widths_1000.as_ref().and_then(|m| m.get(&ch)) {
            return *w;
        }
        let byte = char_to_winansi(ch);
        if byte >= 32 {
            self.widths_1000[(byte - 32) as usize]
        } else {
            0.0
        }
    }

    pub(crate) fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    fn helvetica(bold: bool) -> Self {
        Self {
            widths_1000: helvetica_widths(bold),
            ascender_ratio: 0.718,
            char_widths_1000: None,
        }
    }

    fn from_face(face: &Face, used_chars: &HashSet<char>) -> Self {
        let units = face.units_per_em() as f32;
        let advance_1000 = |ch: char| {
            face.glyph_index(ch)
                .and_then(|gid| face.glyph_hor_advance(gid))
                .map(|adv| adv as f32 / units * 1000.0)
        };
        let widths_1000 = (32u8..=255u8)
            .map(|byte| advance_1000(winansi_to_char(byte)).unwrap_or(0.0))
            .collect();
        let char_widths_1000 = used_chars
            .iter()
            .filter(|&&ch| face.glyph_index(ch).is_some())
            .map(|&ch| (ch, advance_1000(ch).unwrap_or(0.0)))
            .collect();
        Self {
            widths_1000,
            ascender_ratio: face.ascender() as f32 / units,
            char_widths_1000: Some(char_widths_1000),
        }
    }
}

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    pub(crate) metrics: FontMetrics,
    char_to_gid: Option<HashMap<char, u16>>,
}

impl FontEntry {
    /// Bytes for a PDF `Tj` string in this font's encoding.
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

/// Regular and bold faces of the report font family.
pub(crate) struct FontSet {
    pub(crate) regular: FontEntry,
    pub(crate) bold: FontEntry,
}

impl FontSet {
    pub(crate) fn entry(&self, bold: bool) -> &FontEntry {
        if bold { &self.bold } else { &self.regular }
    }

    pub(crate) fn entries(&self) -> [&FontEntry; 2] {
        [&self.regular, &self.bold]
    }
}

impl TextMeasure for FontSet {
    fn text_width(&self, text: &str, bold: bool, size: f32) -> f32 {
        self.entry(bold).metrics.text_width(text, size)
    }
}

/// Metrics of the faces `register_font` would embed, without writing a PDF.
/// Pagination measures with these so its line counts match the drawn text.
pub(crate) struct FontMeasure {
    regular: FontMetrics,
    bold: FontMetrics,
}

impl FontMeasure {
    pub(crate) fn load(family_list: &str, used_chars: &HashSet<char>) -> Self {
        let load_face = |bold: bool| {
            candidate_families(family_list)
                .find_map(|family| {
                    let (path, face_index) = find_font_file(family, bold)?;
                    let data = std::fs::read(&path).ok()?;
                    let face = Face::parse(&data, face_index).ok()?;
                    Some(FontMetrics::from_face(&face, used_chars))
                })
                .unwrap_or_else(|| FontMetrics::helvetica(bold))
        };
        Self {
            regular: load_face(false),
            bold: load_face(true),
        }
    }
}

impl TextMeasure for FontMeasure {
    fn text_width(&self, text: &str, bold: bool, size: f32) -> f32 {
        let metrics = if bold { &self.bold } else { &self.regular };
        metrics.text_width(text, size)
    }
}

fn candidate_families(family_list: &str) -> impl Iterator<Item = &str> {
    family_list
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("helvetica"))
}

/// (lowercase family name, bold) -> (file path, face index within TTC)
type FontLookup = HashMap<(String, bool), (PathBuf, u32)>;

static FONT_INDEX: OnceLock<FontLookup> = OnceLock::new();

fn font_family_name(face: &Face) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
        .find_map(|name| name.to_string())
}

fn font_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    if let Ok(val) = std::env::var("LABREPORT_FONTS") {
        let sep = if cfg!(windows) { ';' } else { ':' };
        dirs.extend(
            val.split(sep)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        );
    }

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        match std::env::var("WINDIR") {
            Ok(windir) => dirs.push(PathBuf::from(windir).join("Fonts")),
            Err(_) => dirs.push("C:\\Windows\\Fonts".into()),
        }
    }

    dirs
}

fn is_font_file(path: &std::path::Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("ttf" | "otf" | "ttc")
    )
}

fn scan_font_dirs() -> FontLookup {
    let t0 = std::time::Instant::now();
    let mut index = FontLookup::new();
    let mut files_scanned = 0u32;
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut stack = font_directories();

    while let Some(dir) = stack.pop() {
        if !visited.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if !is_font_file(&path) {
                continue;
            }
            let Ok(file) = std::fs::File::open(&path) else {
                continue;
            };
            let Ok(data) = (unsafe { Mmap::map(&file) }) else {
                continue;
            };
            files_scanned += 1;
            let face_count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);
            for face_idx in 0..face_count {
                let Ok(face) = Face::parse(&data, face_idx) else {
                    continue;
                };
                if face.is_italic() {
                    continue;
                }
                if let Some(family) = font_family_name(&face) {
                    index
                        .entry((family.to_lowercase(), face.is_bold()))
                        .or_insert((path.clone(), face_idx));
                }
            }
        }
    }

    log::info!(
        "Font scan: {:.1}ms, {} files parsed → {} entries",
        t0.elapsed().as_secs_f64() * 1000.0,
        files_scanned,
        index.len(),
    );
    index
}

fn find_font_file(family: &str, bold: bool) -> Option<(PathBuf, u32)> {
    let index = FONT_INDEX.get_or_init(scan_font_dirs);
    index.get(&(family.to_lowercase(), bold)).cloned()
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
fn winansi_to_char(byte: u8) -> char {
    WINANSI_HIGH
        .iter()
        .find(|&&(b, _)| b == byte)
        .map(|&(_, c)| c)
        .unwrap_or(byte as char)
}

/// Map a Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F | 0x00A0..=0x00FF => c as u8,
        _ => WINANSI_HIGH
            .iter()
            .find(|&&(_, ch)| ch == c)
            .map_or(0, |&(b, _)| b),
    }
}

/// Bytes 0x80-0x9F that do not map to their own code point.
const WINANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

/// Convert a UTF-8 string to WinAnsi bytes; characters outside the code page are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .filter_map(|c| match char_to_winansi(c) {
            0 => None,
            b => Some(b),
        })
        .collect()
}

/// Encode text as big-endian 2-byte glyph IDs for CIDFont content streams.
fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    text.chars()
        .flat_map(|ch| char_to_gid.get(&ch).copied().unwrap_or(0).to_be_bytes())
        .collect()
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
fn helvetica_widths(bold: bool) -> Vec<f32> {
    let boost = if bold { 1.05 } else { 1.0 };
    (32u8..=255u8)
        .map(|b| {
            boost
                * match b {
                    32 => 278.0,
                    33..=47 => 333.0,
                    48..=57 => 556.0,
                    58..=64 => 333.0,
                    73 | 74 => 278.0,
                    77 => 833.0,
                    65..=90 => 667.0,
                    91..=96 => 333.0,
                    102 | 105 | 106 | 108 | 116 => 278.0,
                    109 | 119 => 833.0,
                    97..=122 => 556.0,
                    _ => 556.0,
                }
        })
        .collect()
}

fn identity_system_info() -> pdf_writer::types::SystemInfo<'static> {
    pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    }
}

struct Embedded {
    metrics: FontMetrics,
    char_to_gid: HashMap<char, u16>,
}

/// Embed a TrueType/OpenType face as a Type0 font with Identity-H encoding,
/// subsetted to the characters the report uses.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    font_name: &str,
    font_data: &[u8],
    face_index: u32,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<Embedded> {
    let face = Face::parse(font_data, face_index).ok()?;
    let units = face.units_per_em() as f32;
    let to_1000 = |v: f32| v / units * 1000.0;

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        to_1000(bb.x_min as f32),
        to_1000(bb.y_min as f32),
        to_1000(bb.x_max as f32),
        to_1000(bb.y_max as f32),
    );

    let metrics = FontMetrics::from_face(&face, used_chars);

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut sorted_chars: Vec<char> = used_chars.iter().copied().collect();
    sorted_chars.sort_unstable();
    for ch in sorted_chars {
        if let Some(gid) = face.glyph_index(ch) {
            char_to_gid.insert(ch, remapper.remap(gid.0));
        }
    }

    let subset_data = subsetter::subset(font_data, face_index, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {font_name}: {e}; embedding full font");
        font_data.to_vec()
    });

    let descriptor_ref = alloc();
    let data_ref = alloc();
    let cid_font_ref = alloc();
    let tounicode_ref = alloc();

    let data_len = i32::try_from(subset_data.len()).ok()?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = font_name.replace(' ', "");
    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(to_1000(face.ascender() as f32))
        .descent(to_1000(face.descender() as f32))
        .cap_height(face.capital_height().map_or(700.0, |h| to_1000(h as f32)))
        .stem_v(80.0)
        .font_file2(data_ref);

    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(identity_system_info());
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        let mut gid_widths: Vec<(u16, f32)> = char_to_gid
            .iter()
            .map(|(&ch, &gid)| (gid, metrics.char_width_1000(ch)))
            .collect();
        gid_widths.sort_by_key(|&(gid, _)| gid);
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for (gid, width) in gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), identity_system_info());
    for (&ch, &gid) in &char_to_gid {
        cmap.pair(gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Some(Embedded {
        metrics,
        char_to_gid,
    })
}

/// Register one face of the first available family in `family_list`
/// (`;`-separated). Falls back to the built-in Helvetica.
pub(crate) fn register_font(
    pdf: &mut Pdf,
    family_list: &str,
    bold: bool,
    pdf_name: String,
    alloc: &mut impl FnMut() -> Ref,
    used_chars: &HashSet<char>,
) -> FontEntry {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();

    let embedded = candidate_families(family_list)
        .find_map(|family| {
            let (path, face_index) = find_font_file(family, bold)?;
            let data = std::fs::read(&path).ok()?;
            embed_truetype(pdf, font_ref, family, &data, face_index, used_chars, alloc)
        });

    let entry = match embedded {
        Some(e) => FontEntry {
            pdf_name,
            font_ref,
            metrics: e.metrics,
            char_to_gid: Some(e.char_to_gid),
        },
        None => {
            log::warn!("No font file for [{family_list}] bold={bold}; using Helvetica");
            builtin_helvetica(pdf, font_ref, bold, pdf_name)
        }
    };

    log::debug!(
        "register_font: [{family_list}] bold={bold} → {:.1}ms",
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    entry
}

fn builtin_helvetica(pdf: &mut Pdf, font_ref: Ref, bold: bool, pdf_name: String) -> FontEntry {
    let base: &[u8] = if bold { b"Helvetica-Bold" } else { b"Helvetica" };
    pdf.type1_font(font_ref)
        .base_font(Name(base))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    FontEntry {
        pdf_name,
        font_ref,
        metrics: FontMetrics::helvetica(bold),
        char_to_gid: None,
    }
}
