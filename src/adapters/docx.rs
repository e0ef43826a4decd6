use crate::domain::model::{PhotoLayout, Profile};
use crate::domain::ports::DocumentRenderer;
use crate::utils::error::{CvError, Result};
use chrono::Datelike;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::{SimpleFileOptions, ZipWriter};

const ACCENT_HEX: &str = "2F80ED";
const FONT_FAMILY: &str = "Calibri";
/// 2 cm in twentieths of a point.
const MARGIN_TWIPS: u32 = 1134;
/// 3.5 cm in EMU.
const PHOTO_EMU: u64 = 1_260_000;
const PHOTO_REL_ID: &str = "rIdPhoto";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="jpg" ContentType="image/jpeg"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// `CV_<name with underscores>_<year>.docx`
pub fn output_file_name(name: &str, year: i32) -> String {
    let safe: String = name
        .trim()
        .chars()
        .map(|c| if matches!(c, ' ' | '/' | '\\') { '_' } else { c })
        .collect();
    format!("CV_{}_{}.docx", safe, year)
}

#[derive(Default, Clone, Copy)]
struct RunStyle {
    /// Half-points.
    size: u32,
    bold: bool,
    accent: bool,
}

impl RunStyle {
    fn sized(pt_tenths: u32) -> Self {
        Self {
            size: pt_tenths / 5,
            ..Self::default()
        }
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn accent(mut self) -> Self {
        self.accent = true;
        self
    }
}

fn run(text: &str, style: RunStyle) -> String {
    let mut props = format!(
        r#"<w:rFonts w:ascii="{f}" w:hAnsi="{f}" w:eastAsia="{f}" w:cs="{f}"/>"#,
        f = FONT_FAMILY
    );
    if style.bold {
        props.push_str("<w:b/>");
    }
    if style.accent {
        props.push_str(&format!(r#"<w:color w:val="{}"/>"#, ACCENT_HEX));
    }
    props.push_str(&format!(r#"<w:sz w:val="{s}"/><w:szCs w:val="{s}"/>"#, s = style.size));
    format!(
        r#"<w:r><w:rPr>{}</w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        props,
        escape(text)
    )
}

/// Accumulates WordprocessingML body content.
#[derive(Default)]
struct Body {
    xml: String,
}

impl Body {
    fn paragraph(&mut self, text: &str, style: RunStyle) {
        self.xml.push_str(&format!("<w:p>{}</w:p>", run(text, style)));
    }

    fn raw(&mut self, xml: &str) {
        self.xml.push_str(xml);
    }

    fn section_title(&mut self, title: &str) {
        self.xml.push_str(&format!(
            r#"<w:p><w:pPr><w:pBdr><w:bottom w:val="single" w:sz="10" w:space="5" w:color="{}"/></w:pBdr><w:spacing w:before="320" w:after="80"/></w:pPr>{}</w:p>"#,
            ACCENT_HEX,
            run(&title.to_uppercase(), RunStyle::sized(120).bold())
        ));
    }

    fn bullets<'a>(&mut self, items: impl IntoIterator<Item = &'a str>) {
        for item in items {
            self.xml.push_str(&format!(
                r#"<w:p><w:pPr><w:ind w:left="284" w:hanging="227"/><w:spacing w:after="40"/></w:pPr>{}</w:p>"#,
                run(&format!("• {}", item), RunStyle::sized(105))
            ));
        }
    }
}

fn photo_paragraph(align: &str) -> String {
    format!(
        concat!(
            r#"<w:p><w:pPr><w:jc w:val="{align}"/></w:pPr><w:r><w:drawing>"#,
            r#"<wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{emu}" cy="{emu}"/><wp:docPr id="1" name="Photo"/>"#,
            r#"<a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:nvPicPr><pic:cNvPr id="0" name="photo"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{emu}" cy="{emu}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
        ),
        align = align,
        emu = PHOTO_EMU,
        rel = PHOTO_REL_ID
    )
}

fn header_block(profile: &Profile) -> String {
    let mut block = Body::default();
    block.paragraph(&profile.name, RunStyle::sized(200).bold());
    block.paragraph(&profile.title, RunStyle::sized(120).accent());

    let mut line: Vec<&str> = profile.visible_contacts().collect();
    if let Some(location) = profile.location.as_deref().filter(|l| !l.trim().is_empty()) {
        line.push(location);
    }
    block.paragraph(&line.join(" | "), RunStyle::sized(105));
    block.xml
}

/// Loaded photo ready to be packaged.
struct EmbeddedPhoto {
    bytes: Vec<u8>,
    extension: String,
}

fn load_photo(profile: &Profile) -> std::result::Result<Option<EmbeddedPhoto>, String> {
    if !profile.include_photo {
        return Ok(None);
    }
    let Some(path) = profile.photo_path.as_deref().map(Path::new) else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    let extension = embeddable_extension(&bytes)
        .ok_or_else(|| format!("{} is not a PNG or JPEG image", path.display()))?;
    Ok(Some(EmbeddedPhoto {
        bytes,
        extension: extension.to_string(),
    }))
}

/// Package extension for photo bytes Word can show, judged by content.
#[cfg(feature = "photos")]
fn embeddable_extension(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        image::ImageFormat::Png => Some("png"),
        image::ImageFormat::Jpeg => Some("jpg"),
        _ => None,
    }
}

#[cfg(not(feature = "photos"))]
fn embeddable_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else {
        None
    }
}

fn document_xml(profile: &Profile, has_photo: bool, photo_error: Option<&str>) -> String {
    let mut body = Body::default();

    if has_photo && profile.photo_layout.is_beside_text() {
        let text = header_block(profile);
        let photo = photo_paragraph(match profile.photo_layout {
            PhotoLayout::LeftBesideText => "left",
            _ => "right",
        });
        let (left, right, left_w, right_w) = match profile.photo_layout {
            PhotoLayout::LeftBesideText => (photo, text, 2600, 6900),
            _ => (text, photo, 6900, 2600),
        };
        body.raw(&format!(
            concat!(
                r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/></w:tblPr>"#,
                r#"<w:tblGrid><w:gridCol w:w="{lw}"/><w:gridCol w:w="{rw}"/></w:tblGrid><w:tr>"#,
                r#"<w:tc><w:tcPr><w:tcW w:w="{lw}" w:type="dxa"/></w:tcPr>{left}</w:tc>"#,
                r#"<w:tc><w:tcPr><w:tcW w:w="{rw}" w:type="dxa"/></w:tcPr>{right}</w:tc>"#,
                r#"</w:tr></w:tbl>"#
            ),
            lw = left_w,
            rw = right_w,
            left = left,
            right = right
        ));
    } else {
        body.raw(&header_block(profile));
        if has_photo {
            body.raw(&photo_paragraph("right"));
        }
    }
    if let Some(err) = photo_error {
        body.paragraph(&format!("(Photo could not be inserted: {})", err), RunStyle::sized(90));
    }

    body.section_title("Professional summary");
    body.paragraph(&profile.summary, RunStyle::sized(110));

    body.section_title("Professional experience");
    for exp in &profile.experience {
        body.paragraph(
            &format!("{} – {} | {}", exp.role, exp.employer, exp.period),
            RunStyle::sized(115).bold(),
        );
        let subtitle: Vec<&str> = [exp.location.as_deref(), exp.sector.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect();
        if !subtitle.is_empty() {
            body.paragraph(&subtitle.join(" / "), RunStyle::sized(100));
        }
        for (label, items) in [
            ("Achievements:", &exp.achievements),
            ("Activities:", &exp.activities),
            ("Projects:", &exp.projects),
        ] {
            if !items.is_empty() {
                body.paragraph(label, RunStyle::sized(105).bold());
                body.bullets(items.iter().map(String::as_str));
            }
        }
    }

    body.section_title("Education");
    for ed in &profile.education {
        body.paragraph(
            &format!("{} – {}", ed.degree, ed.institution),
            RunStyle::sized(115).bold(),
        );
        if let Some(detail) = ed.detail.as_deref().filter(|d| !d.trim().is_empty()) {
            body.paragraph(detail, RunStyle::sized(105));
        }
    }

    if !profile.certifications.is_empty() {
        body.section_title("Certifications");
        body.bullets(profile.certifications.iter().map(String::as_str));
    }

    body.section_title("Skills");
    body.bullets(profile.skills.iter().map(String::as_str));

    body.section_title("Languages");
    let pairs: Vec<String> = profile
        .languages
        .iter()
        .map(|(language, level)| format!("{}: {}", language, level))
        .collect();
    body.bullets(pairs.iter().map(String::as_str));

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
            r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing">"#,
            r#"<w:body>{body}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/>"#,
            r#"<w:pgMar w:top="{m}" w:right="{m}" w:bottom="{m}" w:left="{m}" w:header="708" w:footer="708" w:gutter="0"/>"#,
            r#"</w:sectPr></w:body></w:document>"#
        ),
        body = body.xml,
        m = MARGIN_TWIPS
    )
}

fn document_rels(photo: Option<&EmbeddedPhoto>) -> String {
    let image_rel = photo
        .map(|p| {
            format!(
                r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/photo.{}"/>"#,
                PHOTO_REL_ID, p.extension
            )
        })
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        image_rel
    )
}

/// Writes one `.docx` per profile.
#[derive(Debug, Clone)]
pub struct DocxRenderer {
    year: i32,
}

impl DocxRenderer {
    pub fn new() -> Self {
        Self {
            year: chrono::Local::now().year(),
        }
    }

    pub fn with_year(year: i32) -> Self {
        Self { year }
    }
}

impl Default for DocxRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn write_package(out_path: &Path, document: &str, photo: Option<&EmbeddedPhoto>) -> Result<()> {
    let mut zip = ZipWriter::new(File::create(out_path)?);

    zip.start_file("[Content_Types].xml", SimpleFileOptions::default())?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;
    zip.start_file("_rels/.rels", SimpleFileOptions::default())?;
    zip.write_all(PACKAGE_RELS.as_bytes())?;
    zip.start_file(
        "word/_rels/document.xml.rels",
        SimpleFileOptions::default(),
    )?;
    zip.write_all(document_rels(photo).as_bytes())?;
    zip.start_file("word/document.xml", SimpleFileOptions::default())?;
    zip.write_all(document.as_bytes())?;
    if let Some(photo) = photo {
        zip.start_file(
            format!("word/media/photo.{}", photo.extension),
            SimpleFileOptions::default(),
        )?;
        zip.write_all(&photo.bytes)?;
    }
    zip.finish()?;
    Ok(())
}

impl DocumentRenderer for DocxRenderer {
    fn render(&self, profile: &Profile, output_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(output_dir)?;
        let out_path = output_dir.join(output_file_name(&profile.name, self.year));

        let (photo, photo_error) = match load_photo(profile) {
            Ok(photo) => (photo, None),
            Err(e) => {
                tracing::warn!("Photo for '{}' could not be read: {}", profile.name, e);
                (None, Some(e))
            }
        };
        let document = document_xml(profile, photo.is_some(), photo_error.as_deref());

        write_package(&out_path, &document, photo.as_ref()).map_err(|e| CvError::RenderError {
            message: format!("{}: {}", out_path.display(), e),
        })?;
        Ok(out_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{EducationEntry, ExperienceEntry};
    use std::io::Read;
    use tempfile::TempDir;

    fn sample() -> Profile {
        Profile {
            name: "Ana Ruiz".to_string(),
            title: "Engineer & Lead".to_string(),
            contact: vec!["a@x.com".to_string(), "linkedin.com/in/ana".to_string()],
            location: Some("Madrid".to_string()),
            summary: "Builds <reliable> systems".to_string(),
            experience: vec![ExperienceEntry {
                role: "Dev".to_string(),
                employer: "ACME".to_string(),
                period: "2020 – 2024".to_string(),
                achievements: vec!["Cut latency".to_string()],
                ..ExperienceEntry::default()
            }],
            education: vec![EducationEntry {
                degree: "BSc".to_string(),
                institution: "UPM".to_string(),
                ..EducationEntry::default()
            }],
            skills: vec!["Go".to_string()],
            languages: [("Spanish".to_string(), "Native".to_string())].into_iter().collect(),
            ..Profile::default()
        }
    }

    fn read_entry(path: &Path, name: &str) -> Option<Vec<u8>> {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut entry = archive.by_name(name).ok()?;
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf).unwrap();
        Some(buf)
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name(" Ana María Ruiz ", 2026), "CV_Ana_María_Ruiz_2026.docx");
        assert_eq!(output_file_name("A/B", 2025), "CV_A_B_2025.docx");
    }

    #[test]
    fn test_render_writes_escaped_document_without_linkedin() {
        let dir = TempDir::new().unwrap();
        let path = DocxRenderer::with_year(2026).render(&sample(), dir.path()).unwrap();

        assert_eq!(path, dir.path().join("CV_Ana_Ruiz_2026.docx"));
        let xml = String::from_utf8(read_entry(&path, "word/document.xml").unwrap()).unwrap();
        assert!(xml.contains("Engineer &amp; Lead"));
        assert!(xml.contains("Builds &lt;reliable&gt; systems"));
        assert!(xml.contains("a@x.com | Madrid"));
        assert!(!xml.contains("linkedin"));
        assert!(xml.contains("Spanish: Native"));
        assert!(!xml.contains("CERTIFICATIONS"));
        assert!(read_entry(&path, "word/media/photo.png").is_none());
    }

    #[test]
    fn test_render_embeds_photo_beside_text() {
        let dir = TempDir::new().unwrap();
        let photo = dir.path().join("ana.png");
        fs::write(&photo, b"\x89PNG\r\n\x1a\n fake").unwrap();

        let mut profile = sample();
        profile.include_photo = true;
        profile.photo_path = Some(photo.to_string_lossy().into_owned());
        profile.photo_layout = PhotoLayout::LeftBesideText;

        let path = DocxRenderer::with_year(2026).render(&profile, &dir.path().join("out")).unwrap();
        assert_eq!(read_entry(&path, "word/media/photo.png").unwrap(), b"\x89PNG\r\n\x1a\n fake");
        let xml = String::from_utf8(read_entry(&path, "word/document.xml").unwrap()).unwrap();
        assert!(xml.contains("<w:tbl>"));
        assert!(xml.contains(PHOTO_REL_ID));
        let rels = String::from_utf8(read_entry(&path, "word/_rels/document.xml.rels").unwrap()).unwrap();
        assert!(rels.contains("media/photo.png"));
    }

    #[test]
    fn test_unsupported_photo_format_leaves_a_note() {
        let dir = TempDir::new().unwrap();
        let photo = dir.path().join("ana.png");
        fs::write(&photo, b"RIFF\x00\x00\x00\x00WEBPVP8 ").unwrap();

        let mut profile = sample();
        profile.include_photo = true;
        profile.photo_path = Some(photo.to_string_lossy().into_owned());

        let path = DocxRenderer::with_year(2026).render(&profile, dir.path()).unwrap();
        assert!(read_entry(&path, "word/media/photo.png").is_none());
        let xml = String::from_utf8(read_entry(&path, "word/document.xml").unwrap()).unwrap();
        assert!(xml.contains("(Photo could not be inserted:"));
        assert!(!xml.contains(PHOTO_REL_ID));
    }

    #[test]
    fn test_jpeg_bytes_are_embedded_whatever_the_file_name() {
        let dir = TempDir::new().unwrap();
        let photo = dir.path().join("ana.photo");
        fs::write(&photo, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap();

        let mut profile = sample();
        profile.include_photo = true;
        profile.photo_path = Some(photo.to_string_lossy().into_owned());

        let path = DocxRenderer::with_year(2026).render(&profile, dir.path()).unwrap();
        assert!(read_entry(&path, "word/media/photo.jpg").is_some());
    }

    #[test]
    fn test_unwritable_output_is_render_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("CV_Ana_Ruiz_2026.docx");
        fs::create_dir_all(&blocker).unwrap();

        let err = DocxRenderer::with_year(2026).render(&sample(), dir.path()).unwrap_err();
        assert!(matches!(err, CvError::RenderError { .. }));
    }

    #[test]
    fn test_photo_ignored_when_not_requested() {
        let dir = TempDir::new().unwrap();
        let photo = dir.path().join("ana.jpg");
        fs::write(&photo, b"jpg").unwrap();

        let mut profile = sample();
        profile.photo_path = Some(photo.to_string_lossy().into_owned());
        let path = DocxRenderer::with_year(2026).render(&profile, dir.path()).unwrap();
        assert!(read_entry(&path, "word/media/photo.jpg").is_none());
    }
}
