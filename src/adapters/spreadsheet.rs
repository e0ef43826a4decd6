use crate::core::fields::{
    cell_list, first_present, first_text, parse_education, parse_experience, parse_languages, Row,
};
use crate::core::photo::PhotoResolver;
use crate::core::text::coerce_bool;
use crate::domain::model::{PhotoLayout, Profile};
use crate::utils::error::{CvError, Result};
use crate::utils::validation::validate_file_extension;
use serde_json::Value;
use std::fs::File;
use std::path::Path;

const SPREADSHEET_EXTENSIONS: [&str; 5] = ["csv", "xlsx", "xlsm", "xls", "ods"];
const UNNAMED: &str = "Sin Nombre";

fn header_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn is_blank_row(row: &Row) -> bool {
    row.values().all(|v| match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    })
}

/// Rows of a CSV file keyed by folded header.
pub fn read_csv_rows(path: &Path) -> Result<Vec<Row>> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader.headers()?.iter().map(header_key).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.clone(), Value::String(cell.to_string())))
            .collect();

        if !is_blank_row(&row) {
            rows.push(row);
        }
    }
    Ok(rows)
}

#[cfg(feature = "xlsx")]
fn excel_cell(cell: &calamine::Data) -> Value {
    use calamine::Data;

    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Bool(b) => Value::Bool(*b),
        Data::Int(i) => Value::from(*i),
        // 整數值的浮點儲存格轉為整數, "1.0" 才能被當作布林值
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Value::from(*f as i64),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        other => Value::String(other.to_string()),
    }
}

/// Rows of the first worksheet of an Excel/ODS workbook.
#[cfg(feature = "xlsx")]
pub fn read_excel_rows(path: &Path) -> Result<Vec<Row>> {
    use calamine::{open_workbook_auto, Reader};

    let mut workbook = open_workbook_auto(path).map_err(|e| CvError::SpreadsheetError {
        message: format!("{}: {}", path.display(), e),
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CvError::SpreadsheetError {
            message: format!("{} has no worksheets", path.display()),
        })?
        .map_err(|e| CvError::SpreadsheetError {
            message: e.to_string(),
        })?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(header_row) => header_row.iter().map(|c| header_key(&c.to_string())).collect(),
        None => return Ok(Vec::new()),
    };

    let rows = sheet_rows
        .map(|cells| {
            headers
                .iter()
                .zip(cells.iter())
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, cell)| (header.clone(), excel_cell(cell)))
                .collect::<Row>()
        })
        .filter(|row| !is_blank_row(row))
        .collect();
    Ok(rows)
}

#[cfg(not(feature = "xlsx"))]
pub fn read_excel_rows(_path: &Path) -> Result<Vec<Row>> {
    Err(CvError::FeatureUnavailableError {
        feature: "Excel ingestion".to_string(),
        cargo_feature: "xlsx".to_string(),
    })
}

/// One canonical profile from a loosely structured row.
pub fn profile_from_row(row: &Row, resolver: &PhotoResolver) -> Profile {
    let name = first_text(row, &["nombre", "name"]).unwrap_or_else(|| UNNAMED.to_string());

    // email | móvil | linkedin | web; linkedin is dropped at render time
    let contact = [
        first_text(row, &["email", "correo"]),
        first_text(row, &["movil", "celular", "telefono", "phone"]),
        first_text(row, &["linkedin"]),
        first_text(row, &["web", "sitio", "website"]),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut include_photo = coerce_bool(first_present(row, &["incluir_foto", "include_photo"]));
    let photo_file = first_text(row, &["foto", "foto_filename", "ruta_foto", "photo"]);
    let photo_path = resolver
        .locate(photo_file.as_deref(), &name)
        .map(|found| {
            include_photo = true;
            resolver.to_stored_path(&found)
        });

    let photo_layout = match first_text(row, &["photo_position", "photo_layout"]) {
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!("{} for '{}', using {}", e, name, PhotoLayout::default());
            PhotoLayout::default()
        }),
        None => PhotoLayout::default(),
    };

    Profile {
        title: first_text(row, &["cargo", "title"]).unwrap_or_default(),
        contact,
        location: first_text(row, &["ubicacion", "location"]),
        summary: first_text(row, &["resumen", "summary"]).unwrap_or_default(),
        experience: parse_experience(row),
        education: parse_education(row),
        certifications: cell_list(first_present(row, &["certificaciones", "certifications"])),
        skills: cell_list(first_present(row, &["habilidades", "skills"])),
        languages: parse_languages(first_present(row, &["idiomas", "languages"])),
        include_photo,
        photo_path,
        photo_layout,
        name,
        ..Profile::default()
    }
}

/// Loads every data row of the first sheet as a profile.
pub fn load_spreadsheet(path: &Path, resolver: &PhotoResolver) -> Result<Vec<Profile>> {
    validate_file_extension("spreadsheet", path, &SPREADSHEET_EXTENSIONS)?;

    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    let rows = if is_csv {
        read_csv_rows(path)?
    } else {
        read_excel_rows(path)?
    };

    tracing::info!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows.iter().map(|row| profile_from_row(row, resolver)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => panic!("row fixture must be an object"),
        }
    }

    #[test]
    fn test_profile_from_row_maps_aliases() {
        let dir = TempDir::new().unwrap();
        let resolver = PhotoResolver::new(dir.path(), dir.path().join("photos"));
        let r = row(json!({
            "nombre": "Natalia Moreno",
            "cargo": "Consultora SAP CPI",
            "correo": "natalia@example.com",
            "celular": 51999888777i64,
            "linkedin": "linkedin.com/in/nmoreno",
            "sitio": "nmoreno.dev",
            "ubicacion": "Lima, Perú",
            "resumen": "Integraciones SAP",
            "puesto": "Consultora",
            "empresa": "EXOLMAR",
            "grado": "Ingeniería de Sistemas",
            "institucion": "PUCP",
            "habilidades": "SAP CPI; Integraciones B2B",
            "idiomas": "Español:Nativo;Inglés:Avanzado",
            "certificaciones": "",
            "photo_position": "left_table",
            "columna_rara": "ignored"
        }));

        let profile = profile_from_row(&r, &resolver);
        assert_eq!(profile.name, "Natalia Moreno");
        assert_eq!(
            profile.contact,
            vec![
                "natalia@example.com",
                "51999888777",
                "linkedin.com/in/nmoreno",
                "nmoreno.dev"
            ]
        );
        assert_eq!(profile.location.as_deref(), Some("Lima, Perú"));
        assert_eq!(profile.experience.len(), 1);
        assert_eq!(profile.education[0].institution, "PUCP");
        assert_eq!(profile.skills.len(), 2);
        assert_eq!(profile.languages.len(), 2);
        assert!(profile.certifications.is_empty());
        assert_eq!(profile.photo_layout, PhotoLayout::LeftBesideText);
        assert!(!profile.include_photo);
        assert!(crate::core::validate::validate(&profile).is_valid());
    }

    #[test]
    fn test_profile_from_row_finds_photo_and_enables_it() {
        let dir = TempDir::new().unwrap();
        let photos = dir.path().join("assets").join("photos");
        fs::create_dir_all(&photos).unwrap();
        fs::write(photos.join("luis.png"), b"png").unwrap();
        fs::write(photos.join("maria-lopez.jpg"), b"jpg").unwrap();
        let resolver = PhotoResolver::new(dir.path(), &photos);

        let by_file = profile_from_row(
            &row(json!({"nombre": "Luis", "foto": "luis", "incluir_foto": "no"})),
            &resolver,
        );
        assert!(by_file.include_photo);
        assert_eq!(
            by_file.photo_path.map(std::path::PathBuf::from),
            Some(std::path::PathBuf::from("assets").join("photos").join("luis.png"))
        );

        let by_name = profile_from_row(
            &row(json!({"nombre": "María López", "foto": "missing"})),
            &resolver,
        );
        assert!(by_name.include_photo);
        assert!(by_name.photo_path.unwrap().ends_with("maria-lopez.jpg"));
    }

    #[test]
    fn test_profile_from_row_defaults() {
        let dir = TempDir::new().unwrap();
        let resolver = PhotoResolver::new(dir.path(), dir.path());
        let profile = profile_from_row(
            &row(json!({"incluir_foto": "Sí", "photo_position": "upside"})),
            &resolver,
        );

        assert_eq!(profile.name, UNNAMED);
        assert!(profile.title.is_empty());
        assert!(profile.include_photo);
        assert_eq!(profile.photo_path, None);
        assert_eq!(profile.photo_layout, PhotoLayout::RightInline);
    }

    #[test]
    fn test_load_csv_folds_headers_and_skips_blank_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("people.csv");
        fs::write(
            &path,
            " Nombre ,CARGO,Habilidades,Idiomas\nAna Ruiz,Engineer,\"Go, Rust\",Spanish:Native\n,,,\nLuis,QA,Testing,\n",
        )
        .unwrap();
        let resolver = PhotoResolver::new(dir.path(), dir.path());

        let profiles = load_spreadsheet(&path, &resolver).unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].name, "Ana Ruiz");
        assert_eq!(profiles[0].title, "Engineer");
        assert_eq!(profiles[0].skills, vec!["Go", "Rust"]);
        assert_eq!(profiles[1].skills, vec!["Testing"]);
        assert!(profiles[1].languages.is_empty());
    }

    #[test]
    fn test_load_spreadsheet_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let resolver = PhotoResolver::new(dir.path(), dir.path());
        let err = load_spreadsheet(&dir.path().join("people.txt"), &resolver).unwrap_err();
        assert!(matches!(err, CvError::InvalidConfigValueError { .. }));
    }

    #[cfg(feature = "xlsx")]
    mod xlsx {
        use super::*;
        use calamine::Data;
        use std::io::Write;
        use zip::write::{SimpleFileOptions, ZipWriter};

        const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/worksheets/sheet2.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

        const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

        const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Perfiles" sheetId="1" r:id="rId1"/><sheet name="Notas" sheetId="2" r:id="rId2"/></sheets></workbook>"#;

        const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/></Relationships>"#;

        // C1 has no header; row 3 is empty
        const PEOPLE_SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t> Nombre </t></is></c><c r="B1" t="inlineStr"><is><t>CARGO</t></is></c><c r="D1" t="inlineStr"><is><t>Incluir_Foto</t></is></c><c r="E1" t="inlineStr"><is><t>Habilidades</t></is></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>Ana Ruiz</t></is></c><c r="B2" t="inlineStr"><is><t>Engineer</t></is></c><c r="C2" t="inlineStr"><is><t>orphan</t></is></c><c r="D2"><v>1</v></c><c r="E2" t="inlineStr"><is><t>Go; Rust</t></is></c></row><row r="4"><c r="A4" t="inlineStr"><is><t>Luis</t></is></c><c r="B4" t="inlineStr"><is><t>QA</t></is></c><c r="D4"><v>0</v></c></row></sheetData></worksheet>"#;

        const NOTES_SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>Nombre</t></is></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>Second Sheet</t></is></c></row></sheetData></worksheet>"#;

        fn write_workbook(path: &Path) {
            let mut zip = ZipWriter::new(File::create(path).unwrap());
            for (name, body) in [
                ("[Content_Types].xml", CONTENT_TYPES),
                ("_rels/.rels", ROOT_RELS),
                ("xl/workbook.xml", WORKBOOK),
                ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
                ("xl/worksheets/sheet1.xml", PEOPLE_SHEET),
                ("xl/worksheets/sheet2.xml", NOTES_SHEET),
            ] {
                zip.start_file(
                    name,
                    SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored),
                )
                .unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }

        #[test]
        fn test_excel_cell_conversions() {
            assert_eq!(excel_cell(&Data::Empty), Value::Null);
            assert_eq!(excel_cell(&Data::String("x".into())), json!("x"));
            assert_eq!(excel_cell(&Data::Bool(true)), json!(true));
            assert_eq!(excel_cell(&Data::Int(7)), json!(7));
            assert_eq!(excel_cell(&Data::Float(2.5)), json!(2.5));

            let whole = excel_cell(&Data::Float(1.0));
            assert_eq!(whole, json!(1));
            assert!(coerce_bool(Some(&whole)));
            assert!(!coerce_bool(Some(&excel_cell(&Data::Float(0.0)))));
        }

        #[test]
        fn test_read_excel_rows_uses_first_sheet() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("people.xlsx");
            write_workbook(&path);

            let rows = read_excel_rows(&path).unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].get("nombre"), Some(&json!("Ana Ruiz")));
            assert_eq!(rows[0].get("incluir_foto"), Some(&json!(1)));
            assert!(!rows[0].contains_key(""));
            assert!(!rows[0].values().any(|v| v == &json!("orphan")));
        }

        #[test]
        fn test_load_xlsx_spreadsheet() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("people.xlsx");
            write_workbook(&path);
            let resolver = PhotoResolver::new(dir.path(), dir.path());

            let profiles = load_spreadsheet(&path, &resolver).unwrap();
            let names: Vec<&str> = profiles.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(names, vec!["Ana Ruiz", "Luis"]);
            assert_eq!(profiles[0].title, "Engineer");
            assert_eq!(profiles[0].skills, vec!["Go", "Rust"]);
            assert!(profiles[0].include_photo);
            assert!(!profiles[1].include_photo);
        }

        #[test]
        fn test_read_excel_rows_reports_unreadable_workbook() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("broken.xlsx");
            fs::write(&path, b"not a zip").unwrap();
            assert!(matches!(
                read_excel_rows(&path),
                Err(CvError::SpreadsheetError { .. })
            ));
        }
    }
}
