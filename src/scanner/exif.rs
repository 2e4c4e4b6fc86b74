use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// EXIFの ImageDescription を取得
pub fn extract_description(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let mut bufreader = BufReader::new(file);
    let exif_reader = exif::Reader::new();
    let exif = exif_reader.read_from_container(&mut bufreader)?;

    if let Some(field) = exif.get_field(exif::Tag::ImageDescription, exif::In::PRIMARY) {
        if let exif::Value::Ascii(ref values) = field.value {
            let text = values
                .iter()
                .map(|v| String::from_utf8_lossy(v).into_owned())
                .collect::<Vec<_>>()
                .join(" ");
            let text = text.trim_matches(char::from(0)).trim().to_string();
            if !text.is_empty() {
                return Ok(text);
            }
        }
    }

    Err("No ImageDescription found in EXIF".into())
}
