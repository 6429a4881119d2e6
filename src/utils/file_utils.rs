use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {:?}", dir))?;
    }
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse JSON: {:?}", path))
}

/// Writes `value` as compact JSON, replacing any existing file.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)
        .with_context(|| format!("Failed to write JSON: {:?}", path))?;
    writer.flush()?;
    Ok(())
}

pub fn append_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open file for append: {:?}", path))?;
    write_all_lines(file, lines).with_context(|| format!("Failed to write: {:?}", path))
}

pub fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    write_all_lines(file, lines).with_context(|| format!("Failed to write: {:?}", path))
}

fn write_all_lines<S: AsRef<str>>(file: File, lines: &[S]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{}", line.as_ref())?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_lines_accumulates_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("log.txt");
        ensure_dir(path.parent().unwrap()).unwrap();

        append_lines(&path, &["file a.png"]).unwrap();
        append_lines(&path, &["duration 0.5", "file b.png"]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "file a.png\nduration 0.5\nfile b.png\n");
    }

    #[test]
    fn json_is_written_compact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &serde_json::json!([{"a": 1}])).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"[{"a":1}]"#);

        let back: serde_json::Value = read_json(&path).unwrap();
        assert_eq!(back[0]["a"], 1);
    }
}
