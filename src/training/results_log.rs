use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Append `YYYY-MM-DD HH:MM:SS:<text>` to `path`, creating the file first if needed.
pub fn append_line(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    writeln!(file, "{stamp}:{text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("results.log");

        append_line(&path, "win").unwrap();
        append_line(&path, "lose").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(content.ends_with('\n'));

        for (line, text) in lines.iter().zip(["win", "lose"]) {
            // "2024-01-31 12:34:56" is 19 chars
            assert_eq!(&line[19..], format!(":{text}"));
            assert_eq!(line.as_bytes()[4], b'-');
            assert_eq!(line.as_bytes()[10], b' ');
            assert_eq!(line.as_bytes()[13], b':');
        }
    }

    #[test]
    fn test_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.log");
        fs::write(&path, "earlier\n").unwrap();

        append_line(&path, "next").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("earlier\n"));
        assert!(content.trim_end().ends_with(":next"));
    }
}
