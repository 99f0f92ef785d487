use std::io;
use std::path::Path;

/// Number of non-overlapping occurrences of `needle` in `haystack`, scanning
/// left to right. An empty needle counts as zero.
pub fn count_occurrences(haystack: &[u8], needle: &[u8]) -> u64 {
    if needle.is_empty() || needle.len() > haystack.len() {
        return 0;
    }

    let mut count = 0;
    let mut offset = 0;
    while offset + needle.len() <= haystack.len() {
        if &haystack[offset..offset + needle.len()] == needle {
            count += 1;
            offset += needle.len();
        } else {
            offset += 1;
        }
    }
    count
}

/// Read the whole file and count `magic_word` in its bytes.
pub fn count_in_file(path: &Path, magic_word: &str) -> io::Result<u64> {
    let content = std::fs::read(path)?;
    Ok(count_occurrences(&content, magic_word.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_non_overlapping() {
        assert_eq!(count_occurrences(b"aaaa", b"aa"), 2);
        assert_eq!(count_occurrences(b"aaa", b"aa"), 1);
        assert_eq!(count_occurrences(b"magic and more magic", b"magic"), 2);
        assert_eq!(count_occurrences(b"magimagic", b"magic"), 1);
    }

    #[test]
    fn degenerate_inputs_count_zero() {
        assert_eq!(count_occurrences(b"anything", b""), 0);
        assert_eq!(count_occurrences(b"", b"magic"), 0);
        assert_eq!(count_occurrences(b"mag", b"magic"), 0);
    }

    #[test]
    fn matching_is_case_sensitive_bytes() {
        assert_eq!(count_occurrences(b"Magic MAGIC magic", b"magic"), 1);
        assert_eq!(count_occurrences("ünïcödé magic ü".as_bytes(), "ü".as_bytes()), 2);
    }

    #[test]
    fn counts_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "magic\nmagic\nplain\n").unwrap();

        assert_eq!(count_in_file(&path, "magic").unwrap(), 2);
        assert!(count_in_file(&dir.path().join("missing"), "magic").is_err());
    }
}
