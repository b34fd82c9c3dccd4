use regex::Regex;

/// Maximum accepted upload size (10MB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// File extensions the ingestion pipeline accepts.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "doc", "docx", "txt"];

/// Collapse whitespace and strip characters outside basic punctuation.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let re_special = Regex::new(r"[^\w\s.,!?;:()\-\[\]{}]").unwrap();
    let re_whitespace = Regex::new(r"\s+").unwrap();

    let cleaned = re_special.replace_all(text, " ");
    let cleaned = re_whitespace.replace_all(&cleaned, " ");

    cleaned.trim().to_string()
}

/// Normalize a user query before embedding: clean, lowercase, and expand
/// the admission abbreviations prospective students actually type.
pub fn preprocess_query(query: &str) -> String {
    if query.trim().is_empty() {
        return String::new();
    }

    let abbreviations = [
        ("gpa", "grade point average"),
        ("sat", "scholastic assessment test"),
        ("act", "american college testing"),
        ("fafsa", "free application for federal student aid"),
    ];

    let mut normalized = clean_text(query).to_lowercase();
    for (abbr, full_form) in abbreviations {
        normalized = normalized.replace(abbr, full_form);
    }

    normalized
}

/// Truncate text to `max_length` chars, preferring a sentence boundary
/// when one falls in the last fifth of the window.
pub fn truncate_excerpt(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_length).collect();
    match truncated.rfind('.') {
        Some(last_period) if last_period > max_length * 4 / 5 => {
            truncated[..last_period + 1].to_string()
        }
        _ => format!("{}...", truncated),
    }
}

/// Lowercased extension of a filename, if it has one.
pub fn file_extension(filename: &str) -> Option<String> {
    filename.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

/// Whether the filename carries an extension the pipeline supports.
pub fn allowed_file_type(filename: &str) -> bool {
    match file_extension(filename) {
        Some(ext) => ALLOWED_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

/// Strip path components and shell-hostile characters from an uploaded
/// filename before it touches the filesystem.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = sanitized.trim_matches(['.', '_']).to_string();
    if trimmed.is_empty() {
        "document".to_string()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_whitespace_and_specials() {
        let cleaned = clean_text("Tuition:  $12,000\n\nper\tyear @ campus!");
        assert_eq!(cleaned, "Tuition: 12,000 per year campus!");
    }

    #[test]
    fn preprocess_expands_abbreviations() {
        let query = preprocess_query("What GPA and SAT do I need?");
        assert!(query.contains("grade point average"));
        assert!(query.contains("scholastic assessment test"));
        assert!(!query.contains("gpa"));
    }

    #[test]
    fn truncate_prefers_sentence_boundary() {
        let text = "First sentence about deadlines. Second sentence about fees that keeps going well past the cutoff point";
        let excerpt = truncate_excerpt(text, 35);
        assert_eq!(excerpt, "First sentence about deadlines.");
    }

    #[test]
    fn truncate_falls_back_to_ellipsis() {
        let text = "no sentence boundary anywhere in this stretch of text at all";
        let excerpt = truncate_excerpt(text, 20);
        assert_eq!(excerpt, "no sentence boundar...");
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_excerpt("short", 500), "short");
    }

    #[test]
    fn file_type_allow_list() {
        assert!(allowed_file_type("handbook.pdf"));
        assert!(allowed_file_type("Requirements.DOCX"));
        assert!(allowed_file_type("notes.txt"));
        assert!(allowed_file_type("legacy.doc"));
        assert!(!allowed_file_type("malware.exe"));
        assert!(!allowed_file_type("no_extension"));
    }

    #[test]
    fn sanitize_strips_paths_and_specials() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("admissions guide.pdf"), "admissions_guide.pdf");
        assert_eq!(sanitize_filename("///"), "document");
    }
}
