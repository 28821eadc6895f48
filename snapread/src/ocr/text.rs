use super::types::AnalyzeResult;

/// Flattens the nested read result (pages → lines → words) into one text
/// block. Word tokens are joined by single spaces, falling back to the
/// pre-joined line text when the service omits words; every line is
/// terminated by a newline. Order is preserved throughout. Pure function.
pub fn flatten_text(result: &AnalyzeResult) -> String {
    let mut recognized = String::new();
    for page in &result.read_results {
        for line in &page.lines {
            if line.words.is_empty() {
                if let Some(text) = &line.text {
                    recognized.push_str(text);
                }
            } else {
                let mut words = line.words.iter();
                if let Some(first) = words.next() {
                    recognized.push_str(&first.text);
                }
                for word in words {
                    recognized.push(' ');
                    recognized.push_str(&word.text);
                }
            }
            recognized.push('\n');
        }
    }
    recognized
}
