//! Quoted-field CSV line parsing
//!
//! A deliberately small parser: a double quote toggles quoted mode, a comma
//! ends a field only outside quotes, quotes are dropped from the output and
//! every field is whitespace-trimmed. There is no escaping. An odd number of
//! quotes leaves the rest of the line in quoted mode; that is accepted, not
//! reported.

/// Split one line into trimmed fields
///
/// # Examples
/// ```
/// use recital_common::csv::parse_line;
///
/// let fields = parse_line(r#"1,"Ballet, Grand","Spring Recital",img.jpg"#);
/// assert_eq!(fields, vec!["1", "Ballet, Grand", "Spring Recital", "img.jpg"]);
/// ```
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

/// Parse every data row of a document, skipping the header row
///
/// The document is trimmed before splitting, so trailing newlines do not
/// produce phantom rows. Blank interior rows are skipped.
pub fn data_rows(text: &str) -> impl Iterator<Item = Vec<String>> + '_ {
    text.trim()
        .split('\n')
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_fields() {
        assert_eq!(parse_line("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_quoted_comma_kept_in_field() {
        let fields = parse_line(r#"1,"Ballet, Grand","Spring Recital",img.jpg"#);
        assert_eq!(fields, vec!["1", "Ballet, Grand", "Spring Recital", "img.jpg"]);
    }

    #[test]
    fn test_fields_are_trimmed_including_quoted() {
        let fields = parse_line(r#"  1 , "  padded  " ,x  "#);
        assert_eq!(fields, vec!["1", "padded", "x"]);
    }

    #[test]
    fn test_empty_line_yields_single_empty_field() {
        assert_eq!(parse_line(""), vec![""]);
    }

    #[test]
    fn test_empty_fields_preserved() {
        assert_eq!(parse_line(",,"), vec!["", "", ""]);
    }

    #[test]
    fn test_quotes_inside_unquoted_field_are_dropped() {
        assert_eq!(parse_line(r#"say "hi" now,2"#), vec!["say hi now", "2"]);
    }

    #[test]
    fn test_unbalanced_quote_absorbs_rest_of_line() {
        let fields = parse_line(r#"1,"Open quote, never closed,img.jpg"#);
        assert_eq!(fields, vec!["1", "Open quote, never closed,img.jpg"]);
    }

    #[test]
    fn test_carriage_return_is_trimmed() {
        assert_eq!(parse_line("1,Title\r"), vec!["1", "Title"]);
    }

    #[test]
    fn test_data_rows_skips_header_and_blank_lines() {
        let text = "index,title,performances,image\n1,A,x,a.jpg\n\n2,B,y,b.jpg\n\n";
        let rows: Vec<_> = data_rows(text).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], "A");
        assert_eq!(rows[1][1], "B");
    }

    #[test]
    fn test_data_rows_header_only() {
        assert_eq!(data_rows("index,title\n").count(), 0);
        assert_eq!(data_rows("").count(), 0);
    }
}
