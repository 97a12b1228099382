/// Collapses runs of whitespace to single spaces and trims. Empty results
/// become `None`.
pub fn clean_text(input: &str) -> Option<String> {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::clean_text;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(
            clean_text("  EBVR-018\n\t A  \"Title\" "),
            Some("EBVR-018 A \"Title\"".to_string())
        );
        assert_eq!(clean_text(" \n "), None);
    }
}
