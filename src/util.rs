use itertools::Itertools;


// Slightly adjusted macro from https://docs.rs/once_cell/latest/once_cell/#lazily-compiled-regex:
#[macro_export]
macro_rules! once_cell_regex {
    ($re:expr $(,)?) => {{
        static RE: std::sync::OnceLock<regex_lite::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex_lite::Regex::new($re).unwrap())
    }};
}

// If a string consists of a single character, returns the character. Otherwise returns none.
pub fn as_single_char(s: &str) -> Option<char> {
    s.chars().collect_tuple().map(|(single_char,)| single_char)
}

// Popeye output reaches us HTML-escaped. Only the entities Popeye can produce are handled.
pub fn decode_entities(s: &str) -> String {
    s.replace("&gt;", ">").replace("&lt;", "<").replace("&amp;", "&")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_char() {
        assert_eq!(as_single_char("a"), Some('a'));
        assert_eq!(as_single_char(""), None);
        assert_eq!(as_single_char("ab"), None);
    }

    #[test]
    fn entities() {
        assert_eq!(decode_entities("wKe1&lt;--&gt;bKe8"), "wKe1<-->bKe8");
        assert_eq!(decode_entities("&amp;gt;"), "&gt;");
    }
}
