use std::collections::HashSet;

/// Characters with special meaning in prompt weighting syntax.
const PROMPT_SYNTAX_CHARS: [char; 6] = ['(', ')', '[', ']', '{', '}'];

/// Post-processing for tag names read from metadata or user input.
///
/// Training captions are kept as written apart from whitespace, so that
/// tags like `1girl` or `looking at viewer` survive unchanged.
pub struct TagNormalizer;

impl TagNormalizer {
    /// Trims surrounding whitespace. Inner spacing is kept as the trainer wrote it.
    ///
    /// # Examples
    ///
    /// ```
    /// use lora_wildcard::tags::TagNormalizer;
    ///
    /// assert_eq!(TagNormalizer::normalize_tag("  white background "), "white background");
    /// assert_eq!(TagNormalizer::normalize_tag("looking at  viewer"), "looking at  viewer");
    /// assert_eq!(TagNormalizer::normalize_tag("   "), "");
    /// ```
    #[must_use]
    pub fn normalize_tag(tag: &str) -> String {
        tag.trim().to_string()
    }

    /// Normalizes a collection of tags, removing duplicates and empty strings.
    ///
    /// Preserves the order of first occurrence.
    ///
    /// # Examples
    ///
    /// ```
    /// use lora_wildcard::tags::TagNormalizer;
    ///
    /// let tags = vec![" solo".to_string(), "solo ".to_string(), "".to_string()];
    /// assert_eq!(TagNormalizer::normalize_tags(tags), vec!["solo"]);
    /// ```
    #[must_use]
    pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        tags.into_iter()
            .map(|tag| Self::normalize_tag(&tag))
            .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
            .collect()
    }

    /// Backslash-escapes bracket characters so a prompt parser reads them
    /// literally instead of as attention weights.
    ///
    /// # Examples
    ///
    /// ```
    /// use lora_wildcard::tags::TagNormalizer;
    ///
    /// assert_eq!(
    ///     TagNormalizer::escape_prompt_syntax("hatsune miku (cosplay)"),
    ///     r"hatsune miku \(cosplay\)"
    /// );
    /// ```
    #[must_use]
    pub fn escape_prompt_syntax(tag: &str) -> String {
        let mut escaped = String::with_capacity(tag.len());
        for c in tag.chars() {
            if PROMPT_SYNTAX_CHARS.contains(&c) {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }
}
