//! Frequency-threshold sampling of tags into a prompt.

use std::collections::{BTreeSet, HashSet};

use rand::Rng;

use crate::models::TagFrequency;

use super::normalizer::TagNormalizer;

/// Rule deciding which tags survive sampling.
///
/// Both variants compare a tag's frequency against a fraction of the highest
/// frequency in the list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// Keep tags whose frequency exceeds `ratio * max`.
    Fixed(f64),
    /// Keep each tag whose frequency exceeds `u * max` for a fresh uniform
    /// `u` in `[0, 1)`, so frequent tags are kept more often.
    Random,
}

impl Threshold {
    /// Interprets a command-line ratio. Negative values select random sampling.
    ///
    /// # Examples
    ///
    /// ```
    /// use lora_wildcard::tags::Threshold;
    ///
    /// assert_eq!(Threshold::from_ratio(0.5), Threshold::Fixed(0.5));
    /// assert_eq!(Threshold::from_ratio(-1.0), Threshold::Random);
    /// ```
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.0 {
            Self::Random
        } else {
            Self::Fixed(ratio)
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::Fixed(0.5)
    }
}

/// Selects tags from a frequency-sorted list and joins them into a prompt.
#[derive(Debug, Clone)]
pub struct Sampler {
    threshold: Threshold,
    excluded: HashSet<String>,
    escape: bool,
}

impl Sampler {
    /// Creates a sampler. Excluded tags are normalized before comparison.
    pub fn new<I, S>(threshold: Threshold, excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let excluded = TagNormalizer::normalize_tags(excluded.into_iter().map(Into::into).collect());
        Self {
            threshold,
            excluded: excluded.into_iter().collect(),
            escape: false,
        }
    }

    /// Enables backslash-escaping of prompt bracket syntax in kept tags.
    #[must_use]
    pub fn with_escape(mut self, escape: bool) -> Self {
        self.escape = escape;
        self
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Returns the kept tags, deduplicated and sorted.
    ///
    /// `tags` must be sorted by descending frequency: the first entry defines
    /// the maximum, even when that tag is itself excluded.
    pub fn sample<R: Rng>(&self, tags: &[TagFrequency], rng: &mut R) -> Vec<String> {
        let Some(max) = tags.first().map(TagFrequency::frequency) else {
            return Vec::new();
        };

        let mut kept = BTreeSet::new();
        for tag in tags {
            if self.excluded.contains(tag.tag()) {
                tracing::debug!(tag = tag.tag(), "ignoring excluded tag");
                continue;
            }

            let cutoff = match self.threshold {
                Threshold::Fixed(ratio) => ratio * max,
                Threshold::Random => rng.random::<f64>() * max,
            };

            if tag.frequency() > cutoff {
                let name = if self.escape {
                    TagNormalizer::escape_prompt_syntax(tag.tag())
                } else {
                    tag.tag().to_string()
                };
                kept.insert(name);
            }
        }

        kept.into_iter().collect()
    }

    /// Samples `tags` and joins the result with `", "`.
    pub fn generate_prompt<R: Rng>(&self, tags: &[TagFrequency], rng: &mut R) -> String {
        self.sample(tags, rng).join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sorted_tags() -> Vec<TagFrequency> {
        vec![
            TagFrequency::new("solo", 20.0),
            TagFrequency::new("simple background", 15.0),
            TagFrequency::new("smile", 12.0),
            TagFrequency::new("hat", 10.0),
            TagFrequency::new("blush", 3.0),
        ]
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_fixed_threshold_keeps_strictly_greater() {
        let sampler = Sampler::new(Threshold::Fixed(0.5), Vec::<String>::new());
        // cutoff is 10.0, so "hat" at exactly 10 is dropped
        assert_eq!(
            sampler.generate_prompt(&sorted_tags(), &mut rng()),
            "simple background, smile, solo"
        );
    }

    #[test]
    fn test_zero_threshold_keeps_all_positive() {
        let sampler = Sampler::new(Threshold::Fixed(0.0), Vec::<String>::new());
        assert_eq!(sampler.sample(&sorted_tags(), &mut rng()).len(), 5);
    }

    #[test]
    fn test_threshold_one_keeps_nothing() {
        let sampler = Sampler::new(Threshold::Fixed(1.0), Vec::<String>::new());
        assert_eq!(sampler.generate_prompt(&sorted_tags(), &mut rng()), "");
    }

    #[test]
    fn test_excluded_tags_removed_but_still_define_max() {
        let mut tags = sorted_tags();
        tags.insert(0, TagFrequency::new("white background", 40.0));

        let sampler = Sampler::new(Threshold::Fixed(0.5), ["white background", " solo "]);
        // max stays 40, cutoff 20, nothing else beats it
        assert_eq!(sampler.generate_prompt(&tags, &mut rng()), "");

        let sampler = Sampler::new(Threshold::Fixed(0.25), ["white background"]);
        assert_eq!(
            sampler.generate_prompt(&tags, &mut rng()),
            "simple background, smile, solo"
        );
    }

    #[test]
    fn test_output_deduplicated_and_sorted() {
        let tags = vec![
            TagFrequency::new("zebra", 9.0),
            TagFrequency::new("apple", 8.0),
            TagFrequency::new("zebra", 7.0),
        ];
        let sampler = Sampler::new(Threshold::Fixed(0.0), Vec::<String>::new());
        assert_eq!(sampler.generate_prompt(&tags, &mut rng()), "apple, zebra");
    }

    #[test]
    fn test_empty_tags_give_empty_prompt() {
        let sampler = Sampler::new(Threshold::Random, Vec::<String>::new());
        assert_eq!(sampler.generate_prompt(&[], &mut rng()), "");
    }

    #[test]
    fn test_random_threshold_always_keeps_max_tag() {
        // u * max < max for every u in [0, 1)
        let sampler = Sampler::new(Threshold::Random, Vec::<String>::new());
        let mut rng = rng();
        for _ in 0..50 {
            let kept = sampler.sample(&sorted_tags(), &mut rng);
            assert!(kept.contains(&"solo".to_string()));
        }
    }

    #[test]
    fn test_random_threshold_is_reproducible_with_seed() {
        let sampler = Sampler::new(Threshold::Random, Vec::<String>::new());
        let first = sampler.generate_prompt(&sorted_tags(), &mut StdRng::seed_from_u64(9));
        let second = sampler.generate_prompt(&sorted_tags(), &mut StdRng::seed_from_u64(9));
        assert_eq!(first, second);
    }

    #[test]
    fn test_random_threshold_favors_frequent_tags() {
        let sampler = Sampler::new(Threshold::Random, Vec::<String>::new());
        let mut rng = rng();
        let (mut smile, mut blush) = (0, 0);
        for _ in 0..1000 {
            let kept = sampler.sample(&sorted_tags(), &mut rng);
            smile += usize::from(kept.contains(&"smile".to_string()));
            blush += usize::from(kept.contains(&"blush".to_string()));
        }
        // expected rates are 0.6 and 0.15
        assert!(smile > blush * 2, "smile={smile} blush={blush}");
    }

    #[test]
    fn test_escape_applied_to_kept_tags() {
        let tags = vec![
            TagFrequency::new("miku (cosplay)", 5.0),
            TagFrequency::new("[rare]", 1.0),
        ];
        let sampler = Sampler::new(Threshold::Fixed(0.5), Vec::<String>::new()).with_escape(true);
        assert_eq!(sampler.generate_prompt(&tags, &mut rng()), r"miku \(cosplay\)");
    }

    #[test]
    fn test_from_ratio() {
        assert_eq!(Threshold::from_ratio(0.0), Threshold::Fixed(0.0));
        assert_eq!(Threshold::from_ratio(-0.01), Threshold::Random);
        assert_eq!(Threshold::default(), Threshold::Fixed(0.5));
    }
}
