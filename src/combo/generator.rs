//! Keyword combination generator
//! Backtracking k-combinations over title, subtitle and cross pools under a hard cap.
//! Generation stops the moment the cap is reached, never after overshooting it.

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::time::Instant;
use tracing::debug;

use crate::config::ComboLimits;
use crate::rule::DEFAULT_STOPWORDS;

#[derive(Debug, Clone)]
pub struct ComboOptions {
    pub limits: ComboLimits,
    /// Also combine title keywords with subtitle keywords
    pub include_cross: bool,
    /// Lowercase stopwords removed before enumeration
    pub stopwords: HashSet<String>,
}

impl Default for ComboOptions {
    fn default() -> Self {
        Self {
            limits: ComboLimits::default(),
            include_cross: true,
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ComboOptions {
    pub fn with_limits(mut self, limits: ComboLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_lengths(mut self, min_length: usize, max_length: usize) -> Self {
        self.limits.min_length = min_length;
        self.limits.max_length = max_length;
        self
    }

    pub fn with_cross(mut self, include_cross: bool) -> Self {
        self.include_cross = include_cross;
        self
    }

    pub fn with_stopwords<I, S>(mut self, stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stopwords = stopwords.into_iter().map(|s| s.as_ref().to_lowercase()).collect();
        self
    }

    fn lengths(&self) -> RangeInclusive<usize> {
        self.limits.min_length.max(2)..=self.limits.max_length
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Title,
    Subtitle,
}

struct Keyword {
    text: String,
    side: Side,
}

/// Stopwords, single characters and repeats removed; order kept
pub fn filter_keywords<S: AsRef<str>>(keywords: &[S], stopwords: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| k.chars().count() > 1 && !stopwords.contains(k))
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

fn tag(words: &[String], side: Side) -> Vec<Keyword> {
    words.iter().map(|w| Keyword { text: w.clone(), side }).collect()
}

/// Shared output with a unique-combo budget
struct ComboSink<'a> {
    out: &'a mut Vec<String>,
    seen: &'a mut HashSet<String>,
    budget: usize,
    added: usize,
}

impl ComboSink<'_> {
    /// Returns false once the budget is spent
    fn push(&mut self, combo: String) -> bool {
        if self.added >= self.budget {
            return false;
        }
        if self.seen.insert(combo.clone()) {
            self.out.push(combo);
            self.added += 1;
        }
        self.added < self.budget
    }
}

/// Sides still reachable from each index onwards; `reach[i]` covers `words[i..]`
fn side_reach(words: &[Keyword]) -> Vec<(bool, bool)> {
    let mut reach = vec![(false, false); words.len() + 1];
    for i in (0..words.len()).rev() {
        let (title, subtitle) = reach[i + 1];
        reach[i] = match words[i].side {
            Side::Title => (true, subtitle),
            Side::Subtitle => (title, true),
        };
    }
    reach
}

/// Combination state for the cross pool
#[derive(Clone, Copy, Default)]
struct Sides {
    title: bool,
    subtitle: bool,
}

impl Sides {
    fn with(self, side: Side) -> Self {
        match side {
            Side::Title => Self { title: true, ..self },
            Side::Subtitle => Self { subtitle: true, ..self },
        }
    }

    /// Can `slots` more picks from `words[from..]` still cover both sides
    fn reachable(self, slots: usize, from: (bool, bool)) -> bool {
        let missing = usize::from(!self.title) + usize::from(!self.subtitle);
        missing <= slots && (self.title || from.0) && (self.subtitle || from.1)
    }
}

fn backtrack(
    words: &[Keyword],
    k: usize,
    start: usize,
    stack: &mut Vec<usize>,
    cross: Option<(&[(bool, bool)], Sides)>,
    sink: &mut ComboSink<'_>,
) -> bool {
    if stack.len() == k {
        let combo = stack.iter().map(|&i| words[i].text.as_str()).collect::<Vec<_>>().join(" ");
        return sink.push(combo);
    }

    let last = words.len() - (k - stack.len());
    for i in start..=last {
        // Branches that can no longer cover both sides are cut, so work stays bounded by output
        let next = match cross {
            Some((reach, sides)) => {
                let sides = sides.with(words[i].side);
                if !sides.reachable(k - stack.len() - 1, reach[i + 1]) {
                    continue;
                }
                Some((reach, sides))
            }
            None => None,
        };
        stack.push(i);
        let keep_going = backtrack(words, k, i + 1, stack, next, sink);
        stack.pop();
        if !keep_going {
            return false;
        }
    }
    true
}

fn enumerate_pool(
    words: &[Keyword],
    lengths: RangeInclusive<usize>,
    require_cross: bool,
    sink: &mut ComboSink<'_>,
) {
    if sink.budget == 0 {
        return;
    }
    let reach = side_reach(words);
    if require_cross && reach[0] != (true, true) {
        return;
    }
    for k in lengths {
        if k > words.len() {
            break;
        }
        let cross = require_cross.then(|| (reach.as_slice(), Sides::default()));
        let mut stack = Vec::with_capacity(k);
        if !backtrack(words, k, 0, &mut stack, cross, sink) {
            return;
        }
    }
}

/// Every unique 2..=N keyword combination from the title and subtitle keyword lists
pub fn generate_all_possible_combos<S: AsRef<str>>(
    title_keywords: &[S],
    subtitle_keywords: &[S],
    options: &ComboOptions,
) -> Vec<String> {
    let start = Instant::now();
    let title = filter_keywords(title_keywords, &options.stopwords);
    let subtitle = filter_keywords(subtitle_keywords, &options.stopwords);

    let title_pool = tag(&title, Side::Title);
    let subtitle_pool = tag(&subtitle, Side::Subtitle);

    let mut pools = vec![(title_pool, false), (subtitle_pool, false)];
    if options.include_cross {
        // Words on both sides count as title words
        let mut cross = tag(&title, Side::Title);
        cross.extend(
            subtitle
                .iter()
                .filter(|w| !title.contains(w))
                .map(|w| Keyword { text: w.clone(), side: Side::Subtitle }),
        );
        pools.push((cross, true));
    }

    let total_cap = options.limits.max_total();
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for (words, require_cross) in &pools {
        let remaining = total_cap.saturating_sub(out.len());
        let mut sink = ComboSink {
            budget: options.limits.max_combos_per_source.min(remaining),
            out: &mut out,
            seen: &mut seen,
            added: 0,
        };
        enumerate_pool(words, options.lengths(), *require_cross, &mut sink);
    }

    debug!(
        "Generated {} combos from {} title / {} subtitle keywords in {:?}",
        out.len(),
        title.len(),
        subtitle.len(),
        start.elapsed()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_pools_and_cross() {
        let options = ComboOptions::default().with_lengths(2, 2).with_cross(true);
        let combos = generate_all_possible_combos(&["learn", "spanish", "fast"], &["app", "language"], &options);

        for expected in ["learn spanish", "spanish fast", "learn fast", "app language", "learn app"] {
            assert!(combos.contains(&expected.to_string()), "missing {}", expected);
        }
        assert!(combos.iter().all(|c| c.split(' ').count() == 2));
        // 3 title + 1 subtitle + 6 cross
        assert_eq!(combos.len(), 10);
    }

    #[test]
    fn test_without_cross() {
        let options = ComboOptions::default().with_lengths(2, 3).with_cross(false);
        let combos = generate_all_possible_combos(&["learn", "spanish", "fast"], &["app", "language"], &options);
        assert!(!combos.contains(&"learn app".to_string()));
        assert!(combos.contains(&"learn spanish fast".to_string()));
        assert_eq!(combos.len(), 5);
    }

    #[test]
    fn test_stopwords_single_chars_and_repeats_filtered() {
        let options = ComboOptions::default().with_lengths(2, 4);
        let combos = generate_all_possible_combos(&["The", "best", "a", "x", "BEST", "app"], &["for", "you"], &options);
        assert_eq!(combos, vec!["best app".to_string()]);
    }

    #[test]
    fn test_cap_is_exact() {
        let title: Vec<String> = (0..30).map(|i| format!("title{}", i)).collect();
        let subtitle: Vec<String> = (0..30).map(|i| format!("sub{}", i)).collect();

        let options = ComboOptions::default();
        let combos = generate_all_possible_combos(&title, &subtitle, &options);
        assert_eq!(combos.len(), options.limits.max_total());
        let unique: HashSet<&String> = combos.iter().collect();
        assert_eq!(unique.len(), combos.len());

        let small = ComboOptions::default().with_limits(ComboLimits {
            max_combos_per_source: 7,
            ..ComboLimits::default()
        });
        assert_eq!(generate_all_possible_combos(&title, &subtitle, &small).len(), 21);
    }

    #[test]
    fn test_short_lists() {
        let options = ComboOptions::default();
        let empty: [&str; 0] = [];
        assert!(generate_all_possible_combos(&empty, &empty, &options).is_empty());
        assert!(generate_all_possible_combos(&["solo"], &empty, &options).is_empty());
    }

    #[test]
    fn test_one_sided_cross_pool_is_skipped() {
        let title: Vec<String> = (0..300).map(|i| format!("word{}", i)).collect();
        let empty: [String; 0] = [];

        let start = Instant::now();
        let combos = generate_all_possible_combos(&title, &empty, &ComboOptions::default());
        assert_eq!(combos.len(), 500);
        assert!(start.elapsed().as_secs() < 2, "took {:?}", start.elapsed());

        // Subtitle words already in the title add nothing, to the cross pool or otherwise
        let repeated = vec![title[0].clone(), title[1].clone()];
        let start = Instant::now();
        let combos = generate_all_possible_combos(&title, &repeated, &ComboOptions::default());
        assert_eq!(combos.len(), 500);
        assert!(start.elapsed().as_secs() < 2, "took {:?}", start.elapsed());
    }

    #[test]
    fn test_cross_pool_with_single_subtitle_word() {
        let title: Vec<String> = (0..200).map(|i| format!("word{}", i)).collect();
        let options = ComboOptions::default().with_lengths(3, 3);
        let combos = generate_all_possible_combos(&title, &["extra".to_string()], &options);

        assert_eq!(combos.len(), 1000);
        assert_eq!(combos.iter().filter(|c| c.ends_with(" extra")).count(), 500);
    }
}
