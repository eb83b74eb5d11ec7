//! Flesch Reading Ease scoring over extracted page text.

/// Vowel-group syllable heuristic with a silent-e adjustment. Words without
/// any letters (numbers, punctuation runs) count zero.
pub(crate) fn count_syllables(word: &str) -> usize {
    let letters: Vec<char> = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if letters.is_empty() {
        return 0;
    }

    let mut count = 0;
    let mut prev_vowel = false;
    for &c in &letters {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }

    // Silent trailing e, except the consonant-le ending ("table").
    if count > 1 && letters.ends_with(&['e']) && !letters.ends_with(&['l', 'e']) {
        count -= 1;
    }
    count.max(1)
}

/// `206.835 − 1.015·(words/sentences) − 84.6·(syllables/words)`, rounded to
/// one decimal. Sentence count is floored at 1 so short fragments still
/// score. Callers handle the empty-text case.
pub(crate) fn flesch_reading_ease(text: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let sentences = text.matches(['.', '!', '?']).count().max(1) as f64;
    let word_count = words.len() as f64;
    let syllables: usize = words.iter().map(|word| count_syllables(word)).sum();

    let score = 206.835 - 1.015 * (word_count / sentences) - 84.6 * (syllables as f64 / word_count);
    (score * 10.0).round() / 10.0
}

pub(crate) fn readability_level(score: f64) -> &'static str {
    if score >= 90.0 {
        "Very Easy"
    } else if score >= 80.0 {
        "Easy"
    } else if score >= 70.0 {
        "Fairly Easy"
    } else if score >= 60.0 {
        "Standard"
    } else if score >= 50.0 {
        "Fairly Difficult"
    } else if score >= 30.0 {
        "Difficult"
    } else {
        "Very Difficult"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syllable_counts_for_common_words() {
        assert_eq!(count_syllables("cat"), 1);
        assert_eq!(count_syllables("table"), 2);
        assert_eq!(count_syllables("here"), 1);
        assert_eq!(count_syllables("readability"), 5);
        assert_eq!(count_syllables("queue"), 1);
        assert_eq!(count_syllables("a"), 1);
        assert_eq!(count_syllables("1952"), 0);
    }

    #[test]
    fn simple_prose_scores_easy() {
        let score = flesch_reading_ease("The cat sat on the mat. The dog ran to the park.");
        assert!(score > 90.0, "score was {score}");
    }

    #[test]
    fn dense_prose_scores_harder_than_simple_prose() {
        let simple = flesch_reading_ease("The cat sat. The dog ran.");
        let dense = flesch_reading_ease(
            "Institutional prioritization of multidimensional organizational accountability \
             necessitates comprehensive interdepartmental harmonization.",
        );
        assert!(dense < simple);
    }

    #[test]
    fn fragment_without_terminator_still_scores() {
        let score = flesch_reading_ease("just a few plain words");
        assert!(score != 0.0);
    }

    #[test]
    fn level_bands_cover_the_scale() {
        assert_eq!(readability_level(95.0), "Very Easy");
        assert_eq!(readability_level(90.0), "Very Easy");
        assert_eq!(readability_level(85.0), "Easy");
        assert_eq!(readability_level(75.0), "Fairly Easy");
        assert_eq!(readability_level(65.0), "Standard");
        assert_eq!(readability_level(55.0), "Fairly Difficult");
        assert_eq!(readability_level(35.0), "Difficult");
        assert_eq!(readability_level(10.0), "Very Difficult");
        assert_eq!(readability_level(-20.0), "Very Difficult");
    }
}
