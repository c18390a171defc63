//! Rule-based trade quality grading
//!
//! Infers a setup grade from confluence tags and the free-text review when
//! the journal carries no explicit grade. An explicit grade always wins and
//! passes through untouched, including grades the heuristic never assigns.

use crate::types::{Grade, Trade};

/// Structural / price-action setup terms, matched against tags and comment
const STRONG_KEYWORDS: &[&str] = &[
    "order block",
    "breaker",
    "sweep",
    "liquidity grab",
    "displacement",
    "break of structure",
    "bos",
    "market structure shift",
    "mss",
    "fair value gap",
    "fvg",
    "imbalance",
    "inducement",
    "smt",
    "cisd",
    "kill zone",
    "htf bias",
    "premium",
    "discount",
    "institutional",
];

/// Execution-discipline terms, matched against the comment only
const QUALITY_KEYWORDS: &[&str] = &[
    "patient",
    "confirmed",
    "textbook",
    "as expected",
    "waited",
    "clean entry",
    "followed plan",
    "per plan",
    "disciplined",
];

/// Emotional / undisciplined terms, matched against the comment only
const WEAK_KEYWORDS: &[&str] = &[
    "fomo",
    "revenge",
    "impulsive",
    "chased",
    "chasing",
    "forced",
    "tilt",
    "overtraded",
    "oversized",
    "moved stop",
    "no confirmation",
    "gambl",
    "boredom",
];

/// Which keywords fired for a trade; display-only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeExplanation {
    pub grade: Grade,
    pub strong: Vec<&'static str>,
    pub quality: Vec<&'static str>,
    pub weak: Vec<&'static str>,
    pub confluence_count: usize,
    /// True when the grade came from the journal, not the heuristic
    pub explicit: bool,
}

fn matches_in(text: &str, keywords: &'static [&'static str]) -> Vec<&'static str> {
    keywords.iter().copied().filter(|k| text.contains(k)).collect()
}

struct Tally {
    strong: Vec<&'static str>,
    quality: Vec<&'static str>,
    weak: Vec<&'static str>,
    tags: usize,
}

fn tally(trade: &Trade) -> Tally {
    let comment = trade.comment.to_lowercase();
    let combined = {
        let mut text = trade.confluences.join(" ").to_lowercase();
        text.push(' ');
        text.push_str(&comment);
        text
    };
    Tally {
        strong: matches_in(&combined, STRONG_KEYWORDS),
        quality: matches_in(&comment, QUALITY_KEYWORDS),
        weak: matches_in(&comment, WEAK_KEYWORDS),
        tags: trade.confluences.len(),
    }
}

// Decision ladder, first matching rule wins. WEAK evidence vetoes before
// anything else is considered.
fn decide(t: &Tally) -> Grade {
    let (strong, quality, weak) = (t.strong.len(), t.quality.len(), t.weak.len());
    if weak >= 2 {
        Grade::C
    } else if strong >= 3 || (strong >= 2 && quality >= 1) {
        Grade::APlus
    } else if strong >= 2 || (t.tags >= 3 && quality >= 1) {
        Grade::APlus
    } else if strong >= 1 && t.tags >= 2 {
        Grade::B
    } else if t.tags >= 2 && weak == 0 {
        Grade::B
    } else {
        // tags >= 1 or quality >= 1, and the empty case, all land on C
        Grade::C
    }
}

/// Grade a trade: explicit journal grade wins, heuristic otherwise
pub fn grade(trade: &Trade) -> Grade {
    match trade.grade {
        Some(explicit) => explicit,
        None => decide(&tally(trade)),
    }
}

/// Full explanation of a trade's grade, for display
pub fn explain(trade: &Trade) -> GradeExplanation {
    let t = tally(trade);
    GradeExplanation {
        grade: grade(trade),
        strong: t.strong,
        quality: t.quality,
        weak: t.weak,
        confluence_count: t.tags,
        explicit: trade.grade.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Trade;

    fn trade_with(confluences: &[&str], comment: &str) -> Trade {
        let mut trade = Trade::empty("t");
        trade.confluences = confluences.iter().map(|s| s.to_string()).collect();
        trade.comment = comment.to_string();
        trade
    }

    #[test]
    fn test_explicit_grade_passes_through_unmodified() {
        // "A" is a grade the heuristic itself never produces
        let mut trade = trade_with(&["Sweep", "Displacement", "FVG"], "textbook");
        trade.grade = Some(Grade::A);
        assert_eq!(grade(&trade), Grade::A);

        trade.grade = Some(Grade::F);
        assert_eq!(grade(&trade), Grade::F);
    }

    #[test]
    fn test_three_strong_confluences_grade_a_plus() {
        let trade = trade_with(&["Order Block", "Sweep", "Displacement"], "");
        assert_eq!(grade(&trade), Grade::APlus);
    }

    #[test]
    fn test_two_strong_with_quality_comment_grade_a_plus() {
        let trade = trade_with(&["Sweep", "FVG"], "waited for the close, patient");
        assert_eq!(grade(&trade), Grade::APlus);
    }

    #[test]
    fn test_two_strong_alone_grade_a_plus() {
        let trade = trade_with(&["Sweep", "Displacement"], "");
        assert_eq!(grade(&trade), Grade::APlus);
    }

    #[test]
    fn test_three_tags_with_quality_grade_a_plus() {
        // Tags that are not STRONG terms still count toward the tag rule
        let trade = trade_with(&["Trendline", "Round Number", "News Day"], "textbook execution");
        assert_eq!(grade(&trade), Grade::APlus);
    }

    #[test]
    fn test_one_strong_two_tags_grade_b() {
        let trade = trade_with(&["Sweep", "Trendline"], "");
        assert_eq!(grade(&trade), Grade::B);
    }

    #[test]
    fn test_two_plain_tags_grade_b() {
        let trade = trade_with(&["Trendline", "Round Number"], "");
        assert_eq!(grade(&trade), Grade::B);
    }

    #[test]
    fn test_weak_comment_vetoes_strong_setup() {
        let trade = trade_with(
            &["Order Block", "Sweep", "Displacement"],
            "pure fomo, revenge trade after the loss",
        );
        assert_eq!(grade(&trade), Grade::C);
    }

    #[test]
    fn test_single_weak_keyword_does_not_veto() {
        let trade = trade_with(&["Order Block", "Sweep", "Displacement"], "slight fomo");
        assert_eq!(grade(&trade), Grade::APlus);
    }

    #[test]
    fn test_bare_trade_grades_c() {
        let trade = trade_with(&[], "");
        assert_eq!(grade(&trade), Grade::C);
    }

    #[test]
    fn test_single_tag_grades_c() {
        let trade = trade_with(&["Trendline"], "");
        assert_eq!(grade(&trade), Grade::C);
    }

    #[test]
    fn test_quality_keywords_ignored_in_tags() {
        // "patient" as a tag must not count as a QUALITY match
        let trade = trade_with(&["patient"], "");
        assert_eq!(grade(&trade), Grade::C);
        let explanation = explain(&trade);
        assert!(explanation.quality.is_empty());
    }

    #[test]
    fn test_explanation_lists_fired_keywords() {
        let trade = trade_with(&["Sweep", "FVG"], "kept chasing it, fomo entry");
        let explanation = explain(&trade);
        assert_eq!(explanation.grade, Grade::C, "weak veto applies");
        assert!(explanation.strong.contains(&"sweep"));
        assert!(explanation.strong.contains(&"fvg"));
        assert!(explanation.weak.contains(&"chasing"));
        assert!(explanation.weak.contains(&"fomo"));
        assert_eq!(explanation.confluence_count, 2);
        assert!(!explanation.explicit);
    }
}
