//! Community feed filtering and the like-toggle rule.

use crate::models::Blend;

/// Sentinel mood meaning "no mood filter".
pub const ALL_MOODS: &str = "all";

/// Filters persisted blends by mood tag and target strength.
///
/// A blend is kept when the mood is the `all` sentinel (or blank) or at
/// least one component's taste tags contain the mood case-insensitively,
/// AND its average intensity is within 1 of the target. The filter is
/// stable: results keep the input order, which the stores guarantee to be
/// submission order. No re-ranking by likes.
pub fn filter_by_mood_and_strength(blends: &[Blend], mood: &str, target_strength: u8) -> Vec<Blend> {
    let mood = mood.trim().to_lowercase();
    let unfiltered = mood.is_empty() || mood == ALL_MOODS;
    blends
        .iter()
        .filter(|blend| {
            unfiltered
                || blend
                    .components
                    .iter()
                    .any(|c| c.taste_tags.to_lowercase().contains(&mood))
        })
        .filter(|blend| (blend.average_intensity as i16 - target_strength as i16).abs() <= 1)
        .cloned()
        .collect()
}

/// Applies one viewer's like toggle to a blend.
///
/// `currently_liked` is the viewer-local state tracked outside the blend;
/// an unlike never takes the count below zero. Used as the mutator for the
/// store's per-record atomic update, which is what serializes concurrent
/// toggles from different viewers.
pub fn apply_like_toggle(blend: &mut Blend, currently_liked: bool) {
    if currently_liked {
        blend.like_count = blend.like_count.saturating_sub(1);
    } else {
        blend.like_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlavorComponent, SourceId};
    use chrono::Utc;
    use uuid::Uuid;

    fn blend(title: &str, tags: &str, average_intensity: u8) -> Blend {
        Blend {
            id: Uuid::new_v4(),
            title: title.to_string(),
            author: "Guest".to_string(),
            components: vec![FlavorComponent {
                source_id: SourceId::new("brand", "flavor"),
                display_name: "Flavor".to_string(),
                taste_tags: tags.to_string(),
                intensity: average_intensity,
                percent: 100,
            }],
            average_intensity,
            like_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn strength_window_is_plus_minus_one() {
        let blends: Vec<Blend> = [3, 4, 5, 6, 7]
            .into_iter()
            .map(|s| blend(&format!("s{s}"), "fruity", s))
            .collect();
        let kept = filter_by_mood_and_strength(&blends, ALL_MOODS, 5);
        let titles: Vec<&str> = kept.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["s4", "s5", "s6"]);
    }

    #[test]
    fn mood_matches_substring_case_insensitively() {
        let blends = vec![
            blend("berries", "Berry, Tart", 5),
            blend("dessert", "dessert, creamy", 5),
        ];
        let kept = filter_by_mood_and_strength(&blends, "berry", 5);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "berries");
    }

    #[test]
    fn blank_mood_means_no_mood_filter() {
        let blends = vec![blend("a", "fruity", 5), blend("b", "dessert", 5)];
        assert_eq!(filter_by_mood_and_strength(&blends, "", 5).len(), 2);
        assert_eq!(filter_by_mood_and_strength(&blends, "  all ", 5).len(), 2);
    }

    #[test]
    fn filter_preserves_input_order() {
        let blends = vec![
            blend("first", "fruity", 4),
            blend("second", "fruity", 6),
            blend("third", "fruity", 5),
        ];
        let kept = filter_by_mood_and_strength(&blends, "fruity", 5);
        let titles: Vec<&str> = kept.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn like_toggle_round_trip() {
        let mut b = blend("a", "fruity", 5);
        apply_like_toggle(&mut b, false);
        assert_eq!(b.like_count, 1);
        apply_like_toggle(&mut b, true);
        assert_eq!(b.like_count, 0);
    }

    #[test]
    fn unlike_never_goes_negative() {
        let mut b = blend("a", "fruity", 5);
        apply_like_toggle(&mut b, true);
        assert_eq!(b.like_count, 0);
    }
}
