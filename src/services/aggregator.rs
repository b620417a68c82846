//! Pure blend statistics: weighted intensity, tone labels, descriptions,
//! and the single percent-allocation gatekeeping rule. No I/O.

use crate::models::{FlavorComponent, SourceId};

/// Weighted average of component intensity, weighted by percent:
/// `round(Σ percent·intensity / Σ percent)`, half rounded away from zero.
///
/// Returns 0 when the component list is empty or every percent is zero;
/// the division-by-zero case is absorbed rather than surfaced because a
/// draft with no allocation simply has no strength yet.
pub fn average_intensity(components: &[FlavorComponent]) -> u8 {
    let total: u32 = components.iter().map(|c| c.percent as u32).sum();
    if total == 0 {
        return 0;
    }
    let weighted: u32 = components
        .iter()
        .map(|c| c.percent as u32 * c.intensity as u32)
        .sum();
    (weighted as f64 / total as f64).round() as u8
}

/// Qualitative strength descriptor for a weighted-average intensity.
pub fn tone_label(average: u8) -> &'static str {
    match average {
        7.. => "rich",
        5..=6 => "pronounced",
        3..=4 => "mild",
        _ => "light",
    }
}

/// Human-readable one-sentence summary of a composition.
///
/// The two largest components (by percent) form the base descriptor, the
/// next two appear as accent notes. Returns the empty string for an empty
/// component list.
pub fn describe(components: &[FlavorComponent]) -> String {
    if components.is_empty() {
        return String::new();
    }

    let mut sorted: Vec<&FlavorComponent> = components.iter().collect();
    sorted.sort_by(|a, b| b.percent.cmp(&a.percent));

    let base = join_descriptors(&sorted[..sorted.len().min(2)]);
    let accent = join_descriptors(&sorted[sorted.len().min(2)..sorted.len().min(4)]);

    let tone = tone_label(average_intensity(components));
    if accent.is_empty() {
        format!("{tone} blend: {base}")
    } else {
        format!("{tone} blend: {base} with hints of {accent}")
    }
}

fn join_descriptors(components: &[&FlavorComponent]) -> String {
    components
        .iter()
        .map(|c| taste_descriptor(c))
        .filter(|d| !d.is_empty())
        .collect::<Vec<_>>()
        .join(" and ")
}

fn taste_descriptor(component: &FlavorComponent) -> String {
    component
        .taste_tags
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Clamps a proposed percent for one component into the share still
/// available: `[0, 100 - Σ other components' percent]`. Fractional input is
/// rounded to the nearest integer first. Idempotent.
pub fn clamp_percent_allocation(
    components: &[FlavorComponent],
    source_id: &SourceId,
    proposed: f64,
) -> u8 {
    let sum_others: i64 = components
        .iter()
        .filter(|c| &c.source_id != source_id)
        .map(|c| c.percent as i64)
        .sum();
    let allowed = (100 - sum_others).max(0);
    (proposed.round() as i64).clamp(0, allowed) as u8
}
