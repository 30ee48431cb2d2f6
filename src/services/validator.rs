use crate::domain::plan::TimeSlot;
use std::ops::RangeInclusive;

/// Structural sanity check on generated text: every `Day N:` header for the
/// range plus the four slot headers must appear somewhere. Content is not
/// inspected.
pub fn validate(text: &str, days: &RangeInclusive<u32>) -> bool {
    let days_present = days.clone().all(|d| text.contains(&format!("Day {d}:")));
    let slots_present = TimeSlot::ALL.iter().all(|slot| text.contains(&slot.header()));
    days_present && slots_present
}
