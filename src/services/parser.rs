use crate::domain::plan::{Activity, DayPlan, TimeSlot};

pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Turns generated plan text into day plans. Kept behind a trait so a
/// structured-output parser can replace the text scanner without touching
/// callers.
pub trait PlanParser: Send + Sync {
    /// Day plans in source-text order, not sorted by day number.
    fn parse(&self, raw: &str) -> Vec<DayPlan>;
}

/// Best-effort scanner for the `Day N:` / `Morning:` / `- Title (N min): text`
/// layout the generation prompt asks for. Anything it cannot read is skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextPlanParser;

enum Line<'a> {
    DayHeader(Option<u32>),
    SlotHeader(Option<TimeSlot>),
    Activity(&'a str),
    Other,
}

fn strip_markup(line: &str) -> &str {
    line.trim()
        .trim_start_matches(|c: char| c == '#' || c == '*' || c.is_whitespace())
        .trim_end_matches(|c: char| c == '*' || c.is_whitespace())
}

fn classify(raw: &str) -> Line<'_> {
    let line = strip_markup(raw);

    if let Some(rest) = line.strip_prefix("- ") {
        return Line::Activity(rest);
    }
    // `Day 3:`, `Day 3: Gentle Start`, `Day 3 (Monday)`; anything else
    // after `Day ` is an unreadable header.
    if let Some(rest) = line.strip_prefix("Day ") {
        let number = rest
            .split(|c: char| c == ':' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .trim_matches(|c: char| !c.is_alphanumeric());
        return Line::DayHeader(number.parse().ok());
    }
    if let Some(header) = line.strip_suffix(':') {
        let label = header.trim_matches(|c: char| !c.is_alphanumeric());
        return Line::SlotHeader(TimeSlot::from_label(label));
    }
    Line::Other
}

fn leading_minutes(duration: &str) -> Option<u32> {
    let token = duration.split_whitespace().next()?;
    let digits: String = token.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// `Title (Duration unit): Description`; None when a part is missing.
fn parse_activity(record: &str, slot: TimeSlot) -> Option<Activity> {
    let (head, description) = record.split_once(':')?;
    let (title, duration) = head.split_once('(')?;
    if duration.contains('(') {
        return None;
    }

    let title = title.trim();
    let description = description.trim();
    if title.is_empty() || description.is_empty() {
        return None;
    }

    let minutes = leading_minutes(duration.trim_end_matches(|c: char| c == ')' || c.is_whitespace()))
        .unwrap_or(DEFAULT_DURATION_MINUTES);

    Some(Activity::new(title.to_string(), description.to_string(), minutes, slot))
}

impl PlanParser for TextPlanParser {
    fn parse(&self, raw: &str) -> Vec<DayPlan> {
        let mut days = Vec::new();
        // None while inside a block whose header had no readable day number.
        let mut current: Option<Option<DayPlan>> = None;
        let mut slot: Option<TimeSlot> = None;

        for raw_line in raw.lines() {
            match classify(raw_line) {
                Line::DayHeader(number) => {
                    if let Some(Some(day)) = current.take() {
                        days.push(day);
                    }
                    if number.is_none() {
                        tracing::debug!("Skipping day block with unreadable header: {}", raw_line.trim());
                    }
                    current = Some(number.map(|day_number| DayPlan {
                        day_number,
                        activities: Vec::new(),
                    }));
                    slot = None;
                }
                Line::SlotHeader(next) => slot = next,
                Line::Activity(record) => {
                    let (Some(Some(day)), Some(slot)) = (current.as_mut(), slot) else {
                        continue;
                    };
                    match parse_activity(record, slot) {
                        Some(activity) => day.activities.push(activity),
                        None => tracing::debug!("Dropping malformed activity line: {}", record),
                    }
                }
                Line::Other => {}
            }
        }

        if let Some(Some(day)) = current {
            days.push(day);
        }
        days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::ActivityCategory;
    use crate::test_support::{plan_text, render_plan};

    #[test]
    fn parses_days_slots_and_activities() {
        let raw = "Here is your plan 🌸\n\nDay 1:\nMorning:\n- Mindful Breathing (5 minutes): Sit comfortably and breathe.\nAfternoon:\n- Nature Walk (20 min): Stroll outside.\nEvening:\n- Gratitude Journal (10 minutes): Write three good things.\nNight:\n- Bedtime Reading (15 minutes): Read something light.\n";
        let days = TextPlanParser.parse(raw);
        assert_eq!(days.len(), 1);
        let day = &days[0];
        assert_eq!(day.day_number, 1);
        assert_eq!(day.activities.len(), 4);

        let first = &day.activities[0];
        assert_eq!(first.title, "Mindful Breathing");
        assert_eq!(first.duration, 5);
        assert_eq!(first.content, "Sit comfortably and breathe.");
        assert_eq!(first.time_slot, TimeSlot::Morning);
        assert_eq!(first.category, ActivityCategory::Mindfulness);
        assert!(!first.is_completed);
        assert_eq!(day.activities[3].time_slot, TimeSlot::Night);
    }

    #[test]
    fn malformed_lines_are_dropped_and_duration_defaults() {
        let raw = "Day 2:\nMorning:\n- No duration here: just text\n- Stretch (a few minutes): Loosen up.\n- Missing description (5 min)\n- Tea Break (10-15 min): Slow down.\n";
        let days = TextPlanParser.parse(raw);
        let titles: Vec<&str> = days[0].activities.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Stretch", "Tea Break"]);
        assert_eq!(days[0].activities[0].duration, DEFAULT_DURATION_MINUTES);
        assert_eq!(days[0].activities[1].duration, 10);
    }

    #[test]
    fn unreadable_day_headers_drop_their_block() {
        let raw = "Day One:\nMorning:\n- Walk (10 min): Go.\nDay 3:\nMorning:\n- Walk (10 min): Go.\n";
        let days = TextPlanParser.parse(raw);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].day_number, 3);
        assert_eq!(days[0].activities.len(), 1);
    }

    #[test]
    fn titled_day_headers_open_their_own_block() {
        let raw = "Day 1:\nMorning:\n- Walk (10 min): Go.\nDay 2: Gentle Start\nMorning:\n- Stretch (5 min): Loosen up.\nDay Two: Rest Day\nMorning:\n- Nap (20 min): Lie down.\n";
        let days = TextPlanParser.parse(raw);
        let shape: Vec<(u32, usize)> = days.iter().map(|d| (d.day_number, d.activities.len())).collect();
        assert_eq!(shape, vec![(1, 1), (2, 1)]);
        assert_eq!(days[1].activities[0].title, "Stretch");
    }

    #[test]
    fn activities_outside_known_slots_are_dropped() {
        let raw = "Day 4:\n- Early Walk (10 min): Before any slot.\nMidday:\n- Snack (5 min): Unknown slot.\n**Evening:**\n- Call a Friend (15 min): Catch up.\n";
        let days = TextPlanParser.parse(raw);
        assert_eq!(days[0].activities.len(), 1);
        assert_eq!(days[0].activities[0].time_slot, TimeSlot::Evening);
    }

    #[test]
    fn order_follows_source_text() {
        let raw = "Day 5:\nMorning:\n- Walk (10 min): Go.\n### Day 2:\nMorning:\n- Walk (10 min): Go.\n";
        let numbers: Vec<u32> = TextPlanParser.parse(raw).iter().map(|d| d.day_number).collect();
        assert_eq!(numbers, vec![5, 2]);
    }

    #[test]
    fn render_then_parse_recovers_days_and_counts() {
        let original = TextPlanParser.parse(&plan_text(1..=14));
        assert_eq!(original.len(), 14);

        let reparsed = TextPlanParser.parse(&render_plan(&original));
        let shape = |days: &[DayPlan]| -> Vec<(u32, usize)> {
            days.iter().map(|d| (d.day_number, d.activities.len())).collect()
        };
        assert_eq!(shape(&reparsed), shape(&original));
    }
}
