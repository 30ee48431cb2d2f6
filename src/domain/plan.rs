use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PLAN_DAYS: u32 = 14;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 4] = [
        TimeSlot::Morning,
        TimeSlot::Afternoon,
        TimeSlot::Evening,
        TimeSlot::Night,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "Morning",
            TimeSlot::Afternoon => "Afternoon",
            TimeSlot::Evening => "Evening",
            TimeSlot::Night => "Night",
        }
    }

    /// The literal header generated text must carry, e.g. `"Morning:"`.
    pub fn header(&self) -> String {
        format!("{}:", self.as_str())
    }

    pub fn from_label(label: &str) -> Option<Self> {
        TimeSlot::ALL
            .into_iter()
            .find(|slot| slot.as_str().eq_ignore_ascii_case(label.trim()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActivityCategory {
    Exercise,
    Mindfulness,
    Social,
    Creative,
    Rest,
    Nutrition,
    Reflection,
    Other,
}

// Ordered: the first row with a matching keyword wins.
const CATEGORY_KEYWORDS: &[(ActivityCategory, &[&str])] = &[
    (
        ActivityCategory::Mindfulness,
        &["meditat", "mindful", "breath", "yoga", "body scan", "grounding", "relax"],
    ),
    (
        ActivityCategory::Exercise,
        &["walk", "run", "jog", "stretch", "exercise", "workout", "dance", "bike", "swim", "hike"],
    ),
    (
        ActivityCategory::Social,
        &["friend", "call", "family", "social", "connect", "chat", "volunteer", "share"],
    ),
    (
        ActivityCategory::Creative,
        &["draw", "paint", "music", "creative", "craft", "sing", "doodle", "sketch"],
    ),
    (
        ActivityCategory::Reflection,
        &["journal", "gratitude", "reflect", "write", "affirmation", "review"],
    ),
    (
        ActivityCategory::Nutrition,
        &["breakfast", "lunch", "dinner", "meal", "snack", "herbal tea", "hydrat", "water", "cook"],
    ),
    (
        ActivityCategory::Rest,
        &["sleep", "rest", "nap", "bath", "wind down", "unwind", "bedtime", "read"],
    ),
];

impl ActivityCategory {
    pub fn from_title(title: &str) -> Self {
        let lowered = title.to_lowercase();
        CATEGORY_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(category, _)| *category)
            .unwrap_or(ActivityCategory::Other)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub duration: u32,
    pub category: ActivityCategory,
    pub time_slot: TimeSlot,
    pub is_completed: bool,
}

impl Activity {
    pub fn new(title: String, content: String, duration: u32, time_slot: TimeSlot) -> Self {
        let category = ActivityCategory::from_title(&title);
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            duration,
            category,
            time_slot,
            is_completed: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    pub day_number: u32,
    pub activities: Vec<Activity>,
}

impl DayPlan {
    pub fn activities_in(&self, slot: TimeSlot) -> impl Iterator<Item = &Activity> {
        self.activities.iter().filter(move |a| a.time_slot == slot)
    }
}

/// A complete schedule: exactly days 1..=14, ascending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WellnessPlan {
    days: Vec<DayPlan>,
}

impl WellnessPlan {
    /// Assembles days 1..=14 from parsed blocks in any order. The first block
    /// seen for a day number wins. Returns the number of distinct days found
    /// when the set is incomplete.
    pub fn assemble(blocks: Vec<DayPlan>) -> Result<Self, usize> {
        let mut slots: Vec<Option<DayPlan>> = vec![None; PLAN_DAYS as usize];
        for block in blocks {
            let day = block.day_number;
            if !(1..=PLAN_DAYS).contains(&day) {
                tracing::warn!("Dropping out-of-range day {} from generated plan", day);
                continue;
            }
            let slot = &mut slots[(day - 1) as usize];
            if slot.is_some() {
                tracing::warn!("Dropping duplicate day {} from generated plan", day);
                continue;
            }
            *slot = Some(block);
        }

        let found = slots.iter().filter(|s| s.is_some()).count();
        if found < PLAN_DAYS as usize {
            return Err(found);
        }
        Ok(Self {
            days: slots.into_iter().flatten().collect(),
        })
    }

    /// Strict counterpart of `assemble` for client-supplied days: exactly
    /// one block per day 1..=14, nothing dropped. Returns the offending day
    /// numbers otherwise.
    pub fn from_days(days: Vec<DayPlan>) -> Result<Self, Vec<u32>> {
        let numbers: Vec<u32> = days.iter().map(|d| d.day_number).collect();
        if days.len() != PLAN_DAYS as usize {
            return Err(numbers);
        }
        Self::assemble(days).map_err(|_| numbers)
    }

    pub fn days(&self) -> &[DayPlan] {
        &self.days
    }

    pub fn into_days(self) -> Vec<DayPlan> {
        self.days
    }
}

/// The persisted form: `plans/currentPlan`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanRecord {
    pub creation_date: DateTime<Utc>,
    pub plan: Vec<DayPlan>,
}

impl PlanRecord {
    pub fn day(&self, day_number: u32) -> Option<&DayPlan> {
        self.plan.iter().find(|d| d.day_number == day_number)
    }

    /// 1-based day of the plan on `today`, clamped to 1..=14.
    pub fn current_day(&self, created_local: NaiveDate, today: NaiveDate) -> u32 {
        let elapsed = (today - created_local).num_days() + 1;
        elapsed.clamp(1, PLAN_DAYS as i64) as u32
    }

    pub fn days_remaining(current_day: u32) -> u32 {
        PLAN_DAYS.saturating_sub(current_day)
    }

    /// Sets `is_completed` on the activity with `id`. False when no activity
    /// carries that id.
    pub fn set_completion(&mut self, id: Uuid, completed: bool) -> bool {
        match self
            .plan
            .iter_mut()
            .flat_map(|day| day.activities.iter_mut())
            .find(|a| a.id == id)
        {
            Some(activity) => {
                activity.is_completed = completed;
                true
            }
            None => false,
        }
    }
}
