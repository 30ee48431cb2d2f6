use crate::domain::assessment::Assessment;
use std::ops::RangeInclusive;

pub const TOP_PREFERENCES: usize = 5;

/// Highest-affinity activities first. The sort is stable, so equal scores
/// keep the preference map's iteration order.
pub fn top_preferences(assessment: &Assessment) -> Vec<(&str, f64)> {
    let mut prefs: Vec<(&str, f64)> = assessment
        .preferences
        .iter()
        .map(|(name, score)| (name.as_str(), *score))
        .collect();
    prefs.sort_by(|a, b| b.1.total_cmp(&a.1));
    prefs.truncate(TOP_PREFERENCES);
    prefs
}

/// The user-specific part of a plan request: scores and favourite activities.
pub fn build_plan_prompt(assessment: &Assessment) -> String {
    let preferences = top_preferences(assessment)
        .into_iter()
        .map(|(name, score)| format!("{name}: {score:.1}%"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"As Bryan, a compassionate and caring wellness guide, create a personalized 14-day wellness plan for a user with the following characteristics:

GAD-7 score: {gad}
PHQ-9 score: {phq}
Top 5 activity preferences: {preferences}

Create a plan that addresses the user's anxiety and depression levels while incorporating their preferred activities. Include a mix of activities that address mental, emotional, and physical well-being, drawing inspiration from various therapeutic approaches like CBT, mindfulness, and person-centered therapy.

For each day, provide one or two morning, afternoon, evening, and nighttime activities, each lasting within 30 minutes. These should be practical, engaging, and aimed at improving the user's overall wellness.

Use language that is encouraging and empowering. Offer brief insights into why certain activities are beneficial, in a natural, conversational manner. Keep a balance between structure and flexibility, and encourage gentle self-reflection throughout the plan.

Important: Each activity description should be between 25 and 40 words long.

Format the plan as follows for each day:

Day X:
Morning:
- Activity Title (Duration): Description (25-40 words)
Afternoon:
- Activity Title (Duration): Description (25-40 words)
Evening:
- Activity Title (Duration): Description (25-40 words)
Night:
- Activity Title (Duration): Description (25-40 words)

Use gentle emojis every few lines to keep a warm and friendly tone, but never inside a section header."#,
        gad = assessment.gad_score,
        phq = assessment.phq_score,
    )
}

/// Wraps the user prompt with the structural contract for one day range.
pub fn build_chunk_prompt(requirements: &str, days: &RangeInclusive<u32>) -> String {
    let day_list = days
        .clone()
        .map(|d| format!("Day {d}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Generate a detailed wellness plan for the following days: {day_list}. Each day MUST include morning, afternoon, evening, and night activities. Format the plan as follows:

Day X:
Morning:
- Activity Title (Duration): Description
Afternoon:
- Activity Title (Duration): Description
Evening:
- Activity Title (Duration): Description
Night:
- Activity Title (Duration): Description

Additional requirements:
{requirements}"#
    )
}
