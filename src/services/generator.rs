use crate::domain::assessment::Assessment;
use crate::domain::plan::{WellnessPlan, PLAN_DAYS};
use crate::error::{Result, WellnessError};
use crate::services::completion::TextCompletion;
use crate::services::parser::PlanParser;
use crate::services::prompt::{build_chunk_prompt, build_plan_prompt};
use crate::services::validator::validate;
use std::ops::RangeInclusive;
use std::sync::Arc;

/// Runs prompt -> completion -> validation per day-range chunk, then parses
/// the joined text into a complete 14-day plan. Chunks are requested one
/// after another; a plan is either complete or the call fails.
pub struct PlanGenerator {
    client: Arc<dyn TextCompletion>,
    parser: Arc<dyn PlanParser>,
    chunk_days: u32,
}

impl PlanGenerator {
    pub fn new(client: Arc<dyn TextCompletion>, parser: Arc<dyn PlanParser>) -> Self {
        Self {
            client,
            parser,
            chunk_days: PLAN_DAYS,
        }
    }

    pub fn with_chunk_days(mut self, chunk_days: u32) -> Self {
        self.chunk_days = chunk_days.clamp(1, PLAN_DAYS);
        self
    }

    fn chunks(&self) -> Vec<RangeInclusive<u32>> {
        (1..=PLAN_DAYS)
            .step_by(self.chunk_days as usize)
            .map(|start| start..=(start + self.chunk_days - 1).min(PLAN_DAYS))
            .collect()
    }

    /// One chunk, with exactly one retry when the text fails validation.
    async fn generate_chunk(&self, requirements: &str, days: RangeInclusive<u32>) -> Result<String> {
        let prompt = build_chunk_prompt(requirements, &days);

        let text = self.client.complete(&prompt).await?;
        if validate(&text, &days) {
            return Ok(text);
        }

        tracing::warn!(
            "Generated text for days {}-{} failed structure validation, retrying once",
            days.start(),
            days.end()
        );
        let text = self.client.complete(&prompt).await?;
        if validate(&text, &days) {
            return Ok(text);
        }

        tracing::error!("Days {}-{} still invalid after retry", days.start(), days.end());
        Err(WellnessError::StructureValidation {
            start: *days.start(),
            end: *days.end(),
        })
    }

    /// Raw text for all 14 days, chunks joined by a blank line.
    pub async fn generate_plan_text(&self, requirements: &str) -> Result<String> {
        let mut parts = Vec::new();
        for days in self.chunks() {
            tracing::debug!("Requesting plan chunk for days {}-{}", days.start(), days.end());
            parts.push(self.generate_chunk(requirements, days).await?);
        }
        Ok(parts.join("\n\n"))
    }

    pub async fn generate_14_day_plan(&self, assessment: &Assessment) -> Result<WellnessPlan> {
        let requirements = build_plan_prompt(assessment);
        let raw = self.generate_plan_text(&requirements).await?;
        let blocks = self.parser.parse(&raw);
        tracing::debug!("Parsed {} day blocks from {} chars", blocks.len(), raw.len());

        let plan = WellnessPlan::assemble(blocks).map_err(|found| {
            tracing::error!("Generated plan has only {} of {} days", found, PLAN_DAYS);
            WellnessError::IncompletePlan { found }
        })?;

        tracing::info!(
            "Generated 14-day plan (gad={}, phq={})",
            assessment.gad_score,
            assessment.phq_score
        );
        Ok(plan)
    }
}
