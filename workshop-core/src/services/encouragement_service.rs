// File: workshop-core/src/services/encouragement_service.rs

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use workshop_ai::prompts::{daily_mission_prompt, encouragement_prompt};
use workshop_ai::TextGenerator;
use workshop_common::models::rank::rank_for;
use workshop_common::models::{Account, MissionSuggestion};

pub const FALLBACK_ENCOURAGEMENT: &str = "保持學習的熱情，你是最棒的！";

pub fn fallback_mission() -> MissionSuggestion {
    MissionSuggestion {
        title: "每日閱讀".to_string(),
        description: "閱讀一本好書 30 分鐘，並記錄下最喜歡的一句話。".to_string(),
        points: 100,
    }
}

const MIN_SUGGESTED_POINTS: i64 = 50;
const MAX_SUGGESTED_POINTS: i64 = 200;

/// Best-effort tutor messages. Every failure path ends in a fixed fallback,
/// so callers never see an error from here.
pub struct EncouragementService {
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
}

impl EncouragementService {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub fn disabled() -> Self {
        Self::new(None, Duration::from_secs(1))
    }

    pub async fn encourage(&self, account: &Account) -> String {
        let Some(generator) = &self.generator else {
            return FALLBACK_ENCOURAGEMENT.to_string();
        };
        let prompt = encouragement_prompt(account, rank_for(account.total_earned));

        match tokio::time::timeout(self.timeout, generator.generate(&prompt)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(Ok(_)) => {
                debug!("{} returned an empty encouragement", generator.name());
                FALLBACK_ENCOURAGEMENT.to_string()
            }
            Ok(Err(e)) => {
                warn!("{} encouragement failed: {}", generator.name(), e);
                FALLBACK_ENCOURAGEMENT.to_string()
            }
            Err(_) => {
                warn!("{} encouragement timed out after {:?}", generator.name(), self.timeout);
                FALLBACK_ENCOURAGEMENT.to_string()
            }
        }
    }

    /// A mission idea for today; points are kept within 50..=200.
    pub async fn suggest_daily_mission(&self, account: &Account) -> MissionSuggestion {
        let Some(generator) = &self.generator else {
            return fallback_mission();
        };
        let prompt = daily_mission_prompt(account);

        let value = match tokio::time::timeout(self.timeout, generator.generate_json(&prompt)).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                warn!("{} mission suggestion failed: {}", generator.name(), e);
                return fallback_mission();
            }
            Err(_) => {
                warn!("{} mission suggestion timed out", generator.name());
                return fallback_mission();
            }
        };

        match serde_json::from_value::<MissionSuggestion>(value) {
            Ok(mut suggestion) if !suggestion.title.trim().is_empty() => {
                suggestion.points = suggestion.points.clamp(MIN_SUGGESTED_POINTS, MAX_SUGGESTED_POINTS);
                suggestion
            }
            Ok(_) => fallback_mission(),
            Err(e) => {
                warn!("Unusable mission suggestion from {}: {}", generator.name(), e);
                fallback_mission()
            }
        }
    }
}
