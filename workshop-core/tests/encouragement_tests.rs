// File: workshop-core/tests/encouragement_tests.rs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use serde_json::json;

use workshop_ai::TextGenerator;
use workshop_common::models::{Account, RoleAccount};
use workshop_core::services::encouragement_service::{fallback_mission, FALLBACK_ENCOURAGEMENT};
use workshop_core::services::EncouragementService;

mock! {
    Generator {}
    #[async_trait]
    impl TextGenerator for Generator {
        fn name(&self) -> &str;
        async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
        async fn generate_json(&self, prompt: &str) -> anyhow::Result<serde_json::Value>;
    }
}

/// Never answers within any reasonable timeout.
struct StalledGenerator;

#[async_trait]
impl TextGenerator for StalledGenerator {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok("too late".into())
    }
}

fn student() -> Account {
    let mut account = RoleAccount::Guest.account();
    account.id = "user_1".into();
    account.name = "小明".into();
    account.total_earned = 640;
    account.balance = 120;
    account
}

fn service(generator: MockGenerator) -> EncouragementService {
    EncouragementService::new(Some(Arc::new(generator)), Duration::from_secs(5))
}

#[tokio::test]
async fn test_encourage_uses_generated_text() {
    let mut generator = MockGenerator::new();
    generator.expect_name().return_const("mock".to_string());
    generator
        .expect_generate()
        .withf(|prompt| prompt.contains("小明") && prompt.contains("積極求知者"))
        .times(1)
        .returning(|_| Ok("  繼續加油！  ".to_string()));

    let text = service(generator).encourage(&student()).await;
    assert_eq!(text, "繼續加油！");
}

#[tokio::test]
async fn test_encourage_falls_back_on_error_or_empty_text() {
    let mut failing = MockGenerator::new();
    failing.expect_name().return_const("mock".to_string());
    failing.expect_generate().returning(|_| Err(anyhow::anyhow!("quota exceeded")));
    assert_eq!(service(failing).encourage(&student()).await, FALLBACK_ENCOURAGEMENT);

    let mut empty = MockGenerator::new();
    empty.expect_name().return_const("mock".to_string());
    empty.expect_generate().returning(|_| Ok("   ".to_string()));
    assert_eq!(service(empty).encourage(&student()).await, FALLBACK_ENCOURAGEMENT);
}

#[tokio::test]
async fn test_disabled_service_uses_fallbacks() {
    let service = EncouragementService::disabled();
    assert_eq!(service.encourage(&student()).await, FALLBACK_ENCOURAGEMENT);
    assert_eq!(service.suggest_daily_mission(&student()).await, fallback_mission());
}

#[tokio::test(start_paused = true)]
async fn test_slow_generator_times_out_to_fallback() {
    let service = EncouragementService::new(Some(Arc::new(StalledGenerator)), Duration::from_millis(200));
    assert_eq!(service.encourage(&student()).await, FALLBACK_ENCOURAGEMENT);
    assert_eq!(service.suggest_daily_mission(&student()).await, fallback_mission());
}

#[tokio::test]
async fn test_daily_mission_clamps_points() {
    let mut generator = MockGenerator::new();
    generator.expect_name().return_const("mock".to_string());
    generator
        .expect_generate_json()
        .times(1)
        .returning(|_| Ok(json!({ "title": "寫日記", "description": "記錄今天學到的三件事", "points": 999 })));

    let suggestion = service(generator).suggest_daily_mission(&student()).await;
    assert_eq!(suggestion.title, "寫日記");
    assert_eq!(suggestion.points, 200);
}

#[tokio::test]
async fn test_daily_mission_rejects_unusable_payloads() {
    let mut untitled = MockGenerator::new();
    untitled.expect_name().return_const("mock".to_string());
    untitled
        .expect_generate_json()
        .returning(|_| Ok(json!({ "title": " ", "description": "", "points": 10 })));
    assert_eq!(service(untitled).suggest_daily_mission(&student()).await, fallback_mission());

    let mut malformed = MockGenerator::new();
    malformed.expect_name().return_const("mock".to_string());
    malformed.expect_generate_json().returning(|_| Ok(json!(["not", "an", "object"])));
    assert_eq!(service(malformed).suggest_daily_mission(&student()).await, fallback_mission());
}
