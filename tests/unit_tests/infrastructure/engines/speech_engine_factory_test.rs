use speechgate::domain::EngineId;
use speechgate::infrastructure::engines::SpeechEngineFactory;
use speechgate::presentation::config::{EnginesSettings, SelectorSettings};

#[test]
fn given_default_priority_when_creating_all_then_engines_follow_declared_order() {
    let engines =
        SpeechEngineFactory::create_all(&SelectorSettings::default(), &EnginesSettings::default());

    let ids: Vec<_> = engines.iter().map(|e| e.descriptor().id).collect();
    assert_eq!(ids, EngineId::ALL.to_vec());
}

#[test]
fn given_repeated_priority_entries_when_creating_all_then_duplicates_are_dropped() {
    let selector = SelectorSettings {
        priority: vec![EngineId::OpenAi, EngineId::Local, EngineId::OpenAi],
        ..Default::default()
    };

    let engines = SpeechEngineFactory::create_all(&selector, &EnginesSettings::default());

    let ids: Vec<_> = engines.iter().map(|e| e.descriptor().id).collect();
    assert_eq!(ids, vec![EngineId::OpenAi, EngineId::Local]);
}

#[tokio::test]
async fn given_scaffold_mode_when_creating_all_then_every_engine_is_available() {
    let selector = SelectorSettings {
        scaffold: true,
        ..Default::default()
    };

    let engines = SpeechEngineFactory::create_all(&selector, &EnginesSettings::default());

    for engine in engines {
        let status = engine.status().await.unwrap();
        assert!(status.is_available, "{} should be available", status.engine);
    }
}

#[tokio::test]
async fn given_unconfigured_cloud_engines_when_querying_status_then_unavailable() {
    for id in [EngineId::Azure, EngineId::OpenAi, EngineId::Google] {
        let engine = SpeechEngineFactory::create(id, &EnginesSettings::default());

        let status = engine.status().await.unwrap();

        assert_eq!(status.engine, id);
        assert!(!status.is_available);
        assert!(engine.descriptor().requires_network);
    }
}
