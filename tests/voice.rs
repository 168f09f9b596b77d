//! Voice pipeline integration tests
//!
//! Drives the dispatch path end to end with recording doubles

use std::time::Duration;

use vision_voice::matching::{fused_similarity, normalize};
use vision_voice::voice::{
    AppMode, CommandAction, CommandMatcher, CommandTable, DispatchController, DispatchOutcome,
    LearningStats, NO_MATCH_BUCKET, WakeWordDetector,
};
use vision_voice::Config;

mod common;

use common::{RecordingActions, RecordingSpeech};

const UTTERANCES: &[&str] = &[
    "",
    "   ",
    "Hey Vision, camera!",
    "um, like, you know... navigation",
    "aaaargh!!!",
    "what a nice day",
    "¿dónde estoy?",
    "hey vision volume up please",
];

fn controller() -> (
    DispatchController<RecordingActions, RecordingSpeech>,
    RecordingActions,
    RecordingSpeech,
) {
    let actions = RecordingActions::default();
    let speech = RecordingSpeech::default();
    let c = DispatchController::new(&Config::default(), actions.clone(), speech.clone());
    (c, actions, speech)
}

#[test]
fn test_fused_similarity_properties() {
    for a in UTTERANCES {
        assert!((fused_similarity(a, a) - 1.0).abs() < f64::EPSILON, "self similarity of {a:?}");
        for b in UTTERANCES {
            let ab = fused_similarity(a, b);
            let ba = fused_similarity(b, a);
            assert!((ab - ba).abs() < 1e-12, "symmetry of {a:?} / {b:?}");
            assert!((0.0..=1.0).contains(&ab));
        }
    }
}

#[test]
fn test_normalize_idempotent() {
    for s in UTTERANCES {
        let once = normalize(s);
        assert_eq!(normalize(&once), once, "normalize({s:?})");
    }
}

#[test]
fn test_wake_word_acceptance_and_rejection() {
    let config = Config::default();
    let detector = WakeWordDetector::new(&config.wake_word, config.recognition.wake_threshold);

    let hit = detector.detect("hey vision camera", &[]);
    assert!(hit.activated);
    assert!(hit.residual.contains("camera"));

    assert!(!detector.detect("what a nice day", &[]).activated);
}

#[test]
fn test_matcher_routes_every_action_by_name() {
    let matcher = CommandMatcher::new(CommandTable::default(), 0.7, false);
    let learning = LearningStats::new();
    for action in CommandAction::ALL {
        let m = matcher
            .match_command(action.as_str(), AppMode::Home, &learning)
            .unwrap();
        assert_eq!(m.action, action);
    }
}

#[tokio::test(start_paused = true)]
async fn test_end_to_end_single_dispatch() {
    let (mut c, actions, speech) = controller();

    let outcome = c.process("hey vision camera", 0.8);
    assert!(matches!(outcome, DispatchOutcome::Dispatched(ref m) if m.action == CommandAction::Camera));
    assert_eq!(c.process("hey vision camera", 0.8), DispatchOutcome::Busy);

    assert_eq!(actions.calls(), vec!["camera:camera".to_string()]);
    assert_eq!(speech.spoken().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_within_window_after_cooldown() {
    let (mut c, actions, _speech) = controller();

    c.process("hey vision camera", 0.8);
    tokio::time::advance(Duration::from_secs(3)).await;
    c.fire_due(true);

    assert_eq!(c.process("hey vision camera", 0.8), DispatchOutcome::Duplicate);
    assert_eq!(actions.calls().len(), 1);

    // Three newer transcripts push it out of the duplicate window
    for filler in ["one thing", "another thing", "third thing"] {
        assert!(matches!(c.process(filler, 0.8), DispatchOutcome::Ignored { .. }));
    }
    assert!(matches!(c.process("hey vision camera", 0.8), DispatchOutcome::Dispatched(_)));
    assert_eq!(actions.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_ambient_speech_is_silent() {
    let (mut c, actions, speech) = controller();
    assert!(matches!(c.process("what a nice day", 0.9), DispatchOutcome::Ignored { .. }));
    assert!(actions.calls().is_empty());
    assert!(speech.spoken().is_empty());
    assert_eq!(c.history().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_settings_change_and_mode_fallback() {
    let (mut c, actions, _speech) = controller();

    c.process("hey vision volume up", 0.9);
    tokio::time::advance(Duration::from_secs(3)).await;
    c.fire_due(true);
    c.process("hey vision settings", 0.9);

    assert_eq!(
        actions.calls(),
        vec!["setting:volume=up".to_string(), "mode:settings".to_string()]
    );
    assert_eq!(c.mode(), AppMode::Settings);
}

#[tokio::test(start_paused = true)]
async fn test_status_and_help_only_speak() {
    let (mut c, actions, speech) = controller();

    c.process("hey vision help", 0.9);
    assert!(actions.calls().is_empty());
    let spoken = speech.spoken();
    assert_eq!(spoken.len(), 1);
    assert!(spoken[0].contains("camera"));
    assert_eq!(c.last_command().map(|m| m.action), Some(CommandAction::Help));
}

#[tokio::test(start_paused = true)]
async fn test_unmatched_command_suggests() {
    let (mut c, actions, speech) = controller();

    // "navigator" lands between the suggestion floor and the command threshold
    let outcome = c.process("hey vision navigator", 0.9);
    assert_eq!(
        outcome,
        DispatchOutcome::Unmatched {
            suggestion: Some("navigate".to_string())
        }
    );
    assert_eq!(speech.spoken(), vec!["Did you mean \"navigate\"?".to_string()]);
    assert!(actions.calls().is_empty());
    assert_eq!(c.mode(), AppMode::Home);
    assert_eq!(c.learning().get(NO_MATCH_BUCKET).failure_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_bare_wake_phrase_gets_help_prompt() {
    let (mut c, actions, speech) = controller();

    let outcome = c.process("hey vision", 0.9);
    assert_eq!(outcome, DispatchOutcome::Unmatched { suggestion: None });
    assert_eq!(
        speech.spoken(),
        vec!["Sorry, I didn't catch that. Say \"hey vision help\" to hear the commands".to_string()]
    );
    assert!(actions.calls().is_empty());
    assert_eq!(c.learning().get(NO_MATCH_BUCKET).failure_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_embedded_alias_is_ambient_speech() {
    let (mut c, actions, speech) = controller();

    for text in ["the television is on", "I watched television yesterday"] {
        assert!(
            matches!(c.process(text, 0.9), DispatchOutcome::Ignored { .. }),
            "{text:?} should not wake the assistant"
        );
    }
    assert!(actions.calls().is_empty());
    assert!(speech.spoken().is_empty());
    assert!(!c.is_processing());
}

#[test]
fn test_equal_scores_keep_first_declared_action() {
    let matcher = CommandMatcher::new(CommandTable::default(), 0.7, true);
    let learning = LearningStats::new();

    // "call for help" is contained and mode-boosted to 1.0, tying the literal "help"
    let m = matcher.score("help", AppMode::Emergency, &learning).unwrap();
    assert_eq!(m.action, CommandAction::Emergency);
    assert!((m.confidence - 1.0).abs() < f64::EPSILON);

    let m = matcher.score("help", AppMode::Home, &learning).unwrap();
    assert_eq!(m.action, CommandAction::Help);
}

#[tokio::test(start_paused = true)]
async fn test_failed_callback_counts_as_failure() {
    let actions = RecordingActions {
        fail: true,
        ..RecordingActions::default()
    };
    let speech = RecordingSpeech::default();
    let mut c = DispatchController::new(&Config::default(), actions.clone(), speech.clone());

    let outcome = c.process("hey vision navigation", 0.9);
    assert!(matches!(outcome, DispatchOutcome::Failed { action: CommandAction::Navigation, .. }));
    assert_eq!(c.learning().get("navigation").failure_count, 1);
    assert_eq!(c.learning().get("navigation").success_count, 0);
    assert_eq!(c.mode(), AppMode::Home);
    assert_eq!(speech.spoken().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_learning_counts_successes() {
    let (mut c, _actions, _speech) = controller();
    c.process("hey vision navigation", 0.9);
    assert_eq!(c.learning().get("navigation").success_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_inactivity_prompt_repeats() {
    let (mut c, _actions, speech) = controller();
    c.arm_inactivity();

    tokio::time::advance(Duration::from_secs(60)).await;
    c.fire_due(true);
    assert_eq!(speech.spoken().len(), 1);
    assert!(speech.spoken()[0].starts_with("Still listening"));

    tokio::time::advance(Duration::from_secs(60)).await;
    c.fire_due(true);
    assert_eq!(speech.spoken().len(), 2);

    // Not running: the prompt stays quiet and the timer stops
    tokio::time::advance(Duration::from_secs(60)).await;
    c.fire_due(false);
    assert_eq!(speech.spoken().len(), 2);
    assert!(c.next_deadline().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_processed_result_resets_inactivity() {
    let (mut c, _actions, speech) = controller();
    c.arm_inactivity();

    tokio::time::advance(Duration::from_secs(50)).await;
    c.process("just chatting", 0.9);
    tokio::time::advance(Duration::from_secs(20)).await;
    c.fire_due(true);
    assert!(speech.spoken().is_empty());
}
