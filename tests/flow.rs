//! End-to-end flows driven through the router with an in-memory transport.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use tempfile::TempDir;

use mentor_bot::{
    BotContext, ChatTransport, ContentCatalog, Event, FeedbackSink, InlineKeyboard, Router,
    TelegramConfig, UserStore,
};

/// Transport that records everything a handler sends.
#[derive(Debug, Default)]
struct RecordingTransport {
    outbox: Mutex<Vec<Outbound>>,
}

#[derive(Debug, Clone)]
enum Outbound {
    Message {
        chat_id: String,
        text: String,
        tokens: Vec<String>,
    },
    Edit {
        text: String,
        tokens: Vec<String>,
    },
    Photo,
    Ack {
        toast: Option<String>,
    },
}

fn keyboard_tokens(keyboard: Option<&InlineKeyboard>) -> Vec<String> {
    keyboard
        .map(|k| k.buttons().map(|b| b.callback_data.clone()).collect())
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        self.outbox.lock().unwrap().push(Outbound::Message {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            tokens: keyboard_tokens(keyboard),
        });
        Ok(())
    }

    async fn edit_message(
        &self,
        _chat_id: &str,
        _message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        self.outbox.lock().unwrap().push(Outbound::Edit {
            text: text.to_string(),
            tokens: keyboard_tokens(keyboard),
        });
        Ok(())
    }

    async fn send_photo(&self, _chat_id: &str, _photo: Vec<u8>, _caption: &str) -> Result<()> {
        self.outbox.lock().unwrap().push(Outbound::Photo);
        Ok(())
    }

    async fn answer_callback(&self, _callback_id: &str, text: Option<&str>) -> Result<()> {
        self.outbox.lock().unwrap().push(Outbound::Ack {
            toast: text.map(String::from),
        });
        Ok(())
    }
}

impl RecordingTransport {
    fn take(&self) -> Vec<Outbound> {
        std::mem::take(&mut *self.outbox.lock().unwrap())
    }
}

const CATALOG_JSON: &str = r#"{
    "materials": {
        "Funnels and conversion rates": {
            "level": 1,
            "subtopics": {
                "AARRR pirate metrics": "Acquisition, activation, retention, referral, revenue.",
                "Conversion basics": "Conversion is the share of users who complete a step."
            }
        },
        "Cohort analysis": {
            "level": 2,
            "subtopics": { "Retention curves": "Plot retention by signup cohort." }
        }
    },
    "lessons": {
        "Metrics quiz": {
            "level": 1,
            "text": "Which metric measures repeat usage?",
            "answers": ["Retention", "CTR", "CPM"],
            "correct_answer": "Retention"
        },
        "Cohorts quiz": {
            "level": 2,
            "text": "A cohort groups users by what?",
            "answers": ["Signup period", "Device"],
            "correct_answer": "Signup period"
        }
    },
    "about": "Built by the analytics study group."
}"#;

/// Everything a scenario needs, backed by a temp directory.
struct World {
    _dir: TempDir,
    catalog: ContentCatalog,
    users: UserStore,
    feedback: FeedbackSink,
    feedback_path: PathBuf,
    telegram: TelegramConfig,
    transport: RecordingTransport,
    router: Router,
}

impl World {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let feedback_path = dir.path().join("feedback.txt");
        let users = UserStore::load(&dir.path().join("users.json")).unwrap();
        let catalog: ContentCatalog = serde_json::from_str(CATALOG_JSON).unwrap();
        let mut telegram = TelegramConfig::new("123:token");
        telegram.bot_username = "mentor_bot".to_string();
        Self {
            catalog,
            users,
            feedback: FeedbackSink::new(&feedback_path),
            feedback_path,
            telegram,
            transport: RecordingTransport::default(),
            router: Router::new(),
            _dir: dir,
        }
    }

    async fn start(&mut self, user_id: &str, username: &str, referral: Option<&str>) {
        let event = Event::Start {
            user_id: user_id.to_string(),
            username: Some(username.to_string()),
            referral: referral.map(String::from),
        };
        self.dispatch(event).await;
    }

    async fn press(&mut self, user_id: &str, token: &str) {
        let event = Event::Callback {
            callback_id: format!("cb-{}", token),
            user_id: user_id.to_string(),
            message_id: 1,
            token: token.to_string(),
        };
        self.dispatch(event).await;
    }

    async fn say(&mut self, user_id: &str, username: &str, text: &str) {
        let event = Event::Text {
            user_id: user_id.to_string(),
            username: Some(username.to_string()),
            text: text.to_string(),
        };
        self.dispatch(event).await;
    }

    async fn dispatch(&mut self, event: Event) {
        let mut ctx = BotContext {
            catalog: &self.catalog,
            users: &mut self.users,
            feedback: &self.feedback,
            telegram: &self.telegram,
        };
        self.router
            .handle(&self.transport, &mut ctx, event)
            .await
            .unwrap();
    }
}

fn menu_tokens(outbound: &[Outbound]) -> Vec<String> {
    outbound
        .iter()
        .filter_map(|o| match o {
            Outbound::Message { tokens, .. } | Outbound::Edit { tokens, .. } => {
                Some(tokens.clone())
            }
            _ => None,
        })
        .flatten()
        .collect()
}

#[tokio::test]
async fn referral_signup_raises_the_inviter_level_and_unlocks_content() {
    let mut world = World::new();

    world.start("1", "alice", None).await;
    world.transport.take();

    // At level 1 Alice sees only the level-1 topic.
    world.press("1", "materials").await;
    let tokens = menu_tokens(&world.transport.take());
    assert_eq!(
        tokens,
        vec!["mat_Funnels and conversi", "menu"],
        "level-1 materials menu"
    );

    // Bob signs up through Alice's link.
    world.start("2", "bob", Some("alice")).await;
    world.transport.take();
    assert_eq!(world.users.get("1").unwrap().level, 2);
    assert_eq!(world.users.get("2").unwrap().level, 1);

    // Alice's materials menu now includes the level-2 topic.
    world.press("1", "materials").await;
    let tokens = menu_tokens(&world.transport.take());
    assert!(tokens.contains(&"mat_Cohort analysis".to_string()));
}

#[tokio::test]
async fn truncated_tokens_resolve_back_to_full_catalog_names() {
    let mut world = World::new();
    world.start("1", "alice", None).await;
    world.transport.take();

    // The topic name is 30 chars; its token carries only the first 20.
    world.press("1", "mat_Funnels and conversi").await;
    let sent = world.transport.take();
    match &sent[0] {
        Outbound::Edit { text, tokens } => {
            assert_eq!(text, "Choose a subtopic in: Funnels and conversion rates");
            assert_eq!(
                tokens,
                &vec![
                    "sub_Funnels and con_AARRR pirate me".to_string(),
                    "sub_Funnels and con_Conversion basi".to_string(),
                    "materials".to_string()
                ]
            );
        }
        other => panic!("unexpected: {:?}", other),
    }

    // Selecting a subtopic through its doubly-truncated token delivers
    // the full body text.
    world
        .press("1", "sub_Funnels and con_AARRR pirate me")
        .await;
    let sent = world.transport.take();
    match &sent[0] {
        Outbound::Message { text, tokens, .. } => {
            assert_eq!(text, "Acquisition, activation, retention, referral, revenue.");
            assert_eq!(tokens, &vec!["mat_Funnels and conversi".to_string()]);
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn quiz_journey_records_completion_and_survives_restart() {
    let mut world = World::new();
    world.start("1", "alice", None).await;
    world.transport.take();

    // Lessons menu shows the unfinished lesson unchecked.
    world.press("1", "training").await;
    let sent = world.transport.take();
    match &sent[0] {
        Outbound::Message { text, tokens, .. } => {
            assert_eq!(text, "Choose a lesson:");
            assert_eq!(tokens, &vec!["lesson_Metrics quiz".to_string(), "menu".to_string()]);
        }
        other => panic!("unexpected: {:?}", other),
    }

    // Open the lesson, answer wrong, then right.
    world.press("1", "lesson_Metrics quiz").await;
    let sent = world.transport.take();
    match &sent[0] {
        Outbound::Message { text, tokens, .. } => {
            assert_eq!(text, "Which metric measures repeat usage?");
            assert_eq!(tokens.len(), 3);
        }
        other => panic!("unexpected: {:?}", other),
    }

    world.press("1", "answer_Metrics quiz_CPM").await;
    world.transport.take();
    assert!(world.users.get("1").unwrap().completed_lessons.is_empty());

    world.press("1", "answer_Metrics quiz_Retention").await;
    world.transport.take();
    assert_eq!(
        world.users.get("1").unwrap().completed_lessons,
        vec!["Metrics quiz"]
    );

    // A reload from disk sees the same state the handlers left behind.
    let reloaded = UserStore::load(&world._dir.path().join("users.json")).unwrap();
    assert_eq!(
        reloaded.get("1").unwrap().completed_lessons,
        vec!["Metrics quiz"]
    );
}

#[tokio::test]
async fn feedback_flow_captures_exactly_one_message() {
    let mut world = World::new();
    world.start("1", "alice", None).await;
    world.transport.take();

    world.press("1", "feedback").await;
    world.say("1", "alice", "More cohort content please").await;
    world.say("1", "alice", "this one should be dropped").await;

    let contents = std::fs::read_to_string(&world.feedback_path).unwrap();
    assert_eq!(contents, "@alice: More cohort content please\n");

    // The thank-you menu offers to go again.
    let sent = world.transport.take();
    let tokens = menu_tokens(&sent);
    assert_eq!(tokens, vec!["feedback", "menu"]);
}

#[tokio::test]
async fn welcome_photo_is_sent_when_configured() {
    let mut world = World::new();
    let photo_path = world._dir.path().join("welcome.jpg");
    std::fs::write(&photo_path, b"jpeg bytes").unwrap();
    world.telegram.welcome_photo = Some(photo_path);

    world.start("1", "alice", None).await;

    let sent = world.transport.take();
    assert!(matches!(sent[0], Outbound::Photo));
    // The main menu still follows the photo.
    assert_eq!(sent.len(), 2);
}

#[tokio::test]
async fn about_and_referral_and_unknown_commands() {
    let mut world = World::new();
    world.start("1", "alice", None).await;
    world.transport.take();

    world.press("1", "about").await;
    let sent = world.transport.take();
    match &sent[0] {
        Outbound::Message { chat_id, text, .. } => {
            assert_eq!(chat_id, "1");
            assert_eq!(text, "Built by the analytics study group.")
        }
        other => panic!("unexpected: {:?}", other),
    }

    world.press("1", "referral").await;
    let sent = world.transport.take();
    match &sent[0] {
        Outbound::Message { text, .. } => {
            assert_eq!(text, "Your referral link: https://t.me/mentor_bot?start=alice")
        }
        other => panic!("unexpected: {:?}", other),
    }

    world.press("1", "warp_9").await;
    let sent = world.transport.take();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        Outbound::Ack { toast } => {
            assert_eq!(toast.as_deref(), Some("Command not recognized"))
        }
        other => panic!("unexpected: {:?}", other),
    }
}
