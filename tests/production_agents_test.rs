//! Service-backed agents against a mock HTTP server.
//!
//! The blocking HTTP clients are created, used and dropped on a blocking
//! worker so they never touch the async test runtime.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reelforge::agents::{
    build_synthesis_agent, DoubaoAssetAgent, LlmScriptAgent, LlmVisualPlannerAgent,
    OpenAiAssetAgent,
};
use reelforge::build_registry;
use reelforge::config::{
    AgentMode, Config, DashscopeAmbienceSettings, DashscopeMusicSettings, DeepSeekSettings,
    DoubaoSettings, ImageProvider, OpenAiSettings, TextProvider, XunfeiSettings,
};
use reelforge::providers::{DashscopeAudioClient, DoubaoImageClient, OpenAiClient, XunfeiTtsClient};
use reelforge_workflow::{
    AssetAgent, ScriptAgent, ScriptSection, StoryboardShot, TaskContext, TaskId, TaskState,
    SynthesisAgent, TimelineCue, TimelineEntry, VisualPlannerAgent,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{
    body_partial_json, body_string_contains, header, header_exists, method, path,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openai_settings(base_url: &str) -> OpenAiSettings {
    let mut settings = OpenAiSettings::new("sk-test");
    settings.base_url = Some(base_url.to_string());
    settings.timeout_secs = 10;
    settings
}

fn chat_reply(content: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content.to_string()}}]
    }))
}

fn context(persona: &str) -> TaskContext {
    TaskContext::new(TaskId::generate(), persona)
}

fn shot(shot_id: &str, scene: &str) -> StoryboardShot {
    StoryboardShot {
        shot_id: shot_id.to_string(),
        start: Duration::ZERO,
        duration: Duration::from_secs(20),
        scene: scene.to_string(),
        mood: "calm".to_string(),
        subtitle: String::new(),
    }
}

// ---------------------------------------------------------------------------
// Chat agents
// ---------------------------------------------------------------------------

#[tokio::test]
async fn script_agent_requests_json_and_parses_sections() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "response_format": {"type": "json_object"}
        })))
        .and(body_string_contains("Cleopatra"))
        .respond_with(chat_reply(json!({
            "sections": [
                {"section": "introduction", "timeframe": "69 BC", "summary": "Born in Alexandria", "citations": "Plutarch"},
                {"section": "climax", "timeframe": "31 BC", "summary": "Actium"},
                {"section": "legacy", "timeframe": "today", "summary": "Myth", "citations": ["Shakespeare"]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let sections = tokio::task::spawn_blocking(move || {
        let client = Arc::new(OpenAiClient::new(&openai_settings(&base))?);
        LlmScriptAgent::new(client).run(&context("Cleopatra"))
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(sections.len(), 3);
    assert_eq!(sections[0].citations, vec!["Plutarch".to_string()]);
    assert!(sections[1].citations.is_empty());
    assert_eq!(sections[2].section, "legacy");
}

#[tokio::test]
async fn script_agent_accepts_text_parts_and_nested_sections() {
    let server = MockServer::start().await;
    let content = json!({"script": {"sections": {"a": {"section": "only", "summary": "one"}}}});
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": [{"type": "text", "text": content.to_string()}]}}]
        })))
        .mount(&server)
        .await;

    let base = server.uri();
    let sections = tokio::task::spawn_blocking(move || {
        let client = Arc::new(OpenAiClient::new(&openai_settings(&base))?);
        LlmScriptAgent::new(client).run(&context("Cleopatra"))
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].section, "only");
}

#[tokio::test]
async fn deepseek_client_drives_the_script_agent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-deepseek"))
        .and(body_partial_json(json!({"model": "deepseek-chat"})))
        .respond_with(chat_reply(json!({"script": "First part.\n\nSecond part."})))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let sections = tokio::task::spawn_blocking(move || {
        let mut settings = DeepSeekSettings::new("sk-deepseek");
        settings.base_url = Some(base);
        let client = Arc::new(OpenAiClient::deepseek(&settings)?);
        LlmScriptAgent::new(client).run(&context("Du Fu"))
    })
    .await
    .unwrap()
    .unwrap();

    let names: Vec<_> = sections.iter().map(|s| s.section.as_str()).collect();
    assert_eq!(names, ["section_1", "section_2"]);
    assert_eq!(sections[1].summary, "Second part.");
}

#[tokio::test]
async fn http_error_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let base = server.uri();
    let err = tokio::task::spawn_blocking(move || {
        let client = Arc::new(OpenAiClient::new(&openai_settings(&base))?);
        LlmScriptAgent::new(client).run(&context("Cleopatra"))
    })
    .await
    .unwrap()
    .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("429"), "{message}");
    assert!(message.contains("rate limited"), "{message}");
}

#[tokio::test]
async fn storyboard_agent_fills_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("senior video director"))
        .respond_with(chat_reply(json!({
            "shots": [
                {"shot_id": "s1", "start_seconds": 0, "duration_seconds": "12.5", "scene": "Harbor"},
                {"scene": "Palace", "mood": "tense"}
            ]
        })))
        .mount(&server)
        .await;

    let base = server.uri();
    let shots = tokio::task::spawn_blocking(move || {
        let client = Arc::new(OpenAiClient::new(&openai_settings(&base))?);
        let script = vec![ScriptSection {
            section: "introduction".into(),
            timeframe: "69 BC".into(),
            summary: "Born".into(),
            citations: vec![],
        }];
        LlmVisualPlannerAgent::new(client).run(&context("Cleopatra"), &script)
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(shots[0].duration, Duration::from_secs_f64(12.5));
    assert_eq!(shots[0].mood, "neutral");
    assert_eq!(shots[1].shot_id, "shot");
    assert_eq!(shots[1].duration, Duration::from_secs(30));
    assert_eq!(shots[1].mood, "tense");
}

// ---------------------------------------------------------------------------
// Image agents
// ---------------------------------------------------------------------------

#[tokio::test]
async fn openai_asset_agent_generates_one_image_per_shot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .and(body_partial_json(json!({"model": "gpt-image-1", "size": "1024x1024", "n": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"b64_json": "iVBORw0KGgo="}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let base = server.uri();
    let assets = tokio::task::spawn_blocking(move || {
        let client = Arc::new(OpenAiClient::new(&openai_settings(&base))?);
        let storyboard = vec![shot("s1", "a harbor"), shot("s2", "a palace")];
        OpenAiAssetAgent::new(client).run(&context("Cleopatra"), &storyboard)
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(assets.len(), 2);
    assert_eq!(assets[1].shot_id, "s2");
    assert_eq!(
        assets[0].asset_uri.as_deref(),
        Some("data:image/png;base64,iVBORw0KGgo=")
    );
    assert!(assets[0].prompt.starts_with("Cleopatra a harbor."));
    assert_eq!(assets[0].confidence, 0.85);
}

#[tokio::test]
async fn doubao_asset_agent_sends_negative_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images"))
        .and(header("authorization", "Bearer doubao-key"))
        .and(body_partial_json(json!({
            "model": "doubao-vision",
            "input": {"negative_prompt": "blurry", "size": "1024*1024"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"url": "https://cdn.example.com/shot.png"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let assets = tokio::task::spawn_blocking(move || {
        let mut settings = DoubaoSettings::new("doubao-key");
        settings.base_url = Some(base);
        settings.negative_prompt = Some("blurry".into());
        let client = Arc::new(DoubaoImageClient::new(&settings)?);
        DoubaoAssetAgent::new(client).run(&context("Li Bai"), &[shot("s1", "a moonlit river")])
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(
        assets[0].asset_uri.as_deref(),
        Some("https://cdn.example.com/shot.png")
    );
    assert_eq!(assets[0].negative_prompt.as_deref(), Some("blurry"));
    assert_eq!(assets[0].confidence, 0.8);
}

#[tokio::test]
async fn doubao_without_images_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let base = server.uri();
    let err = tokio::task::spawn_blocking(move || {
        let mut settings = DoubaoSettings::new("doubao-key");
        settings.base_url = Some(base);
        let client = Arc::new(DoubaoImageClient::new(&settings)?);
        DoubaoAssetAgent::new(client).run(&context("Li Bai"), &[shot("s1", "a river")])
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(format!("{err:#}").contains("no images"));
}

// ---------------------------------------------------------------------------
// Audio services
// ---------------------------------------------------------------------------

const TEXT_TO_MUSIC: &str = "/services/audio-generation/text-to-music";

fn xunfei_settings(base_url: &str) -> XunfeiSettings {
    let mut settings = XunfeiSettings::new("app-1", "tts-key", "tts-secret");
    settings.base_url = Some(base_url.to_string());
    settings
}

fn music_settings(base_url: &str) -> DashscopeMusicSettings {
    let mut settings = DashscopeMusicSettings::new("ds-key");
    settings.base_url = Some(base_url.to_string());
    settings
}

fn ambience_settings(base_url: &str) -> DashscopeAmbienceSettings {
    let mut settings = DashscopeAmbienceSettings::new("ds-key");
    settings.base_url = Some(base_url.to_string());
    settings
}

fn audio_reply(bytes: &[u8]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": 0,
        "data": {"audio": STANDARD.encode(bytes)}
    }))
}

fn narration(reference: &str, start: u64) -> TimelineCue {
    TimelineCue {
        cue_type: "narration".to_string(),
        reference: reference.to_string(),
        start: Duration::from_secs(start),
        duration: Duration::from_secs(3),
    }
}

#[tokio::test]
async fn xunfei_client_signs_request_and_writes_audio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tts"))
        .and(header("x-appid", "app-1"))
        .and(header_exists("x-curtime"))
        .and(header_exists("x-param"))
        .and(header_exists("x-checksum"))
        .and(body_partial_json(json!({
            "app_id": "app-1",
            "api_secret": "tts-secret",
            "text": STANDARD.encode("Born in Warsaw."),
        })))
        .respond_with(audio_reply(b"ID3-narration"))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let output = tempfile::tempdir().unwrap();
    let target = output.path().join("voice/line.mp3");
    let written = tokio::task::spawn_blocking(move || {
        XunfeiTtsClient::new(&xunfei_settings(&base))?.synthesize("Born in Warsaw.", &target)
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(written, output.path().join("voice/line.mp3"));
    assert_eq!(std::fs::read(&written).unwrap(), b"ID3-narration");
}

#[tokio::test]
async fn xunfei_error_code_surfaces_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 10105,
            "desc": "illegal access"
        })))
        .mount(&server)
        .await;

    let base = server.uri();
    let output = tempfile::tempdir().unwrap();
    let target = output.path().join("line.mp3");
    let err = tokio::task::spawn_blocking(move || {
        XunfeiTtsClient::new(&xunfei_settings(&base))?.synthesize("text", &target)
    })
    .await
    .unwrap()
    .unwrap_err();

    assert_eq!(err.to_string(), "Xunfei TTS error: illegal access");
    assert!(!output.path().join("line.mp3").exists());
}

#[tokio::test]
async fn dashscope_music_posts_prompt_and_decodes_listed_audio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT_TO_MUSIC))
        .and(header("authorization", "Bearer ds-key"))
        .and(body_partial_json(json!({
            "model": "text-to-music-001",
            "input": {"duration": 120},
            "parameters": {"style": "中国古风"}
        })))
        .and(body_string_contains("Marie Curie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": {"audios": [{"data": STANDARD.encode(b"bgm-bytes")}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let output = tempfile::tempdir().unwrap();
    let target = output.path().join("bgm.mp3");
    let written = tokio::task::spawn_blocking(move || {
        DashscopeAudioClient::music(&music_settings(&base))?.generate("Marie Curie", &target)
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(std::fs::read(written).unwrap(), b"bgm-bytes");
}

#[tokio::test]
async fn dashscope_ambience_without_audio_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT_TO_MUSIC))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": {"task_status": "SUCCEEDED"}
        })))
        .mount(&server)
        .await;

    let base = server.uri();
    let output = tempfile::tempdir().unwrap();
    let target = output.path().join("ambience.mp3");
    let err = tokio::task::spawn_blocking(move || {
        DashscopeAudioClient::ambience(&ambience_settings(&base))?.generate("Li Bai", &target)
    })
    .await
    .unwrap()
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "DashScope ambience response missing audio payload"
    );
}

#[tokio::test]
async fn configured_audio_services_fill_synthesis_outputs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tts"))
        .respond_with(audio_reply(b"voice"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TEXT_TO_MUSIC))
        .and(body_partial_json(json!({"parameters": {"style": "中国古风"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": {"audio": {"audio": STANDARD.encode(b"bgm")}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TEXT_TO_MUSIC))
        .and(body_partial_json(json!({"parameters": {"style": "中国场景环境音"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": {"results": [{"audio": STANDARD.encode(b"wind")}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.xunfei_tts = Some(xunfei_settings(&server.uri()));
    config.dashscope_music = Some(music_settings(&server.uri()));
    config.dashscope_ambience = Some(ambience_settings(&server.uri()));
    config.storage.output_dir = output.path().to_path_buf();

    let timeline = vec![TimelineEntry {
        shot_id: "s1".to_string(),
        layers: vec![],
        audio_cues: vec![
            narration("Born in Warsaw.", 0),
            TimelineCue {
                cue_type: "sfx".to_string(),
                reference: "door".to_string(),
                start: Duration::from_secs(1),
                duration: Duration::from_secs(1),
            },
            narration("Moved to Paris.", 3),
        ],
    }];
    let task = TaskContext::new(TaskId::from("audio-1"), "Marie Curie");

    let assets = tokio::task::spawn_blocking(move || {
        build_synthesis_agent(&config)?.run(&task, &timeline)
    })
    .await
    .unwrap()
    .unwrap();

    let dir = output.path();
    let bgm = dir.join("audio-1_bgm.mp3");
    assert_eq!(assets.audio_uri.as_deref(), Some(bgm.display().to_string().as_str()));
    assert_eq!(std::fs::read(&bgm).unwrap(), b"bgm");
    assert_eq!(std::fs::read(dir.join("audio-1_ambience.mp3")).unwrap(), b"wind");

    let narration_files = assets.metadata["narration_files"].as_array().unwrap();
    assert_eq!(narration_files.len(), 2);
    assert!(narration_files[0].as_str().unwrap().ends_with("audio-1_narration_00.mp3"));
    assert!(narration_files[1].as_str().unwrap().ends_with("audio-1_narration_01.mp3"));
    assert_eq!(assets.metadata["background_music"], bgm.display().to_string());
    assert!(assets.metadata["ambience"]
        .as_str()
        .unwrap()
        .ends_with("audio-1_ambience.mp3"));

    assert!(dir.join("audio-1.srt").exists());
    assert!(dir.join("audio-1_timeline.json").exists());
}

#[tokio::test]
async fn failing_audio_service_fails_synthesis() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXT_TO_MUSIC))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let output = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.dashscope_music = Some(music_settings(&server.uri()));
    config.storage.output_dir = output.path().to_path_buf();
    let task = TaskContext::new(TaskId::from("audio-2"), "Li Bai");

    let err = tokio::task::spawn_blocking(move || {
        build_synthesis_agent(&config)?.run(&task, &[])
    })
    .await
    .unwrap()
    .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("DashScope music API returned 503"));
    assert!(message.contains("busy"));
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn production_pipeline_delivers_with_local_synthesis() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("documentary writer"))
        .respond_with(chat_reply(json!({
            "sections": [{"section": "introduction", "timeframe": "1867", "summary": "Born in Warsaw"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("senior video director"))
        .respond_with(chat_reply(json!({
            "shots": [{"shot_id": "s1", "duration_seconds": 8, "scene": "A laboratory"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"url": "https://cdn.example.com/s1.png"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("cinematographer"))
        .respond_with(chat_reply(json!({
            "plan": [{"shot_id": "s1", "motion_type": "dolly_in", "params": {"speed": 0.3}}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("video editor"))
        .respond_with(chat_reply(json!({
            "entries": [{
                "shot_id": "s1",
                "layers": [{"type": "visual", "reference": "https://cdn.example.com/s1.png", "duration_seconds": 8}],
                "audio_cues": [{"reference": "She was born in Warsaw.", "start_seconds": 0.5, "duration_seconds": 7.25}]
            }]
        })))
        .mount(&server)
        .await;

    let output = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.agents.mode = AgentMode::Production;
    config.openai = Some(openai_settings(&server.uri()));
    config.text_generation.provider = TextProvider::OpenAi;
    config.image_generation.provider = ImageProvider::OpenAi;
    config.storage.output_dir = output.path().to_path_buf();

    let task = tokio::task::spawn_blocking(move || {
        let registry = build_registry(&config).unwrap();
        registry.start_task("Marie Curie")
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(task.state, TaskState::Delivered);
    assert_eq!(task.camera_plan[0].motion_type, "dolly_in");
    assert_eq!(task.assets[0].asset_uri.as_deref(), Some("https://cdn.example.com/s1.png"));

    let id = task.task_id.as_str();
    let final_assets = task.final_assets.as_ref().unwrap();
    let srt_path = output.path().join(format!("{id}.srt"));
    assert_eq!(
        final_assets.subtitles_uri.as_deref(),
        Some(srt_path.display().to_string().as_str())
    );
    let srt = std::fs::read_to_string(&srt_path).unwrap();
    assert_eq!(
        srt,
        "1\n00:00:00,500 --> 00:00:07,750\nShe was born in Warsaw.\n\n"
    );
    assert!(output.path().join(format!("{id}.mp4")).exists());

    let manifest: Value = serde_json::from_slice(
        &std::fs::read(output.path().join(format!("{id}_timeline.json"))).unwrap(),
    )
    .unwrap();
    assert_eq!(manifest["entries"][0]["audio_cues"][0]["cue_type"], "narration");
    assert_eq!(final_assets.metadata["shots"], 1);
}
