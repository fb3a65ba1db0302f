//! File intake: from an inbound message to a stored file and a status report.
//!
//! Planning (category, directory, name) is pure; storing touches the transport
//! and the disk. The user sees an in-progress status that is edited into the
//! final outcome.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::attachment::{Attachment, AttachmentKind};
use crate::category::{parse_caption, CategoryRegistry, CategoryResolver, ResolutionSource};
use crate::error::TransferError;
use crate::filename;
use crate::prefs::UserPreferences;
use crate::storage::{self, StagedFile};
use crate::telegram::types::Message;
use crate::transport::{FileSource, MessageRef, Messenger};

/// Notice sent for messages without a recognizable attachment.
pub const REJECT_NOTICE: &str = "Could not process this file.";

/// Seconds since the Unix epoch; used in generated filenames.
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Everything decided about one file before any bytes move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    pub kind: AttachmentKind,
    pub source_id: String,
    pub suggested_name: String,
    /// Filename requested in the caption, if any.
    pub override_name: Option<String>,
    pub category: String,
    pub resolved_by: ResolutionSource,
    pub storage_dir: PathBuf,
}

impl IncomingFile {
    /// Name before sanitizing: the caption override (inheriting the suggested
    /// name's extension) or the suggested name.
    pub fn desired_name(&self) -> String {
        filename::choose_name(&self.suggested_name, self.override_name.as_deref())
    }
}

/// A file written to its final path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: PathBuf,
    pub category: String,
    pub bytes: u64,
}

/// Outcome of one intake.
#[derive(Debug)]
pub enum IntakeReport {
    Rejected { reason: String },
    Saved(StoredFile),
    Failed { category: String, error: TransferError },
}

impl IntakeReport {
    /// Text shown to the user for this outcome.
    pub fn user_text(&self) -> String {
        match self {
            IntakeReport::Rejected { reason } => reason.clone(),
            IntakeReport::Saved(stored) => format!(
                "File saved successfully!\nCategory: {}\nLocation: {}",
                stored.category,
                stored.path.display()
            ),
            IntakeReport::Failed { error, .. } => format!("Error saving file: {error}"),
        }
    }
}

/// Intake orchestrator. Stores are shared with the rest of the bot; the
/// transport is injected through the [`FileSource`] and [`Messenger`] ports.
pub struct Intake<S, M> {
    registry: Arc<CategoryRegistry>,
    prefs: Arc<UserPreferences>,
    source: S,
    messenger: M,
    clock: fn() -> u64,
}

impl<S: FileSource, M: Messenger> Intake<S, M> {
    pub fn new(
        registry: Arc<CategoryRegistry>,
        prefs: Arc<UserPreferences>,
        source: S,
        messenger: M,
    ) -> Self {
        Self {
            registry,
            prefs,
            source,
            messenger,
            clock: now_unix,
        }
    }

    /// Replace the clock used for generated names.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    /// Decide category, directory and name for `msg`. `None` if it carries no attachment.
    pub fn plan(&self, msg: &Message, now: u64) -> Option<IncomingFile> {
        let attachment = Attachment::from_message(msg)?;
        let caption = msg.caption.as_deref();
        let override_name = caption.and_then(|c| parse_caption(c, &self.registry).filename);
        let resolution = CategoryResolver::new(&self.registry, &self.prefs).resolve(
            caption,
            msg.user_id(),
            Some(attachment.kind),
        );
        let storage_dir = self.registry.storage_dir_or_fallback(&resolution.category);
        Some(IncomingFile {
            kind: attachment.kind,
            suggested_name: attachment.suggested_name(now),
            source_id: attachment.source_id,
            override_name,
            category: resolution.category,
            resolved_by: resolution.source,
            storage_dir,
        })
    }

    /// Fetch and write `file`: resolve the URL, pick a free name, stream into a
    /// `.part` file and rename it into place.
    pub fn store(&self, file: &IncomingFile, now: u64) -> Result<StoredFile, TransferError> {
        let url = self.source.locate(&file.source_id)?;
        let name = filename::safe_name(&file.desired_name(), &file.kind.generated_name(now));

        storage::ensure_dir(&file.storage_dir)?;
        let final_path = filename::unique_path(&file.storage_dir, &name);

        let mut staged = StagedFile::create(&final_path)?;
        let bytes = self
            .source
            .fetch(&url, &mut staged)
            .map_err(|e| e.into_transfer_error(&final_path))?;
        let path = staged.finalize()?;

        Ok(StoredFile {
            path,
            category: file.category.clone(),
            bytes,
        })
    }

    /// Handle one file message end to end, reporting progress and outcome to its chat.
    pub fn handle(&self, msg: &Message) -> IntakeReport {
        let chat_id = msg.chat.id;
        let now = (self.clock)();

        let Some(file) = self.plan(msg, now) else {
            let report = IntakeReport::Rejected {
                reason: REJECT_NOTICE.to_string(),
            };
            self.deliver(chat_id, None, &report.user_text());
            return report;
        };

        tracing::debug!(
            chat_id,
            kind = file.kind.label(),
            category = %file.category,
            resolved_by = ?file.resolved_by,
            "intake planned"
        );

        let status_text = format!(
            "Saving file '{}' to category '{}' (path: {})...",
            file.desired_name(),
            file.category,
            file.storage_dir.display()
        );
        let status = match self.messenger.send_text(chat_id, &status_text) {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!(chat_id, "could not send status message: {:#}", e);
                None
            }
        };

        let report = match self.store(&file, now) {
            Ok(stored) => {
                tracing::info!(
                    category = %stored.category,
                    bytes = stored.bytes,
                    "saved {}",
                    stored.path.display()
                );
                IntakeReport::Saved(stored)
            }
            Err(error) => {
                tracing::warn!(category = %file.category, "intake failed: {}", error);
                IntakeReport::Failed {
                    category: file.category.clone(),
                    error,
                }
            }
        };

        self.deliver(chat_id, status, &report.user_text());
        report
    }

    /// Edit the status message into `text`, or send `text` when there is no
    /// status message or the edit fails.
    fn deliver(&self, chat_id: i64, status: Option<MessageRef>, text: &str) {
        if let Some(status) = status {
            match self.messenger.edit_text(status, text) {
                Ok(()) => return,
                Err(e) => tracing::warn!(chat_id, "could not edit status message: {:#}", e),
            }
        }
        if let Err(e) = self.messenger.send_text(chat_id, text) {
            tracing::warn!(chat_id, "could not send reply: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BotConfig, CategoryConfig};
    use crate::transport::FetchError;
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::Path;
    use std::sync::Mutex;

    const NOW: u64 = 1_700_000_000;

    /// Serves canned bodies by source id and records every chat interaction.
    #[derive(Default)]
    struct FakeTransport {
        bodies: HashMap<String, Vec<u8>>,
        fail_locate: bool,
        fail_status: bool,
        break_after: Option<usize>,
        log: Mutex<Vec<String>>,
    }

    impl FakeTransport {
        fn with_body(source_id: &str, body: &[u8]) -> Self {
            let mut t = Self::default();
            t.bodies.insert(source_id.to_string(), body.to_vec());
            t
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    impl FileSource for FakeTransport {
        fn locate(&self, source_id: &str) -> Result<String, TransferError> {
            if self.fail_locate {
                return Err(TransferError::FileUrl("file is too big".to_string()));
            }
            Ok(format!("fake://{source_id}"))
        }

        fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
            let id = url.trim_start_matches("fake://");
            let body = self.bodies.get(id).ok_or(FetchError::Status(404))?;
            if let Some(n) = self.break_after {
                sink.write_all(&body[..n]).map_err(FetchError::Sink)?;
                return Err(FetchError::Transport("connection reset".to_string()));
            }
            sink.write_all(body).map_err(FetchError::Sink)?;
            Ok(body.len() as u64)
        }
    }

    impl Messenger for FakeTransport {
        fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<MessageRef> {
            if self.fail_status && text.starts_with("Saving") {
                anyhow::bail!("flood control");
            }
            let mut log = self.log.lock().unwrap();
            log.push(format!("send:{text}"));
            Ok(MessageRef {
                chat_id,
                message_id: log.len() as i64,
            })
        }

        fn edit_text(&self, _message: MessageRef, text: &str) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("edit:{text}"));
            Ok(())
        }
    }

    fn registry_in(root: &Path) -> Arc<CategoryRegistry> {
        let cfg = BotConfig {
            categories: ["document", "image", "video", "audio", "other"]
                .iter()
                .map(|n| CategoryConfig {
                    name: n.to_string(),
                    path: root.join(n),
                })
                .collect(),
            ..BotConfig::default()
        };
        Arc::new(CategoryRegistry::from_config(&cfg))
    }

    fn message(json_extra: &str) -> Message {
        let json = format!(
            r#"{{"message_id": 1, "from": {{"id": 5, "first_name": "Ana"}}, "chat": {{"id": 9}}, {json_extra}}}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    fn intake(root: &Path, transport: FakeTransport) -> Intake<Arc<FakeTransport>, Arc<FakeTransport>> {
        let t = Arc::new(transport);
        Intake::new(registry_in(root), Arc::new(UserPreferences::new()), t.clone(), t)
            .with_clock(|| NOW)
    }

    #[test]
    fn caption_overrides_category_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake(dir.path(), FakeTransport::with_body("d1", b"pdf"));
        let msg = message(r#""caption": "/image vacation", "document": {"file_id": "d1", "file_name": "trip.pdf"}"#);

        let plan = intake.plan(&msg, NOW).unwrap();
        assert_eq!(plan.category, "image");
        assert_eq!(plan.resolved_by, ResolutionSource::Caption);
        assert_eq!(plan.desired_name(), "vacation.pdf");

        match intake.handle(&msg) {
            IntakeReport::Saved(stored) => {
                assert_eq!(stored.path, dir.path().join("image").join("vacation.pdf"));
                assert_eq!(stored.category, "image");
                assert_eq!(stored.bytes, 3);
                assert_eq!(std::fs::read(&stored.path).unwrap(), b"pdf");
            }
            other => panic!("expected Saved, got {other:?}"),
        }
    }

    #[test]
    fn repeated_saves_get_numbered() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake(dir.path(), FakeTransport::with_body("d1", b"x"));
        let msg = message(r#""caption": "/image vacation", "document": {"file_id": "d1", "file_name": "trip.pdf"}"#);

        let names: Vec<String> = (0..3)
            .map(|_| match intake.handle(&msg) {
                IntakeReport::Saved(s) => s.path.file_name().unwrap().to_string_lossy().into_owned(),
                other => panic!("expected Saved, got {other:?}"),
            })
            .collect();
        assert_eq!(names, ["vacation.pdf", "vacation_1.pdf", "vacation_2.pdf"]);
    }

    #[test]
    fn status_is_sent_then_edited() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::with_body("p", b"jpg");
        let intake = intake(dir.path(), transport);
        let msg = message(r#""photo": [{"file_id": "p", "width": 1, "height": 1}]"#);
        intake.handle(&msg);

        let log = intake.messenger().log();
        assert_eq!(log.len(), 2);
        let image_dir = dir.path().join("image");
        assert_eq!(
            log[0],
            format!(
                "send:Saving file 'photo_{NOW}.jpg' to category 'image' (path: {})...",
                image_dir.display()
            )
        );
        assert_eq!(
            log[1],
            format!(
                "edit:File saved successfully!\nCategory: image\nLocation: {}",
                image_dir.join(format!("photo_{NOW}.jpg")).display()
            )
        );
    }

    #[test]
    fn user_default_applies_without_caption() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake(dir.path(), FakeTransport::with_body("v", b"ogg"));
        intake.prefs.set_default(5, "document", &intake.registry).unwrap();
        let msg = message(r#""voice": {"file_id": "v"}"#);
        let plan = intake.plan(&msg, NOW).unwrap();
        assert_eq!(plan.category, "document");
        assert_eq!(plan.resolved_by, ResolutionSource::UserDefault);
        assert_eq!(plan.suggested_name, format!("voice_{NOW}.ogg"));
    }

    #[test]
    fn unknown_caption_category_keeps_name_and_infers() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake(dir.path(), FakeTransport::default());
        let msg = message(r#""caption": "/bogus notes", "audio": {"file_id": "a", "file_name": "x.mp3"}"#);
        let plan = intake.plan(&msg, NOW).unwrap();
        assert_eq!(plan.category, "audio");
        assert_eq!(plan.desired_name(), "notes.mp3");
    }

    #[test]
    fn message_without_attachment_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake(dir.path(), FakeTransport::default());
        let report = intake.handle(&message(r#""text": "hello""#));
        assert!(matches!(report, IntakeReport::Rejected { .. }));
        assert_eq!(intake.messenger().log(), [format!("send:{REJECT_NOTICE}")]);
    }

    #[test]
    fn sanitized_and_dot_names() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake(dir.path(), FakeTransport::with_body("d", b"1"));

        let msg = message(r#""caption": "/document a:b*c", "document": {"file_id": "d", "file_name": "r.txt"}"#);
        match intake.handle(&msg) {
            IntakeReport::Saved(s) => assert_eq!(s.path, dir.path().join("document").join("a_b_c.txt")),
            other => panic!("expected Saved, got {other:?}"),
        }

        let msg = message(r#""caption": "/document ..", "document": {"file_id": "d", "file_name": ".."}"#);
        match intake.handle(&msg) {
            IntakeReport::Saved(s) => {
                assert_eq!(s.path, dir.path().join("document").join(format!("document_{NOW}")))
            }
            other => panic!("expected Saved, got {other:?}"),
        }
    }

    #[test]
    fn locate_failure_reports_cause_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport {
            fail_locate: true,
            ..FakeTransport::default()
        };
        let intake = intake(dir.path(), transport);
        let msg = message(r#""document": {"file_id": "d", "file_name": "a.pdf"}"#);
        let report = intake.handle(&msg);
        assert!(matches!(report, IntakeReport::Failed { error: TransferError::FileUrl(_), .. }));
        assert_eq!(
            report.user_text(),
            "Error saving file: error getting file URL: file is too big"
        );
        assert!(!dir.path().join("document").exists());
        assert_eq!(intake.messenger().log().last().unwrap(), &format!("edit:{}", report.user_text()));
    }

    #[test]
    fn broken_stream_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut transport = FakeTransport::with_body("d", b"0123456789");
        transport.break_after = Some(4);
        let intake = intake(dir.path(), transport);
        let msg = message(r#""document": {"file_id": "d", "file_name": "a.pdf"}"#);

        let report = intake.handle(&msg);
        assert!(matches!(report, IntakeReport::Failed { error: TransferError::Fetch(_), .. }));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("document")).unwrap().collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }

    #[test]
    fn stored_part_file_survives_save_and_failure() {
        let dir = tempfile::tempdir().unwrap();
        let doc_dir = dir.path().join("document");
        std::fs::create_dir_all(&doc_dir).unwrap();
        let kept = doc_dir.join("report.pdf.part");
        std::fs::write(&kept, b"PRECIOUS").unwrap();
        let msg = message(r#""document": {"file_id": "d", "file_name": "report.pdf"}"#);

        let failing = intake(dir.path(), FakeTransport::default());
        assert!(matches!(
            failing.handle(&msg),
            IntakeReport::Failed { error: TransferError::HttpStatus(404), .. }
        ));
        assert_eq!(std::fs::read(&kept).unwrap(), b"PRECIOUS");

        let working = intake(dir.path(), FakeTransport::with_body("d", b"new"));
        match working.handle(&msg) {
            IntakeReport::Saved(s) => assert_eq!(s.path, doc_dir.join("report.pdf")),
            other => panic!("expected Saved, got {other:?}"),
        }
        assert_eq!(std::fs::read(&kept).unwrap(), b"PRECIOUS");
        assert_eq!(std::fs::read(doc_dir.join("report.pdf")).unwrap(), b"new");
        assert_eq!(std::fs::read_dir(&doc_dir).unwrap().count(), 2);
    }

    #[test]
    fn http_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake(dir.path(), FakeTransport::default());
        let msg = message(r#""video": {"file_id": "missing"}"#);
        let report = intake.handle(&msg);
        assert_eq!(report.user_text(), "Error saving file: error downloading file: HTTP 404");
    }

    #[test]
    fn failed_status_send_falls_back_to_new_message() {
        let dir = tempfile::tempdir().unwrap();
        let mut transport = FakeTransport::with_body("d", b"z");
        transport.fail_status = true;
        let intake = intake(dir.path(), transport);
        let msg = message(r#""document": {"file_id": "d", "file_name": "z.bin"}"#);
        assert!(matches!(intake.handle(&msg), IntakeReport::Saved(_)));
        let log = intake.messenger().log();
        assert_eq!(log.len(), 1);
        assert!(log[0].starts_with("send:File saved successfully!"), "{log:?}");
    }

    #[test]
    fn missing_category_directory_falls_back_to_other() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = BotConfig {
            categories: vec![
                CategoryConfig {
                    name: "other".to_string(),
                    path: dir.path().join("misc"),
                },
                CategoryConfig {
                    name: "books".to_string(),
                    path: dir.path().join("books"),
                },
            ],
            ..BotConfig::default()
        };
        let t = Arc::new(FakeTransport::with_body("d", b"1"));
        let intake = Intake::new(
            Arc::new(CategoryRegistry::from_config(&cfg)),
            Arc::new(UserPreferences::new()),
            t.clone(),
            t,
        );
        let msg = message(r#""document": {"file_id": "d", "file_name": "a.pdf"}"#);
        let plan = intake.plan(&msg, NOW).unwrap();
        assert_eq!(plan.category, "document");
        assert_eq!(plan.storage_dir, dir.path().join("misc"));
    }
}
