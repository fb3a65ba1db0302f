//! Attachment extraction: one tagged kind per inbound file message.

use crate::category::{AUDIO, DOCUMENT, IMAGE, VIDEO};
use crate::telegram::types::Message;

/// The kinds of file a message can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    Document,
    Photo,
    Video,
    Audio,
    Voice,
    VideoNote,
}

impl AttachmentKind {
    /// Category a file of this kind lands in when nothing else decides.
    pub fn default_category(self) -> &'static str {
        match self {
            AttachmentKind::Document => DOCUMENT,
            AttachmentKind::Photo => IMAGE,
            AttachmentKind::Video | AttachmentKind::VideoNote => VIDEO,
            AttachmentKind::Audio | AttachmentKind::Voice => AUDIO,
        }
    }

    /// Generated filename when the platform supplies none, e.g. `voice_1700000000.ogg`.
    pub fn generated_name(self, unix_secs: u64) -> String {
        let (prefix, ext) = match self {
            AttachmentKind::Document => ("document", ""),
            AttachmentKind::Photo => ("photo", ".jpg"),
            AttachmentKind::Video => ("video", ".mp4"),
            AttachmentKind::Audio => ("audio", ".mp3"),
            AttachmentKind::Voice => ("voice", ".ogg"),
            AttachmentKind::VideoNote => ("video_note", ".mp4"),
        };
        format!("{prefix}_{unix_secs}{ext}")
    }

    pub fn label(self) -> &'static str {
        match self {
            AttachmentKind::Document => "document",
            AttachmentKind::Photo => "photo",
            AttachmentKind::Video => "video",
            AttachmentKind::Audio => "audio",
            AttachmentKind::Voice => "voice",
            AttachmentKind::VideoNote => "video note",
        }
    }
}

/// File carried by a message: kind, retrieval token and the platform-declared name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub source_id: String,
    pub declared_name: Option<String>,
}

impl Attachment {
    fn new(kind: AttachmentKind, source_id: &str, declared_name: Option<&String>) -> Self {
        Self {
            kind,
            source_id: source_id.to_string(),
            declared_name: declared_name.filter(|n| !n.is_empty()).cloned(),
        }
    }

    /// Extracts the attachment, checking document, photo, video, audio, voice
    /// and video note in that order. Photos use the largest (last) size.
    pub fn from_message(msg: &Message) -> Option<Self> {
        if let Some(d) = &msg.document {
            return Some(Self::new(AttachmentKind::Document, &d.file_id, d.file_name.as_ref()));
        }
        if let Some(p) = msg.photo.as_deref().and_then(<[_]>::last) {
            return Some(Self::new(AttachmentKind::Photo, &p.file_id, None));
        }
        if let Some(v) = &msg.video {
            return Some(Self::new(AttachmentKind::Video, &v.file_id, v.file_name.as_ref()));
        }
        if let Some(a) = &msg.audio {
            return Some(Self::new(AttachmentKind::Audio, &a.file_id, a.file_name.as_ref()));
        }
        if let Some(v) = &msg.voice {
            return Some(Self::new(AttachmentKind::Voice, &v.file_id, None));
        }
        if let Some(v) = &msg.video_note {
            return Some(Self::new(AttachmentKind::VideoNote, &v.file_id, None));
        }
        None
    }

    /// Declared name, or a time-stamped generated one.
    pub fn suggested_name(&self, unix_secs: u64) -> String {
        self.declared_name
            .clone()
            .unwrap_or_else(|| self.kind.generated_name(unix_secs))
    }
}
