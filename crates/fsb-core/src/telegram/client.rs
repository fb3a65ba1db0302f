//! Blocking Bot API client over libcurl.
//!
//! Every method is a form-encoded POST to `{base}/bot{token}/{method}`.
//! Call from `spawn_blocking` if used from async code. The token is part of
//! every URL, so URLs are never logged.

use std::io::Write;
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::types::{ApiResponse, File, Message, Update, User};
use crate::error::TransferError;
use crate::transport::{FetchError, FileSource, MessageRef, Messenger};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Extra time on top of the long-poll timeout before curl gives up.
const POLL_GRACE: Duration = Duration::from_secs(15);

/// Error from a Bot API method call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Curl(#[from] curl::Error),
    #[error("HTTP {0}")]
    Http(u32),
    #[error("invalid response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{description} (code {code})")]
    Api { code: i64, description: String },
    #[error("response has no result")]
    MissingResult,
}

/// Client for one bot token.
#[derive(Debug, Clone)]
pub struct BotApi {
    base_url: String,
    token: String,
    poll_timeout: Duration,
    stall_timeout: Option<Duration>,
}

impl BotApi {
    pub fn new(base_url: &str, token: &str, poll_timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            poll_timeout,
            stall_timeout: None,
        }
    }

    /// Abort downloads that stay under 1 KiB/s for `timeout`. Off unless set.
    pub fn with_stall_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stall_timeout = timeout;
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Download URL for a `file_path` returned by `getFile`.
    pub fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.base_url, self.token, file_path)
    }

    fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<T, ApiError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();

        let mut response = Vec::new();
        let mut easy = curl::easy::Easy::new();
        easy.url(&self.method_url(method))?;
        easy.post(true)?;
        easy.post_fields_copy(body.as_bytes())?;
        easy.connect_timeout(CONNECT_TIMEOUT)?;
        easy.timeout(timeout)?;
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                response.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }
        let code = easy.response_code()?;
        decode(code, &response)
    }

    pub fn get_me(&self) -> Result<User, ApiError> {
        self.call("getMe", &[], REQUEST_TIMEOUT)
    }

    /// Long-poll for updates with id >= `offset`.
    pub fn get_updates(&self, offset: i64) -> Result<Vec<Update>, ApiError> {
        let params = [
            ("offset", offset.to_string()),
            ("timeout", self.poll_timeout.as_secs().to_string()),
            ("allowed_updates", r#"["message"]"#.to_string()),
        ];
        self.call("getUpdates", &params, self.poll_timeout + POLL_GRACE)
    }

    pub fn send_message(&self, chat_id: i64, text: &str) -> Result<Message, ApiError> {
        let params = [("chat_id", chat_id.to_string()), ("text", text.to_string())];
        self.call("sendMessage", &params, REQUEST_TIMEOUT)
    }

    pub fn edit_message_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<(), ApiError> {
        let params = [
            ("chat_id", chat_id.to_string()),
            ("message_id", message_id.to_string()),
            ("text", text.to_string()),
        ];
        // Result is the edited Message (or `true` for inline messages); only success matters.
        self.call::<serde_json::Value>("editMessageText", &params, REQUEST_TIMEOUT)
            .map(|_| ())
    }

    pub fn get_file(&self, file_id: &str) -> Result<File, ApiError> {
        self.call("getFile", &[("file_id", file_id.to_string())], REQUEST_TIMEOUT)
    }

    /// Streams a GET body into `sink`. Redirects are followed. Only the connect
    /// phase is time-limited unless a stall timeout was configured.
    pub fn download(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
        let transport = |e: curl::Error| FetchError::Transport(e.to_string());

        let mut written = 0u64;
        let mut sink_error = None;
        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(transport)?;
        easy.follow_location(true).map_err(transport)?;
        easy.max_redirections(10).map_err(transport)?;
        easy.fail_on_error(true).map_err(transport)?;
        easy.connect_timeout(CONNECT_TIMEOUT).map_err(transport)?;
        if let Some(stall) = self.stall_timeout {
            easy.low_speed_limit(1024).map_err(transport)?;
            easy.low_speed_time(stall).map_err(transport)?;
        }

        let result = {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| match sink.write_all(data) {
                    Ok(()) => {
                        written += data.len() as u64;
                        Ok(data.len())
                    }
                    Err(e) => {
                        sink_error = Some(e);
                        Ok(0) // abort transfer
                    }
                })
                .map_err(transport)?;
            transfer.perform()
        };

        if let Some(e) = sink_error {
            return Err(FetchError::Sink(e));
        }
        if let Err(e) = result {
            if e.is_http_returned_error() {
                let code = easy.response_code().unwrap_or(0);
                return Err(FetchError::Status(code));
            }
            return Err(transport(e));
        }
        sink.flush().map_err(FetchError::Sink)?;
        Ok(written)
    }
}

fn decode<T: DeserializeOwned>(code: u32, body: &[u8]) -> Result<T, ApiError> {
    let envelope: ApiResponse<T> = match serde_json::from_slice(body) {
        Ok(env) => env,
        Err(_) if !(200..300).contains(&code) => return Err(ApiError::Http(code)),
        Err(e) => return Err(e.into()),
    };
    if !envelope.ok {
        return Err(ApiError::Api {
            code: envelope.error_code.unwrap_or(i64::from(code)),
            description: envelope.description.unwrap_or_default(),
        });
    }
    envelope.result.ok_or(ApiError::MissingResult)
}

impl Messenger for BotApi {
    fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<MessageRef> {
        let msg = self.send_message(chat_id, text)?;
        Ok(MessageRef {
            chat_id: msg.chat.id,
            message_id: msg.message_id,
        })
    }

    fn edit_text(&self, message: MessageRef, text: &str) -> anyhow::Result<()> {
        self.edit_message_text(message.chat_id, message.message_id, text)?;
        Ok(())
    }
}

impl FileSource for BotApi {
    fn locate(&self, source_id: &str) -> Result<String, TransferError> {
        let file = self
            .get_file(source_id)
            .map_err(|e| TransferError::FileUrl(e.to_string()))?;
        let path = file
            .file_path
            .filter(|p| !p.is_empty())
            .ok_or_else(|| TransferError::FileUrl("getFile returned no file_path".to_string()))?;
        Ok(self.file_url(&path))
    }

    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
        self.download(url, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_embed_token_and_trim_base() {
        let api = BotApi::new("https://api.example.org/", "123:abc", Duration::from_secs(1));
        assert_eq!(api.method_url("getMe"), "https://api.example.org/bot123:abc/getMe");
        assert_eq!(
            api.file_url("documents/file_1.pdf"),
            "https://api.example.org/file/bot123:abc/documents/file_1.pdf"
        );
    }

    #[test]
    fn downloads_have_no_stall_abort_by_default() {
        let api = BotApi::new("https://api.example.org", "t", Duration::from_secs(1));
        assert_eq!(api.stall_timeout, None);
        let api = api.with_stall_timeout(Some(Duration::from_secs(120)));
        assert_eq!(api.stall_timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn decode_success_and_api_error() {
        let user: User = decode(200, br#"{"ok":true,"result":{"id":1,"is_bot":true,"first_name":"Bot"}}"#).unwrap();
        assert_eq!(user.id, 1);

        let err = decode::<User>(401, br#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#)
            .unwrap_err();
        assert!(matches!(err, ApiError::Api { code: 401, ref description } if description == "Unauthorized"));
        assert_eq!(err.to_string(), "Unauthorized (code 401)");
    }

    #[test]
    fn decode_non_json_error_page() {
        assert!(matches!(decode::<User>(502, b"<html>Bad Gateway</html>"), Err(ApiError::Http(502))));
        assert!(matches!(decode::<User>(200, b"garbage"), Err(ApiError::Json(_))));
        assert!(matches!(decode::<User>(200, br#"{"ok":true}"#), Err(ApiError::MissingResult)));
    }
}
