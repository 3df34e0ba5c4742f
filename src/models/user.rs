use crate::error::{AppResult, ValidationError};
use crate::models::de;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// 用户标识（登录成功后由认证服务返回）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(#[serde(deserialize_with = "de::id")] String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 当前会话
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user_id: Option<UserId>,
}

/// 待上传的音频文件
#[derive(Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for AudioFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioFile")
            .field("filename", &self.filename)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl AudioFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let mime = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .to_string();
        Self {
            filename,
            mime,
            bytes,
        }
    }

    /// 从磁盘读取音频文件
    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ValidationError::FileUnreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());
        Ok(Self::new(filename, bytes))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bytes.is_empty() {
            return Err(ValidationError::EmptyFile {
                filename: self.filename.clone(),
            });
        }
        Ok(())
    }
}
