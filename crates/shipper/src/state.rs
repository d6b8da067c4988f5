//! 시퀀스 토큰 영속화
//!
//! [`CursorStore`]는 업로더가 반환한 시퀀스 토큰을 파일에 저장하고,
//! 재시작 시 다시 읽어 옵니다. 저장은 같은 디렉토리의 임시 파일에 쓴 뒤
//! rename으로 교체합니다.

use std::path::PathBuf;

use crate::error::ShipperError;

/// 시퀀스 토큰 파일 저장소
#[derive(Debug, Clone)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 저장된 토큰을 읽습니다.
    ///
    /// 파일이 없거나 내용이 비어 있으면 `None`입니다.
    pub async fn load(&self) -> Result<Option<String>, ShipperError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let token = content.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_owned()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.state_error(e)),
        }
    }

    /// 토큰을 원자적으로 저장합니다.
    pub async fn save(&self, token: &str) -> Result<(), ShipperError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.state_error(e))?;
        }

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, token)
            .await
            .map_err(|e| self.state_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.state_error(e))?;

        tracing::trace!(path = %self.path.display(), "sequence token saved");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn state_error(&self, err: std::io::Error) -> ShipperError {
        ShipperError::State {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        }
    }
}
