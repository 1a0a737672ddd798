//! # 令牌重建会话
//!
//! 一次重建尝试的全部状态：两个分片、拼接出的令牌，以及 resolve / verify
//! 的结果。状态显式保存在 [`Reconstruction`] 中并在调用之间传递。
//!
//! ```text
//! Empty → Image1Loaded → BothImagesLoaded → TokenJoined → {Resolved | ResolveFailed}
//!                                                       → {Verified | VerifyFailed}
//! ```
//!
//! resolve 与 verify 互不依赖。失败不会丢弃已解码的分片，可以直接重试。

use std::fmt;

use image::RgbaImage;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::StegoError;
use crate::token::{Slot, decode_share, join};

/// 外部 resolve / verify 服务返回的错误。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// 服务端拒绝了令牌 (`success: false`)。
    #[error("{0}")]
    UnknownToken(String),
    /// 传输层失败，由调用方提供的传输实现报告。
    #[error("request failed: {0}")]
    Transport(String),
    /// 响应体无法解析。
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Malformed(err.to_string())
    }
}

/// 会话层错误。
#[derive(Debug, Error)]
pub enum SessionError {
    /// 某个槽位尚未加载分片。
    #[error("no share decoded from {0} yet; scan or paste both parts first")]
    MissingShare(Slot),
    /// 两个分片拼接后为空令牌。
    #[error("both shares are empty; there is no token to send")]
    EmptyToken,
    /// 分片解码失败。
    #[error("failed to decode share from {slot}: {source}")]
    Decode {
        slot: Slot,
        #[source]
        source: StegoError,
    },
    /// 外部服务失败。
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// resolve 成功时服务端给出的文档信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub filename: String,
    pub on_chain_doc_hash: String,
    pub download_location: String,
}

impl DocumentRecord {
    /// 返回可直接访问的下载地址；相对路径会拼接到 `base` 之后。
    pub fn download_url(&self, base: &str) -> String {
        let location = self.download_location.as_str();
        if location.starts_with("http://") || location.starts_with("https://") {
            self.download_location.clone()
        } else {
            format!("{}{}", base.trim_end_matches('/'), self.download_location)
        }
    }
}

/// 链上校验结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// 链上哈希匹配。
    Authentic,
    /// 链上未找到记录。
    NotFound,
}

impl From<bool> for Verification {
    fn from(is_valid: bool) -> Self {
        if is_valid {
            Verification::Authentic
        } else {
            Verification::NotFound
        }
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verification::Authentic => f.write_str("Authentic (on-chain hash match)"),
            Verification::NotFound => f.write_str("Not found on-chain"),
        }
    }
}

/// `/api/resolve` 的响应体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub on_chain_doc_hash: String,
    #[serde(default)]
    pub download_url: String,
}

impl ResolveResponse {
    /// 解析 JSON 响应体并转换为文档信息。
    pub fn parse(body: &[u8]) -> Result<DocumentRecord, ApiError> {
        serde_json::from_slice::<Self>(body)?.into_record()
    }

    pub fn into_record(self) -> Result<DocumentRecord, ApiError> {
        if !self.success {
            return Err(ApiError::UnknownToken(
                self.error.unwrap_or_else(|| "Resolve failed".to_owned()),
            ));
        }
        Ok(DocumentRecord {
            filename: self.filename,
            on_chain_doc_hash: self.on_chain_doc_hash,
            download_location: self.download_url,
        })
    }
}

/// `/api/verify` 的响应体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub is_valid: bool,
}

impl VerifyResponse {
    /// 解析 JSON 响应体并转换为校验结果。
    pub fn parse(body: &[u8]) -> Result<Verification, ApiError> {
        serde_json::from_slice::<Self>(body)?.into_verification()
    }

    pub fn into_verification(self) -> Result<Verification, ApiError> {
        if !self.success {
            return Err(ApiError::UnknownToken(
                self.error.unwrap_or_else(|| "Verify failed".to_owned()),
            ));
        }
        Ok(self.is_valid.into())
    }
}

/// 接收重建令牌的外部服务。
///
/// 超时与重试策略属于传输实现，本模块不做任何重试。
pub trait TokenApi {
    /// 根据令牌查询文档信息。
    fn resolve(&self, token: &str) -> Result<DocumentRecord, ApiError>;

    /// 校验令牌对应的链上哈希。
    fn verify(&self, token: &str) -> Result<Verification, ApiError>;
}

/// 会话当前所处的阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructionState {
    Empty,
    Image1Loaded,
    /// 先加载了图像 2。
    Image2Loaded,
    BothImagesLoaded,
    TokenJoined,
    Resolved,
    ResolveFailed,
    /// verify 分支，只由 [`Reconstruction::verify_state`] 给出。
    Verified,
    VerifyFailed,
}

/// 一次令牌重建尝试。
#[derive(Debug, Default)]
pub struct Reconstruction {
    first: Option<String>,
    second: Option<String>,
    token: Option<String>,
    resolution: Option<Result<DocumentRecord, ApiError>>,
    verification: Option<Result<Verification, ApiError>>,
}

impl Reconstruction {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从载体图像解码分片并放入指定槽位。
    ///
    /// 重新加载会清除已拼接的令牌和之前的 resolve / verify 结果；
    /// 解码失败时该槽位保持原样。
    pub fn load_image(&mut self, slot: Slot, image: &RgbaImage) -> Result<&str, SessionError> {
        let share = decode_share(image).map_err(|source| SessionError::Decode { slot, source })?;
        debug!(%slot, share_len = share.len(), "share decoded");
        Ok(self.set_share(slot, share))
    }

    /// 直接设置分片文本 (例如手动粘贴)。
    pub fn set_share(&mut self, slot: Slot, share: String) -> &str {
        self.token = None;
        self.resolution = None;
        self.verification = None;
        let place = match slot {
            Slot::First => &mut self.first,
            Slot::Second => &mut self.second,
        };
        place.insert(share).as_str()
    }

    pub fn share(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::First => self.first.as_deref(),
            Slot::Second => self.second.as_deref(),
        }
    }

    /// 按图像 1、图像 2 的顺序拼接令牌。
    ///
    /// 两个槽位都必须已加载；单个分片可以为空 (如一个字符的令牌)，
    /// 但拼接结果不能为空。
    pub fn join(&mut self) -> Result<&str, SessionError> {
        let first = self
            .first
            .as_deref()
            .ok_or(SessionError::MissingShare(Slot::First))?;
        let second = self
            .second
            .as_deref()
            .ok_or(SessionError::MissingShare(Slot::Second))?;
        let token = join(first, second);
        if token.is_empty() {
            return Err(SessionError::EmptyToken);
        }
        Ok(self.token.insert(token).as_str())
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// 用拼接出的令牌查询文档信息，结果会保留在会话中。
    pub fn resolve<A: TokenApi + ?Sized>(&mut self, api: &A) -> Result<&DocumentRecord, SessionError> {
        let token = self.joined_token()?;
        let outcome = api.resolve(&token);
        match &outcome {
            Ok(record) => info!(filename = %record.filename, "token resolved"),
            Err(err) => warn!(error = %err, "resolve failed"),
        }
        self.resolution
            .insert(outcome)
            .as_ref()
            .map_err(|err| SessionError::Api(err.clone()))
    }

    /// 用拼接出的令牌做链上校验，与 [`resolve`](Self::resolve) 相互独立。
    pub fn verify<A: TokenApi + ?Sized>(&mut self, api: &A) -> Result<Verification, SessionError> {
        let token = self.joined_token()?;
        let outcome = api.verify(&token);
        match &outcome {
            Ok(verification) => info!(%verification, "token verified"),
            Err(err) => warn!(error = %err, "verify failed"),
        }
        self.verification
            .insert(outcome)
            .clone()
            .map_err(SessionError::Api)
    }

    pub fn resolution(&self) -> Option<&Result<DocumentRecord, ApiError>> {
        self.resolution.as_ref()
    }

    pub fn verification(&self) -> Option<&Result<Verification, ApiError>> {
        self.verification.as_ref()
    }

    /// verify 分支上的阶段：尚未校验时为 `None`，否则为
    /// [`Verified`](ReconstructionState::Verified) 或
    /// [`VerifyFailed`](ReconstructionState::VerifyFailed)。
    ///
    /// 链上未找到记录 ([`Verification::NotFound`]) 也算校验失败。
    pub fn verify_state(&self) -> Option<ReconstructionState> {
        self.verification.as_ref().map(|outcome| match outcome {
            Ok(Verification::Authentic) => ReconstructionState::Verified,
            Ok(Verification::NotFound) | Err(_) => ReconstructionState::VerifyFailed,
        })
    }

    /// resolve 分支上的阶段；verify 分支见 [`verify_state`](Self::verify_state)。
    pub fn state(&self) -> ReconstructionState {
        match (&self.resolution, &self.token, &self.first, &self.second) {
            (Some(Ok(_)), ..) => ReconstructionState::Resolved,
            (Some(Err(_)), ..) => ReconstructionState::ResolveFailed,
            (None, Some(_), ..) => ReconstructionState::TokenJoined,
            (None, None, Some(_), Some(_)) => ReconstructionState::BothImagesLoaded,
            (None, None, Some(_), None) => ReconstructionState::Image1Loaded,
            (None, None, None, Some(_)) => ReconstructionState::Image2Loaded,
            (None, None, None, None) => ReconstructionState::Empty,
        }
    }

    fn joined_token(&mut self) -> Result<String, SessionError> {
        match &self.token {
            Some(token) => Ok(token.clone()),
            None => self.join().map(str::to_owned),
        }
    }
}
