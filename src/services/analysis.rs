//! AI analysis pipeline: prompt construction, remote completion, reply parsing

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(test)]
use mockall::automock;

use crate::{
    config::AiConfig,
    error::{AppError, AppResult},
    models::{
        analysis::{AiAnalysisResult, AnalysisPayload, SaveAnalysisRequest, SavedAnalysis},
        enums::AnalysisType,
        memo::Memo,
    },
    repository::Repository,
};

/// Largest memo batch accepted by the analysis endpoints
pub const MAX_MEMOS_PER_ANALYSIS: usize = 100;

/// Length of the fallback summary when the reply carries no usable JSON
const FALLBACK_SUMMARY_CHARS: usize = 500;

const SYSTEM_PROMPT: &str = r#"당신은 독립서점 경영 컨설턴트입니다.
서점 주인이 기록한 고객 관찰 메모를 분석하여 실용적인 경영 인사이트를 제공합니다.

분석 시 다음을 고려하세요:
- 고객 방문 패턴 (시간대, 날씨, 계절별)
- 도서 판매 트렌드 (장르, 저자, 시기별)
- 고객 유형 분류 및 재방문 패턴
- 서점 분위기와 판매의 상관관계
- 계절/날씨와 고객 행동의 관계
- 실행 가능한 구체적 제안

응답은 반드시 아래 JSON 형식으로 작성하세요:
{
  "summary": "전체 요약 (2-3문장)",
  "insights": [
    {
      "category": "고객패턴/판매트렌드/계절성/운영제안 중 택1",
      "title": "인사이트 제목",
      "description": "상세 설명",
      "confidence": "높음/중간/낮음 중 택1"
    }
  ],
  "recommendations": [
    {
      "priority": "상/중/하 중 택1",
      "action": "구체적인 실행 방안",
      "expected_effect": "기대 효과",
      "timing": "실행 시기"
    }
  ],
  "fun_fact": "데이터에서 발견한 흥미로운 사실 1개"
}"#;

fn instruction(analysis_type: AnalysisType) -> &'static str {
    match analysis_type {
        AnalysisType::Weekly => {
            "최근 1주일간의 메모를 분석해주세요. 이번 주의 주요 트렌드와 다음 주 준비사항을 중심으로 분석해주세요."
        }
        AnalysisType::Monthly => {
            "최근 1개월간의 메모를 분석해주세요. 월간 트렌드, 고객 유형 분류, 장르별 판매 패턴을 중심으로 분석해주세요."
        }
        AnalysisType::Custom => {
            "전체 기간의 메모를 분석해주세요. 종합적인 패턴과 장기 전략을 중심으로 분석해주세요."
        }
    }
}

// ---------------------------------------------------------------------------
// Prompt construction
// ---------------------------------------------------------------------------

fn memo_block(index: usize, memo: &Memo) -> String {
    let weather = if memo.weather_detail.trim().is_empty() {
        memo.weather.as_str()
    } else {
        memo.weather_detail.as_str()
    };
    let temp = memo
        .weather_temp
        .map(|t| format!(" ({}°C)", t))
        .unwrap_or_default();
    let nickname = memo
        .customer_tag
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| format!(" (별명: {})", t))
        .unwrap_or_default();

    let books = memo
        .purchased_books
        .iter()
        .map(|b| format!("\"{}\" ({}, {})", b.title, b.author, b.genre))
        .collect::<Vec<_>>()
        .join(", ");
    let books = if books.is_empty() { "없음".to_string() } else { books };

    let tags = memo
        .tags
        .iter()
        .map(|t| format!("#{}", t))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "[메모 {index}] {date} {time}\n\
         날씨: {weather}{temp}\n\
         분위기: {mood}\n\
         고객: {impression}{nickname}\n\
         관찰: {browsing}\n\
         구매도서: {books}\n\
         주인메모: {owner}\n\
         태그: {tags}",
        index = index + 1,
        date = memo.visit_date.format("%Y-%m-%d"),
        time = memo.visit_time,
        mood = memo.mood,
        impression = memo.customer_impression,
        browsing = memo.browsing_note,
        owner = memo.owner_note,
    )
}

/// Build the user prompt for a batch of (already filtered) memos.
pub fn build_prompt(memos: &[Memo], analysis_type: AnalysisType) -> String {
    let blocks = memos
        .iter()
        .enumerate()
        .map(|(i, m)| memo_block(i, m))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    format!(
        "{}\n\n총 {}건의 관찰 메모:\n\n{}\n\n위 메모들을 분석하여 JSON 형식으로 응답해주세요.",
        instruction(analysis_type),
        memos.len(),
        blocks
    )
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Byte ranges of the balanced `{...}` spans of `text`, ordered by opening brace.
///
/// One pass with a stack of open braces. Quotes only open a JSON string
/// inside a brace, so apostrophes and quotes in surrounding prose are ignored.
fn balanced_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' if !open.is_empty() => in_string = true,
            '{' => open.push(i),
            '}' => {
                if let Some(start) = open.pop() {
                    spans.push((start, i + 1));
                }
            }
            _ => {}
        }
    }

    spans.sort_unstable_by_key(|&(start, _)| start);
    spans
}

fn is_json_object(span: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(span)
        .map(|v| v.is_object())
        .unwrap_or(false)
}

/// Extract the first balanced `{...}` span of `text` that is a JSON object.
///
/// Leading and trailing prose (including markdown fences) is ignored.
/// Braces nested in a span that was already rejected are not tried again.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let mut rejected_until = 0;
    for (start, end) in balanced_spans(text) {
        if start < rejected_until {
            continue;
        }
        let span = &text[start..end];
        if is_json_object(span) {
            return Some(span);
        }
        rejected_until = end;
    }
    None
}

/// Turn a raw model reply into a result. Never fails: unreadable replies
/// come back with `parse_error` set and the start of the reply as summary.
pub fn parse_reply(raw: &str, memo_count: usize) -> AiAnalysisResult {
    let parsed = extract_json_object(raw)
        .ok_or_else(|| "no JSON object in reply".to_string())
        .and_then(|json| {
            serde_json::from_str::<AnalysisPayload>(json).map_err(|e| e.to_string())
        });

    match parsed {
        Ok(payload) => AiAnalysisResult {
            summary: payload.summary,
            insights: payload.insights,
            recommendations: payload.recommendations,
            fun_fact: payload.fun_fact,
            memo_count,
            raw_response: raw.to_string(),
            parse_error: false,
        },
        Err(reason) => {
            tracing::warn!("Could not read structured analysis from reply: {}", reason);
            AiAnalysisResult {
                summary: raw.chars().take(FALLBACK_SUMMARY_CHARS).collect(),
                insights: Vec::new(),
                recommendations: Vec::new(),
                fun_fact: String::new(),
                memo_count,
                raw_response: raw.to_string(),
                parse_error: true,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Windows and batch limits
// ---------------------------------------------------------------------------

/// First visit date included in the window ending `today`, if the window is bounded
pub fn window_start(analysis_type: AnalysisType, today: NaiveDate) -> Option<NaiveDate> {
    match analysis_type {
        AnalysisType::Weekly => Some(today - Duration::days(7)),
        AnalysisType::Monthly => Some(today - Duration::days(30)),
        AnalysisType::Custom => None,
    }
}

/// Keep the memos inside the analysis window.
///
/// The window is a cutoff on the ISO calendar date (`visit_date >= cutoff`),
/// so year boundaries need no special handling.
pub fn filter_window(memos: Vec<Memo>, analysis_type: AnalysisType, today: NaiveDate) -> Vec<Memo> {
    match window_start(analysis_type, today) {
        Some(cutoff) => memos.into_iter().filter(|m| m.visit_date >= cutoff).collect(),
        None => memos,
    }
}

/// Reject batches the analysis endpoint does not accept.
pub fn check_batch(memos: Option<&[Memo]>) -> AppResult<&[Memo]> {
    match memos {
        None | Some([]) => Err(AppError::Validation(
            "memos are required for analysis".to_string(),
        )),
        Some(m) if m.len() > MAX_MEMOS_PER_ANALYSIS => Err(AppError::Validation(format!(
            "at most {} memos can be analysed at once",
            MAX_MEMOS_PER_ANALYSIS
        ))),
        Some(m) => Ok(m),
    }
}

// ---------------------------------------------------------------------------
// Remote completion
// ---------------------------------------------------------------------------

/// Generative-text backend
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Fails with a configuration error when no credential is available
    fn ensure_configured(&self) -> AppResult<()>;

    /// Send one system + user prompt and return the text of the reply
    async fn complete(&self, system: &str, prompt: &str) -> AppResult<String>;
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic Messages API client
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    config: AiConfig,
}

impl AnthropicClient {
    pub fn new(config: AiConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl CompletionProvider for AnthropicClient {
    fn ensure_configured(&self) -> AppResult<()> {
        self.config.require_api_key().map(|_| ())
    }

    async fn complete(&self, system: &str, prompt: &str) -> AppResult<String> {
        let api_key = self.config.require_api_key()?;

        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(
            "Sending analysis request to {} (model {}, {} prompt chars)",
            self.config.endpoint,
            self.config.model,
            prompt.chars().count()
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let data: MessagesResponse = response.json().await?;
        Ok(data
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .and_then(|block| block.text)
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AnalysisService {
    repository: Repository,
    provider: Arc<dyn CompletionProvider>,
}

impl AnalysisService {
    pub fn new(repository: Repository, provider: Arc<dyn CompletionProvider>) -> Self {
        Self { repository, provider }
    }

    /// Run the pipeline over an already filtered batch. No retries.
    pub async fn analyze(
        &self,
        memos: &[Memo],
        analysis_type: AnalysisType,
    ) -> AppResult<AiAnalysisResult> {
        run_pipeline(self.provider.as_ref(), memos, analysis_type).await
    }

    /// Analyse the user's stored memos for the requested window.
    pub async fn analyze_window(
        &self,
        user_id: Uuid,
        analysis_type: AnalysisType,
    ) -> AppResult<AiAnalysisResult> {
        let memos = self.repository.memos.list_all(user_id).await?;
        let mut memos = filter_window(memos, analysis_type, Utc::now().date_naive());
        if memos.is_empty() {
            return Err(AppError::Validation(
                "no memos in the selected period".to_string(),
            ));
        }
        if memos.len() > MAX_MEMOS_PER_ANALYSIS {
            // Memos come newest first
            tracing::info!(
                "Analysing the {} most recent of {} memos",
                MAX_MEMOS_PER_ANALYSIS,
                memos.len()
            );
            memos.truncate(MAX_MEMOS_PER_ANALYSIS);
        }
        self.analyze(&memos, analysis_type).await
    }

    pub async fn save(&self, user_id: Uuid, request: &SaveAnalysisRequest) -> AppResult<SavedAnalysis> {
        self.repository.analyses.create(user_id, request).await
    }

    pub async fn recent(&self, user_id: Uuid, limit: Option<i64>) -> AppResult<Vec<SavedAnalysis>> {
        let limit = limit.unwrap_or(10).clamp(1, 100);
        self.repository.analyses.recent(user_id, limit).await
    }
}

/// Prompt construction, remote invocation and reply parsing
pub async fn run_pipeline(
    provider: &dyn CompletionProvider,
    memos: &[Memo],
    analysis_type: AnalysisType,
) -> AppResult<AiAnalysisResult> {
    provider.ensure_configured()?;
    if memos.is_empty() {
        return Err(AppError::Validation("no memos to analyse".to_string()));
    }

    let prompt = build_prompt(memos, analysis_type);
    let raw = provider.complete(SYSTEM_PROMPT, &prompt).await?;
    tracing::info!(
        "Analysis reply received ({} memos, {} chars)",
        memos.len(),
        raw.chars().count()
    );

    Ok(parse_reply(&raw, memos.len()))
}
