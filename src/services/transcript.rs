//! 对话记录导出
//!
//! 将会话轮次格式化为纯文本或 Markdown，只做格式化，不依赖分类器。

use serde::{Deserialize, Serialize};

use crate::models::{ChatSession, ConversationTurn};

const TITLE: &str = "InMind Chat Transcript";
const RULE_WIDTH: usize = 40;

/// 导出格式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptFormat {
    #[default]
    Text,
    Markdown,
}

impl TranscriptFormat {
    pub fn file_name(&self) -> &'static str {
        match self {
            TranscriptFormat::Text => "inmind_chat.txt",
            TranscriptFormat::Markdown => "inmind_chat.md",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            TranscriptFormat::Text => "text/plain; charset=utf-8",
            TranscriptFormat::Markdown => "text/markdown; charset=utf-8",
        }
    }
}

/// 导出结果
#[derive(Debug, Clone)]
pub struct Transcript {
    pub file_name: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

/// 导出会话记录
pub fn export(session: &ChatSession, format: TranscriptFormat) -> Transcript {
    let body = match format {
        TranscriptFormat::Text => render_text(&session.turns),
        TranscriptFormat::Markdown => render_markdown(&session.turns),
    };

    Transcript {
        file_name: format.file_name(),
        content_type: format.content_type(),
        body,
    }
}

/// 纯文本格式
pub fn render_text(turns: &[ConversationTurn]) -> String {
    let mut out = format!("{}\n", TITLE);
    if let Some(first) = turns.first() {
        out.push_str(&format!(
            "Session started: {}\n",
            first.timestamp.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push_str("\n\n");

    for turn in turns {
        let mut line = format!(
            "[{}] {}: {}",
            turn.timestamp.format("%H:%M:%S"),
            turn.role.speaker(),
            turn.content
        );
        if let Some(url) = &turn.meta.url {
            line.push_str(&format!(" (source: {})", url));
        }
        out.push_str(&line);
        out.push_str("\n\n");
    }

    out
}

/// Markdown 格式
pub fn render_markdown(turns: &[ConversationTurn]) -> String {
    let mut out = format!("# {}\n\n", TITLE);
    if let Some(first) = turns.first() {
        out.push_str(&format!(
            "_Session started: {}_\n\n",
            first.timestamp.format("%Y-%m-%d %H:%M:%S")
        ));
    }

    for turn in turns {
        out.push_str(&format!(
            "**{}** ({})\n\n{}\n\n",
            turn.role.speaker(),
            turn.timestamp.format("%H:%M:%S"),
            turn.content
        ));
        if let Some(url) = &turn.meta.url {
            let label = turn.meta.title.as_deref().unwrap_or("source");
            out.push_str(&format!("Source: [{}]({})\n\n", label, url));
        }
    }

    out
}
