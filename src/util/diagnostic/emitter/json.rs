//! JSON 诊断渲染器
//!
//! 提供符合 Language Server Protocol (LSP) 规范的 JSON 输出

use serde::Serialize;
use serde_json::to_string_pretty;

use crate::util::diagnostic::{Diagnostic, Severity};
use crate::util::span::Span;

/// LSP 诊断严重级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LspDiagnosticSeverity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

impl Serialize for LspDiagnosticSeverity {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// LSP 位置范围
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LspRange {
    pub start: LspPosition,
    pub end: LspPosition,
}

/// LSP 位置
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LspPosition {
    pub line: u32,
    pub character: u32,
}

/// LSP 相关诊断信息
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LspRelatedInformation {
    pub range: LspRange,
    pub message: String,
}

/// LSP 诊断结构
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LspDiagnostic {
    /// 诊断范围
    pub range: LspRange,
    /// 严重级别
    pub severity: LspDiagnosticSeverity,
    /// 错误代码
    pub code: String,
    /// 错误代码来源
    pub source: String,
    /// 诊断消息
    pub message: String,
    /// 相关诊断信息
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<LspRelatedInformation>,
}

/// JSON 诊断渲染器
#[derive(Debug, Clone)]
pub struct JsonEmitter;

impl JsonEmitter {
    /// 渲染诊断为 JSON 字符串
    pub fn render(diagnostic: &Diagnostic) -> String {
        let lsp_diagnostic = Self::to_lsp_diagnostic(diagnostic);
        to_string_pretty(&lsp_diagnostic).unwrap_or_else(|_| "{}".to_string())
    }

    /// 渲染多个诊断
    pub fn render_all(diagnostics: &[Diagnostic]) -> String {
        let lsp_diagnostics: Vec<LspDiagnostic> =
            diagnostics.iter().map(Self::to_lsp_diagnostic).collect();
        to_string_pretty(&lsp_diagnostics).unwrap_or_else(|_| "[]".to_string())
    }

    /// 转换为 LSP 诊断结构
    pub fn to_lsp_diagnostic(diagnostic: &Diagnostic) -> LspDiagnostic {
        LspDiagnostic {
            range: Self::span_to_range(diagnostic.span.as_ref()),
            severity: match diagnostic.severity {
                Severity::Error => LspDiagnosticSeverity::Error,
                Severity::Warning => LspDiagnosticSeverity::Warning,
                Severity::Info => LspDiagnosticSeverity::Information,
                Severity::Hint => LspDiagnosticSeverity::Hint,
            },
            code: diagnostic.code.clone(),
            source: "mixfix".to_string(),
            message: diagnostic.message.clone(),
            related_information: diagnostic
                .related
                .iter()
                .map(|related| LspRelatedInformation {
                    range: Self::span_to_range(related.span.as_ref()),
                    message: related.message.clone(),
                })
                .collect(),
        }
    }

    /// 转换 Span 到 LSP Range（0-indexed）
    fn span_to_range(span: Option<&Span>) -> LspRange {
        match span {
            Some(s) if !s.is_dummy() => LspRange {
                start: LspPosition {
                    line: s.start.line.saturating_sub(1) as u32,
                    character: s.start.column.saturating_sub(1) as u32,
                },
                end: LspPosition {
                    line: s.end.line.saturating_sub(1) as u32,
                    character: s.end.column.saturating_sub(1) as u32,
                },
            },
            _ => Self::dummy_range(),
        }
    }

    /// 创建虚拟 Range（用于无位置的错误）
    fn dummy_range() -> LspRange {
        LspRange {
            start: LspPosition {
                line: 0,
                character: 0,
            },
            end: LspPosition {
                line: 0,
                character: 0,
            },
        }
    }
}
