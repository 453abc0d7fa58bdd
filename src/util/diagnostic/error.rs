//! 诊断数据结构
//!
//! 提供统一的错误报告机制
//!
//! # 设计原则
//!
//! - `Diagnostic` 的 `message` 在构建时已按模板渲染完成
//! - **只允许通过 `DiagnosticBuilder` 创建诊断**，所有错误码必须在注册表中注册
//!
//! # 创建方式
//!
//! ```ignore
//! ErrorCodeDefinition::find("E0302").unwrap()
//!     .builder()
//!     .param("reason", "unexpected '+'")
//!     .at(span)
//!     .build();
//! ```

use serde::Serialize;

use crate::util::span::Span;

/// 诊断严重级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl std::fmt::Display for Severity {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}

/// 诊断信息（message 已渲染完成）
///
/// **不可直接构造**。必须通过 `DiagnosticBuilder::build()` 或
/// `Diagnostic::note()` 创建。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// 严重级别
    pub severity: Severity,
    /// 错误码（注释类诊断为空）
    pub code: String,
    /// 完整消息
    pub message: String,
    /// 帮助信息
    pub help: String,
    /// 位置信息
    pub span: Option<Span>,
    /// 相关诊断（例如相互竞争的运算符位置）
    pub related: Vec<Diagnostic>,
}

impl Diagnostic {
    /// 创建错误诊断
    ///
    /// `pub(crate)`: 仅由 `DiagnosticBuilder::build()` 调用。
    pub(crate) fn error(
        code: String,
        message: String,
        help: String,
        span: Option<Span>,
    ) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message,
            help,
            span,
            related: Vec::new(),
        }
    }

    /// 创建附注诊断，用于 `related`
    pub fn note(
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            severity: Severity::Info,
            code: String::new(),
            message: message.into(),
            help: String::new(),
            span: Some(span),
            related: Vec::new(),
        }
    }

    /// 添加相关诊断
    pub(crate) fn with_related(
        mut self,
        related: Vec<Diagnostic>,
    ) -> Self {
        self.related = related;
        self
    }

    /// 所有涉及的位置（主位置在前）
    pub fn spans(&self) -> Vec<Span> {
        self.span
            .iter()
            .copied()
            .chain(self.related.iter().filter_map(|r| r.span))
            .collect()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        if self.code.is_empty() {
            write!(f, "{}: {}", self.severity, self.message)
        } else {
            write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
        }
    }
}
