//! 通用诊断构建器
//!
//! 支持模板参数化的错误消息构建器

use crate::util::diagnostic::Diagnostic;
use crate::util::span::Span;

/// 诊断构建器（支持模板参数）
#[derive(Debug, Clone)]
pub struct DiagnosticBuilder {
    code: &'static str,
    message_template: &'static str,
    help_template: &'static str,
    params: Vec<(&'static str, String)>,
    span: Option<Span>,
    related: Vec<Diagnostic>,
}

impl DiagnosticBuilder {
    /// 创建新的诊断构建器
    pub fn new(
        code: &'static str,
        message_template: &'static str,
        help_template: &'static str,
    ) -> Self {
        Self {
            code,
            message_template,
            help_template,
            params: Vec::new(),
            span: None,
            related: Vec::new(),
        }
    }

    /// 添加模板参数
    pub fn param(
        mut self,
        key: &'static str,
        value: impl Into<String>,
    ) -> Self {
        self.params.push((key, value.into()));
        self
    }

    /// 设置位置
    #[inline]
    pub fn at(
        mut self,
        span: Span,
    ) -> Self {
        self.span = Some(span);
        self
    }

    /// 添加相关诊断
    #[inline]
    pub fn with_related(
        mut self,
        related: Vec<Diagnostic>,
    ) -> Self {
        self.related = related;
        self
    }

    /// 构建 Diagnostic
    ///
    /// 缺失的模板参数在 debug 构建下直接 panic，release 下保留原样占位符。
    pub fn build(&self) -> Diagnostic {
        if cfg!(debug_assertions) {
            let missing = self.missing_params();
            assert!(
                missing.is_empty(),
                "Missing parameter(s) {:?} for error code '{}'",
                missing,
                self.code
            );
        }

        let message = render_template(self.message_template, &self.params);
        let help = render_template(self.help_template, &self.params);

        let mut diagnostic = Diagnostic::error(self.code.to_string(), message, help, self.span);
        if !self.related.is_empty() {
            diagnostic = diagnostic.with_related(self.related.clone());
        }
        diagnostic
    }

    /// 模板中出现但未提供的参数
    fn missing_params(&self) -> Vec<String> {
        template_keys(self.message_template)
            .into_iter()
            .chain(template_keys(self.help_template))
            .filter(|key| !self.params.iter().any(|(k, _)| k == key))
            .collect()
    }
}

/// 提取模板中的 `{key}` 占位符
fn template_keys(template: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                if !key.is_empty() {
                    keys.push(key.to_string());
                }
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    keys
}

/// 用参数渲染模板
pub fn render_template(
    template: &str,
    params: &[(&'static str, String)],
) -> String {
    let mut output = template.to_string();
    for (key, value) in params {
        output = output.replace(&format!("{{{}}}", key), value);
    }
    output
}
