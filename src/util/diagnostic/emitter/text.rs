//! 诊断渲染器

use owo_colors::OwoColorize;

use crate::util::diagnostic::Diagnostic;
use crate::util::diagnostic::Severity;
use crate::util::span::SourceFile;

/// 渲染器配置
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// 是否启用颜色输出
    pub use_colors: bool,
    /// 是否显示源码片段
    pub show_source: bool,
    /// 是否显示帮助信息
    pub show_help: bool,
    /// 是否显示相关诊断
    pub show_related: bool,
    /// 是否显示行号
    pub show_line_numbers: bool,
    /// 指示字符 (默认: "^")
    pub indicator: char,
    /// 最大显示行数
    pub max_lines: usize,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            use_colors: true,
            show_source: true,
            show_help: true,
            show_related: true,
            show_line_numbers: true,
            indicator: '^',
            max_lines: 6,
        }
    }
}

/// 文本诊断渲染器
#[derive(Debug, Clone)]
pub struct TextEmitter {
    config: EmitterConfig,
}

impl TextEmitter {
    /// 创建新的文本渲染器
    pub fn new() -> Self {
        Self {
            config: EmitterConfig::default(),
        }
    }

    /// 使用自定义配置创建渲染器
    pub fn with_config(config: EmitterConfig) -> Self {
        Self { config }
    }

    /// 渲染单个诊断
    pub fn render(
        &self,
        diagnostic: &Diagnostic,
    ) -> String {
        self.render_internal(diagnostic, None, 0)
    }

    /// 渲染诊断到指定源码文件
    pub fn render_with_source(
        &self,
        diagnostic: &Diagnostic,
        source_file: Option<&SourceFile>,
    ) -> String {
        self.render_internal(diagnostic, source_file, 0)
    }

    /// 内部渲染方法（递归）
    fn render_internal(
        &self,
        diagnostic: &Diagnostic,
        source_file: Option<&SourceFile>,
        indent: usize,
    ) -> String {
        let mut output = String::new();
        let pad = "  ".repeat(indent);

        // 1. 渲染头部
        output.push_str(&pad);
        output.push_str(&self.render_header(diagnostic));

        // 2. 渲染位置
        output.push_str(&self.render_location(diagnostic, source_file));

        // 3. 渲染源码片段
        if self.config.show_source {
            if let Some(snippet) = self.render_source_snippet(diagnostic, source_file) {
                output.push_str(&snippet);
            }
        }

        // 4. 渲染帮助信息
        if self.config.show_help && !diagnostic.help.is_empty() {
            output.push_str(&pad);
            output.push_str(&self.paint("help", Severity::Hint));
            output.push_str(": ");
            output.push_str(&diagnostic.help);
            output.push('\n');
        }

        // 5. 渲染相关诊断
        if self.config.show_related {
            for related in &diagnostic.related {
                output.push_str(&self.render_internal(related, source_file, indent + 1));
            }
        }

        output
    }

    /// 渲染错误头部
    fn render_header(
        &self,
        diagnostic: &Diagnostic,
    ) -> String {
        let severity = self.paint(&diagnostic.severity.to_string(), diagnostic.severity);

        if diagnostic.code.is_empty() {
            format!("{}: {}\n", severity, diagnostic.message)
        } else if self.config.use_colors {
            format!(
                "{} [{}] {}\n",
                severity,
                diagnostic.code.bold(),
                diagnostic.message
            )
        } else {
            format!("{} [{}] {}\n", severity, diagnostic.code, diagnostic.message)
        }
    }

    /// 渲染位置信息
    fn render_location(
        &self,
        diagnostic: &Diagnostic,
        source_file: Option<&SourceFile>,
    ) -> String {
        match &diagnostic.span {
            Some(span) if !span.is_dummy() => {
                let file_name = source_file
                    .map(|sf| sf.name.as_str())
                    .unwrap_or("<unknown>");
                format!(
                    " --> {}:{}:{}\n",
                    file_name, span.start.line, span.start.column
                )
            }
            _ => String::new(),
        }
    }

    /// 渲染源码片段
    fn render_source_snippet(
        &self,
        diagnostic: &Diagnostic,
        source_file: Option<&SourceFile>,
    ) -> Option<String> {
        let span = diagnostic.span.as_ref()?;
        if span.is_dummy() {
            return None;
        }

        let source_file = source_file?;
        let start_line = span.start.line;
        let end_line = span.end.line.max(start_line);

        // 限制显示行数
        let lines_to_show = (end_line - start_line + 1).min(self.config.max_lines);
        let mut output = String::new();

        for i in 0..lines_to_show {
            let line_num = start_line + i;
            let Some(line) = source_file.line(line_num) else {
                break;
            };
            if self.config.show_line_numbers {
                output.push_str(&format!("{:>4} | ", line_num));
            } else {
                output.push_str("     | ");
            }
            output.push_str(line);
            output.push('\n');

            // 第一行添加错误指示
            if i == 0 {
                let spaces = " ".repeat(span.start.column.saturating_sub(1));
                let indicator_len = if start_line == end_line {
                    span.end.column.saturating_sub(span.start.column).max(1)
                } else {
                    line.len()
                        .saturating_sub(span.start.column.saturating_sub(1))
                        .max(1)
                };
                let indicators = self.config.indicator.to_string().repeat(indicator_len);
                output.push_str(&format!(
                    "     | {}{}\n",
                    spaces,
                    self.paint(&indicators, diagnostic.severity)
                ));
            }
        }

        Some(output)
    }

    /// 按严重级别着色
    fn paint(
        &self,
        text: &str,
        severity: Severity,
    ) -> String {
        if !self.config.use_colors {
            return text.to_string();
        }

        match severity {
            Severity::Error => text.red().to_string(),
            Severity::Warning => text.yellow().to_string(),
            Severity::Info => text.blue().to_string(),
            Severity::Hint => text.cyan().to_string(),
        }
    }
}

impl Default for TextEmitter {
    fn default() -> Self {
        Self::new()
    }
}
