//! 错误码注册表
//!
//! 提供所有诊断错误码的集中定义和管理

pub mod e01xx;
pub mod e02xx;
pub mod e03xx;

pub use e01xx::*;
pub use e02xx::*;
pub use e03xx::*;

pub mod builder;
pub use builder::DiagnosticBuilder;

use once_cell::sync::Lazy;

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Category, // E01xx: 紧密度类别声明
    Operator, // E02xx: 运算符声明与导入
    Parse,    // E03xx: 表达式解析
}

impl ErrorCategory {
    /// 声明阶段错误会中止整个编译单元
    pub fn is_declaration(&self) -> bool {
        matches!(self, ErrorCategory::Category | ErrorCategory::Operator)
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            ErrorCategory::Category => write!(f, "Category"),
            ErrorCategory::Operator => write!(f, "Operator"),
            ErrorCategory::Parse => write!(f, "Parse"),
        }
    }
}

/// 错误码定义（元数据 + 消息模板）
#[derive(Debug, Clone, Copy)]
pub struct ErrorCodeDefinition {
    /// 错误码，如 "E0302"
    pub code: &'static str,
    /// 错误类别
    pub category: ErrorCategory,
    /// 消息模板，支持 {param} 占位符
    pub message_template: &'static str,
    /// 帮助模板，支持 {param} 占位符，可为空
    pub help_template: &'static str,
}

/// 完整的错误码注册表
static ERROR_CODES: Lazy<Vec<ErrorCodeDefinition>> = Lazy::new(|| {
    let mut codes: Vec<ErrorCodeDefinition> = Vec::new();

    // E01xx: 紧密度类别
    codes.extend_from_slice(e01xx::E01XX);
    // E02xx: 运算符
    codes.extend_from_slice(e02xx::E02XX);
    // E03xx: 表达式解析
    codes.extend_from_slice(e03xx::E03XX);

    codes
});

impl ErrorCodeDefinition {
    /// 根据代码查找错误码定义
    pub fn find(code: &str) -> Option<&'static Self> {
        ERROR_CODES.iter().find(|c| c.code == code)
    }

    /// 获取所有错误码
    pub fn all() -> &'static [Self] {
        &ERROR_CODES
    }

    /// 按类别获取错误码
    pub fn by_category(category: ErrorCategory) -> impl Iterator<Item = &'static Self> {
        ERROR_CODES.iter().filter(move |c| c.category == category)
    }

    /// 创建 DiagnosticBuilder
    pub fn builder(&self) -> DiagnosticBuilder {
        DiagnosticBuilder::new(self.code, self.message_template, self.help_template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_error_code() {
        let code = ErrorCodeDefinition::find("E0302");
        assert!(code.is_some());
        assert_eq!(code.unwrap().category, ErrorCategory::Parse);
    }

    #[test]
    fn test_find_unknown_code() {
        assert!(ErrorCodeDefinition::find("E9999").is_none());
    }

    #[test]
    fn test_codes_are_unique() {
        let all = ErrorCodeDefinition::all();
        let mut seen = std::collections::HashSet::new();
        for def in all {
            assert!(seen.insert(def.code), "duplicate code {}", def.code);
        }
        assert_eq!(all.len(), 12);
    }

    #[test]
    fn test_by_category() {
        assert_eq!(ErrorCodeDefinition::by_category(ErrorCategory::Category).count(), 3);
        assert!(ErrorCodeDefinition::by_category(ErrorCategory::Operator)
            .all(|c| c.category.is_declaration()));
        assert!(ErrorCodeDefinition::by_category(ErrorCategory::Parse)
            .all(|c| !c.category.is_declaration()));
    }
}
