//! 错误码定义
//!
//! E03xx: 表达式解析阶段的错误码（每个表达式独立恢复）

use super::{ErrorCategory, ErrorCodeDefinition};

/// E03xx 错误码列表
pub static E03XX: &[ErrorCodeDefinition] = &[
    ErrorCodeDefinition {
        code: "E0301",
        category: ErrorCategory::Parse,
        message_template: "Operator symbol '{symbol}' is {reason} in this scope",
        help_template: "Symbolic operators must be imported explicitly",
    },
    ErrorCodeDefinition {
        code: "E0302",
        category: ErrorCategory::Parse,
        message_template: "No valid parse for expression: {reason}",
        help_template: "Check for a dangling operator or a missing operand",
    },
    ErrorCodeDefinition {
        code: "E0303",
        category: ErrorCategory::Parse,
        message_template: "Ambiguous expression: competing operators {operators}",
        help_template: "Add parentheses to make the grouping explicit",
    },
    ErrorCodeDefinition {
        code: "E0304",
        category: ErrorCategory::Parse,
        message_template: "Operator '{operator}' has no parameter named '{label}'",
        help_template: "Declared parameters: {expected}",
    },
    ErrorCodeDefinition {
        code: "E0305",
        category: ErrorCategory::Parse,
        message_template: "Parameter list of operator '{operator}' is invalid: {reason}",
        help_template: "Declared parameters: {expected}",
    },
];
