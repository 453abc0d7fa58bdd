//! 错误码定义
//!
//! E02xx: 运算符声明与导入阶段的错误码

use super::{ErrorCategory, ErrorCodeDefinition};

/// E02xx 错误码列表
pub static E02XX: &[ErrorCodeDefinition] = &[
    ErrorCodeDefinition {
        code: "E0201",
        category: ErrorCategory::Operator,
        message_template: "Operator '{name}' conflicts with existing operator '{existing}': {reason}",
        help_template: "Two operators must differ in name and in keyword/placeholder skeleton",
    },
    ErrorCodeDefinition {
        code: "E0202",
        category: ErrorCategory::Operator,
        message_template: "Invalid display form for operator '{name}': {reason}",
        help_template: "",
    },
    ErrorCodeDefinition {
        code: "E0203",
        category: ErrorCategory::Operator,
        message_template: "Unknown operator: '{name}'",
        help_template: "Operators must be declared before they are imported or used as combinators",
    },
    ErrorCodeDefinition {
        code: "E0204",
        category: ErrorCategory::Operator,
        message_template: "Unknown scope: {scope}",
        help_template: "",
    },
];
