//! 错误码定义
//!
//! E01xx: 紧密度类别（tightness category）声明阶段的错误码

use super::{ErrorCategory, ErrorCodeDefinition};

/// E01xx 错误码列表
pub static E01XX: &[ErrorCodeDefinition] = &[
    ErrorCodeDefinition {
        code: "E0101",
        category: ErrorCategory::Category,
        message_template: "Declaring category '{category}' would create a tightness cycle: {cycle}",
        help_template: "Remove one of the tighter/weaker edges along the cycle",
    },
    ErrorCodeDefinition {
        code: "E0102",
        category: ErrorCategory::Category,
        message_template: "Unknown category: '{category}'",
        help_template: "Categories must be declared before they are referenced",
    },
    ErrorCodeDefinition {
        code: "E0103",
        category: ErrorCategory::Category,
        message_template: "Category '{category}' is already declared",
        help_template: "Use `relate` to add ordering edges to an existing category",
    },
];
