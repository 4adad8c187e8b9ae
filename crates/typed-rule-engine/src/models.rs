//! 规则引擎领域模型

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 规则定义
///
/// 一组按声明顺序排列的条件，全部满足时规则匹配。没有条件的规则匹配任何对象。
///
/// 评估器以 `Arc<Rule>` 的分配身份作为缓存键，而不是规则内容：
/// 内容相同的两个 `Arc<Rule>` 会被分别编译和缓存，同一个 `Arc` 的克隆共享身份。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
}

impl Rule {
    pub fn new(name: impl Into<String>, criteria: Vec<Criterion>) -> Self {
        Self {
            name: name.into(),
            criteria,
        }
    }

    /// 从 JSON 字符串解析单条规则
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 从 JSON 数组解析规则列表，每条规则拥有独立身份
    pub fn list_from_json(json: &str) -> Result<Vec<Arc<Rule>>> {
        let rules: Vec<Rule> = serde_json::from_str(json)?;
        Ok(rules.into_iter().map(Arc::new).collect())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 规则的身份键（分配地址）
    pub(crate) fn identity(&self) -> usize {
        self as *const Rule as usize
    }
}

/// 条件：属性路径 / 操作符 / 参数值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    /// 点号分隔的属性路径，如 "Response.Answer"
    pub property_path: String,
    /// 操作符名称，大小写敏感
    pub operator: String,
    /// 文本形式的参数，`None` 表示没有值
    #[serde(default)]
    pub value: Option<String>,
}

impl Criterion {
    pub fn new(
        property_path: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            property_path: property_path.into(),
            operator: operator.into(),
            value: Some(value.into()),
        }
    }

    /// 不带参数的条件，用于 IsNull / IsTrue 等操作符，或与空值比较
    pub fn unary(property_path: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            property_path: property_path.into(),
            operator: operator.into(),
            value: None,
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {} {:?}", self.property_path, self.operator, value),
            None => write!(f, "{} {}", self.property_path, self.operator),
        }
    }
}

/// 单条条件的评估结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriterionOutcome {
    /// 条件的文本形式，如 `Response.Answer Equal "42"`
    pub criterion: String,
    pub matched: bool,
}

/// 规则评估说明
///
/// 逐条评估所有条件（不短路），`matched` 与短路求值的结果一致。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub rule_name: String,
    pub matched: bool,
    pub outcomes: Vec<CriterionOutcome>,
}

impl Explanation {
    pub fn new(rule_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            matched: false,
            outcomes: Vec::new(),
        }
    }

    /// 未通过的条件
    pub fn failed(&self) -> impl Iterator<Item = &CriterionOutcome> {
        self.outcomes.iter().filter(|o| !o.matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_serialization() {
        let rule = Rule::new(
            "answer_rule",
            vec![
                Criterion::new("Response.Answer", "Equal", "42"),
                Criterion::unary("Name", "IsNotNull"),
            ],
        );

        let json = rule.to_json().unwrap();
        let parsed = Rule::from_json(&json).unwrap();
        assert_eq!(parsed, rule);
    }

    #[test]
    fn test_rule_deserialization() {
        let json = r#"
        {
            "name": "steve_rule",
            "criteria": [
                { "property_path": "Name", "operator": "Equal", "value": "Steve" },
                { "property_path": "Response.Answer", "operator": "IsNotNull" }
            ]
        }
        "#;

        let rule = Rule::from_json(json).unwrap();
        assert_eq!(rule.name, "steve_rule");
        assert_eq!(rule.criteria.len(), 2);
        assert_eq!(rule.criteria[1].value, None);
    }

    #[test]
    fn test_rule_without_criteria_field() {
        let rule = Rule::from_json(r#"{ "name": "match_all" }"#).unwrap();
        assert!(rule.criteria.is_empty());
    }

    #[test]
    fn test_list_from_json_gives_distinct_identities() {
        let json = r#"[{ "name": "a" }, { "name": "a" }]"#;
        let rules = Rule::list_from_json(json).unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0], rules[1]);
        assert_ne!(rules[0].identity(), rules[1].identity());
    }

    #[test]
    fn test_invalid_json() {
        let result = Rule::from_json("{ not json");
        assert!(matches!(result, Err(crate::RuleError::Parse(_))));
    }

    #[test]
    fn test_criterion_display() {
        assert_eq!(
            Criterion::new("Response.Answer", "Equal", "42").to_string(),
            r#"Response.Answer Equal "42""#
        );
        assert_eq!(Criterion::unary("Flag", "IsTrue").to_string(), "Flag IsTrue");
    }
}
