//! 规则匹配命令行工具
//!
//! 用法：`rule-match <rules.json> <document.json> [--explain]`
//!
//! 规则文件是规则数组，文档是任意 JSON 对象。匹配的规则名称逐行输出到 stdout，
//! `--explain` 时改为输出每条规则的评估说明（JSON）。

use anyhow::{Context, Result, bail};
use rule_engine::{DynamicEvaluator, EngineConfig, EvaluatorOptions, Inspect, Rule, telemetry};
use std::fs;
use std::sync::Arc;
use tracing::{info, warn};

fn main() -> Result<()> {
    let config = EngineConfig::load("rule-match").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        EngineConfig::default()
    });
    telemetry::init(&config)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let explain = args.iter().any(|a| a == "--explain");
    let paths: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
    let [rules_path, document_path] = paths.as_slice() else {
        bail!("usage: rule-match <rules.json> <document.json> [--explain]");
    };

    let rules_json = fs::read_to_string(rules_path)
        .with_context(|| format!("Failed to read rules from {}", rules_path))?;
    let rules = Rule::list_from_json(&rules_json)
        .with_context(|| format!("Failed to parse rules from {}", rules_path))?;
    info!("Loaded {} rules from {}", rules.len(), rules_path);

    let document_json = fs::read_to_string(document_path)
        .with_context(|| format!("Failed to read document from {}", document_path))?;
    let document: serde_json::Value = serde_json::from_str(&document_json)
        .with_context(|| format!("Failed to parse document from {}", document_path))?;

    let evaluator = DynamicEvaluator::with_options(
        rules.iter().map(Arc::clone),
        EvaluatorOptions {
            config,
            ..EvaluatorOptions::default()
        },
    );

    if explain {
        for rule in &rules {
            match evaluator.explain(&document, rule) {
                Ok(explanation) => println!("{}", serde_json::to_string(&explanation)?),
                Err(e) => warn!(rule_name = %rule.name, error = %e, "Failed to evaluate rule"),
            }
        }
        return Ok(());
    }

    let matched = evaluator.get_matching_rules(Some(&document as &dyn Inspect))?;
    info!("{} of {} rules matched", matched.len(), rules.len());

    for rule in matched {
        println!("{}", rule.name);
    }

    Ok(())
}
