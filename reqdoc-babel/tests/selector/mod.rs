//! Format selector and dispatch properties

use proptest::prelude::*;
use reqdoc_babel::model::Expression;
use reqdoc_babel::{
    walk, FieldValue, FormatRule, FormatSpecifier, RecordRef, RenderConfig, ValueHandler, Walked,
};

fn rule(
    package: Option<&str>,
    type_name: Option<&str>,
    attribute: Option<&str>,
    format: &str,
) -> FormatRule {
    FormatRule::new(
        package,
        type_name,
        attribute,
        Some(FormatSpecifier::parse(format)),
    )
    .unwrap()
}

#[test]
fn test_more_specific_later_rule_wins() {
    let config = RenderConfig::from_rules(vec![
        rule(Some("P"), None, None, "rst"),
        rule(Some("P"), Some("T"), None, "md"),
    ]);
    assert_eq!(config.resolve("P", "T", "a"), Some(&FormatSpecifier::Markdown));
    assert_eq!(config.resolve("P", "U", "a"), Some(&FormatSpecifier::Rst));
    assert_eq!(config.resolve("Q", "T", "a"), None);
}

#[test]
fn test_patterns_match_prefixes() {
    let config = RenderConfig::from_rules(vec![rule(None, Some("Sw"), None, "md")]);
    assert!(config.is_format_markdown("P", "SwReq", "a"));
    assert!(!config.is_format_markdown("P", "HwSwReq", "a"));
}

#[test]
fn test_invalid_pattern_names_it() {
    let result = RenderConfig::from_json(r#"{"renderCfg": [{"type": "(unclosed"}]}"#);
    match result {
        Err(reqdoc_babel::ConvertError::InvalidRulePattern { pattern, .. }) => {
            assert_eq!(pattern, "(unclosed")
        }
        other => panic!("Expected InvalidRulePattern, got {other:?}"),
    }
}

/// Counts post-processing per array child.
#[derive(Default)]
struct Counter {
    processed: usize,
}

impl ValueHandler for Counter {
    type Artifact = usize;

    fn string(&mut self, text: &str) -> Option<usize> {
        Some(text.len())
    }

    fn list_item(&mut self, _index: usize, walked: Walked<usize>) -> Walked<usize> {
        self.processed += 1;
        match walked {
            Walked::Leaf(len) => Walked::Leaf(len * 10),
            seq => seq,
        }
    }

    fn other(&mut self, _value: &FieldValue) -> usize {
        0
    }
}

fn scalar() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Null),
        "[a-z]{0,6}".prop_map(FieldValue::String),
        ("[A-Z][a-z]{0,4}", "[a-z_]{1,6}")
            .prop_map(|(package, name)| FieldValue::Reference(RecordRef::new(package, name))),
        any::<i64>().prop_map(|value| FieldValue::Other(Expression::Integer(value))),
    ]
}

fn specifier() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["plain", "md", "markdown", "rst", "custom"])
}

fn maybe_pattern() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[A-Za-z]{1,3}")
}

type RawRule = (Option<String>, Option<String>, Option<String>, &'static str);

fn raw_rules() -> impl Strategy<Value = Vec<RawRule>> {
    prop::collection::vec(
        (maybe_pattern(), maybe_pattern(), maybe_pattern(), specifier()),
        0..6,
    )
}

fn compile(rules: &[RawRule]) -> Vec<FormatRule> {
    rules
        .iter()
        .map(|(package, type_name, attribute, format)| {
            rule(package.as_deref(), type_name.as_deref(), attribute.as_deref(), format)
        })
        .collect()
}

proptest! {
    #[test]
    fn appended_wildcard_wins_everywhere(
        rules in raw_rules(),
        wildcard in specifier(),
        input in ("[A-Za-z]{0,5}", "[A-Za-z]{0,5}", "[A-Za-z]{0,5}"),
    ) {
        let mut config = RenderConfig::from_rules(compile(&rules));
        config.push_rule(rule(None, None, None, wildcard));
        let (package, type_name, attribute) = input;
        prop_assert_eq!(
            config.resolve(&package, &type_name, &attribute),
            Some(&FormatSpecifier::parse(wildcard))
        );
    }

    #[test]
    fn resolve_returns_last_matching_rule(
        rules in raw_rules(),
        input in ("[A-Za-z]{0,5}", "[A-Za-z]{0,5}", "[A-Za-z]{0,5}"),
    ) {
        let compiled = compile(&rules);
        let (package, type_name, attribute) = input;
        let expected = compiled
            .iter()
            .rev()
            .find(|rule| rule.matches(&package, &type_name, &attribute))
            .and_then(|rule| rule.format().cloned());
        let config = RenderConfig::from_rules(compiled);
        prop_assert_eq!(config.resolve(&package, &type_name, &attribute).cloned(), expected);
    }

    #[test]
    fn array_children_are_post_processed_once(items in prop::collection::vec(scalar(), 0..12)) {
        let mut counter = Counter::default();
        let walked = walk(&mut counter, &FieldValue::Array(items.clone()));
        prop_assert_eq!(counter.processed, items.len());
        prop_assert_eq!(walked.len(), items.len());

        let expected: Vec<usize> = items
            .iter()
            .map(|item| match item {
                FieldValue::String(text) => text.len() * 10,
                _ => 0,
            })
            .collect();
        prop_assert_eq!(walked.into_leaves(), expected);
    }
}
