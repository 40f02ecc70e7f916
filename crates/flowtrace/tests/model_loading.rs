//! Integration tests for loading the analyser's JSON into a type model

use flowtrace::model::{Modifier, TypeKind};
use flowtrace::prelude::*;

fn load(json: &str) -> Result<TypeModel, FlowError> {
    TypeModel::from_json(json, &Conventions::default())
}

#[test]
fn test_sparse_document_loads() {
    let model = load(r#"[ { "kind": "class", "fullName": "Shop.Billing.Invoice" } ]"#).unwrap();
    let invoice = model.get("Shop.Billing.Invoice").unwrap();

    assert_eq!(invoice.kind, TypeKind::Class);
    assert!(invoice.methods.is_empty());
    assert!(invoice.summary().is_none());
    assert_eq!(invoice.namespace(), "Shop.Billing");
}

#[test]
fn test_statements_are_tagged() {
    let json = r#"[
        { "kind": "class", "fullName": "Shop.Billing.Handler",
          "methods": [ { "name": "HandleAsync", "modifiers": ["public", "async", "extern"],
            "statements": [
              { "$type": "if", "sections": [
                  { "condition": "paid", "statements": [
                      { "$type": "invocation", "containingType": "Shop.Mail", "name": "Send" } ] },
                  { "statements": [] } ] },
              { "$type": "switch", "expression": "status", "sections": [
                  { "labels": ["Status.Open"], "statements": [] } ] },
              { "$type": "forEach", "expression": "lines", "statements": [
                  { "$type": "block", "statements": [
                      { "$type": "invocation", "containingType": "Shop.Store", "name": "Save",
                        "arguments": [ { "type": "Shop.Line", "text": "line" } ] } ] } ] }
            ] } ] }
    ]"#;
    let model = load(json).unwrap();
    let method = model.get("Shop.Billing.Handler").unwrap().method("HandleAsync").unwrap();

    assert_eq!(method.statements.len(), 3);
    assert_eq!(method.modifiers, vec![Modifier::Public, Modifier::Async, Modifier::Other]);
    assert_eq!(method.owner, "Shop.Billing.Handler");

    let names: Vec<_> = method
        .statements
        .iter()
        .flat_map(Statement::invocations)
        .map(|invocation| invocation.name.as_str())
        .collect();
    assert_eq!(names, vec!["Send", "Save"]);
}

#[test]
fn test_unknown_statement_tag_is_rejected() {
    let json = r#"[ { "kind": "class", "fullName": "Shop.A",
        "methods": [ { "name": "Run", "statements": [ { "$type": "goto" } ] } ] } ]"#;
    assert!(matches!(load(json), Err(FlowError::Json { .. })));
}

#[test]
fn test_structural_violations_are_malformed() {
    let cases = [
        r#"[ { "kind": "class", "fullName": "  " } ]"#,
        r#"[ { "kind": "class", "fullName": "Shop.A", "methods": [ { "name": "" } ] } ]"#,
        r#"[ { "kind": "class", "fullName": "Shop.A", "methods": [ { "name": "Run",
              "statements": [ { "$type": "invocation", "containingType": "", "name": "Go" } ] } ] } ]"#,
        r#"[ { "kind": "class", "fullName": "Shop.A" }, { "kind": "class", "fullName": "Shop.A" } ]"#,
    ];
    for json in cases {
        let error = load(json).unwrap_err();
        assert!(
            matches!(error, FlowError::MalformedInput { .. }),
            "expected malformed input for {json}, got {error}"
        );
    }
}

#[test]
fn test_excluded_namespaces_are_dropped() {
    let json = r#"[
        { "kind": "class", "fullName": "Shop.Billing.Invoice" },
        { "kind": "class", "fullName": "LivingDocumentation.Tooling.Renderer" }
    ]"#;
    let model = load(json).unwrap();
    assert_eq!(model.len(), 1);
    assert!(!model.contains("LivingDocumentation.Tooling.Renderer"));
}

#[test]
fn test_inherited_bases_and_members() {
    let json = r#"[
        { "kind": "class", "fullName": "Shop.Base.Message",
          "fields": [ { "name": "MessageId", "type": "System.Guid" } ] },
        { "kind": "class", "fullName": "Shop.Base.Event", "baseTypes": ["Shop.Base.Message"],
          "methods": [ { "name": "Describe" } ] },
        { "kind": "class", "fullName": "Shop.Billing.InvoicePaid", "baseTypes": ["Shop.Base.Event"],
          "methods": [ { "name": "Describe", "modifiers": ["public", "override"] } ] }
    ]"#;
    let model = load(json).unwrap();
    let paid = model.get("Shop.Billing.InvoicePaid").unwrap();

    assert_eq!(paid.base_types, vec!["Shop.Base.Event", "Shop.Base.Message"]);
    assert!(paid.fields.iter().any(|field| field.name == "MessageId"));
    assert_eq!(paid.methods.len(), 1);
    assert!(paid.methods[0].is_override());
}

#[test]
fn test_inherited_methods_keep_their_owner() {
    let json = r#"[
        { "kind": "class", "fullName": "Shop.Billing.HandlerBase",
          "methods": [ { "name": "Audit" } ] },
        { "kind": "class", "fullName": "Shop.Billing.Handler", "baseTypes": ["Shop.Billing.HandlerBase"] }
    ]"#;
    let model = load(json).unwrap();
    let audit = model.get("Shop.Billing.Handler").unwrap().method("Audit").unwrap();
    assert_eq!(audit.owner, "Shop.Billing.HandlerBase");
}

#[test]
fn test_inheritance_cycle_terminates() {
    let json = r#"[
        { "kind": "class", "fullName": "Shop.A", "baseTypes": ["Shop.B"] },
        { "kind": "class", "fullName": "Shop.B", "baseTypes": ["Shop.A"] }
    ]"#;
    let model = load(json).unwrap();
    assert_eq!(model.get("Shop.A").unwrap().base_types, vec!["Shop.B"]);
}

#[test]
fn test_generic_definitions_resolve() {
    let json = r#"[
        { "kind": "interface", "fullName": "Shop.Data.IRepository<T>" },
        { "kind": "class", "fullName": "Shop.Data.Repository<T>", "baseTypes": ["Shop.Data.IRepository<T>"] }
    ]"#;
    let model = load(json).unwrap();

    let resolved = model.resolve("Shop.Data.Repository<Shop.Billing.Invoice>").unwrap();
    assert_eq!(resolved.full_name, "Shop.Data.Repository<T>");
    assert_eq!(model.implementations_of("Shop.Data.IRepository<T>").len(), 1);
    assert!(model.resolve("Shop.Data.Missing<Shop.Billing.Invoice>").is_none());
}

#[test]
fn test_from_path() {
    let dir = std::env::temp_dir().join(format!("flowtrace-model-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("types.json");
    std::fs::write(&path, r#"[ { "kind": "enum", "fullName": "Shop.Status", "enumMembers": [] } ]"#)
        .unwrap();

    let model = TypeModel::from_path(&path, &Conventions::default()).unwrap();
    assert_eq!(model.get("Shop.Status").unwrap().kind, TypeKind::Enum);

    let missing = TypeModel::from_path(dir.join("absent.json"), &Conventions::default());
    assert!(matches!(missing, Err(FlowError::Io { .. })));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_conventions_override() {
    let conventions =
        Conventions::from_json(r#"{ "excludedNamespaces": ["Generated"], "maxDepth": 4 }"#).unwrap();
    assert_eq!(conventions.max_depth, 4);
    assert_eq!(conventions.event_handling_method, "HandleAsync");

    let json = r#"[
        { "kind": "class", "fullName": "Shop.Generated.Proxy" },
        { "kind": "class", "fullName": "LivingDocumentation.Kept" }
    ]"#;
    let model = TypeModel::from_json(json, &conventions).unwrap();
    assert!(model.contains("LivingDocumentation.Kept"));
    assert!(!model.contains("Shop.Generated.Proxy"));

    assert!(Conventions::from_json(r#"{ "maxDepth": 0 }"#).is_err());
}
