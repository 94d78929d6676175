use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

const VALID_DOMAIN: &str = r#"
types:
  - name: Party
    kind: abstract
    methods:
      - name: getName
        returns: string
  - name: Customer
    superclass: Party
    methods:
      - name: getOrders
        returns: list:Order
      - name: placeOrder
        parameters:
          - name: quantity
            type: prim:int
  - name: Order
    markers:
      - marker: immutable
        value: null
    methods:
      - name: getCustomer
        returns: Customer
"#;

const INVALID_DOMAIN: &str = r#"
types:
  - name: Invoice
    methods:
      - name: getTotal
        returns: prim:int
        markers:
          - marker: optional
      - name: getOwner
        returns: Ghost
"#;

#[test]
fn validate_accepts_valid_domain() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let domain = dir.path().join("domain.yml");
    fs::write(&domain, VALID_DOMAIN)?;

    #[allow(deprecated)]
    Command::cargo_bin("facetry")?
        .current_dir(dir.path())
        .arg("validate")
        .arg(&domain)
        .assert()
        .success()
        .stdout(predicate::str::contains("Metamodel valid"));

    Ok(())
}

#[test]
fn validate_reports_every_problem() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let domain = dir.path().join("domain.yml");
    fs::write(&domain, INVALID_DOMAIN)?;

    #[allow(deprecated)]
    let assert = Command::cargo_bin("facetry")?
        .current_dir(dir.path())
        .args(["validate", "--json"])
        .arg(&domain)
        .assert()
        .failure();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let value: Value = serde_json::from_str(&stdout)?;
    assert_eq!(value["valid"], false);
    let failures = value["report"]["failures"].as_array().expect("failures array");
    assert!(failures
        .iter()
        .any(|f| f["validator"] == "optional-primitive"
            && f["identifier"]["logical_type"] == "Invoice"
            && f["identifier"]["member"] == "total"));
    let introspection = value["report"]["introspection_failures"]
        .as_array()
        .expect("introspection failures array");
    assert_eq!(introspection.len(), 1);

    Ok(())
}

#[test]
fn inspect_prints_members_and_facets() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let domain = dir.path().join("domain.yml");
    fs::write(&domain, VALID_DOMAIN)?;

    #[allow(deprecated)]
    let assert = Command::cargo_bin("facetry")?
        .current_dir(dir.path())
        .args(["inspect", "--json", "--type", "Customer"])
        .arg(&domain)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let value: Value = serde_json::from_str(&stdout)?;
    let customer = &value.as_array().expect("json array")[0];
    assert_eq!(customer["logical_type"], "Customer");
    assert_eq!(customer["state"], "FULLY_INTROSPECTED");
    assert_eq!(customer["ancestors"][0], "Party");
    let ids: Vec<_> = customer["members"]
        .as_array()
        .expect("members array")
        .iter()
        .map(|m| m["id"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(ids, vec!["orders", "placeOrder", "name"]);

    Ok(())
}

#[test]
fn inspect_text_marks_immutable_members_disabled() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let domain = dir.path().join("domain.yml");
    fs::write(&domain, VALID_DOMAIN)?;

    #[allow(deprecated)]
    Command::cargo_bin("facetry")?
        .current_dir(dir.path())
        .args(["inspect", "--type", "Order"])
        .arg(&domain)
        .assert()
        .success()
        .stdout(predicate::str::contains("Order [FULLY_INTROSPECTED] concrete"))
        .stdout(predicate::str::contains("disabled=\"Object is immutable\""));

    Ok(())
}

#[test]
fn config_file_enables_fail_fast() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let domain = dir.path().join("domain.yml");
    fs::write(&domain, INVALID_DOMAIN)?;
    fs::write(
        dir.path().join("facetry.yml"),
        "introspection:\n  fail_fast: true\n",
    )?;

    #[allow(deprecated)]
    Command::cargo_bin("facetry")?
        .current_dir(dir.path())
        .args(["inspect", "--type", "Invoice"])
        .arg(&domain)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no descriptor for type Ghost"));

    Ok(())
}
