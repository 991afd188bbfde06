use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert_eq!(
        KitError::precondition("No layers selected").to_string(),
        "No layers selected"
    );
    assert!(
        KitError::conflict("x")
            .to_string()
            .starts_with("conflict:")
    );
    assert!(KitError::host("x").to_string().contains("host error:"));
    assert!(
        KitError::validation("x")
            .to_string()
            .contains("validation error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = KitError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn only_conflicts_report_as_conflicts() {
    assert!(KitError::conflict("overlap").is_conflict());
    assert!(!KitError::host("missing").is_conflict());
}
