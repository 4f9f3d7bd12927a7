use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        DataJoinError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(DataJoinError::data("x").to_string().contains("data error:"));
    assert!(
        DataJoinError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = DataJoinError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
