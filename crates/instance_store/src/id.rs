use std::fmt;

use uuid::Uuid;

/// Container label key that ties a container to one launch.
pub const LABEL_KEY: &str = "clankercage.instance";

/// Random 128-bit launch identifier, rendered as 32 lowercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceId(String);

impl InstanceId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[must_use]
pub fn instance_label(id: &InstanceId) -> String {
    format!("{LABEL_KEY}={id}")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{instance_label, InstanceId};

    #[test]
    fn generated_ids_are_32_lowercase_hex() {
        let id = InstanceId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn generated_ids_do_not_repeat() {
        let ids: HashSet<_> = (0..1000).map(|_| InstanceId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn label_embeds_id() {
        let id = InstanceId::generate();
        assert_eq!(instance_label(&id), format!("clankercage.instance={id}"));
    }
}
