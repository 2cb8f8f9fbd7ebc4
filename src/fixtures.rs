#[cfg(test)]
pub mod test {
    use crate::schema::{Schema, SchemaDefinition, SchemaEntry};
    use crate::types::TypeTag;

    /// Layout of a configuration-management object directory.
    pub fn object_definition() -> SchemaDefinition {
        SchemaDefinition::from(vec![
            SchemaEntry::new("changed", TypeTag::Boolean),
            SchemaEntry::new("code-remote", TypeTag::String),
            SchemaEntry::new("source", TypeTag::String),
            SchemaEntry::nested("explorer", TypeTag::Dict, vec![("state", TypeTag::String)]),
            SchemaEntry::nested("parameter", TypeTag::Dict, vec![("state", TypeTag::String)]),
            SchemaEntry::new("state", TypeTag::String),
        ])
    }

    pub fn object_schema() -> Schema {
        Schema::new(&object_definition()).unwrap()
    }

    /// A single `user` dict with a name and an age.
    pub fn user_schema() -> Schema {
        Schema::new(&SchemaDefinition::from(vec![SchemaEntry::nested(
            "user",
            TypeTag::Dict,
            vec![("name", TypeTag::String), ("age", TypeTag::Integer)],
        )]))
        .unwrap()
    }

    #[test]
    fn fixtures_build() {
        assert_eq!(object_schema().len(), 6);
        assert_eq!(user_schema().len(), 1);
    }
}
