use crate::{
    models::NewGroup,
    store::{Store, StoreError},
};
use std::{fs, path::Path};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("cannot read groups file: {0}")]
    Io(#[from] std::io::Error),
    #[error("groups file is not a JSON array of groups: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Loads groups from a JSON array of `{title, slug, description}` objects.
pub fn load_groups(store: &Store, path: &Path) -> Result<usize, SeedError> {
    let raw = fs::read_to_string(path)?;
    seed_groups(store, &raw)
}

pub fn seed_groups(store: &Store, raw: &str) -> Result<usize, SeedError> {
    let groups: Vec<NewGroup> = serde_json::from_str(raw)?;
    let count = groups.len();
    for group in groups {
        store.create_group(group)?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_groups_in_order() {
        let store = Store::new();
        let raw = r#"[
            {"title": "Cats", "slug": "cats", "description": "Meow"},
            {"title": "Dogs", "slug": "dogs"}
        ]"#;

        assert_eq!(seed_groups(&store, raw).unwrap(), 2);
        let groups = store.groups();
        assert_eq!(groups[0].slug, "cats");
        assert_eq!(groups[1].description, "");
    }

    #[test]
    fn duplicate_slug_fails() {
        let store = Store::new();
        let raw = r#"[{"title": "A", "slug": "a"}, {"title": "B", "slug": "a"}]"#;
        assert!(matches!(
            seed_groups(&store, raw),
            Err(SeedError::Store(StoreError::SlugTaken(_)))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let store = Store::new();
        let result = load_groups(&store, Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(SeedError::Io(_))));
    }
}
