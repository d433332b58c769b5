use cmdbar_core::{CmdbarError, Result, SnippetStore};
use uuid::Uuid;

/// Resolve a CLI target to a snippet id.
///
/// Case-insensitive exact name match wins; otherwise the target is treated as
/// an id prefix, which must match exactly one snippet.
pub fn resolve_snippet(store: &SnippetStore, target: &str) -> Result<Uuid> {
    let lowered = target.to_lowercase();

    if let Some(snippet) = store
        .snippets()
        .iter()
        .find(|s| s.name.to_lowercase() == lowered)
    {
        return Ok(snippet.id);
    }

    let mut by_prefix = store
        .snippets()
        .iter()
        .filter(|s| s.id.to_string().starts_with(&lowered));

    match (by_prefix.next(), by_prefix.next()) {
        (Some(snippet), None) => Ok(snippet.id),
        (Some(_), Some(_)) => Err(CmdbarError::AmbiguousId(target.to_string())),
        (None, _) => Err(CmdbarError::NotFound(target.to_string())),
    }
}

/// Short id prefix for list output
pub fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdbar_core::Snippet;
    use tempfile::tempdir;

    fn store_with(names: &[&str]) -> SnippetStore {
        let dir = tempdir().unwrap();
        let mut store = SnippetStore::open(dir.path().join("db.json"));
        for name in names {
            store
                .add(Snippet::new(
                    name.to_string(),
                    String::new(),
                    "general".to_string(),
                    vec!["true".to_string()],
                    vec![],
                ))
                .unwrap();
        }
        store
    }

    #[test]
    fn name_match_is_case_insensitive() {
        let store = store_with(&["Deploy API", "Build image"]);
        let id = resolve_snippet(&store, "deploy api").unwrap();
        assert_eq!(store.get(id).unwrap().name, "Deploy API");
    }

    #[test]
    fn id_prefix_resolves_when_unambiguous() {
        let store = store_with(&["one", "two"]);
        let want = store.snippets()[1].id;
        let prefix: String = want.to_string().chars().take(8).collect();
        assert_eq!(resolve_snippet(&store, &prefix).unwrap(), want);
    }

    #[test]
    fn unknown_target_is_not_found() {
        let store = store_with(&["one"]);
        assert!(matches!(
            resolve_snippet(&store, "zzzz"),
            Err(CmdbarError::NotFound(_))
        ));
    }

    #[test]
    fn name_match_beats_prefix_match() {
        let mut store = store_with(&["one"]);
        let id = store.snippets()[0].id;
        let prefix: String = id.to_string().chars().take(4).collect();
        // A snippet literally named like the other snippet's id prefix
        store
            .add(Snippet::new(
                prefix.clone(),
                String::new(),
                "general".to_string(),
                vec!["true".to_string()],
                vec![],
            ))
            .unwrap();
        let resolved = resolve_snippet(&store, &prefix).unwrap();
        assert_eq!(store.get(resolved).unwrap().name, prefix);
    }
}
