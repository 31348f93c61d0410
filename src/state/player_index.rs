use std::sync::Arc;

use dashmap::DashMap;

use crate::types::PlayerProfile;

/// Outcome of resolving a line's player name against the index.
#[derive(Debug, Clone)]
pub enum NameMatch {
    /// Normalized full name matched directly.
    Exact(PlayerProfile),
    /// Exactly one indexed player carries the name's last token.
    LastToken(PlayerProfile),
    /// Two or more indexed players carry the last token. Carries the
    /// candidate count; the line is not scored.
    Ambiguous(usize),
    Miss,
}

/// Concurrent player lookup index. Keys are normalized full names; a
/// secondary index maps last tokens to the full names that carry them.
///
/// Resolution policy: exact full-name match wins; the last-token fallback
/// applies only when it is unambiguous. Collisions are surfaced, never
/// silently resolved to the first candidate.
pub struct PlayerIndex {
    /// normalized full name -> profile
    by_name: DashMap<String, PlayerProfile>,
    /// last token -> normalized full names carrying it
    by_last_token: DashMap<String, Vec<String>>,
}

/// Lowercase, trim, and collapse internal whitespace.
pub fn normalize(name: &str) -> String {
    name.split_whitespace()
        .map(|t| t.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

impl PlayerIndex {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            by_name: DashMap::new(),
            by_last_token: DashMap::new(),
        })
    }

    /// Insert or replace a profile. The stored profile keeps the caller's
    /// display name; all keys are normalized.
    pub fn upsert(&self, profile: PlayerProfile) {
        let key = normalize(&profile.name);
        if key.is_empty() {
            return;
        }
        if let Some(last) = key.rsplit(' ').next() {
            let mut names = self.by_last_token.entry(last.to_string()).or_default();
            if !names.contains(&key) {
                names.push(key.clone());
            }
        }
        self.by_name.insert(key, profile);
    }

    pub fn resolve(&self, raw_name: &str) -> NameMatch {
        let key = normalize(raw_name);
        if key.is_empty() {
            return NameMatch::Miss;
        }

        if let Some(profile) = self.by_name.get(&key) {
            return NameMatch::Exact(profile.clone());
        }

        let Some(last) = key.rsplit(' ').next() else {
            return NameMatch::Miss;
        };
        let Some(candidates) = self.by_last_token.get(last) else {
            return NameMatch::Miss;
        };

        match candidates.as_slice() {
            [] => NameMatch::Miss,
            [only] => match self.by_name.get(only) {
                Some(profile) => NameMatch::LastToken(profile.clone()),
                None => NameMatch::Miss,
            },
            many => NameMatch::Ambiguous(many.len()),
        }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::types::StatKind;

    fn profile(name: &str) -> PlayerProfile {
        PlayerProfile {
            name: name.to_string(),
            team: None,
            averages: HashMap::from([(StatKind::Points, 20.0)]),
        }
    }

    #[test]
    fn exact_match_ignores_case_and_spacing() {
        let index = PlayerIndex::new();
        index.upsert(profile("LeBron James"));

        let result = index.resolve("  lebron   JAMES ");
        assert!(matches!(result, NameMatch::Exact(p) if p.name == "LeBron James"));
    }

    #[test]
    fn unique_last_token_falls_back() {
        let index = PlayerIndex::new();
        index.upsert(profile("Stephen Curry"));

        let result = index.resolve("S. Curry");
        assert!(matches!(result, NameMatch::LastToken(p) if p.name == "Stephen Curry"));
    }

    #[test]
    fn duplicate_last_tokens_are_ambiguous() {
        let index = PlayerIndex::new();
        index.upsert(profile("Jaylen Brown"));
        index.upsert(profile("Jalen Brown"));

        let result = index.resolve("J Brown");
        assert!(matches!(result, NameMatch::Ambiguous(2)));
    }

    #[test]
    fn exact_match_beats_an_ambiguous_last_token() {
        let index = PlayerIndex::new();
        index.upsert(profile("Jaylen Brown"));
        index.upsert(profile("Jalen Brown"));

        let result = index.resolve("jaylen brown");
        assert!(matches!(result, NameMatch::Exact(p) if p.name == "Jaylen Brown"));
    }

    #[test]
    fn unknown_name_is_a_miss() {
        let index = PlayerIndex::new();
        index.upsert(profile("Stephen Curry"));

        assert!(matches!(index.resolve("Nikola Jokic"), NameMatch::Miss));
        assert!(matches!(index.resolve(""), NameMatch::Miss));
    }

    #[test]
    fn reupserting_does_not_duplicate_the_token_index() {
        let index = PlayerIndex::new();
        index.upsert(profile("Stephen Curry"));
        index.upsert(profile("Stephen Curry"));

        assert_eq!(index.len(), 1);
        assert!(matches!(index.resolve("curry"), NameMatch::LastToken(_)));
    }
}
