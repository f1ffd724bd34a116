//! Storage of granted tokens, looked up by their access or refresh value.
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::grant::GrantedToken;
use super::PrimitiveError;

/// Storage of issued tokens.
#[async_trait]
pub trait GrantedTokenRepository: Send + Sync {
    /// Persist a newly issued token.
    ///
    /// Fails with `Conflict` if its id, access value or refresh value is already in use.
    async fn insert(&self, token: GrantedToken) -> Result<(), PrimitiveError>;

    /// Find the grant of an access token.
    async fn get_by_access_token(&self, access_token: &str) -> Result<Option<GrantedToken>, PrimitiveError>;

    /// Find the grant of a refresh token.
    async fn get_by_refresh_token(&self, refresh_token: &str) -> Result<Option<GrantedToken>, PrimitiveError>;

    /// Remove a token and every token refreshed from it.
    async fn delete(&self, token: &GrantedToken) -> Result<(), PrimitiveError>;
}

/// Keeps track of access and refresh tokens by a hash-map.
#[derive(Default)]
pub struct TokenMap {
    inner: Mutex<Tokens>,
}

#[derive(Default)]
struct Tokens {
    by_id: HashMap<String, GrantedToken>,
    access: HashMap<String, String>,
    refresh: HashMap<String, String>,
}

impl TokenMap {
    /// Construct an empty map.
    pub fn new() -> Self {
        TokenMap::default()
    }

    fn tokens(&self) -> Result<MutexGuard<'_, Tokens>, PrimitiveError> {
        self.inner
            .lock()
            .map_err(|_| PrimitiveError::Unavailable("token store poisoned".into()))
    }
}

impl Tokens {
    fn remove(&mut self, id: &str) -> Option<GrantedToken> {
        let token = self.by_id.remove(id)?;
        self.access.remove(&token.access_token);
        if let Some(refresh) = &token.refresh_token {
            self.refresh.remove(refresh);
        }
        Some(token)
    }
}

#[async_trait]
impl GrantedTokenRepository for TokenMap {
    async fn insert(&self, token: GrantedToken) -> Result<(), PrimitiveError> {
        let mut tokens = self.tokens()?;
        let refresh_taken = token
            .refresh_token
            .as_ref()
            .map_or(false, |refresh| tokens.refresh.contains_key(refresh));
        if tokens.by_id.contains_key(&token.id) || tokens.access.contains_key(&token.access_token) || refresh_taken {
            return Err(PrimitiveError::Conflict);
        }

        tokens.access.insert(token.access_token.clone(), token.id.clone());
        if let Some(refresh) = &token.refresh_token {
            tokens.refresh.insert(refresh.clone(), token.id.clone());
        }
        tokens.by_id.insert(token.id.clone(), token);
        Ok(())
    }

    async fn get_by_access_token(&self, access_token: &str) -> Result<Option<GrantedToken>, PrimitiveError> {
        let tokens = self.tokens()?;
        Ok(tokens
            .access
            .get(access_token)
            .and_then(|id| tokens.by_id.get(id))
            .cloned())
    }

    async fn get_by_refresh_token(&self, refresh_token: &str) -> Result<Option<GrantedToken>, PrimitiveError> {
        let tokens = self.tokens()?;
        Ok(tokens
            .refresh
            .get(refresh_token)
            .and_then(|id| tokens.by_id.get(id))
            .cloned())
    }

    async fn delete(&self, token: &GrantedToken) -> Result<(), PrimitiveError> {
        let mut tokens = self.tokens()?;
        let mut pending = vec![token.id.clone()];
        while let Some(id) = pending.pop() {
            tokens.remove(&id);
            pending.extend(
                tokens
                    .by_id
                    .values()
                    .filter(|child| child.parent_token_id.as_deref() == Some(id.as_str()))
                    .map(|child| child.id.clone()),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn token(id: &str, parent: Option<&str>) -> GrantedToken {
        let now = Utc::now();
        GrantedToken {
            id: id.into(),
            access_token: format!("access-{}", id),
            refresh_token: Some(format!("refresh-{}", id)),
            id_token: None,
            scope: "openid".parse().unwrap(),
            client_id: "client".into(),
            subject: Some("owner".into()),
            parent_token_id: parent.map(str::to_string),
            created_at: now,
            until: now + Duration::hours(1),
        }
    }

    #[test]
    fn lookup_both_ways() {
        let map = TokenMap::new();
        smol::block_on(map.insert(token("a", None))).unwrap();

        let by_access = smol::block_on(map.get_by_access_token("access-a")).unwrap();
        let by_refresh = smol::block_on(map.get_by_refresh_token("refresh-a")).unwrap();
        assert_eq!(by_access, by_refresh);
        assert!(smol::block_on(map.get_by_access_token("refresh-a")).unwrap().is_none());
        assert!(matches!(
            smol::block_on(map.insert(token("a", None))),
            Err(PrimitiveError::Conflict)
        ));
    }

    #[test]
    fn refresh_values_are_unique() {
        let map = TokenMap::new();
        smol::block_on(map.insert(token("a", None))).unwrap();

        let mut duplicate = token("b", None);
        duplicate.refresh_token = Some("refresh-a".into());
        assert!(matches!(
            smol::block_on(map.insert(duplicate)),
            Err(PrimitiveError::Conflict)
        ));
        assert!(smol::block_on(map.get_by_access_token("access-b")).unwrap().is_none());

        let mut without_refresh = token("c", None);
        without_refresh.refresh_token = None;
        smol::block_on(map.insert(without_refresh)).unwrap();
    }

    #[test]
    fn delete_removes_refresh_chain() {
        let map = TokenMap::new();
        smol::block_on(map.insert(token("root", None))).unwrap();
        smol::block_on(map.insert(token("child", Some("root")))).unwrap();
        smol::block_on(map.insert(token("grandchild", Some("child")))).unwrap();
        smol::block_on(map.insert(token("unrelated", None))).unwrap();

        let root = smol::block_on(map.get_by_refresh_token("refresh-root")).unwrap().unwrap();
        smol::block_on(map.delete(&root)).unwrap();

        for id in ["root", "child", "grandchild"].iter() {
            let access = format!("access-{}", id);
            assert!(smol::block_on(map.get_by_access_token(&access)).unwrap().is_none());
        }
        assert!(smol::block_on(map.get_by_access_token("access-unrelated")).unwrap().is_some());
    }
}
