//! Matching of a request against the consents given by its resource owner.
use super::error::ProtocolError;
use crate::primitives::consent::{Consent, ConsentRepository};
use crate::primitives::scope::Scope;

/// Finds a previous consent that covers a request.
///
/// A consent covers the request if it was given to the same client, grants every requested scope
/// and every individually requested claim. Finding none is not an error, the resource owner is
/// then asked for consent.
pub struct ConsentMatcher<'a> {
    consents: &'a dyn ConsentRepository,
}

impl<'a> ConsentMatcher<'a> {
    /// Match against the consents of a repository.
    pub fn new(consents: &'a dyn ConsentRepository) -> Self {
        ConsentMatcher { consents }
    }

    /// The first consent of `subject` covering the request.
    pub async fn find(
        &self, subject: &str, client_id: &str, scope: &Scope, claims: &[String],
    ) -> Result<Option<Consent>, ProtocolError> {
        let consents = self.consents.get_consents(subject).await?;
        Ok(consents
            .into_iter()
            .find(|consent| covers(consent, client_id, scope, claims)))
    }
}

/// If the consent grants the scopes and claims to the client.
pub fn covers(consent: &Consent, client_id: &str, scope: &Scope, claims: &[String]) -> bool {
    consent.client_id == client_id
        && consent.scopes.privileged_to(scope)
        && claims.iter().all(|claim| consent.claims.contains(claim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::consent::ConsentMap;

    fn consent(client_id: &str, scopes: &str) -> Consent {
        Consent {
            subject: "owner".into(),
            client_id: client_id.into(),
            scopes: scopes.parse().unwrap(),
            claims: vec!["email".into()],
        }
    }

    #[test]
    fn superset_matches() {
        let consents = ConsentMap::new();
        smol::block_on(consents.insert(consent("other", "openid profile email"))).unwrap();
        smol::block_on(consents.insert(consent("client", "openid profile"))).unwrap();
        let matcher = ConsentMatcher::new(&consents);

        let found = smol::block_on(matcher.find("owner", "client", &"openid".parse().unwrap(), &[]))
            .unwrap()
            .unwrap();
        assert_eq!(found.client_id, "client");

        let wider = smol::block_on(matcher.find("owner", "client", &"openid email".parse().unwrap(), &[]))
            .unwrap();
        assert!(wider.is_none());

        let nobody = smol::block_on(matcher.find("nobody", "client", &"openid".parse().unwrap(), &[]))
            .unwrap();
        assert!(nobody.is_none());
    }

    #[test]
    fn claims_must_be_granted() {
        let given = consent("client", "openid");
        let scope = "openid".parse().unwrap();
        assert!(covers(&given, "client", &scope, &["email".to_string()]));
        assert!(!covers(&given, "client", &scope, &["phone_number".to_string()]));
    }
}
